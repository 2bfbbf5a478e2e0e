//! Battle phase and outcome enums.

/// Phases of one battle.
///
/// `PreCombat -> Intro -> Combat -> Outro -> Complete`. A global cancel can
/// drop `Combat` back into a paused `PreCombat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleState {
    #[default]
    PreCombat,
    Intro,
    Combat,
    Outro,
    Complete,
}

impl BattleState {
    /// Intro through Outro: participants are committed to the fight.
    pub const fn is_underway(self) -> bool {
        matches!(self, BattleState::Intro | BattleState::Combat | BattleState::Outro)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    #[default]
    Undetermined,
    Won,
    Lost,
}

/// How the encounter started; decides who may act first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    /// Allies act immediately, enemies wait the initial cooldown.
    Advantage,
    /// Enemies act immediately, allies wait the initial cooldown.
    Disadvantage,
    #[default]
    Neutral,
}

impl TransitionKind {
    /// Starting cooldowns as `(friendly, enemy)`.
    pub fn initial_cooldowns(self, initial: f32) -> (f32, f32) {
        match self {
            TransitionKind::Advantage => (0.0, initial),
            TransitionKind::Disadvantage => (initial, 0.0),
            TransitionKind::Neutral => (initial, initial),
        }
    }
}
