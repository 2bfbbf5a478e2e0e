//! Error infrastructure for battle-core.
//!
//! Expected edge cases (zero valid targets, an empty skill pool, a dead sender
//! or recipient at dequeue time) are never errors: the affected operation
//! returns `Ok(false)` or `None` and logs the reason. [`BattleError`] is
//! reserved for misuse of the API and for invalid external data.

use crate::combatant::{CombatantId, Side};
use crate::skill::SkillId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the embedder may retry later (e.g. after a battle ends)
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: a state inconsistency that indicates a bug
/// - **Fatal**: corrupted data; the embedder should reload a known-good state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Errors surfaced to the embedding application.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("combatant {0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("skill '{0}' is not registered")]
    UnknownSkill(SkillId),

    #[error("combatant {0} was added twice")]
    DuplicateCombatant(CombatantId),

    #[error("battle needs at least one {side} combatant")]
    EmptyRoster { side: Side },

    #[error("a battle is already in progress")]
    BattleInProgress,

    #[error("invalid combatant record for {combatant}: {reason}")]
    InvalidRecord {
        combatant: CombatantId,
        reason: &'static str,
    },

    #[error("invalid battle configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}

impl BattleError {
    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::BattleInProgress => ErrorSeverity::Recoverable,
            Self::UnknownCombatant(_)
            | Self::UnknownSkill(_)
            | Self::DuplicateCombatant(_)
            | Self::EmptyRoster { .. }
            | Self::InvalidConfig { .. } => ErrorSeverity::Validation,
            Self::InvalidRecord { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns a static identifier for this error variant.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCombatant(_) => "unknown_combatant",
            Self::UnknownSkill(_) => "unknown_skill",
            Self::DuplicateCombatant(_) => "duplicate_combatant",
            Self::EmptyRoster { .. } => "empty_roster",
            Self::BattleInProgress => "battle_in_progress",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}

pub type Result<T> = core::result::Result<T, BattleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_records_are_fatal() {
        let err = BattleError::InvalidRecord {
            combatant: CombatantId(3),
            reason: "negative hp",
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.to_string(), "invalid combatant record for #3: negative hp");
    }

    #[test]
    fn busy_controller_is_recoverable() {
        assert!(BattleError::BattleInProgress.severity().is_recoverable());
        assert_eq!(BattleError::BattleInProgress.error_code(), "battle_in_progress");
    }
}
