//! Battle controller: state machine, resolution queue and turn sequencing.
//!
//! The controller owns every participant for the duration of a battle and is
//! advanced by the embedder through [`BattleController::advance`]. Each
//! `Combat` tick counts cooldowns down, rolls ally HP meters, advances
//! statuses, drives the resolution queue and lets AI-controlled combatants
//! pick actions.
//!
//! Only one queue entry is in flight at a time. While it resolves the halt
//! flag is held; player input is ignored until it clears.

mod queue;
mod resolve;
mod selection;
mod state;

pub use queue::BattleSequence;
pub use selection::{BattleInput, Direction4, PlayerSelection};
pub use state::{BattleOutcome, BattleState, TransitionKind};

use std::collections::{HashMap, HashSet, VecDeque};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use self::queue::Resolution;
use crate::ai::{AiContext, BattleAi};
use crate::combatant::{Combatant, CombatantId, CombatantSnapshot, Side, StatKind};
use crate::config::BattleConfig;
use crate::entity::{self, BattleEntity, BattleRow};
use crate::error::{BattleError, Result};
use crate::events::{BattleEvent, BattleListener, StateAlteredKind};
use crate::mat::{BattleMat, Placement};
use crate::skill::{SkillBook, SkillId};
use crate::status::StatusTracker;
use crate::targeting::{BattleActionData, NavigationDirection};

pub struct BattleController {
    config: BattleConfig,
    state: BattleState,
    outcome: BattleOutcome,
    paused: bool,
    phase_timer: f32,
    allies: Vec<BattleEntity>,
    enemies: Vec<BattleEntity>,
    skills: SkillBook,
    brains: HashMap<CombatantId, BattleAi>,
    mat: BattleMat,
    queue: VecDeque<BattleSequence>,
    resolution: Option<Resolution>,
    halted: bool,
    selection: PlayerSelection,
    statuses: StatusTracker,
    rng: StdRng,
    pending: Vec<BattleEvent>,
    listeners: Vec<Box<dyn BattleListener>>,
}

impl BattleController {
    pub fn new(config: BattleConfig, skills: SkillBook) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            mat: BattleMat::new(config.mat.clone()),
            config,
            state: BattleState::PreCombat,
            outcome: BattleOutcome::Undetermined,
            paused: false,
            phase_timer: 0.0,
            allies: Vec::new(),
            enemies: Vec::new(),
            skills,
            brains: HashMap::new(),
            queue: VecDeque::new(),
            resolution: None,
            halted: false,
            selection: PlayerSelection::default(),
            statuses: StatusTracker::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
        })
    }

    pub fn add_listener(&mut self, listener: impl BattleListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ------------------------------------------------------------------
    // Setup and roster
    // ------------------------------------------------------------------

    /// Starts a new battle in `PreCombat`.
    ///
    /// Enemies the mat cannot place are left out and returned; the battle
    /// goes ahead with the rest.
    pub fn setup(
        &mut self,
        allies: Vec<Combatant>,
        enemies: Vec<(Combatant, BattleRow)>,
        transition: TransitionKind,
    ) -> Result<Vec<CombatantId>> {
        if self.state.is_underway() || (self.state == BattleState::PreCombat && !self.allies.is_empty()) {
            return Err(BattleError::BattleInProgress);
        }
        if !allies.iter().any(|c| c.side() == Side::Ally) {
            return Err(BattleError::EmptyRoster { side: Side::Ally });
        }
        if enemies.is_empty() {
            return Err(BattleError::EmptyRoster { side: Side::Enemy });
        }
        if allies.iter().any(|c| !c.side().is_friendly()) {
            return Err(BattleError::InvalidConfig {
                reason: "friendly roster contains an enemy-side combatant",
            });
        }
        if enemies.iter().any(|(c, _)| c.side() != Side::Enemy) {
            return Err(BattleError::InvalidConfig {
                reason: "enemy roster contains a friendly combatant",
            });
        }
        let mut seen = HashSet::new();
        for id in allies.iter().chain(enemies.iter().map(|(c, _)| c)).map(Combatant::id) {
            if !seen.insert(id) {
                return Err(BattleError::DuplicateCombatant(id));
            }
        }

        self.reset();
        let (friendly_cooldown, enemy_cooldown) =
            transition.initial_cooldowns(self.config.initial_cooldown);

        for (column, mut combatant) in allies.into_iter().enumerate() {
            combatant.set_in_combat(false);
            combatant.set_cooldown(friendly_cooldown);
            self.emit(BattleEvent::EntityAdded {
                combatant: combatant.id(),
                side: combatant.side(),
                row: BattleRow::Any,
                column,
            });
            self.allies.push(BattleEntity::new(combatant, BattleRow::Any, column));
        }

        let mut unplaced = Vec::new();
        for (combatant, row) in enemies {
            let id = combatant.id();
            if !self.insert_enemy(combatant, row, enemy_cooldown).is_placed() {
                warn!(target: "battle::controller", enemy = %id, "no room on the mat, enemy left out");
                unplaced.push(id);
            }
        }
        if self.enemies.is_empty() {
            self.reset();
            self.pending.clear();
            return Err(BattleError::EmptyRoster { side: Side::Enemy });
        }

        info!(
            target: "battle::controller",
            allies = self.allies.len(),
            enemies = self.enemies.len(),
            unplaced = unplaced.len(),
            %transition,
            "battle set up"
        );
        self.enter_state(BattleState::PreCombat);
        self.flush();
        Ok(unplaced)
    }

    /// Brings an enemy into a running battle.
    ///
    /// Returns the unplaced sentinel when the mat is full; the enemy is then
    /// not added and the caller decides what to do with it.
    pub fn add_enemy(&mut self, combatant: Combatant, row: BattleRow) -> Result<Placement> {
        if combatant.side() != Side::Enemy {
            return Err(BattleError::InvalidConfig {
                reason: "only enemy-side combatants can be placed on the mat",
            });
        }
        if self.entity(combatant.id()).is_some() {
            return Err(BattleError::DuplicateCombatant(combatant.id()));
        }
        let cooldown = if self.state.is_underway() {
            self.config.initial_cooldown
        } else {
            0.0
        };
        let placement = self.insert_enemy(combatant, row, cooldown);
        self.flush();
        Ok(placement)
    }

    pub fn remove_enemy(&mut self, id: CombatantId) -> Result<()> {
        let Some(index) = self.enemies.iter().position(|e| e.id() == id) else {
            return Err(BattleError::UnknownCombatant(id));
        };
        self.enemies.remove(index);
        self.mat.remove(id);
        self.brains.remove(&id);
        let changes = self.statuses.owner_died(id);
        self.apply_status_changes(changes);
        self.emit(BattleEvent::EntityRemoved { combatant: id });
        debug!(target: "battle::controller", enemy = %id, "enemy removed");
        self.check_outcome();
        self.flush();
        Ok(())
    }

    /// Puts a combatant under AI control, or back under player control.
    pub fn set_ai(&mut self, id: CombatantId, ai: Option<BattleAi>) {
        match ai {
            Some(ai) => {
                for skill in ai.unknown_skills(&self.skills) {
                    warn!(
                        target: "battle::ai",
                        combatant = %id,
                        %skill,
                        "priority references an unknown skill"
                    );
                }
                self.brains.insert(id, ai);
            }
            None => {
                self.brains.remove(&id);
            }
        }
    }

    pub fn is_player_controlled(&self, id: CombatantId) -> bool {
        !self.brains.contains_key(&id)
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Queues a single-recipient action.
    pub fn enqueue(
        &mut self,
        sender: CombatantId,
        recipient: CombatantId,
        skill: &SkillId,
    ) -> Result<bool> {
        self.enqueue_action(sender, skill, &[recipient])
    }

    /// Queues one entry per target, in target order.
    ///
    /// Returns `Ok(false)` when the action is not executable right now (no
    /// targets, sender not ready, skill unusable, battle not in combat).
    /// On success the sender's cooldown is locked until its last entry
    /// resolves.
    pub fn enqueue_action(
        &mut self,
        sender: CombatantId,
        skill: &SkillId,
        targets: &[CombatantId],
    ) -> Result<bool> {
        let skill = self
            .skills
            .get(skill)
            .ok_or_else(|| BattleError::UnknownSkill(skill.clone()))?;
        let combatant = self
            .entity(sender)
            .ok_or(BattleError::UnknownCombatant(sender))?
            .combatant();
        if let Some(missing) = targets.iter().find(|t| self.entity(**t).is_none()) {
            return Err(BattleError::UnknownCombatant(*missing));
        }

        if self.state != BattleState::Combat {
            debug!(target: "battle::queue", %sender, state = %self.state, "enqueue outside combat ignored");
            return Ok(false);
        }
        if targets.is_empty() {
            debug!(target: "battle::queue", %sender, skill = %skill.id, "action has no targets");
            return Ok(false);
        }
        if !combatant.is_ready() || !skill.is_usable_by(combatant) {
            debug!(target: "battle::queue", %sender, skill = %skill.id, "sender cannot act");
            return Ok(false);
        }

        for (index, recipient) in targets.iter().enumerate() {
            self.queue.push_back(BattleSequence {
                sender,
                recipient: *recipient,
                skill: skill.id.clone(),
                pays_cost: index == 0,
            });
        }
        if let Some(entity) = self.entity_mut(sender) {
            entity.combatant_mut().lock_cooldown();
        }
        if self.selection.references(sender) {
            self.selection.clear();
        }
        debug!(
            target: "battle::queue",
            %sender,
            skill = %skill.id,
            targets = targets.len(),
            depth = self.queue.len(),
            "action queued"
        );
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Player selection and input
    // ------------------------------------------------------------------

    /// Selects the ally the player is issuing orders for; `None` clears.
    pub fn set_selected_combatant(&mut self, id: Option<CombatantId>) -> Result<bool> {
        let Some(id) = id else {
            self.selection.clear();
            return Ok(true);
        };
        let Some(entity) = entity::find(&self.allies, id) else {
            return match entity::find(&self.enemies, id) {
                Some(_) => Ok(false),
                None => Err(BattleError::UnknownCombatant(id)),
            };
        };
        if self.state != BattleState::Combat
            || !entity.combatant().is_ready()
            || !self.is_player_controlled(id)
        {
            return Ok(false);
        }
        self.selection.select_combatant(id);
        Ok(true)
    }

    /// Picks a skill for the selected combatant and targets forward once.
    pub fn set_selected_skill(&mut self, skill: Option<&SkillId>) -> Result<bool> {
        let Some(sender) = self.selection.combatant() else {
            return Ok(false);
        };
        let Some(skill) = skill else {
            self.selection.select_combatant(sender);
            return Ok(true);
        };
        let skill = self
            .skills
            .get(skill)
            .ok_or_else(|| BattleError::UnknownSkill(skill.clone()))?;
        let usable = self
            .entity(sender)
            .is_some_and(|e| skill.is_usable_by(e.combatant()));
        if !usable {
            return Ok(false);
        }

        let mut action = BattleActionData::new(sender);
        if !skill.targeting.select(
            NavigationDirection::Forward,
            &mut action,
            skill.participant,
            &skill.filters,
            &self.allies,
            &self.enemies,
        ) {
            debug!(target: "battle::input", %sender, skill = %skill.id, "skill has no targets");
            return Ok(false);
        }
        self.selection.select_skill(skill, action);
        Ok(true)
    }

    /// Re-anchors targeting on `target`. Ineligible targets are rejected
    /// and the previous targets kept.
    pub fn set_selected_target(&mut self, target: CombatantId) -> Result<bool> {
        if self.entity(target).is_none() {
            return Err(BattleError::UnknownCombatant(target));
        }
        let (Some(skill), Some(action)) = (self.selection.skill(), self.selection.action()) else {
            return Ok(false);
        };
        let mut action = action.clone();
        action.set_focal_target(Some(target));
        if !skill.targeting.select(
            NavigationDirection::None,
            &mut action,
            skill.participant,
            &skill.filters,
            &self.allies,
            &self.enemies,
        ) {
            return Ok(false);
        }
        self.selection.set_action(action);
        Ok(true)
    }

    /// Applies a global input. Returns whether it was consumed.
    pub fn handle_input(&mut self, input: BattleInput) -> bool {
        if self.halted {
            return false;
        }
        let handled = match (self.state, input) {
            (BattleState::PreCombat, BattleInput::Execute | BattleInput::Cancel) if self.paused => {
                self.paused = false;
                self.enter_state(BattleState::Combat);
                true
            }
            (BattleState::Combat, BattleInput::Navigate(direction)) => self.navigate(direction.into()),
            (BattleState::Combat, BattleInput::Execute) => self.execute_selection(),
            (BattleState::Combat, BattleInput::Cancel) => {
                if self.selection.is_empty() {
                    self.paused = true;
                    self.enter_state(BattleState::PreCombat);
                } else {
                    self.selection.clear();
                }
                true
            }
            _ => false,
        };
        self.flush();
        handled
    }

    fn navigate(&mut self, direction: NavigationDirection) -> bool {
        let (Some(skill), Some(action)) = (self.selection.skill(), self.selection.action()) else {
            return false;
        };
        let mut action = action.clone();
        if !skill.targeting.select(
            direction,
            &mut action,
            skill.participant,
            &skill.filters,
            &self.allies,
            &self.enemies,
        ) {
            return false;
        }
        self.selection.set_action(action);
        true
    }

    fn execute_selection(&mut self) -> bool {
        let (Some(skill), Some(action)) = (self.selection.skill(), self.selection.action()) else {
            return false;
        };
        let skill = skill.id.clone();
        let sender = action.sender();
        let targets = action.targets().to_vec();
        match self.enqueue_action(sender, &skill, &targets) {
            Ok(queued) => queued,
            Err(error) => {
                warn!(target: "battle::input", %sender, %error, "selection could not be queued");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advances the battle by `dt` seconds and returns the resulting state.
    pub fn advance(&mut self, dt: f32) -> BattleState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.state {
            BattleState::PreCombat => {
                if !self.paused && !self.allies.is_empty() {
                    self.enter_state(BattleState::Intro);
                }
            }
            BattleState::Intro => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.enter_state(BattleState::Combat);
                }
            }
            BattleState::Combat => self.tick_combat(dt),
            BattleState::Outro => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.enter_state(BattleState::Complete);
                }
            }
            BattleState::Complete => self.tick_statuses(dt),
        }
        self.flush();
        self.state
    }

    fn tick_combat(&mut self, dt: f32) {
        self.tick_cooldowns(dt);
        self.tick_hp_scroll(dt);
        if self.state != BattleState::Combat {
            return;
        }
        self.tick_statuses(dt);
        if self.state != BattleState::Combat {
            return;
        }
        self.tick_queue(dt);
        if self.state != BattleState::Combat {
            return;
        }
        self.run_ai();
    }

    fn tick_cooldowns(&mut self, dt: f32) {
        let expired: Vec<CombatantId> = self
            .allies
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .filter_map(|e| e.combatant_mut().tick_cooldown(dt).then(|| e.id()))
            .collect();
        for id in expired {
            self.altered(id, StateAlteredKind::CooldownExpired);
        }
    }

    fn tick_hp_scroll(&mut self, dt: f32) {
        let span = self.config.hp_scroll_duration;
        let died: Vec<CombatantId> = self
            .allies
            .iter_mut()
            .filter_map(|e| e.combatant_mut().tick_hp(dt, span).then(|| e.id()))
            .collect();
        for id in died {
            self.on_death(id);
        }
    }

    fn tick_statuses(&mut self, dt: f32) {
        let mut ticks = Vec::new();
        let changes = self
            .statuses
            .advance(dt, |owner, effect| ticks.push((owner, effect)));
        self.apply_status_changes(changes);
        for (owner, effect) in ticks {
            self.apply_recurring(owner, effect);
        }
    }

    fn run_ai(&mut self) {
        let ready: Vec<CombatantId> = self
            .allies
            .iter()
            .chain(self.enemies.iter())
            .filter(|e| e.combatant().is_ready() && self.brains.contains_key(&e.id()))
            .map(BattleEntity::id)
            .collect();

        for id in ready {
            if self.state != BattleState::Combat {
                return;
            }
            let Some(brain) = self.brains.get(&id) else {
                continue;
            };
            let Some(mut ctx) = AiContext::new(id, &self.allies, &self.enemies, &mut self.rng) else {
                continue;
            };
            let decision = brain.choose_skill_and_target(&mut ctx, &self.skills);

            let Some(decision) = decision else {
                // Retry after a back-off instead of polling every tick.
                let seconds = self.config.initial_cooldown;
                if let Some(entity) = self.entity_mut(id) {
                    entity.combatant_mut().set_cooldown(seconds);
                }
                debug!(target: "battle::ai", combatant = %id, "no decision");
                self.altered(id, StateAlteredKind::CooldownSet { seconds });
                continue;
            };
            let targets = decision.action.targets().to_vec();
            if let Err(error) = self.enqueue_action(id, &decision.skill.id, &targets) {
                warn!(target: "battle::ai", combatant = %id, %error, "decision rejected");
            }
        }
    }

    fn enter_state(&mut self, state: BattleState) {
        let previous = self.state;
        self.state = state;

        let was_combat = previous == BattleState::Combat;
        let is_combat = state == BattleState::Combat;
        if was_combat != is_combat {
            for entity in self.allies.iter_mut().chain(self.enemies.iter_mut()) {
                entity.combatant_mut().set_in_combat(is_combat);
            }
            let changes = self.statuses.set_battle_active(is_combat);
            self.apply_status_changes(changes);
        }

        self.phase_timer = match state {
            BattleState::Intro => self.config.intro_duration,
            BattleState::Outro => self.config.outro_duration,
            _ => 0.0,
        };

        match state {
            BattleState::Outro => self.settle_hp(),
            BattleState::Complete => self.cleanup(),
            _ => {}
        }

        info!(
            target: "battle::controller",
            from = %previous,
            to = %state,
            outcome = %self.outcome,
            "battle state changed"
        );
        self.emit(BattleEvent::StateChanged {
            state,
            outcome: self.outcome,
            allies: snapshots(&self.allies),
            enemies: snapshots(&self.enemies),
        });
    }

    fn settle_hp(&mut self) {
        let died: Vec<CombatantId> = self
            .allies
            .iter_mut()
            .filter_map(|e| e.combatant_mut().settle_hp().then(|| e.id()))
            .collect();
        for id in died {
            self.on_death(id);
        }
    }

    fn cleanup(&mut self) {
        let changes = self.statuses.battle_complete();
        self.apply_status_changes(changes);
        self.queue.clear();
        self.resolution = None;
        self.halted = false;
        self.paused = false;
        self.selection.clear();
        self.mat.clear();
    }

    fn reset(&mut self) {
        self.allies.clear();
        self.enemies.clear();
        self.mat.clear();
        self.queue.clear();
        self.resolution = None;
        self.halted = false;
        self.paused = false;
        self.selection.clear();
        self.statuses = StatusTracker::new();
        self.outcome = BattleOutcome::Undetermined;
        self.state = BattleState::PreCombat;
    }

    fn insert_enemy(&mut self, mut combatant: Combatant, row: BattleRow, cooldown: f32) -> Placement {
        let id = combatant.id();
        let placement = self.mat.place_enemy(id, row);
        if !placement.is_placed() {
            return placement;
        }
        combatant.set_in_combat(self.state == BattleState::Combat);
        combatant.set_cooldown(cooldown);
        self.emit(BattleEvent::EntityAdded {
            combatant: id,
            side: combatant.side(),
            row: placement.row,
            column: placement.column,
        });
        self.enemies
            .push(BattleEntity::new(combatant, placement.row, placement.column));
        placement
    }

    /// Sets the outcome and moves to `Outro` once a side is wiped out.
    ///
    /// Assists never count toward defeat.
    fn check_outcome(&mut self) {
        if self.outcome != BattleOutcome::Undetermined
            || !matches!(self.state, BattleState::Intro | BattleState::Combat)
        {
            return;
        }
        let allies_down = self
            .allies
            .iter()
            .filter(|e| e.side() == Side::Ally)
            .all(|e| !e.is_alive());
        let enemies_down = self.enemies.iter().all(|e| !e.is_alive());

        self.outcome = if allies_down {
            BattleOutcome::Lost
        } else if enemies_down {
            BattleOutcome::Won
        } else {
            return;
        };
        self.enter_state(BattleState::Outro);
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn emit(&mut self, event: BattleEvent) {
        self.pending.push(event);
    }

    fn altered(&mut self, combatant: CombatantId, kind: StateAlteredKind) {
        self.emit(BattleEvent::CombatantAltered { combatant, kind });
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            tracing::trace!(target: "battle::events", event = event.name(), "dispatch");
            for listener in &mut self.listeners {
                listener.on_event(event);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while a dequeued entry is resolving.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn allies(&self) -> &[BattleEntity] {
        &self.allies
    }

    pub fn enemies(&self) -> &[BattleEntity] {
        &self.enemies
    }

    pub fn entity(&self, id: CombatantId) -> Option<&BattleEntity> {
        entity::find(&self.allies, id).or_else(|| entity::find(&self.enemies, id))
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.entity(id).map(BattleEntity::combatant)
    }

    fn entity_mut(&mut self, id: CombatantId) -> Option<&mut BattleEntity> {
        self.allies
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|e| e.id() == id)
    }

    pub fn queued(&self) -> impl Iterator<Item = &BattleSequence> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn selection(&self) -> &PlayerSelection {
        &self.selection
    }

    pub fn statuses(&self) -> &StatusTracker {
        &self.statuses
    }

    pub fn mat(&self) -> &BattleMat {
        &self.mat
    }

    pub fn skills(&self) -> &SkillBook {
        &self.skills
    }

    /// Sum of the enemies' experience reward once the battle is won.
    pub fn experience_reward(&self) -> f32 {
        if self.outcome != BattleOutcome::Won {
            return 0.0;
        }
        self.enemies
            .iter()
            .map(|e| e.combatant().stat(StatKind::ExperienceReward).max(0.0))
            .sum()
    }
}

fn snapshots(pool: &[BattleEntity]) -> Vec<CombatantSnapshot> {
    pool.iter().map(|e| e.combatant().snapshot()).collect()
}
