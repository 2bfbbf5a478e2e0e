//! Turn-based battle resolution core.
//!
//! `battle-core` decides who acts, in what order, against which targets and
//! with what numeric outcome. It is synchronous and deterministic for a given
//! seed: the embedder drives it through [`controller::BattleController`] by
//! calling `advance(dt)` once per frame and feeding it player input, and
//! observes the battle through [`events::BattleListener`]s.
//!
//! Stat computation, persistence formats and presentation stay with the
//! embedder; the core only consumes a [`combatant::StatsProvider`] and emits
//! [`events::BattleEvent`]s.
pub mod ai;
pub mod combatant;
pub mod config;
pub mod controller;
pub mod damage;
pub mod entity;
pub mod error;
pub mod events;
pub mod mat;
pub mod party;
pub mod skill;
pub mod status;
pub mod targeting;

pub use ai::{
    AiContext, AiDecision, AiPriority, BattleAi, BattlePredicate, Condition, Conjunction,
    Disjunction, PredicateClause, SkillTree, TargetOrder, TargetPriority,
};
pub use combatant::{
    Combatant, CombatantFlags, CombatantId, CombatantRecord, CombatantSnapshot, HpChange, Side,
    StatKind, StatModifiers, StatSheet, StatsProvider,
};
pub use config::{BattleConfig, MatConfig};
pub use controller::{
    BattleController, BattleInput, BattleOutcome, BattleSequence, BattleState, Direction4,
    PlayerSelection, TransitionKind,
};
pub use damage::calculate_health_delta;
pub use entity::{BattleEntity, BattleRow};
pub use error::{BattleError, ErrorSeverity, Result};
pub use events::{BattleEvent, BattleListener, EventRecorder, StateAlteredKind};
pub use mat::{BattleMat, Placement};
pub use party::Party;
pub use skill::{DamageType, Skill, SkillBook, SkillEffect, SkillId};
pub use status::{
    PersistentStatus, RecurringEffect, StatusChange, StatusId, StatusKind, StatusPhase,
    StatusTemplate, StatusTracker,
};
pub use targeting::{
    BattleActionData, FilterChain, FilterStrategy, NavigationDirection, ParticipantType,
    TargetingStrategy,
};
