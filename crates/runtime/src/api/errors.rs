//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the battle core and from worker coordination so
//! clients can bubble them up with consistent context.
use battle_core::BattleError;
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error("battle did not complete within {ticks} ticks")]
    TickLimit { ticks: u64 },

    #[error("invalid runtime configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
