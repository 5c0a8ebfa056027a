//! Rejection reasons.
//!
//! Every variant is detected before any field of the session is written,
//! so a rejected request leaves the session exactly as it was.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Operation not valid in the current phase.
    #[error("operation not allowed in current phase")]
    WrongPhase,

    /// Second seat already taken.
    #[error("session already has a second player")]
    SlotTaken,

    /// Creator tried to join their own session.
    #[error("cannot join your own session")]
    SelfPlay,

    /// Cell index outside 0..=8.
    #[error("position out of range")]
    OutOfRange,

    /// Cell already marked.
    #[error("cell already occupied")]
    CellOccupied,

    /// Mover does not hold the mark whose turn it is.
    #[error("not your turn")]
    NotYourTurn,

    /// Requester is neither player.
    #[error("not a participant in this session")]
    NotAParticipant,
}
