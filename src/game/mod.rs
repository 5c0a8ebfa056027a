//! Game Logic Module
//!
//! The session state machine. 100% deterministic, no I/O.
//!
//! ## Module Structure
//!
//! - `state`: Session data model, marks, phases, player ids
//! - `rules`: Precondition checks and post-move resolution
//! - `session`: Request handlers (Join, Move, Forfeit, StateQuery)
//! - `events`: Notifications queued by accepted requests
//! - `error`: Rejection reasons

pub mod error;
pub mod events;
pub mod rules;
pub mod session;
pub mod state;

// Re-export key types
pub use error::RejectReason;
pub use events::{GameEvent, GameEventData, Outbox};
pub use rules::MoveResolution;
pub use session::Action;
pub use state::{GamePhase, GameSession, Mark, PlayerId, SessionId, SessionSnapshot};
