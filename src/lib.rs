//! # Tic-Tac-Toe Session Server
//!
//! Authoritative two-player tic-tac-toe sessions behind a concurrent registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TICTAC SERVER                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── bitboard.rs - 9-cell board as a u16 bitmask             │
//! │  └── hash.rs     - Domain-separated SHA-256 hashing          │
//! │                                                              │
//! │  game/           - Session state machine (deterministic)     │
//! │  ├── state.rs    - Session, marks, phases, player ids        │
//! │  ├── rules.rs    - Precondition checks, win/draw resolution  │
//! │  ├── session.rs  - Join / Move / Forfeit / StateQuery        │
//! │  ├── events.rs   - Notifications and the outbox              │
//! │  └── error.rs    - Rejection reasons                         │
//! │                                                              │
//! │  network/        - Concurrency and wire format               │
//! │  ├── protocol.rs - Client/server messages                    │
//! │  ├── registry.rs - Id counter, sessions, mailboxes           │
//! │  └── auth.rs     - JWT identity resolution                   │
//! │                                                              │
//! │  config.rs       - Environment-driven settings               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No clocks, randomness, or I/O
//! - Boards are fixed-width bitmasks; all counters are integers
//! - A rejected request leaves the session byte-for-byte unchanged
//!
//! Given the same request sequence, a session reaches the same state and
//! the same state hash on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use config::ArenaConfig;
pub use core::bitboard::{Bitboard, WIN_MASKS};
pub use game::state::{GamePhase, GameSession, Mark, PlayerId, SessionId, SessionSnapshot};
pub use game::{Action, Outbox, RejectReason};
pub use network::registry::{RegistryError, SessionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
