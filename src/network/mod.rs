//! Network Layer
//!
//! Message schema, identity resolution and the session registry.
//! This layer is **non-deterministic** (concurrency, mailboxes, clocks for
//! token expiry); all game rules run through `game/`.

pub mod auth;
pub mod protocol;
pub mod registry;

pub use auth::{resolve_identity, validate_token, AuthConfig, AuthError, TokenClaims};
pub use protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
pub use registry::{
    derive_session_address, Dispatched, RegistryError, SessionAddress, SessionCounter,
    SessionRegistry,
};
