//! State Hashing
//!
//! Deterministic SHA-256 hashing used for:
//! - Session state fingerprints (verifying a rejected request changed nothing)
//! - Session address derivation in the registry

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for session data.
///
/// Wraps SHA-256 with helpers for the fixed-width fields a session holds.
/// Order of updates is significant.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session state.
    pub fn for_session_state() -> Self {
        Self::new(b"TICTAC_SESSION_STATE_V1")
    }

    /// Create hasher for session addresses.
    pub fn for_session_address() -> Self {
        Self::new(b"TICTAC_SESSION_ADDR_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u16 value (little-endian).
    #[inline]
    pub fn update_u16(&mut self, value: u16) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a 16-byte identifier.
    #[inline]
    pub fn update_id(&mut self, id: &[u8; 16]) {
        self.hasher.update(id);
    }

    /// Update with an optional 16-byte identifier.
    ///
    /// A presence byte precedes the id so `None` never collides with any id.
    #[inline]
    pub fn update_optional_id(&mut self, id: Option<&[u8; 16]>) {
        match id {
            Some(id) => {
                self.update_bool(true);
                self.update_id(id);
            }
            None => self.update_bool(false),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}
