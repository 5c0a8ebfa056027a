//! Core deterministic primitives.
//!
//! Nothing in this module touches time, randomness, or I/O.

pub mod bitboard;
pub mod hash;

// Re-export core types
pub use bitboard::{Bitboard, BOARD_MASK, CELL_COUNT, WIN_MASKS};
pub use hash::{StateHash, StateHasher};
