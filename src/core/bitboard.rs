//! Nine-Cell Bitboard
//!
//! Occupancy of one mark on the 3x3 grid, packed into the low 9 bits of a `u16`.
//! Cells are indexed left-to-right, top-to-bottom:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! Bits 9..15 are always zero. Every constructor masks with [`BOARD_MASK`]
//! instead of trusting the caller.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Number of cells on the board.
pub const CELL_COUNT: u8 = 9;

/// Mask of the nine valid cell bits.
pub const BOARD_MASK: u16 = 0x01FF;

/// The 8 winning triples as bitmasks: rows, columns, diagonals.
pub const WIN_MASKS: [u16; 8] = [
    0b000_000_111, // {0,1,2}
    0b000_111_000, // {3,4,5}
    0b111_000_000, // {6,7,8}
    0b001_001_001, // {0,3,6}
    0b010_010_010, // {1,4,7}
    0b100_100_100, // {2,5,8}
    0b100_010_001, // {0,4,8}
    0b001_010_100, // {2,4,6}
];

/// Set of cells occupied by one mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bitboard(u16);

impl Bitboard {
    /// Empty board.
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Every cell occupied.
    pub const FULL: Bitboard = Bitboard(BOARD_MASK);

    /// Create from raw bits. Bits above cell 8 are discarded.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Bitboard(bits & BOARD_MASK)
    }

    /// Raw bits (low 9 bits only).
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Bit for a single cell, or `None` if `cell` is off the board.
    #[inline]
    pub const fn cell_bit(cell: u8) -> Option<u16> {
        if cell < CELL_COUNT {
            Some(1u16 << cell)
        } else {
            None
        }
    }

    /// Check whether `cell` is set. Off-board cells are never set.
    #[inline]
    pub const fn contains(self, cell: u8) -> bool {
        match Self::cell_bit(cell) {
            Some(bit) => self.0 & bit != 0,
            None => false,
        }
    }

    /// Return a copy with `cell` set. Off-board cells leave the board unchanged.
    #[inline]
    #[must_use]
    pub const fn with(self, cell: u8) -> Self {
        match Self::cell_bit(cell) {
            Some(bit) => Bitboard((self.0 | bit) & BOARD_MASK),
            None => self,
        }
    }

    /// Number of occupied cells.
    #[inline]
    pub const fn popcount(self) -> u32 {
        self.0.count_ones()
    }

    /// True if no cell is occupied.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two boards.
    #[inline]
    pub const fn union(self, other: Bitboard) -> Bitboard {
        Bitboard(self.0 | other.0)
    }

    /// True if the two boards share any cell.
    #[inline]
    pub const fn overlaps(self, other: Bitboard) -> bool {
        self.0 & other.0 != 0
    }

    /// First winning triple fully covered by this board.
    ///
    /// Scans [`WIN_MASKS`] in order and stops at the first hit, so a move
    /// completing two lines at once reports only one of them.
    pub fn winning_line(self) -> Option<u16> {
        WIN_MASKS.iter().copied().find(|&mask| self.0 & mask == mask)
    }

    /// True if any winning triple is fully covered.
    #[inline]
    pub fn covers_any_line(self) -> bool {
        self.winning_line().is_some()
    }

    /// Iterate occupied cells in ascending order.
    pub fn cells(self) -> impl Iterator<Item = u8> {
        (0..CELL_COUNT).filter(move |&cell| self.contains(cell))
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:09b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_masks_high_bits() {
        let board = Bitboard::from_bits(0xFFFF);
        assert_eq!(board.bits(), BOARD_MASK);
        assert_eq!(board, Bitboard::FULL);
    }

    #[test]
    fn test_with_out_of_range_is_noop() {
        let board = Bitboard::EMPTY.with(9);
        assert!(board.is_empty());
        assert!(!board.contains(9));
        assert!(!board.contains(200));
    }

    #[test]
    fn test_with_sets_single_cell() {
        let board = Bitboard::EMPTY.with(0).with(8);
        assert_eq!(board.bits(), 257);
        assert_eq!(board.popcount(), 2);
        assert_eq!(board.cells().collect::<Vec<_>>(), vec![0, 8]);
    }

    #[test]
    fn test_every_win_mask_has_three_cells() {
        for mask in WIN_MASKS {
            assert_eq!(mask.count_ones(), 3);
            assert_eq!(mask & !BOARD_MASK, 0);
        }
    }

    #[test]
    fn test_win_masks_match_cell_triples() {
        let triples: [[u8; 3]; 8] = [
            [0, 1, 2], [3, 4, 5], [6, 7, 8],
            [0, 3, 6], [1, 4, 7], [2, 5, 8],
            [0, 4, 8], [2, 4, 6],
        ];
        for (mask, [a, b, c]) in WIN_MASKS.iter().zip(triples) {
            let board = Bitboard::EMPTY.with(a).with(b).with(c);
            assert_eq!(board.bits(), *mask);
        }
    }

    #[test]
    fn test_diagonal_detected() {
        let board = Bitboard::from_bits(273);
        assert_eq!(board.winning_line(), Some(0b100_010_001));
    }

    #[test]
    fn test_double_line_reports_first() {
        // Top row and left column share cell 0.
        let board = Bitboard::EMPTY.with(0).with(1).with(2).with(3).with(6);
        assert_eq!(board.winning_line(), Some(WIN_MASKS[0]));
    }

    #[test]
    fn test_no_line_on_scattered_cells() {
        let board = Bitboard::EMPTY.with(0).with(2).with(3).with(7).with(8);
        assert!(!board.covers_any_line());
    }

    #[test]
    fn test_overlap_and_union() {
        let a = Bitboard::EMPTY.with(1);
        let b = Bitboard::EMPTY.with(2);
        assert!(!a.overlaps(b));
        assert!(a.union(b).overlaps(b));
    }
}
