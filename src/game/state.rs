//! Game Session State
//!
//! The data model for one match: phase, both bitboards, both players,
//! turn and move counters. Mutation happens only through the handlers in
//! `game::session`, which check every precondition before touching a field.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::bitboard::{Bitboard, CELL_COUNT};
use crate::core::hash::{StateHash, StateHasher};

/// Session identifier assigned by the registry (starts at 1).
pub type SessionId = u32;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Opaque player identity (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random identity.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

// =============================================================================
// MARK
// =============================================================================

/// The two marks. X always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Mark {
    /// Creator's mark
    #[default]
    X = 0,
    /// Joiner's mark
    O = 1,
}

impl Mark {
    /// The other mark.
    #[inline]
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Terminal phase in which this mark has won.
    #[inline]
    pub fn won_phase(self) -> GamePhase {
        match self {
            Mark::X => GamePhase::XWon,
            Mark::O => GamePhase::OWon,
        }
    }

    /// Wire code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Option<Mark> {
        match code {
            0 => Some(Mark::X),
            1 => Some(Mark::O),
            _ => None,
        }
    }
}

// =============================================================================
// GAME PHASE
// =============================================================================

/// Session phase.
///
/// Transitions only move forward: `Waiting -> Active -> {XWon | OWon | Draw}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum GamePhase {
    /// Created, waiting for a second player
    #[default]
    Waiting = 0,
    /// Both players present, moves accepted
    Active = 1,
    /// X completed a line or O forfeited
    XWon = 2,
    /// O completed a line or X forfeited
    OWon = 3,
    /// Board filled with no line
    Draw = 4,
}

impl GamePhase {
    /// True for XWon, OWon and Draw.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::XWon | GamePhase::OWon | GamePhase::Draw)
    }

    /// Winning mark, if this is a won phase.
    #[inline]
    pub fn winning_mark(self) -> Option<Mark> {
        match self {
            GamePhase::XWon => Some(Mark::X),
            GamePhase::OWon => Some(Mark::O),
            _ => None,
        }
    }

    /// Wire code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Option<GamePhase> {
        match code {
            0 => Some(GamePhase::Waiting),
            1 => Some(GamePhase::Active),
            2 => Some(GamePhase::XWon),
            3 => Some(GamePhase::OWon),
            4 => Some(GamePhase::Draw),
            _ => None,
        }
    }
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// One match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub(crate) id: SessionId,
    pub(crate) phase: GamePhase,
    pub(crate) x_board: Bitboard,
    pub(crate) o_board: Bitboard,
    pub(crate) player_x: PlayerId,
    pub(crate) player_o: Option<PlayerId>,
    pub(crate) current_turn: Mark,
    pub(crate) total_moves: u8,
    pub(crate) winner: Option<PlayerId>,
}

impl GameSession {
    /// Create a session in `Waiting` with the creator playing X.
    pub fn new(id: SessionId, creator: PlayerId) -> Self {
        Self {
            id,
            phase: GamePhase::Waiting,
            x_board: Bitboard::EMPTY,
            o_board: Bitboard::EMPTY,
            player_x: creator,
            player_o: None,
            current_turn: Mark::X,
            total_moves: 0,
            winner: None,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Cells held by X.
    pub fn x_board(&self) -> Bitboard {
        self.x_board
    }

    /// Cells held by O.
    pub fn o_board(&self) -> Bitboard {
        self.o_board
    }

    /// The creator.
    pub fn player_x(&self) -> PlayerId {
        self.player_x
    }

    /// The joiner, once one has joined.
    pub fn player_o(&self) -> Option<PlayerId> {
        self.player_o
    }

    /// Whose move is next. Meaningful only while `Active`.
    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    /// Cells filled so far.
    pub fn total_moves(&self) -> u8 {
        self.total_moves
    }

    /// Winner, set only in `XWon` / `OWon`.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Board of the given mark.
    pub fn board(&self, mark: Mark) -> Bitboard {
        match mark {
            Mark::X => self.x_board,
            Mark::O => self.o_board,
        }
    }

    /// Cells held by either mark.
    pub fn occupied(&self) -> Bitboard {
        self.x_board.union(self.o_board)
    }

    /// Mark at a cell.
    pub fn cell(&self, position: u8) -> Option<Mark> {
        if self.x_board.contains(position) {
            Some(Mark::X)
        } else if self.o_board.contains(position) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Player holding a mark.
    pub fn player_for(&self, mark: Mark) -> Option<PlayerId> {
        match mark {
            Mark::X => Some(self.player_x),
            Mark::O => self.player_o,
        }
    }

    /// Mark held by a player, if they take part in this session.
    pub fn mark_of(&self, player: &PlayerId) -> Option<Mark> {
        if *player == self.player_x {
            Some(Mark::X)
        } else if self.player_o.as_ref() == Some(player) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Player expected to move next, while the game is running.
    pub fn next_player(&self) -> Option<PlayerId> {
        if self.phase == GamePhase::Active {
            self.player_for(self.current_turn)
        } else {
            None
        }
    }

    /// True once the session reached a terminal phase.
    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True when all nine cells are taken.
    pub fn is_board_filled(&self) -> bool {
        self.total_moves == CELL_COUNT
    }

    /// Empty cells, ascending.
    pub fn valid_moves(&self) -> Vec<u8> {
        let occupied = self.occupied();
        (0..CELL_COUNT).filter(|&cell| !occupied.contains(cell)).collect()
    }

    /// Check every data-model invariant.
    pub fn invariants_hold(&self) -> bool {
        let disjoint = !self.x_board.overlaps(self.o_board);
        let counted = self.x_board.popcount() + self.o_board.popcount()
            == u32::from(self.total_moves);
        let bounded = self.total_moves <= CELL_COUNT;
        let winner_iff_won = self.winner.is_some() == self.phase.winning_mark().is_some();
        let winner_matches = match self.phase.winning_mark() {
            Some(mark) => self.winner == self.player_for(mark),
            None => true,
        };
        let distinct_players = self.player_o != Some(self.player_x);
        let joined_once_active = self.phase == GamePhase::Waiting || self.player_o.is_some();

        disjoint
            && counted
            && bounded
            && winner_iff_won
            && winner_matches
            && distinct_players
            && joined_once_active
    }

    /// Read-only view of every field.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            player_x: self.player_x,
            player_o: self.player_o,
            current_turn: self.current_turn,
            total_moves: self.total_moves,
            winner: self.winner,
            x_board: self.x_board,
            o_board: self.o_board,
        }
    }

    /// Fingerprint over every field.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_session_state();
        hasher.update_u32(self.id);
        hasher.update_u8(self.phase.code());
        hasher.update_u16(self.x_board.bits());
        hasher.update_u16(self.o_board.bits());
        hasher.update_id(self.player_x.as_bytes());
        hasher.update_optional_id(self.player_o.as_ref().map(PlayerId::as_bytes));
        hasher.update_u8(self.current_turn.code());
        hasher.update_u8(self.total_moves);
        hasher.update_optional_id(self.winner.as_ref().map(PlayerId::as_bytes));
        hasher.finalize()
    }
}

impl fmt::Display for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3u8 {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            for col in 0..3u8 {
                if col > 0 {
                    write!(f, "|")?;
                }
                let cell = row * 3 + col;
                match self.cell(cell) {
                    Some(Mark::X) => write!(f, " X ")?,
                    Some(Mark::O) => write!(f, " O ")?,
                    None => write!(f, " {} ", cell)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Copy of a session's fields, as returned by a state query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: SessionId,
    /// Phase at query time.
    pub phase: GamePhase,
    /// Creator.
    pub player_x: PlayerId,
    /// Joiner, if any.
    pub player_o: Option<PlayerId>,
    /// Whose move is next.
    pub current_turn: Mark,
    /// Cells filled.
    pub total_moves: u8,
    /// Winner, if won.
    pub winner: Option<PlayerId>,
    /// X's cells.
    pub x_board: Bitboard,
    /// O's cells.
    pub o_board: Bitboard,
}
