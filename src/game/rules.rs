//! Rules
//!
//! Precondition checks (pure reads) and post-move resolution.
//! Each check returns the first failing condition in a fixed order.

use crate::core::bitboard::{Bitboard, CELL_COUNT};
use crate::game::error::RejectReason;
use crate::game::state::{GamePhase, GameSession, Mark, PlayerId};

/// What a freshly applied move did to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResolution {
    /// The mover completed a line.
    Won(Mark),
    /// Ninth cell filled without a line.
    Draw,
    /// Game continues; the payload is the mark to move next.
    Continue(Mark),
}

/// Check a Join request.
///
/// Order: terminal phase, self-join, occupied seat, non-waiting phase.
pub fn check_join(session: &GameSession, requester: &PlayerId) -> Result<(), RejectReason> {
    if session.phase.is_terminal() {
        return Err(RejectReason::WrongPhase);
    }
    if *requester == session.player_x {
        return Err(RejectReason::SelfPlay);
    }
    if session.player_o.is_some() {
        return Err(RejectReason::SlotTaken);
    }
    if session.phase != GamePhase::Waiting {
        return Err(RejectReason::WrongPhase);
    }
    Ok(())
}

/// Check a Move request and return the mover's mark.
///
/// Order: phase, range, occupancy, turn.
pub fn check_move(
    session: &GameSession,
    requester: &PlayerId,
    position: u8,
) -> Result<Mark, RejectReason> {
    if session.phase != GamePhase::Active {
        return Err(RejectReason::WrongPhase);
    }
    if position >= CELL_COUNT {
        return Err(RejectReason::OutOfRange);
    }
    if session.x_board.contains(position) || session.o_board.contains(position) {
        return Err(RejectReason::CellOccupied);
    }
    let mark = session.current_turn;
    if session.player_for(mark).as_ref() != Some(requester) {
        return Err(RejectReason::NotYourTurn);
    }
    Ok(mark)
}

/// Check a Forfeit request and return the forfeiting player's mark.
pub fn check_forfeit(session: &GameSession, requester: &PlayerId) -> Result<Mark, RejectReason> {
    if session.phase != GamePhase::Active {
        return Err(RejectReason::WrongPhase);
    }
    session.mark_of(requester).ok_or(RejectReason::NotAParticipant)
}

/// Resolve the game after `mover` placed a mark.
///
/// Only the mover's board is inspected: cells are exclusive and a move adds
/// one bit to one board, so the opponent's lines cannot change. Win is
/// checked before draw, so a line completed on the ninth cell is a win.
pub fn resolve_move(mover_board: Bitboard, total_moves: u8, mover: Mark) -> MoveResolution {
    if mover_board.covers_any_line() {
        MoveResolution::Won(mover)
    } else if total_moves >= CELL_COUNT {
        MoveResolution::Draw
    } else {
        MoveResolution::Continue(mover.opponent())
    }
}
