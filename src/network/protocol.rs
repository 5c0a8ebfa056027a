//! Protocol Messages
//!
//! Wire shapes for requests into a session and notifications out of it.
//! Tagged enums are serialized as JSON; the flat payload structs also have
//! a compact binary (bincode) form.
//!
//! Boards travel as the low 9 bits of a `u16`; phase and turn as `u8` codes.

use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;

use crate::game::error::RejectReason;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::session::Action;
use crate::game::state::SessionId;

// =============================================================================
// CLIENT -> SESSION MESSAGES
// =============================================================================

/// Requests addressed to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take the second seat.
    Join(JoinRequest),

    /// Place a mark.
    Move(MoveRequest),

    /// Concede the game.
    Forfeit(ForfeitRequest),

    /// Ask for the full session state.
    StateQuery(StateQueryRequest),
}

/// Join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Target session.
    pub session_id: u32,
}

/// Move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Target session.
    pub session_id: u32,
    /// Cell index (0-8).
    pub position: u8,
}

/// Forfeit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForfeitRequest {
    /// Target session.
    pub session_id: u32,
}

/// State query request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateQueryRequest {
    /// Target session.
    pub session_id: u32,
    /// Echoed in the response.
    pub correlation_id: u64,
}

impl ClientMessage {
    /// Session the request is addressed to.
    pub fn session_id(&self) -> SessionId {
        match self {
            ClientMessage::Join(req) => req.session_id,
            ClientMessage::Move(req) => req.session_id,
            ClientMessage::Forfeit(req) => req.session_id,
            ClientMessage::StateQuery(req) => req.session_id,
        }
    }

    /// Convert to a state machine action.
    pub fn to_action(&self) -> Action {
        match self {
            ClientMessage::Join(_) => Action::Join,
            ClientMessage::Move(req) => Action::Move { position: req.position },
            ClientMessage::Forfeit(_) => Action::Forfeit,
            ClientMessage::StateQuery(req) => Action::StateQuery {
                correlation_id: req.correlation_id,
            },
        }
    }
}

// =============================================================================
// SESSION -> CLIENT MESSAGES
// =============================================================================

/// Notifications sent to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Second player joined.
    PlayerJoined(PlayerJoined),

    /// A move was applied.
    MoveMade(MoveMade),

    /// Session reached a terminal phase.
    GameEnded(GameEnded),

    /// Answer to a state query.
    StateResponse(StateResponse),

    /// Request was refused.
    Error(ServerError),
}

/// Player joined notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoined {
    /// Session identifier.
    pub session_id: u32,
    /// Joining player.
    pub player: [u8; 16],
}

/// Move notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMade {
    /// Session identifier.
    pub session_id: u32,
    /// Mover.
    pub player: [u8; 16],
    /// Cell that was marked.
    pub position: u8,
    /// X's cells after the move.
    pub x_board: u16,
    /// O's cells after the move.
    pub o_board: u16,
}

/// Game over notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnded {
    /// Session identifier.
    pub session_id: u32,
    /// Winner (None if draw).
    pub winner: Option<[u8; 16]>,
    /// Terminal phase code.
    pub state: u8,
}

/// Full session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    /// Copied from the query.
    pub correlation_id: u64,
    /// Session identifier.
    pub session_id: u32,
    /// Phase code.
    pub state: u8,
    /// Creator.
    pub player_x: [u8; 16],
    /// Joiner, if any.
    pub player_o: Option<[u8; 16]>,
    /// Mark to move (0 = X, 1 = O).
    pub current_turn: u8,
    /// Cells filled.
    pub total_moves: u8,
    /// Winner, if won.
    pub winner: Option<[u8; 16]>,
    /// X's cells.
    pub x_board: u16,
    /// O's cells.
    pub o_board: u16,
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Operation not valid in the current phase.
    WrongPhase,
    /// Second seat taken.
    SlotTaken,
    /// Creator joining own session.
    SelfPlay,
    /// Cell index outside 0..=8.
    OutOfRange,
    /// Cell already marked.
    CellOccupied,
    /// Move out of turn.
    NotYourTurn,
    /// Requester not seated in the session.
    NotAParticipant,
    /// No session with that id.
    SessionNotFound,
    /// Identity could not be resolved.
    NotAuthenticated,
    /// Internal error.
    InternalError,
}

impl From<RejectReason> for ErrorCode {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::WrongPhase => ErrorCode::WrongPhase,
            RejectReason::SlotTaken => ErrorCode::SlotTaken,
            RejectReason::SelfPlay => ErrorCode::SelfPlay,
            RejectReason::OutOfRange => ErrorCode::OutOfRange,
            RejectReason::CellOccupied => ErrorCode::CellOccupied,
            RejectReason::NotYourTurn => ErrorCode::NotYourTurn,
            RejectReason::NotAParticipant => ErrorCode::NotAParticipant,
        }
    }
}

impl From<&GameEvent> for ServerMessage {
    fn from(event: &GameEvent) -> Self {
        let session_id = event.session_id;
        match &event.data {
            GameEventData::PlayerJoined { player } => ServerMessage::PlayerJoined(PlayerJoined {
                session_id,
                player: *player.as_bytes(),
            }),
            GameEventData::MoveMade { player, position, x_board, o_board } => {
                ServerMessage::MoveMade(MoveMade {
                    session_id,
                    player: *player.as_bytes(),
                    position: *position,
                    x_board: x_board.bits(),
                    o_board: o_board.bits(),
                })
            }
            GameEventData::GameEnded { winner, phase } => ServerMessage::GameEnded(GameEnded {
                session_id,
                winner: winner.map(|w| *w.as_bytes()),
                state: phase.code(),
            }),
            GameEventData::StateResponse { correlation_id, snapshot } => {
                ServerMessage::StateResponse(StateResponse {
                    correlation_id: *correlation_id,
                    session_id: snapshot.session_id,
                    state: snapshot.phase.code(),
                    player_x: *snapshot.player_x.as_bytes(),
                    player_o: snapshot.player_o.map(|p| *p.as_bytes()),
                    current_turn: snapshot.current_turn.code(),
                    total_moves: snapshot.total_moves,
                    winner: snapshot.winner.map(|w| *w.as_bytes()),
                    x_board: snapshot.x_board.bits(),
                    o_board: snapshot.o_board.bits(),
                })
            }
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Encode a flat payload struct to binary.
///
/// Tagged enums (`#[serde(tag = "type")]`) are not supported by bincode;
/// use JSON for `ClientMessage`/`ServerMessage`.
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(payload)
}

/// Decode a flat payload struct from binary.
pub fn decode_payload<T: DeserializeOwned>(data: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(data)
}
