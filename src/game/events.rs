//! Game Events
//!
//! Notifications produced by accepted requests. Each event names one
//! recipient; a handler that notifies both players pushes two events.
//! Delivery is the caller's business and never feeds back into the session.

use serde::{Serialize, Deserialize};

use crate::core::bitboard::Bitboard;
use crate::game::state::{GamePhase, PlayerId, SessionId, SessionSnapshot};

/// Notification payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Second player took the O seat
    PlayerJoined {
        player: PlayerId,
    },

    /// A mark was placed
    MoveMade {
        player: PlayerId,
        position: u8,
        x_board: Bitboard,
        o_board: Bitboard,
    },

    /// Session reached a terminal phase
    GameEnded {
        winner: Option<PlayerId>,
        phase: GamePhase,
    },

    /// Answer to a state query
    StateResponse {
        correlation_id: u64,
        snapshot: SessionSnapshot,
    },
}

/// A notification addressed to one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Session that produced the event
    pub session_id: SessionId,

    /// Who should receive it
    pub recipient: PlayerId,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(session_id: SessionId, recipient: PlayerId, data: GameEventData) -> Self {
        Self {
            session_id,
            recipient,
            data,
        }
    }

    /// Create player joined event.
    pub fn player_joined(session_id: SessionId, player: PlayerId) -> Self {
        Self::new(session_id, player, GameEventData::PlayerJoined { player })
    }

    /// Create move made event, addressed to the mover.
    pub fn move_made(
        session_id: SessionId,
        player: PlayerId,
        position: u8,
        x_board: Bitboard,
        o_board: Bitboard,
    ) -> Self {
        Self::new(
            session_id,
            player,
            GameEventData::MoveMade {
                player,
                position,
                x_board,
                o_board,
            },
        )
    }

    /// Create game ended event for one recipient.
    pub fn game_ended(
        session_id: SessionId,
        recipient: PlayerId,
        winner: Option<PlayerId>,
        phase: GamePhase,
    ) -> Self {
        Self::new(session_id, recipient, GameEventData::GameEnded { winner, phase })
    }

    /// Create state response event.
    pub fn state_response(
        recipient: PlayerId,
        correlation_id: u64,
        snapshot: SessionSnapshot,
    ) -> Self {
        Self::new(
            snapshot.session_id,
            recipient,
            GameEventData::StateResponse {
                correlation_id,
                snapshot,
            },
        )
    }
}

/// Ordered list of notifications produced by one or more requests.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    events: Vec<GameEvent>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Queued events in emission order.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every queued event, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
