//! Session State Machine
//!
//! One handler per request kind. A handler reads the session, validates
//! through `game::rules`, and only then mutates and queues notifications.
//! Callers must serialize access to a session (`&mut self` enforces this
//! within a thread; the registry wraps each session in a mutex).

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::game::error::RejectReason;
use crate::game::events::{GameEvent, Outbox};
use crate::game::rules::{self, MoveResolution};
use crate::game::state::{GamePhase, GameSession, Mark, PlayerId};

/// Requests a session understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Take the O seat.
    Join,
    /// Place the current mark on a cell.
    Move {
        /// Cell index, 0..=8.
        position: u8,
    },
    /// Concede to the opponent.
    Forfeit,
    /// Read the whole state.
    StateQuery {
        /// Echoed back in the response.
        correlation_id: u64,
    },
}

impl GameSession {
    /// Dispatch an action to its handler.
    ///
    /// Returns the phase after the action. On `Err` the session and the
    /// outbox are untouched.
    pub fn apply(
        &mut self,
        requester: PlayerId,
        action: Action,
        outbox: &mut Outbox,
    ) -> Result<GamePhase, RejectReason> {
        let result = match action {
            Action::Join => self.join(requester, outbox),
            Action::Move { position } => self.make_move(requester, position, outbox),
            Action::Forfeit => self.forfeit(requester, outbox),
            Action::StateQuery { correlation_id } => {
                self.query(requester, correlation_id, outbox);
                Ok(())
            }
        };

        if let Err(reason) = result {
            debug!(
                session_id = self.id,
                requester = %requester.short(),
                ?action,
                %reason,
                "Request rejected"
            );
        }
        debug_assert!(self.invariants_hold());

        result.map(|()| self.phase)
    }

    /// Seat `requester` as O and start the game.
    pub fn join(&mut self, requester: PlayerId, outbox: &mut Outbox) -> Result<(), RejectReason> {
        rules::check_join(self, &requester)?;

        self.player_o = Some(requester);
        self.phase = GamePhase::Active;

        info!(session_id = self.id, player = %requester.short(), "Player joined as O");
        outbox.push(GameEvent::player_joined(self.id, requester));
        Ok(())
    }

    /// Place the current mark at `position`.
    pub fn make_move(
        &mut self,
        requester: PlayerId,
        position: u8,
        outbox: &mut Outbox,
    ) -> Result<(), RejectReason> {
        let mark = rules::check_move(self, &requester, position)?;

        let board = self.board(mark).with(position);
        match mark {
            Mark::X => self.x_board = board,
            Mark::O => self.o_board = board,
        }
        self.total_moves += 1;

        debug!(
            session_id = self.id,
            player = %requester.short(),
            ?mark,
            position,
            total_moves = self.total_moves,
            "Move applied"
        );
        outbox.push(GameEvent::move_made(
            self.id,
            requester,
            position,
            self.x_board,
            self.o_board,
        ));

        match rules::resolve_move(board, self.total_moves, mark) {
            MoveResolution::Won(winner) => self.finish(winner.won_phase(), outbox),
            MoveResolution::Draw => self.finish(GamePhase::Draw, outbox),
            MoveResolution::Continue(next) => self.current_turn = next,
        }
        Ok(())
    }

    /// Concede; the opponent wins.
    pub fn forfeit(&mut self, requester: PlayerId, outbox: &mut Outbox) -> Result<(), RejectReason> {
        let mark = rules::check_forfeit(self, &requester)?;

        info!(session_id = self.id, player = %requester.short(), ?mark, "Player forfeited");
        self.finish(mark.opponent().won_phase(), outbox);
        Ok(())
    }

    /// Queue a full snapshot for `requester`. Never rejected.
    pub fn query(&self, requester: PlayerId, correlation_id: u64, outbox: &mut Outbox) {
        outbox.push(GameEvent::state_response(requester, correlation_id, self.snapshot()));
    }

    /// Enter a terminal phase and notify both seats.
    fn finish(&mut self, phase: GamePhase, outbox: &mut Outbox) {
        self.phase = phase;
        self.winner = phase.winning_mark().and_then(|mark| self.player_for(mark));

        info!(
            session_id = self.id,
            ?phase,
            winner = ?self.winner.map(|w| w.short()),
            total_moves = self.total_moves,
            "Game ended"
        );

        outbox.push(GameEvent::game_ended(self.id, self.player_x, self.winner, phase));
        if let Some(player_o) = self.player_o {
            outbox.push(GameEvent::game_ended(self.id, player_o, self.winner, phase));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use rand::{rngs::StdRng, SeedableRng};

    fn alice() -> PlayerId {
        PlayerId::new([1; 16])
    }

    fn bob() -> PlayerId {
        PlayerId::new([2; 16])
    }

    fn carol() -> PlayerId {
        PlayerId::new([3; 16])
    }

    fn joined_session() -> GameSession {
        let mut session = GameSession::new(1, alice());
        let mut outbox = Outbox::new();
        session.apply(bob(), Action::Join, &mut outbox).unwrap();
        session
    }

    /// Play alternating moves starting with X; panics on rejection.
    fn play(session: &mut GameSession, cells: &[u8]) -> Outbox {
        let mut outbox = Outbox::new();
        for &cell in cells {
            let player = session.next_player().expect("game still running");
            session
                .apply(player, Action::Move { position: cell }, &mut outbox)
                .unwrap();
        }
        outbox
    }

    /// Apply and assert the session is untouched on rejection.
    fn assert_rejected(session: &mut GameSession, requester: PlayerId, action: Action, reason: RejectReason) {
        let before = session.clone();
        let hash_before = session.compute_hash();
        let mut outbox = Outbox::new();

        assert_eq!(session.apply(requester, action, &mut outbox), Err(reason));
        assert_eq!(*session, before);
        assert_eq!(session.compute_hash(), hash_before);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_join_activates_and_notifies_joiner() {
        let mut session = GameSession::new(1, alice());
        let mut outbox = Outbox::new();

        let phase = session.apply(bob(), Action::Join, &mut outbox).unwrap();
        assert_eq!(phase, GamePhase::Active);
        assert_eq!(session.player_o(), Some(bob()));
        assert_eq!(outbox.events(), &[GameEvent::player_joined(1, bob())]);
    }

    #[test]
    fn test_self_play_rejected_in_any_seat_state() {
        let mut waiting = GameSession::new(1, alice());
        assert_rejected(&mut waiting, alice(), Action::Join, RejectReason::SelfPlay);

        let mut active = joined_session();
        assert_rejected(&mut active, alice(), Action::Join, RejectReason::SelfPlay);
    }

    #[test]
    fn test_third_player_slot_taken() {
        let mut session = joined_session();
        assert_rejected(&mut session, carol(), Action::Join, RejectReason::SlotTaken);
    }

    #[test]
    fn test_move_while_waiting_wrong_phase() {
        let mut session = GameSession::new(1, alice());
        assert_rejected(&mut session, alice(), Action::Move { position: 0 }, RejectReason::WrongPhase);
    }

    #[test]
    fn test_each_move_precondition_maps_to_reason() {
        let mut session = joined_session();
        assert_rejected(&mut session, alice(), Action::Move { position: 9 }, RejectReason::OutOfRange);
        assert_rejected(&mut session, alice(), Action::Move { position: 255 }, RejectReason::OutOfRange);
        assert_rejected(&mut session, bob(), Action::Move { position: 0 }, RejectReason::NotYourTurn);
        assert_rejected(&mut session, carol(), Action::Move { position: 0 }, RejectReason::NotYourTurn);

        play(&mut session, &[0]);
        assert_rejected(&mut session, bob(), Action::Move { position: 0 }, RejectReason::CellOccupied);
        assert_rejected(&mut session, alice(), Action::Move { position: 1 }, RejectReason::NotYourTurn);
        assert_eq!(session.current_turn(), Mark::O);
    }

    #[test]
    fn test_scenario_a_three_moves() {
        let mut session = joined_session();
        let outbox = play(&mut session, &[0, 4, 8]);

        assert_eq!(session.x_board().bits(), 257);
        assert_eq!(session.o_board().bits(), 16);
        assert_eq!(session.total_moves(), 3);
        assert_eq!(session.phase(), GamePhase::Active);
        assert_eq!(session.current_turn(), Mark::O);
        assert_eq!(outbox.len(), 3);

        let last = &outbox.events()[2];
        assert_eq!(last.recipient, alice());
        assert_eq!(
            last.data,
            GameEventData::MoveMade {
                player: alice(),
                position: 8,
                x_board: session.x_board(),
                o_board: session.o_board(),
            }
        );
    }

    #[test]
    fn test_scenario_b_diagonal_win() {
        let mut session = joined_session();
        let outbox = play(&mut session, &[0, 1, 4, 2, 8]);

        assert_eq!(session.phase(), GamePhase::XWon);
        assert_eq!(session.winner(), Some(alice()));
        assert_eq!(session.x_board().bits(), 273);
        assert!(session.invariants_hold());

        // Five MoveMade, then GameEnded to X and O.
        assert_eq!(outbox.len(), 7);
        let ended: Vec<_> = outbox.events()[5..].iter().map(|e| e.recipient).collect();
        assert_eq!(ended, vec![alice(), bob()]);
        for event in &outbox.events()[5..] {
            assert_eq!(
                event.data,
                GameEventData::GameEnded { winner: Some(alice()), phase: GamePhase::XWon }
            );
        }
    }

    #[test]
    fn test_o_can_win() {
        let mut session = joined_session();
        play(&mut session, &[0, 3, 1, 4, 8, 5]);
        assert_eq!(session.phase(), GamePhase::OWon);
        assert_eq!(session.winner(), Some(bob()));
    }

    #[test]
    fn test_scenario_c_draw() {
        let mut session = joined_session();
        let outbox = play(&mut session, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);

        assert_eq!(session.phase(), GamePhase::Draw);
        assert_eq!(session.winner(), None);
        assert_eq!(session.total_moves(), 9);
        assert!(session.is_board_filled());
        assert!(session.valid_moves().is_empty());

        let last = outbox.events().last().unwrap();
        assert_eq!(last.data, GameEventData::GameEnded { winner: None, phase: GamePhase::Draw });
    }

    #[test]
    fn test_win_on_ninth_move_is_not_draw() {
        let mut session = joined_session();
        // X: 0,2,4,5,8 (diagonal on last move); O: 1,3,6,7
        play(&mut session, &[0, 1, 2, 3, 5, 6, 4, 7, 8]);
        assert_eq!(session.total_moves(), 9);
        assert_eq!(session.phase(), GamePhase::XWon);
    }

    #[test]
    fn test_scenario_d_forfeit_by_x() {
        let mut session = joined_session();
        let mut outbox = Outbox::new();

        let phase = session.apply(alice(), Action::Forfeit, &mut outbox).unwrap();
        assert_eq!(phase, GamePhase::OWon);
        assert_eq!(session.winner(), Some(bob()));
        assert_eq!(outbox.len(), 2);
    }

    #[test]
    fn test_scenario_d_forfeit_by_o() {
        let mut session = joined_session();
        play(&mut session, &[4]);
        let mut outbox = Outbox::new();

        let phase = session.apply(bob(), Action::Forfeit, &mut outbox).unwrap();
        assert_eq!(phase, GamePhase::XWon);
        assert_eq!(session.winner(), Some(alice()));
    }

    #[test]
    fn test_forfeit_rejections() {
        let mut waiting = GameSession::new(1, alice());
        assert_rejected(&mut waiting, alice(), Action::Forfeit, RejectReason::WrongPhase);

        let mut active = joined_session();
        assert_rejected(&mut active, carol(), Action::Forfeit, RejectReason::NotAParticipant);
    }

    #[test]
    fn test_terminal_session_frozen() {
        let mut won = joined_session();
        play(&mut won, &[0, 1, 4, 2, 8]);

        let mut drawn = joined_session();
        play(&mut drawn, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);

        let mut forfeited = joined_session();
        forfeited.apply(bob(), Action::Forfeit, &mut Outbox::new()).unwrap();

        for session in [&mut won, &mut drawn, &mut forfeited] {
            for player in [alice(), bob(), carol()] {
                assert_rejected(session, player, Action::Move { position: 5 }, RejectReason::WrongPhase);
                assert_rejected(session, player, Action::Forfeit, RejectReason::WrongPhase);
                assert_rejected(session, player, Action::Join, RejectReason::WrongPhase);
            }

            let mut outbox = Outbox::new();
            let phase = session
                .apply(carol(), Action::StateQuery { correlation_id: 77 }, &mut outbox)
                .unwrap();
            assert_eq!(phase, session.phase());
            assert_eq!(
                outbox.events(),
                &[GameEvent::state_response(carol(), 77, session.snapshot())]
            );
        }
    }

    #[test]
    fn test_query_allowed_while_waiting() {
        let mut session = GameSession::new(5, alice());
        let before = session.clone();
        let mut outbox = Outbox::new();

        session.apply(carol(), Action::StateQuery { correlation_id: 1 }, &mut outbox).unwrap();
        assert_eq!(session, before);

        match &outbox.events()[0].data {
            GameEventData::StateResponse { correlation_id, snapshot } => {
                assert_eq!(*correlation_id, 1);
                assert_eq!(snapshot.session_id, 5);
                assert_eq!(snapshot.phase, GamePhase::Waiting);
                assert_eq!(snapshot.player_o, None);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_random_playouts_terminate_consistently() {
        let mut rng = StdRng::seed_from_u64(0x7AC7AC);

        for _ in 0..200 {
            let mut session = joined_session();
            let mut outbox = Outbox::new();
            while let Some(player) = session.next_player() {
                let cell = *session.valid_moves().choose(&mut rng).unwrap();
                session.apply(player, Action::Move { position: cell }, &mut outbox).unwrap();
                assert!(session.invariants_hold());
            }
            assert!(session.is_ended());
            match session.phase() {
                GamePhase::XWon => assert!(session.x_board().covers_any_line()),
                GamePhase::OWon => assert!(session.o_board().covers_any_line()),
                GamePhase::Draw => assert_eq!(session.total_moves(), 9),
                other => panic!("non-terminal phase {:?}", other),
            }
        }
    }

    #[test]
    fn test_game_ended_skips_missing_second_seat() {
        let mut session = GameSession::new(1, alice());
        let mut outbox = Outbox::new();

        session.finish(GamePhase::XWon, &mut outbox);

        assert_eq!(session.winner(), Some(alice()));
        assert_eq!(
            outbox.events(),
            &[GameEvent::game_ended(1, alice(), Some(alice()), GamePhase::XWon)]
        );
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_for_any_request_stream(
            requests in proptest::collection::vec((0u8..3, 0u8..12, 0u8..4), 0..40)
        ) {
            let players = [alice(), bob(), carol()];
            let mut session = GameSession::new(1, alice());
            let mut outbox = Outbox::new();

            for (who, position, kind) in requests {
                let requester = players[who as usize];
                let action = match kind {
                    0 => Action::Join,
                    1 | 2 => Action::Move { position },
                    _ => Action::Forfeit,
                };

                let before = session.clone();
                match session.apply(requester, action, &mut outbox) {
                    Ok(_) => {
                        if let Action::Move { .. } = action {
                            prop_assert_eq!(session.total_moves(), before.total_moves() + 1);
                            if session.phase() == GamePhase::Active {
                                prop_assert_eq!(session.current_turn(), before.current_turn().opponent());
                            }
                        }
                        prop_assert!(session.phase() >= before.phase());
                    }
                    Err(_) => prop_assert_eq!(&session, &before),
                }

                prop_assert!(session.invariants_hold());
                prop_assert_eq!(session.x_board().bits() & session.o_board().bits(), 0);
                prop_assert_eq!(
                    session.x_board().popcount() + session.o_board().popcount(),
                    u32::from(session.total_moves())
                );
            }
        }
    }
}
