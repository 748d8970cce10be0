//! The per-match turn engine.
//!
//! [`Game`] runs one match to completion over two [`Player`]s. It is
//! strictly sequential: it blocks on exactly one player call at a time,
//! so the two sides are never invoked concurrently.

use anyhow::Result;
use tracing::{debug, warn};

use super::board::{Board, BoardState, Marker};
use super::player::{Player, PlayerGameInfo, PlayersResult};

/// The 8 winning triples: 3 rows, 3 columns, 2 diagonals (row-major
/// cell indices).
const TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Finds the marker holding a strike, if any triple is complete.
///
/// Under alternating single-cell placement at most one marker can hold
/// a strike, so the enumeration order does not matter.
pub(crate) fn find_strike(state: &BoardState) -> Option<Marker> {
    let cells = state.cells();
    TRIPLES.iter().find_map(|&[a, b, c]| {
        if cells[a] != Marker::Empty && cells[a] == cells[b] && cells[b] == cells[c] {
            Some(cells[a])
        } else {
            None
        }
    })
}

/// One match of tic-tac-toe between two players.
pub struct Game<P> {
    board: Board,
    state: BoardState,
    players: [P; 2],
    markers: [Marker; 2],
    mover: usize,
}

impl<P: Player> Game<P> {
    /// Creates a match. The first player is assigned `X`, the second
    /// `O`; the assignment is fixed for the whole match and `X` moves
    /// first.
    pub fn new(first: P, second: P) -> Self {
        let board = Board::new();
        let state = board.snapshot();
        Self {
            board,
            state,
            players: [first, second],
            markers: [Marker::X, Marker::O],
            mover: 0,
        }
    }

    /// Runs the match to completion.
    ///
    /// Illegal placements are recoverable: the offending player is told
    /// why and asked again, without bound. Any error returned by a
    /// player call is fatal and aborts the match immediately, without
    /// end-of-game notifications.
    pub async fn play(&mut self) -> Result<()> {
        let names = [
            self.players[0].name().to_owned(),
            self.players[1].name().to_owned(),
        ];

        self.players[0]
            .game_started(PlayerGameInfo {
                assigned_marker: self.markers[0],
                opponent_name: names[1].clone(),
            })
            .await?;
        self.players[1]
            .game_started(PlayerGameInfo {
                assigned_marker: self.markers[1],
                opponent_name: names[0].clone(),
            })
            .await?;

        while !self.is_over() {
            self.play_round().await?;
        }

        let state = self.state;
        let mover_result = self.mover_result();
        debug!(result = ?mover_result, "match over");

        self.players[self.mover].game_ended(state, mover_result).await?;
        self.players[1 - self.mover]
            .game_ended(state, mover_result.invert())
            .await?;

        Ok(())
    }

    /// Runs one round: the waiting side is notified, the moving side is
    /// asked for a position until a placement is accepted, then the
    /// roles swap.
    async fn play_round(&mut self) -> Result<()> {
        let marker = self.markers[self.mover];

        loop {
            self.players[1 - self.mover]
                .wait_opponents_move(self.state)
                .await?;

            let position = self.players[self.mover].place_marker(self.state).await?;

            match self.board.place_marker(position, marker) {
                Ok(()) => {
                    self.state = self.board.snapshot();
                    self.players[self.mover]
                        .placement_accepted(position, self.state)
                        .await?;
                    break;
                }
                Err(cause) => {
                    let reason =
                        format!("invalid move for the player holding '{marker}': {cause}");
                    warn!(player = self.players[self.mover].name(), %reason, "placement rejected");
                    self.players[self.mover]
                        .placement_rejected(position, &reason)
                        .await?;
                }
            }
        }

        self.mover = 1 - self.mover;
        Ok(())
    }

    fn is_over(&self) -> bool {
        find_strike(&self.state).is_some() || self.state.is_full()
    }

    /// The result from the perspective of whichever side is about to
    /// move when the termination check fires.
    fn mover_result(&self) -> PlayersResult {
        match find_strike(&self.state) {
            None => PlayersResult::Draw,
            Some(winner) => {
                if self.markers[self.mover] == winner {
                    PlayersResult::Victory
                } else {
                    PlayersResult::Defeat
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crate::game::board::Position;

    use super::*;

    /// A scripted player that records every notification it receives.
    struct TestPlayer {
        name: String,
        moves: VecDeque<Position>,
        info: Option<PlayerGameInfo>,
        waits: usize,
        accepted: Vec<Position>,
        rejected: Vec<(Position, String)>,
        result: Option<(BoardState, PlayersResult)>,
    }

    impl TestPlayer {
        fn new(name: &str, moves: &[(i32, i32)]) -> Self {
            Self {
                name: name.to_owned(),
                moves: moves
                    .iter()
                    .map(|&(row, column)| Position::new(row, column).unwrap())
                    .collect(),
                info: None,
                waits: 0,
                accepted: Vec::new(),
                rejected: Vec::new(),
                result: None,
            }
        }
    }

    impl Player for TestPlayer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn game_started(&mut self, info: PlayerGameInfo) -> Result<()> {
            self.info = Some(info);
            Ok(())
        }

        async fn wait_opponents_move(&mut self, _board: BoardState) -> Result<()> {
            self.waits += 1;
            Ok(())
        }

        async fn place_marker(&mut self, _board: BoardState) -> Result<Position> {
            self.moves
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("{} ran out of scripted moves", self.name))
        }

        async fn placement_accepted(&mut self, position: Position, _board: BoardState) -> Result<()> {
            self.accepted.push(position);
            Ok(())
        }

        async fn placement_rejected(&mut self, position: Position, reason: &str) -> Result<()> {
            self.rejected.push((position, reason.to_owned()));
            Ok(())
        }

        async fn game_ended(&mut self, board: BoardState, result: PlayersResult) -> Result<()> {
            self.result = Some((board, result));
            Ok(())
        }
    }

    fn state_of(cells: [Marker; 9]) -> BoardState {
        BoardState::from_cells(cells)
    }

    #[tokio::test]
    async fn first_player_wins_on_a_diagonal() {
        let mut alice = TestPlayer::new("alice", &[(1, 1), (0, 0), (2, 2)]);
        let mut bob = TestPlayer::new("bob", &[(0, 1), (0, 2)]);

        Game::new(&mut alice, &mut bob).play().await.unwrap();

        let alice_info = alice.info.as_ref().unwrap();
        assert_eq!(alice_info.assigned_marker, Marker::X);
        assert_eq!(alice_info.opponent_name, "bob");
        assert_eq!(alice.result.unwrap().1, PlayersResult::Victory);
        assert!(alice.moves.is_empty());
        assert_eq!(alice.waits, 2);

        let bob_info = bob.info.as_ref().unwrap();
        assert_eq!(bob_info.assigned_marker, Marker::O);
        assert_eq!(bob_info.opponent_name, "alice");
        assert_eq!(bob.result.unwrap().1, PlayersResult::Defeat);
        assert!(bob.moves.is_empty());
        assert_eq!(bob.waits, 3);
    }

    #[tokio::test]
    async fn full_board_without_strike_is_a_draw() {
        // X O X
        // X O O
        // O X X
        let mut alice = TestPlayer::new("alice", &[(0, 0), (0, 2), (1, 0), (2, 1), (2, 2)]);
        let mut bob = TestPlayer::new("bob", &[(0, 1), (1, 1), (1, 2), (2, 0)]);

        Game::new(&mut alice, &mut bob).play().await.unwrap();

        let (final_state, alice_result) = alice.result.unwrap();
        assert_eq!(alice_result, PlayersResult::Draw);
        assert_eq!(bob.result.unwrap().1, PlayersResult::Draw);
        assert!(final_state.is_full());
        assert_eq!(find_strike(&final_state), None);
    }

    #[tokio::test]
    async fn occupied_cell_reprompts_the_same_mover() {
        // Bob tries the occupied center first; the attempt is rejected
        // and bob is asked again before play continues.
        let mut alice = TestPlayer::new("alice", &[(1, 1), (0, 0), (2, 2)]);
        let mut bob = TestPlayer::new("bob", &[(1, 1), (0, 1), (0, 2)]);

        Game::new(&mut alice, &mut bob).play().await.unwrap();

        assert_eq!(bob.rejected.len(), 1);
        let (position, reason) = &bob.rejected[0];
        assert_eq!(*position, Position::new(1, 1).unwrap());
        assert!(reason.contains("already contains a marker X"), "{reason}");
        assert!(reason.contains("'O'"), "{reason}");
        // Bob's rejected attempt never reached the board.
        assert_eq!(bob.accepted.len(), 2);
        assert_eq!(alice.result.unwrap().1, PlayersResult::Victory);
    }

    #[tokio::test]
    async fn player_failure_aborts_without_end_notifications() {
        // Bob's script runs dry after one move; the resulting error is
        // fatal and neither side hears the game end.
        let mut alice = TestPlayer::new("alice", &[(0, 0), (1, 1)]);
        let mut bob = TestPlayer::new("bob", &[(0, 1)]);

        let err = Game::new(&mut alice, &mut bob).play().await.unwrap_err();
        assert!(err.to_string().contains("ran out of scripted moves"));
        assert!(alice.result.is_none());
        assert!(bob.result.is_none());
    }

    #[test]
    fn every_winning_triple_is_detected() {
        for &[a, b, c] in &TRIPLES {
            let mut cells = [Marker::Empty; 9];
            cells[a] = Marker::O;
            cells[b] = Marker::O;
            cells[c] = Marker::O;

            assert_eq!(find_strike(&state_of(cells)), Some(Marker::O));
        }
    }

    #[test]
    fn mixed_triple_is_not_a_strike() {
        let mut cells = [Marker::Empty; 9];
        cells[0] = Marker::X;
        cells[1] = Marker::O;
        cells[2] = Marker::X;
        assert_eq!(find_strike(&state_of(cells)), None);
    }

    #[test]
    fn strike_detection_matches_mover_perspective() {
        // O O O / X X _ / X _ _ with the mover holding O.
        use Marker::{Empty, O, X};
        let state = state_of([O, O, O, X, X, Empty, X, Empty, Empty]);
        assert_eq!(find_strike(&state), Some(O));
    }
}
