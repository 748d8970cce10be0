//! The decision-source capability every participant implements.
//!
//! The turn engine only ever talks to a [`Player`]. Network-bound
//! adapters ([`crate::net::RemotePlayer`]) and local interactive
//! players are simply different implementations of the same trait.

use anyhow::Result;

use super::board::{BoardState, Marker, Position};

/// A result of a game from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayersResult {
    /// This player won the match.
    Victory,
    /// This player lost the match.
    Defeat,
    /// Neither player won.
    Draw,
}

impl PlayersResult {
    /// Maps this result to the other player's perspective.
    ///
    /// Involutive: `invert` is its own inverse.
    pub fn invert(self) -> Self {
        match self {
            PlayersResult::Victory => PlayersResult::Defeat,
            PlayersResult::Defeat => PlayersResult::Victory,
            PlayersResult::Draw => PlayersResult::Draw,
        }
    }
}

/// Basic information a player receives when a match starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerGameInfo {
    /// The marker assigned to this player for the whole match.
    pub assigned_marker: Marker,
    /// The opponent's name.
    pub opponent_name: String,
}

/// A participant in a match.
///
/// The engine drives exactly one call at a time; implementations never
/// see concurrent invocations. Any returned error is fatal to the match
/// except where the engine itself recovers (illegal placements are
/// reported through [`Player::placement_rejected`], not through errors).
#[allow(async_fn_in_trait)]
pub trait Player {
    /// The player's display name.
    fn name(&self) -> &str;

    /// Notifies this player that the match has started.
    async fn game_started(&mut self, info: PlayerGameInfo) -> Result<()>;

    /// Tells this player it is the opponent's turn to move.
    async fn wait_opponents_move(&mut self, board: BoardState) -> Result<()>;

    /// Asks this player for the position of their next marker.
    async fn place_marker(&mut self, board: BoardState) -> Result<Position>;

    /// Notifies this player that their last placement was accepted.
    async fn placement_accepted(&mut self, position: Position, board: BoardState) -> Result<()>;

    /// Notifies this player that their last placement was rejected.
    async fn placement_rejected(&mut self, position: Position, reason: &str) -> Result<()>;

    /// Signals this player that the match ended.
    async fn game_ended(&mut self, board: BoardState, result: PlayersResult) -> Result<()>;
}

impl<P: Player> Player for &mut P {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn game_started(&mut self, info: PlayerGameInfo) -> Result<()> {
        (**self).game_started(info).await
    }

    async fn wait_opponents_move(&mut self, board: BoardState) -> Result<()> {
        (**self).wait_opponents_move(board).await
    }

    async fn place_marker(&mut self, board: BoardState) -> Result<Position> {
        (**self).place_marker(board).await
    }

    async fn placement_accepted(&mut self, position: Position, board: BoardState) -> Result<()> {
        (**self).placement_accepted(position, board).await
    }

    async fn placement_rejected(&mut self, position: Position, reason: &str) -> Result<()> {
        (**self).placement_rejected(position, reason).await
    }

    async fn game_ended(&mut self, board: BoardState, result: PlayersResult) -> Result<()> {
        (**self).game_ended(board, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_swaps_victory_and_defeat() {
        assert_eq!(PlayersResult::Victory.invert(), PlayersResult::Defeat);
        assert_eq!(PlayersResult::Defeat.invert(), PlayersResult::Victory);
    }

    #[test]
    fn invert_fixes_draw() {
        assert_eq!(PlayersResult::Draw.invert(), PlayersResult::Draw);
    }

    #[test]
    fn invert_is_involutive() {
        for result in [
            PlayersResult::Victory,
            PlayersResult::Defeat,
            PlayersResult::Draw,
        ] {
            assert_eq!(result.invert().invert(), result);
        }
    }
}
