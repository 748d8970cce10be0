//! Game Logic Module
//!
//! Pure turn-based game logic with no network dependency.
//!
//! - `board`: the grid, its value types, and placement legality
//! - `player`: the decision-source capability participants implement
//! - `engine`: the per-match turn engine

pub mod board;
pub mod engine;
pub mod player;

pub use board::{Board, BoardState, Marker, PlacementError, Position, PositionError};
pub use engine::Game;
pub use player::{Player, PlayerGameInfo, PlayersResult};
