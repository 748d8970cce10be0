//! # Tic-Tac-Toe Arena
//!
//! A networked tic-tac-toe match server and client library.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TIC-TAC-TOE ARENA                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Pure game logic (no network)             │
//! │  ├── board.rs    - Markers, positions, the grid, snapshots  │
//! │  ├── player.rs   - The decision-source capability           │
//! │  └── engine.rs   - Per-match turn engine                    │
//! │                                                             │
//! │  net/            - Wire protocol and session adapters       │
//! │  ├── codec.rs    - Binary message format, framing           │
//! │  ├── session.rs  - Authoritative (server-side) adapter      │
//! │  └── client.rs   - Initiating (client-side) adapter         │
//! │                                                             │
//! │  server/         - Connection pairing and match dispatch    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The turn engine only ever sees the [`game::Player`] trait, so a
//! match plays identically whether a participant is a remote socket,
//! a console user, or a scripted bot. Each match runs on its own task;
//! matches never share state beyond the match-id counter.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod net;
pub mod server;

// Re-export commonly used types
pub use game::{Board, BoardState, Game, Marker, Player, PlayerGameInfo, PlayersResult, Position};
pub use net::{ClientSession, Message, ProtocolError, RemotePlayer, SessionError};
pub use server::{GameServer, ServerConfig, ServerError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The port the server listens on by default.
pub const DEFAULT_PORT: u16 = 9000;
