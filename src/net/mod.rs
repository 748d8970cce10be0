//! Network Layer
//!
//! Framed binary protocol plus the two session adapters that bind a
//! socket to the [`crate::game::Player`] capability. All game logic
//! stays in `game/`.

pub mod client;
pub mod codec;
pub mod session;

pub use client::{ClientSession, CONNECT_TIMEOUT};
pub use codec::{read_frame, write_frame, Message, ProtocolError};
pub use session::{RemotePlayer, SessionError, MAX_MOVE_ATTEMPTS};
