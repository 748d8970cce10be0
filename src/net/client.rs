//! The initiating (client-side) session adapter.
//!
//! [`ClientSession`] connects to a server, joins a match, and forwards
//! every decoded message to a local [`Player`] (a console UI, a bot,
//! anything implementing the capability). The exchange is strictly
//! request/response: at most one outstanding request per direction.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::game::player::{Player, PlayerGameInfo};
use crate::net::codec::{read_frame, write_frame, Message};
use crate::net::session::SessionError;

/// How long to wait for the initial connection before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One client-side match session around a local player.
pub struct ClientSession<P> {
    delegate: P,
    stream: TcpStream,
}

impl<P: Player> ClientSession<P> {
    /// Connects to a server, applying [`CONNECT_TIMEOUT`].
    ///
    /// No further timeout exists once the handshake begins: a slow
    /// server stalls this session indefinitely.
    pub async fn connect(delegate: P, addr: SocketAddr) -> Result<Self, SessionError> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| SessionError::ConnectTimeout(addr))?
            .map_err(crate::net::codec::ProtocolError::from)?;

        debug!(%addr, "connected");
        Ok(Self { delegate, stream })
    }

    /// Joins a match and plays it to the end, giving the local player
    /// back afterwards.
    ///
    /// Sends `JoinGame`, requires exactly one `GameStarted`, then
    /// dispatches every received message to the local player until
    /// `GameEnded` arrives. Any unexpected variant, or the connection
    /// closing mid-match, is fatal.
    pub async fn play(mut self) -> Result<P> {
        let name = self.delegate.name().to_owned();
        info!(player = %name, "joining a game");
        write_frame(&mut self.stream, &Message::JoinGame { player_name: name }).await?;

        let (marker, opponent_name) = match read_frame(&mut self.stream).await? {
            Message::GameStarted {
                marker,
                opponent_name,
            } => (marker, opponent_name),
            other => return Err(SessionError::unexpected("GameStarted", &other).into()),
        };

        info!(%marker, opponent = %opponent_name, "game started");
        self.delegate
            .game_started(PlayerGameInfo {
                assigned_marker: marker,
                opponent_name,
            })
            .await?;

        loop {
            match read_frame(&mut self.stream).await? {
                Message::MakeMove { token, board } => {
                    let position = self.delegate.place_marker(board).await?;
                    write_frame(&mut self.stream, &Message::Move { position, token }).await?;
                }
                Message::InvalidMove {
                    position, reason, ..
                } => {
                    self.delegate.placement_rejected(position, &reason).await?;
                }
                Message::MoveAccepted { position, board } => {
                    self.delegate.placement_accepted(position, board).await?;
                }
                Message::WaitOpponentsMove { board } => {
                    self.delegate.wait_opponents_move(board).await?;
                }
                Message::GameEnded { result, board } => {
                    self.delegate.game_ended(board, result).await?;
                    break;
                }
                other => {
                    return Err(SessionError::unexpected(
                        "MakeMove, InvalidMove, MoveAccepted, WaitOpponentsMove or GameEnded",
                        &other,
                    )
                    .into())
                }
            }
        }

        self.stream.shutdown().await.ok();
        Ok(self.delegate)
    }
}
