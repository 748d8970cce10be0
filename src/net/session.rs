//! The authoritative (server-side) session adapter.
//!
//! [`RemotePlayer`] wraps one accepted connection and implements the
//! [`Player`] capability by exchanging protocol messages: the turn
//! engine calls it like any local player, and every call maps to one
//! framed message exchange with the remote client.

use anyhow::Result;
use rand::Rng;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::game::board::{BoardState, Marker, Position};
use crate::game::player::{Player, PlayerGameInfo, PlayersResult};
use crate::net::codec::{read_frame, write_frame, Message, ProtocolError};

/// How many `MakeMove` attempts a client gets per move before the
/// mismatching tokens become fatal.
pub const MAX_MOVE_ATTEMPTS: u32 = 3;

/// Session errors. All of them abort the owning match.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The wire layer failed: decode error, short frame, closed socket.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A specific message was required but another variant arrived.
    #[error("expected {expected} but {received} was read from the socket")]
    UnexpectedMessage {
        /// The variant that was required.
        expected: &'static str,
        /// The variant that actually arrived.
        received: &'static str,
    },

    /// The client never echoed a valid token.
    #[error("no valid move received after {MAX_MOVE_ATTEMPTS} attempts")]
    MoveAttemptsExhausted,

    /// Establishing the client connection timed out.
    #[error("timed out connecting to {0}")]
    ConnectTimeout(std::net::SocketAddr),
}

impl SessionError {
    pub(crate) fn unexpected(expected: &'static str, received: &Message) -> Self {
        SessionError::UnexpectedMessage {
            expected,
            received: received.name(),
        }
    }
}

/// Mints a fresh positive 63-bit move token.
///
/// Tokens are scoped to one request/response round trip; uniqueness
/// across rapid successive requests is assumed, not enforced.
fn mint_token() -> i64 {
    rand::thread_rng().gen_range(1..i64::MAX)
}

/// A remote participant, driven by the turn engine on the server side.
pub struct RemotePlayer {
    stream: TcpStream,
    name: String,
    marker: Marker,
}

impl RemotePlayer {
    /// Wraps an accepted connection. The player has no name until
    /// [`RemotePlayer::read_join`] has seen the `JoinGame` message.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            name: String::new(),
            marker: Marker::Empty,
        }
    }

    /// Reads the framed `JoinGame` message and records the name.
    ///
    /// Any other variant is a protocol violation.
    pub async fn read_join(&mut self) -> Result<(), SessionError> {
        match self.read_message().await? {
            Message::JoinGame { player_name } => {
                self.name = player_name;
                Ok(())
            }
            other => Err(SessionError::unexpected("JoinGame", &other)),
        }
    }

    /// Closes the underlying connection.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.shutdown().await
    }

    async fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        debug!(player = %self.name, message = message.name(), "sending");
        Ok(write_frame(&mut self.stream, message).await?)
    }

    async fn read_message(&mut self) -> Result<Message, SessionError> {
        let message = read_frame(&mut self.stream).await?;
        debug!(player = %self.name, message = message.name(), "received");
        Ok(message)
    }
}

impl Player for RemotePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn game_started(&mut self, info: PlayerGameInfo) -> Result<()> {
        self.marker = info.assigned_marker;
        self.send(&Message::GameStarted {
            marker: info.assigned_marker,
            opponent_name: info.opponent_name,
        })
        .await?;
        Ok(())
    }

    async fn wait_opponents_move(&mut self, board: BoardState) -> Result<()> {
        self.send(&Message::WaitOpponentsMove { board }).await?;
        Ok(())
    }

    /// Asks the client for a move.
    ///
    /// Each attempt mints a fresh token; the reply must be a `Move`
    /// echoing it. A mismatched token earns the client an
    /// `InvalidMove` and a retry, up to [`MAX_MOVE_ATTEMPTS`] attempts
    /// in total; exhausting them is fatal.
    async fn place_marker(&mut self, board: BoardState) -> Result<Position> {
        for _ in 0..MAX_MOVE_ATTEMPTS {
            let token = mint_token();
            self.send(&Message::MakeMove { token, board }).await?;

            let reply = self.read_message().await?;
            let Message::Move {
                position,
                token: replied,
            } = reply
            else {
                return Err(SessionError::unexpected("Move", &reply).into());
            };

            if replied == token {
                return Ok(position);
            }

            warn!(player = %self.name, token, replied, "token mismatch");
            self.send(&Message::InvalidMove {
                position,
                marker: self.marker,
                reason: format!("The returned token {replied} is invalid."),
            })
            .await?;
        }

        Err(SessionError::MoveAttemptsExhausted.into())
    }

    async fn placement_accepted(&mut self, position: Position, board: BoardState) -> Result<()> {
        self.send(&Message::MoveAccepted { position, board }).await?;
        Ok(())
    }

    async fn placement_rejected(&mut self, position: Position, reason: &str) -> Result<()> {
        self.send(&Message::InvalidMove {
            position,
            marker: self.marker,
            reason: reason.to_owned(),
        })
        .await?;
        Ok(())
    }

    async fn game_ended(&mut self, board: BoardState, result: PlayersResult) -> Result<()> {
        self.send(&Message::GameEnded { result, board }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Accepts one connection and hands back both ends.
    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    #[test]
    fn minted_tokens_are_positive() {
        for _ in 0..1000 {
            assert!(mint_token() > 0);
        }
    }

    #[tokio::test]
    async fn read_join_records_the_name() {
        let (server, mut client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);

        write_frame(
            &mut client,
            &Message::JoinGame {
                player_name: "John".to_owned(),
            },
        )
        .await
        .unwrap();

        player.read_join().await.unwrap();
        assert_eq!(player.name(), "John");
    }

    #[tokio::test]
    async fn read_join_rejects_other_variants() {
        let (server, mut client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);

        write_frame(
            &mut client,
            &Message::Move {
                position: Position::new(0, 0).unwrap(),
                token: 1,
            },
        )
        .await
        .unwrap();

        let err = player.read_join().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnexpectedMessage {
                expected: "JoinGame",
                received: "Move",
            }
        ));
    }

    #[tokio::test]
    async fn matching_token_returns_the_position() {
        let (server, mut client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);

        let echo = tokio::spawn(async move {
            let Message::MakeMove { token, .. } = read_frame(&mut client).await.unwrap() else {
                panic!("expected MakeMove");
            };
            write_frame(
                &mut client,
                &Message::Move {
                    position: Position::new(1, 2).unwrap(),
                    token,
                },
            )
            .await
            .unwrap();
        });

        let position = player.place_marker(BoardState::empty()).await.unwrap();
        assert_eq!(position, Position::new(1, 2).unwrap());
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn stale_tokens_are_retried_then_fatal() {
        let (server, mut client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);

        // The client keeps echoing a bogus token. It must see exactly
        // MAX_MOVE_ATTEMPTS MakeMove requests, each answered with an
        // InvalidMove naming the bad token.
        let stubborn = tokio::spawn(async move {
            let mut requests = 0u32;
            let mut rejections = 0u32;
            loop {
                match read_frame(&mut client).await {
                    Ok(Message::MakeMove { .. }) => {
                        requests += 1;
                        write_frame(
                            &mut client,
                            &Message::Move {
                                position: Position::new(0, 0).unwrap(),
                                token: -1,
                            },
                        )
                        .await
                        .unwrap();
                    }
                    Ok(Message::InvalidMove { reason, .. }) => {
                        assert_eq!(reason, "The returned token -1 is invalid.");
                        rejections += 1;
                    }
                    Ok(other) => panic!("unexpected message: {}", other.name()),
                    Err(_) => break,
                }
            }
            (requests, rejections)
        });

        let err = player.place_marker(BoardState::empty()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::MoveAttemptsExhausted)
        ));

        player.shutdown().await.unwrap();
        drop(player);
        let (requests, rejections) = stubborn.await.unwrap();
        assert_eq!(requests, MAX_MOVE_ATTEMPTS);
        assert_eq!(rejections, MAX_MOVE_ATTEMPTS);
    }

    #[tokio::test]
    async fn wrong_variant_reply_to_make_move_is_fatal() {
        let (server, mut client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);

        let reply = tokio::spawn(async move {
            let _ = read_frame(&mut client).await.unwrap();
            write_frame(
                &mut client,
                &Message::JoinGame {
                    player_name: "late".to_owned(),
                },
            )
            .await
            .unwrap();
        });

        let err = player.place_marker(BoardState::empty()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::UnexpectedMessage {
                expected: "Move",
                received: "JoinGame",
            })
        ));
        reply.await.unwrap();
    }

    #[tokio::test]
    async fn closed_socket_is_fatal() {
        let (server, client) = socket_pair().await;
        let mut player = RemotePlayer::new(server);
        drop(client);

        let err = player.read_join().await.unwrap_err();
        assert!(matches!(err, SessionError::Protocol(ProtocolError::Io(_))));
    }
}
