//! Protocol messages and their binary wire format.
//!
//! Every message travels as one frame: a `u32` big-endian payload
//! length followed by the payload. The first payload byte is the
//! message type code; the rest is the fields in the order given on
//! each variant. All integers are big-endian; strings are a `u32`
//! length prefix plus UTF-8 bytes; boards are 9 marker codes in
//! row-major order.
//!
//! The codec holds no state and `decode(encode(m)) == m` for every
//! valid message.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::board::{BoardState, Marker, Position, PositionError};
use crate::game::player::PlayersResult;

/// A message exchanged between the game server and a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The server tells a client its match has started (code 0).
    GameStarted {
        /// The marker assigned to the receiving player.
        marker: Marker,
        /// The opponent's name.
        opponent_name: String,
    },

    /// A client asks to join a match (code 1).
    JoinGame {
        /// The joining player's name.
        player_name: String,
    },

    /// The server asks a client to make a move (code 2).
    MakeMove {
        /// A single-use token the reply must echo.
        token: i64,
        /// The current board.
        board: BoardState,
    },

    /// A client conveys its move to the server (code 3).
    Move {
        /// Where the player wants to place their marker.
        position: Position,
        /// The token received with the matching [`Message::MakeMove`].
        token: i64,
    },

    /// The server accepts the client's last move (code 4).
    MoveAccepted {
        /// The accepted position.
        position: Position,
        /// The board after the placement.
        board: BoardState,
    },

    /// The server signals the end of the match (code 5).
    GameEnded {
        /// The result from the receiving player's perspective.
        result: PlayersResult,
        /// The final board.
        board: BoardState,
    },

    /// The server rejects the client's last move (code 6).
    InvalidMove {
        /// The rejected position.
        position: Position,
        /// The marker assigned to the receiving player.
        marker: Marker,
        /// Why the move was rejected.
        reason: String,
    },

    /// The server tells a client the opponent is moving (code 7).
    WaitOpponentsMove {
        /// The current board.
        board: BoardState,
    },
}

/// Wire protocol errors. All of them are fatal to the owning match.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payload started with an unrecognized type code.
    #[error("unexpected message code: {0}")]
    UnknownMessageCode(u8),

    /// A marker byte was not one of the three known codes.
    #[error("unsupported marker code: {0}")]
    UnknownMarkerCode(u8),

    /// A result byte was not one of the three known codes.
    #[error("unsupported game result code: {0}")]
    UnknownResultCode(u8),

    /// The payload ended before the message was complete.
    #[error("frame ended before the message was complete")]
    UnexpectedEnd,

    /// A position on the wire was outside the grid.
    #[error(transparent)]
    InvalidPosition(#[from] PositionError),

    /// A string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The underlying socket failed or closed mid-frame.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Message {
    /// The type code identifying this message variant on the wire.
    pub fn code(&self) -> u8 {
        match self {
            Message::GameStarted { .. } => 0,
            Message::JoinGame { .. } => 1,
            Message::MakeMove { .. } => 2,
            Message::Move { .. } => 3,
            Message::MoveAccepted { .. } => 4,
            Message::GameEnded { .. } => 5,
            Message::InvalidMove { .. } => 6,
            Message::WaitOpponentsMove { .. } => 7,
        }
    }

    /// The variant name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Message::GameStarted { .. } => "GameStarted",
            Message::JoinGame { .. } => "JoinGame",
            Message::MakeMove { .. } => "MakeMove",
            Message::Move { .. } => "Move",
            Message::MoveAccepted { .. } => "MoveAccepted",
            Message::GameEnded { .. } => "GameEnded",
            Message::InvalidMove { .. } => "InvalidMove",
            Message::WaitOpponentsMove { .. } => "WaitOpponentsMove",
        }
    }

    /// Encodes this message to its binary payload (without the frame
    /// length prefix).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);
        buf.push(self.code());

        match self {
            Message::GameStarted {
                marker,
                opponent_name,
            } => {
                buf.push(marker_code(*marker));
                put_string(&mut buf, opponent_name);
            }
            Message::JoinGame { player_name } => {
                put_string(&mut buf, player_name);
            }
            Message::MakeMove { token, board } => {
                buf.extend_from_slice(&token.to_be_bytes());
                put_board(&mut buf, board);
            }
            Message::Move { position, token } => {
                put_position(&mut buf, *position);
                buf.extend_from_slice(&token.to_be_bytes());
            }
            Message::MoveAccepted { position, board } => {
                put_position(&mut buf, *position);
                put_board(&mut buf, board);
            }
            Message::GameEnded { result, board } => {
                buf.push(result_code(*result));
                put_board(&mut buf, board);
            }
            Message::InvalidMove {
                position,
                marker,
                reason,
            } => {
                put_position(&mut buf, *position);
                buf.push(marker_code(*marker));
                put_string(&mut buf, reason);
            }
            Message::WaitOpponentsMove { board } => {
                put_board(&mut buf, board);
            }
        }

        buf
    }

    /// Decodes a binary payload back into a message.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader { buf: data };

        let message = match r.u8()? {
            0 => Message::GameStarted {
                marker: r.marker()?,
                opponent_name: r.string()?,
            },
            1 => Message::JoinGame {
                player_name: r.string()?,
            },
            2 => Message::MakeMove {
                token: r.i64()?,
                board: r.board()?,
            },
            3 => Message::Move {
                position: r.position()?,
                token: r.i64()?,
            },
            4 => Message::MoveAccepted {
                position: r.position()?,
                board: r.board()?,
            },
            5 => Message::GameEnded {
                result: r.result()?,
                board: r.board()?,
            },
            6 => Message::InvalidMove {
                position: r.position()?,
                marker: r.marker()?,
                reason: r.string()?,
            },
            7 => Message::WaitOpponentsMove { board: r.board()? },
            code => return Err(ProtocolError::UnknownMessageCode(code)),
        };

        Ok(message)
    }
}

/// Reads one length-prefixed frame and decodes the message in it.
pub async fn read_frame<R>(reader: &mut R) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let length = reader.read_u32().await?;
    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await?;
    Message::decode(&payload)
}

/// Encodes a message and writes it as one length-prefixed frame.
pub async fn write_frame<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = message.encode();
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

fn marker_code(marker: Marker) -> u8 {
    match marker {
        Marker::X => 0,
        Marker::O => 1,
        Marker::Empty => 2,
    }
}

fn result_code(result: PlayersResult) -> u8 {
    match result {
        PlayersResult::Victory => 0,
        PlayersResult::Defeat => 1,
        PlayersResult::Draw => 2,
    }
}

fn put_string(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
}

fn put_position(buf: &mut Vec<u8>, position: Position) {
    buf.extend_from_slice(&i32::from(position.row()).to_be_bytes());
    buf.extend_from_slice(&i32::from(position.column()).to_be_bytes());
}

fn put_board(buf: &mut Vec<u8>, board: &BoardState) {
    for &cell in board.cells() {
        buf.push(marker_code(cell));
    }
}

/// A cursor over a received payload. Every accessor fails with
/// [`ProtocolError::UnexpectedEnd`] instead of panicking on short input.
struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], ProtocolError> {
        if self.buf.len() < n {
            return Err(ProtocolError::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().expect("4 bytes")))
    }

    fn i64(&mut self) -> Result<i64, ProtocolError> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes(bytes.try_into().expect("8 bytes")))
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        let length = self.i32()?;
        let length = usize::try_from(length).map_err(|_| ProtocolError::UnexpectedEnd)?;
        let bytes = self.take(length)?.to_vec();
        Ok(String::from_utf8(bytes)?)
    }

    fn marker(&mut self) -> Result<Marker, ProtocolError> {
        match self.u8()? {
            0 => Ok(Marker::X),
            1 => Ok(Marker::O),
            2 => Ok(Marker::Empty),
            code => Err(ProtocolError::UnknownMarkerCode(code)),
        }
    }

    fn result(&mut self) -> Result<PlayersResult, ProtocolError> {
        match self.u8()? {
            0 => Ok(PlayersResult::Victory),
            1 => Ok(PlayersResult::Defeat),
            2 => Ok(PlayersResult::Draw),
            code => Err(ProtocolError::UnknownResultCode(code)),
        }
    }

    fn position(&mut self) -> Result<Position, ProtocolError> {
        let row = self.i32()?;
        let column = self.i32()?;
        Ok(Position::new(row, column)?)
    }

    fn board(&mut self) -> Result<BoardState, ProtocolError> {
        let mut cells = [Marker::Empty; 9];
        for cell in &mut cells {
            *cell = self.marker()?;
        }
        Ok(BoardState::from_cells(cells))
    }
}
