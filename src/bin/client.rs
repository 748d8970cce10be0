//! Tic-Tac-Toe Arena console client.
//!
//! Prompts for a name and a server address, then plays one match on
//! the terminal. All game traffic goes through [`ClientSession`]; this
//! binary only renders the board and collects positions.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::lookup_host;
use tracing_subscriber::EnvFilter;

use tictactoe_arena::game::{BoardState, Marker, Player, PlayerGameInfo, PlayersResult, Position};
use tictactoe_arena::{ClientSession, SessionError, DEFAULT_PORT};

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the terminal clean unless RUST_LOG asks for more.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("Welcome to Tic-Tac-Toe Arena.");

    let name = prompt("Enter your name: ").await?;
    let addr = read_server_addr().await?;

    println!("Connecting to {addr}");
    let player = ConsolePlayer::new(name);
    let session = match ClientSession::connect(player, addr).await {
        Ok(session) => session,
        Err(SessionError::ConnectTimeout(_)) => {
            println!("Failed to connect to the game server. Exiting the application.");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    println!("Connected! Waiting for the game to start.");
    session.play().await?;
    Ok(())
}

/// Prompts for a server address, retrying a few times on bad input.
/// A bare host name gets the default port appended.
async fn read_server_addr() -> Result<SocketAddr> {
    for _ in 0..3 {
        let input = prompt("Enter Game Server host name or IP address: ").await?;
        let target = if input.contains(':') {
            input.clone()
        } else {
            format!("{input}:{DEFAULT_PORT}")
        };

        if let Ok(mut addrs) = lookup_host(&target).await {
            if let Some(addr) = addrs.next() {
                return Ok(addr);
            }
        }
        println!("Failed to find the host '{input}'. Please try again.");
    }

    anyhow::bail!("failed to resolve the game server address after 3 attempts")
}

async fn prompt(text: &str) -> Result<String> {
    use std::io::Write;
    print!("{text}");
    std::io::stdout().flush()?;
    read_line().await
}

async fn read_line() -> Result<String> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin reader task failed")??;
    Ok(line.trim().to_owned())
}

/// A human player on the terminal.
struct ConsolePlayer {
    name: String,
    opponent_name: String,
    waiting_for_opponent: bool,
}

impl ConsolePlayer {
    fn new(name: String) -> Self {
        Self {
            name,
            opponent_name: String::new(),
            waiting_for_opponent: false,
        }
    }

    fn print_board(&self, board: &BoardState) {
        println!("     a   b   c");
        println!("   -------------");
        for row in 0..3 {
            print!(" {} |", row + 1);
            for column in 0..3 {
                let marker = board.marker_at(Position::new(row, column).unwrap());
                let symbol = match marker {
                    Marker::Empty => " ".to_owned(),
                    other => other.to_string(),
                };
                print!(" {symbol} |");
            }
            println!();
            println!("   -------------");
        }
        println!();
    }

    async fn read_position(&self) -> Result<Position> {
        loop {
            let line = prompt("Enter the position for the marker: ").await?.to_lowercase();

            let mut chars = line.chars();
            let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next())
            else {
                print_input_error();
                continue;
            };

            // Accept both "a2" and "2a".
            let (letter, digit) = if first.is_ascii_alphabetic() {
                (first, second)
            } else {
                (second, first)
            };

            let column = match letter {
                'a' => 0,
                'b' => 1,
                'c' => 2,
                _ => {
                    print_input_error();
                    continue;
                }
            };
            let row = match digit {
                '1' => 0,
                '2' => 1,
                '3' => 2,
                _ => {
                    print_input_error();
                    continue;
                }
            };

            return Ok(Position::new(row, column).expect("parsed coordinates are in range"));
        }
    }
}

fn print_input_error() {
    println!(
        "Invalid position. Must have two characters: one letter for a \
         column and one digit for a row. Example: a2"
    );
}

fn to_coordinates(position: Position) -> String {
    let letter = match position.column() {
        0 => 'a',
        1 => 'b',
        _ => 'c',
    };
    format!("{}{}", letter, position.row() + 1)
}

impl Player for ConsolePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn game_started(&mut self, info: PlayerGameInfo) -> Result<()> {
        println!(
            "Game started. You will play with the marker '{}'.",
            info.assigned_marker
        );
        println!("Your opponent is: {}.", info.opponent_name);
        self.opponent_name = info.opponent_name;
        Ok(())
    }

    async fn wait_opponents_move(&mut self, board: BoardState) -> Result<()> {
        self.waiting_for_opponent = true;
        println!("Waiting for opponents move.");
        self.print_board(&board);
        Ok(())
    }

    async fn place_marker(&mut self, board: BoardState) -> Result<Position> {
        if self.waiting_for_opponent {
            println!("The opponent '{}' has made a move.", self.opponent_name);
        }
        self.waiting_for_opponent = false;

        self.print_board(&board);
        println!("{}, it's your turn.", self.name);
        println!();

        self.read_position().await
    }

    async fn placement_accepted(&mut self, position: Position, board: BoardState) -> Result<()> {
        println!(
            "Marker was accepted at the position '{}'",
            to_coordinates(position)
        );
        println!();
        self.print_board(&board);
        Ok(())
    }

    async fn placement_rejected(&mut self, position: Position, reason: &str) -> Result<()> {
        println!(
            "Error: placement of the marker to position '{}' was rejected.",
            to_coordinates(position)
        );
        println!("Reason: {reason}");
        Ok(())
    }

    async fn game_ended(&mut self, board: BoardState, result: PlayersResult) -> Result<()> {
        match result {
            PlayersResult::Victory => {
                println!("Congratulations {}. You won the game!", self.name)
            }
            PlayersResult::Defeat => println!("Game Over, {}. You lost the game!", self.name),
            PlayersResult::Draw => println!("Game Over, {} - Draw!", self.name),
        }
        self.print_board(&board);
        Ok(())
    }
}
