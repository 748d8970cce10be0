//! The board and its value types.
//!
//! A board has three rows and three columns indexed from zero:
//!
//! ```text
//!   [0, 0] [0, 1] [0, 2]
//!   [1, 0] [1, 1] [1, 2]
//!   [2, 0] [2, 1] [2, 2]
//! ```
//!
//! [`Board`] is the single mutable grid owned by one running match;
//! [`BoardState`] is an immutable snapshot taken after every accepted
//! placement and shared freely with players and the wire layer.

use std::fmt;

/// A marker symbol occupying a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The 'X' marker, assigned to the first player of a match.
    X,
    /// The 'O' marker, assigned to the second player of a match.
    O,
    /// No marker has been placed in the cell.
    Empty,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::X => write!(f, "X"),
            Marker::O => write!(f, "O"),
            Marker::Empty => write!(f, "EMPTY"),
        }
    }
}

/// Error raised when constructing a [`Position`] outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The row index is outside `0..=2`.
    #[error("row {0} is out of bounds <0, 2>")]
    RowOutOfBounds(i32),

    /// The column index is outside `0..=2`.
    #[error("column {0} is out of bounds <0, 2>")]
    ColumnOutOfBounds(i32),
}

/// A position on the board. In-range by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    row: u8,
    column: u8,
}

impl Position {
    /// Creates a position, rejecting indices outside `0..=2`.
    pub fn new(row: i32, column: i32) -> Result<Self, PositionError> {
        if !(0..=2).contains(&row) {
            return Err(PositionError::RowOutOfBounds(row));
        }
        if !(0..=2).contains(&column) {
            return Err(PositionError::ColumnOutOfBounds(column));
        }
        Ok(Self {
            row: row as u8,
            column: column as u8,
        })
    }

    /// The zero-based row index.
    pub fn row(&self) -> u8 {
        self.row
    }

    /// The zero-based column index.
    pub fn column(&self) -> u8 {
        self.column
    }

    /// Row-major cell index in `0..9`.
    pub(crate) fn index(&self) -> usize {
        usize::from(self.row) * 3 + usize::from(self.column)
    }

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < 9);
        Self {
            row: (index / 3) as u8,
            column: (index % 3) as u8,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.column)
    }
}

/// Error raised when a placement is illegal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// A cell can never be cleared once a marker is placed.
    #[error("cannot empty a cell")]
    CannotEmptyCell,

    /// The target cell already holds a marker.
    #[error("position {position} already contains a marker {occupant}")]
    CellOccupied {
        /// The requested position.
        position: Position,
        /// The marker currently in the cell.
        occupant: Marker,
    },
}

/// The mutable grid of one running match.
///
/// `place_marker` is the only mutation point; everything else works on
/// [`BoardState`] snapshots.
#[derive(Debug)]
pub struct Board {
    cells: [Marker; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [Marker::Empty; 9],
        }
    }

    /// Places a marker into an empty cell.
    ///
    /// Placing [`Marker::Empty`] or placing into an occupied cell fails
    /// and leaves the board untouched.
    pub fn place_marker(&mut self, position: Position, marker: Marker) -> Result<(), PlacementError> {
        if marker == Marker::Empty {
            return Err(PlacementError::CannotEmptyCell);
        }

        let occupant = self.cells[position.index()];
        if occupant != Marker::Empty {
            return Err(PlacementError::CellOccupied { position, occupant });
        }

        self.cells[position.index()] = marker;
        Ok(())
    }

    /// The marker at a given position.
    pub fn marker_at(&self, position: Position) -> Marker {
        self.cells[position.index()]
    }

    /// Takes an immutable snapshot of the current grid.
    pub fn snapshot(&self) -> BoardState {
        BoardState { cells: self.cells }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable snapshot of the 9 cells, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardState {
    cells: [Marker; 9],
}

impl BoardState {
    /// A snapshot of an empty board.
    pub fn empty() -> Self {
        Self {
            cells: [Marker::Empty; 9],
        }
    }

    /// Builds a snapshot from 9 row-major cells.
    pub fn from_cells(cells: [Marker; 9]) -> Self {
        Self { cells }
    }

    /// The marker at a given position.
    pub fn marker_at(&self, position: Position) -> Marker {
        self.cells[position.index()]
    }

    /// The 9 cells in row-major order.
    pub fn cells(&self) -> &[Marker; 9] {
        &self.cells
    }

    /// True if every cell holds a marker.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Marker::Empty)
    }
}
