//! Board coordinates and move coordinate pairs.

use std::fmt;

use crate::error::{CoreError, Result};
use crate::piece::ICCS_COLS;

pub const ROWS: usize = 10;
pub const COLS: usize = 9;
pub const SEAT_COUNT: usize = ROWS * COLS;

/// A seat on the 10x9 grid. Row 0 is the visual bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Self {
        debug_assert!(row < ROWS && col < COLS);
        Self { row, col }
    }

    /// Checked constructor for signed arithmetic results.
    pub fn at(row: i32, col: i32) -> Option<Square> {
        if (0..ROWS as i32).contains(&row) && (0..COLS as i32).contains(&col) {
            Some(Square::new(row as usize, col as usize))
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Square {
        Square::new(index / COLS, index % COLS)
    }

    pub fn index(self) -> usize {
        self.row * COLS + self.col
    }

    /// Two-digit record encoding, `row * 10 + col`, used by the binary and JSON formats.
    pub fn rowcol(self) -> u8 {
        (self.row * 10 + self.col) as u8
    }

    pub fn from_rowcol(value: i32) -> Result<Square> {
        if value < 0 {
            return Err(CoreError::BadSquare(value));
        }
        Square::at(value / 10, value % 10).ok_or(CoreError::BadSquare(value))
    }

    /// Position after turning the board half a revolution.
    pub fn rotated(self) -> Square {
        Square::new(ROWS - 1 - self.row, COLS - 1 - self.col)
    }

    /// Position after mirroring left to right.
    pub fn mirrored(self) -> Square {
        Square::new(self.row, COLS - 1 - self.col)
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..SEAT_COUNT).map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.col)
    }
}

/// From/to squares of one ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coords {
    pub from: Square,
    pub to: Square,
}

impl Coords {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// Coordinate notation: column letter and row digit for each end, e.g. `h2e2`.
    pub fn iccs(self) -> String {
        format!(
            "{}{}{}{}",
            ICCS_COLS[self.from.col], self.from.row, ICCS_COLS[self.to.col], self.to.row
        )
    }

    pub fn from_iccs(text: &str) -> Result<Coords> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != 4 {
            return Err(CoreError::BadNotation(text.to_string()));
        }
        let square = |col: char, row: char| -> Option<Square> {
            let col = ICCS_COLS.iter().position(|&c| c == col.to_ascii_lowercase())?;
            let row = row.to_digit(10)? as usize;
            Some(Square::new(row, col))
        };
        match (square(chars[0], chars[1]), square(chars[2], chars[3])) {
            (Some(from), Some(to)) => Ok(Coords::new(from, to)),
            _ => Err(CoreError::BadNotation(text.to_string())),
        }
    }

    pub fn map(self, f: impl Fn(Square) -> Square) -> Coords {
        Coords::new(f(self.from), f(self.to))
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}_{:02}", self.from.rowcol(), self.to.rowcol())
    }
}
