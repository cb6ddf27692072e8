//! Chinese file notation (`炮二平五`, `前马进七`), resolved against the live board.

use crate::board::Board;
use crate::error::{CoreError, Result};
use crate::piece::{
    Color, Kind, Piece, MOVE_CHARS, NUM_CHARS, PRE_CHARS_2, PRE_CHARS_3, PRE_CHARS_N,
};
use crate::square::{Coords, Square, COLS};

fn bad(text: &str) -> CoreError {
    CoreError::BadNotation(text.to_string())
}

/// File index as seen from the owner's side: bottom pieces count files right to left.
fn view_col(is_bottom: bool, col: usize) -> usize {
    if is_bottom {
        COLS - 1 - col
    } else {
        col
    }
}

fn pre_char(len: usize, index: usize) -> Option<char> {
    match len {
        2 => PRE_CHARS_2.get(index).copied(),
        3 => PRE_CHARS_3.get(index).copied(),
        _ => PRE_CHARS_N.get(index).copied(),
    }
}

fn pre_index(len: usize, ch: char) -> Option<usize> {
    match len {
        2 => PRE_CHARS_2.iter().position(|&c| c == ch),
        3 => PRE_CHARS_3.iter().position(|&c| c == ch),
        _ => PRE_CHARS_N.iter().position(|&c| c == ch),
    }
}

/// Orders seats front to back from the owner's point of view.
fn front_to_back(mut squares: Vec<Square>, is_bottom: bool) -> Vec<Square> {
    squares.sort_by_key(|sq| sq.row);
    if is_bottom {
        squares.reverse();
    }
    squares
}

impl Board {
    /// Pawns on files holding two or more of them: files right to left from the owner's
    /// view, each file front to back.
    fn sorted_pawns(&self, pawn: Piece, is_bottom: bool) -> Vec<Square> {
        (0..COLS)
            .map(|view| view_col(is_bottom, view))
            .flat_map(|col| {
                let file = self.squares_of(pawn, Some(col));
                if file.len() > 1 {
                    front_to_back(file, is_bottom)
                } else {
                    Vec::new()
                }
            })
            .collect()
    }

    /// Chinese notation for a move made from this position.
    pub fn zh(&self, coords: Coords) -> Result<String> {
        let Coords { from, to } = coords;
        let piece = self
            .piece_at(from)
            .ok_or_else(|| CoreError::EmptySeat(from.to_string()))?;
        let is_bottom = self.is_bottom_side(piece.color);
        let digits = &NUM_CHARS[piece.color.index()];
        let col_char = |col: usize| digits[view_col(is_bottom, col)];

        let mut text = String::with_capacity(12);
        let same_file = self.squares_of(piece, Some(from.col));
        if same_file.len() > 1 && piece.kind.is_strong() {
            let seats = if piece.kind == Kind::Pawn {
                self.sorted_pawns(piece, is_bottom)
            } else {
                front_to_back(same_file, is_bottom)
            };
            let index = seats.iter().position(|&sq| sq == from).unwrap_or_default();
            text.push(pre_char(seats.len(), index).ok_or_else(|| bad(&coords.iccs()))?);
            text.push(piece.name());
        } else {
            text.push(piece.name());
            text.push(col_char(from.col));
        }

        text.push(if from.row == to.row {
            MOVE_CHARS[1]
        } else if is_bottom == (to.row > from.row) {
            MOVE_CHARS[2]
        } else {
            MOVE_CHARS[0]
        });
        text.push(if piece.kind.is_line_mover() && from.row != to.row {
            digits[from.row.abs_diff(to.row) - 1]
        } else {
            col_char(to.col)
        });
        Ok(text)
    }

    /// Resolves Chinese notation to coordinates. The mover's color comes from the digit
    /// set of the final character.
    pub fn coords_from_zh(&self, text: &str) -> Result<Coords> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != 4 {
            return Err(bad(text));
        }
        let color = Color::from_num_char(chars[3]).ok_or_else(|| bad(text))?;
        let is_bottom = self.is_bottom_side(color);
        let digits = &NUM_CHARS[color.index()];
        let num_index = |ch: char| digits.iter().position(|&c| c == ch).ok_or_else(|| bad(text));
        let glyph = MOVE_CHARS.iter().position(|&c| c == chars[2]).ok_or_else(|| bad(text))?;
        let mov_dir = (glyph as i32 - 1) * if is_bottom { 1 } else { -1 };

        let (kind, from) = if let Some(kind) = Kind::from_name(chars[0]) {
            let col = view_col(is_bottom, num_index(chars[1])?);
            let seats = self.squares_of(Piece::new(color, kind), Some(col));
            // Two advisors or bishops on one file: the one moving toward row 0 is the upper one.
            let index = if seats.len() == 2 && mov_dir == -1 { 1 } else { 0 };
            (kind, seats.get(index).copied().ok_or_else(|| bad(text))?)
        } else {
            let kind = Kind::from_name(chars[1]).ok_or_else(|| bad(text))?;
            let piece = Piece::new(color, kind);
            let seats = if kind == Kind::Pawn {
                self.sorted_pawns(piece, is_bottom)
            } else {
                front_to_back(self.squares_of(piece, None), is_bottom)
            };
            let index = pre_index(seats.len(), chars[0]).ok_or_else(|| bad(text))?;
            (kind, seats.get(index).copied().ok_or_else(|| bad(text))?)
        };

        let num = num_index(chars[3])?;
        let to_col = view_col(is_bottom, num);
        let (row, col) = (from.row as i32, from.col as i32);
        let to = if kind.is_line_mover() {
            if mov_dir == 0 {
                Square::at(row, to_col as i32)
            } else {
                Square::at(row + mov_dir * (num as i32 + 1), col)
            }
        } else {
            let away = (to_col as i32 - col).abs();
            let rows = match kind {
                Kind::Advisor | Kind::Bishop => away,
                _ if away == 1 => 2,
                _ => 1,
            };
            Square::at(row + mov_dir * rows, to_col as i32)
        };
        Ok(Coords::new(from, to.ok_or_else(|| bad(text))?))
    }
}
