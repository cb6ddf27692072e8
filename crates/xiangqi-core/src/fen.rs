//! Compact position strings.
//!
//! A position string holds ten `/`-separated segments, top row (row 9) first. Runs of empty
//! seats collapse to their count. The 90-character occupancy string lists seats by index
//! (`row * 9 + col`, row 0 first) with [`NULL_CHAR`] for empty seats.

use crate::error::{CoreError, Result};
use crate::piece::{Color, Piece, NULL_CHAR};
use crate::square::{COLS, ROWS, SEAT_COUNT};

/// Standard opening position.
pub const FIRST_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

/// Encodes a 90-character occupancy string into a position string.
pub fn piece_chars_to_fen(piece_chars: &str) -> Result<String> {
    let chars: Vec<char> = piece_chars.chars().collect();
    if chars.len() != SEAT_COUNT
        || chars.iter().any(|&ch| ch != NULL_CHAR && Piece::from_char(ch).is_none())
    {
        return Err(CoreError::BadFen(piece_chars.to_string()));
    }
    Ok(encode_rows(&chars))
}

/// Row-run-length encoding of already validated seat characters.
pub(crate) fn encode_rows(chars: &[char]) -> String {
    let mut rows: Vec<String> = chars
        .chunks(COLS)
        .map(|line| {
            let mut segment = String::new();
            let mut blanks = 0;
            for &ch in line {
                if ch == NULL_CHAR {
                    blanks += 1;
                    continue;
                }
                if blanks > 0 {
                    segment.push_str(&blanks.to_string());
                    blanks = 0;
                }
                segment.push(ch);
            }
            if blanks > 0 {
                segment.push_str(&blanks.to_string());
            }
            segment
        })
        .collect();
    rows.reverse();
    rows.join("/")
}

/// Decodes a position string (side-to-move suffix allowed) into a 90-character occupancy string.
pub fn fen_to_piece_chars(fen: &str) -> Result<String> {
    let fen = fen_of(fen);
    let segments: Vec<&str> = fen.split('/').collect();
    if segments.len() != ROWS {
        return Err(CoreError::BadFen(fen.to_string()));
    }
    let mut piece_chars = String::with_capacity(SEAT_COUNT);
    for segment in segments.iter().rev() {
        let mut width = 0;
        for ch in segment.chars() {
            if let Some(n) = ch.to_digit(10) {
                width += n as usize;
                piece_chars.extend(std::iter::repeat(NULL_CHAR).take(n as usize));
            } else if Piece::from_char(ch).is_some() {
                width += 1;
                piece_chars.push(ch);
            } else {
                return Err(CoreError::BadFen(fen.to_string()));
            }
        }
        if width != COLS {
            return Err(CoreError::BadFen(fen.to_string()));
        }
    }
    Ok(piece_chars)
}

/// Appends the side-to-move suffix stored in game records.
pub fn fen_plus(fen: &str, color: Color) -> String {
    format!("{} {} - - 0 1", fen, color.fen_char())
}

/// Strips any suffix after the placement field.
pub fn fen_of(fen_plus: &str) -> &str {
    fen_plus.split(' ').next().unwrap_or(fen_plus)
}

/// Side to move recorded in a suffixed position string; red when absent.
pub fn side_of(fen_plus: &str) -> Color {
    match fen_plus.split(' ').nth(1) {
        Some("b") => Color::Black,
        _ => Color::Red,
    }
}
