//! 90-seat board: occupancy, per-kind move generation, check detection and side transforms.

use std::fmt;

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fen::{self, FIRST_FEN};
use crate::piece::{Color, Kind, Piece, NULL_CHAR};
use crate::square::{Coords, Square, COLS, ROWS, SEAT_COUNT};

/// Whole-board transforms used to derive alternate layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Swap the color of every piece.
    Exchange,
    /// Turn the board half a revolution.
    Rotate,
    /// Mirror left to right.
    Symmetry,
}

impl Transform {
    /// Seat mapping applied to stored moves; `None` when squares are unchanged.
    pub fn square_map(self) -> Option<fn(Square) -> Square> {
        match self {
            Transform::Exchange => None,
            Transform::Rotate => Some(Square::rotated),
            Transform::Symmetry => Some(Square::mirrored),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    seats: [Option<Piece>; SEAT_COUNT],
    bottom: Color,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Board set to the standard opening, red at the bottom.
    pub fn new() -> Self {
        let mut board = Board { seats: [None; SEAT_COUNT], bottom: Color::Red };
        if let Ok(chars) = fen::fen_to_piece_chars(FIRST_FEN) {
            board.place(&chars);
        }
        board
    }

    pub fn from_fen(fen: &str) -> Result<Board> {
        Self::from_piece_chars(&fen::fen_to_piece_chars(fen)?)
    }

    pub fn from_piece_chars(piece_chars: &str) -> Result<Board> {
        let mut board = Board { seats: [None; SEAT_COUNT], bottom: Color::Red };
        board.set_piece_chars(piece_chars)?;
        Ok(board)
    }

    /// Replaces the whole occupancy. Both kings must be present.
    pub fn set_piece_chars(&mut self, piece_chars: &str) -> Result<()> {
        let chars: Vec<char> = piece_chars.chars().collect();
        if chars.len() != SEAT_COUNT
            || chars.iter().any(|&ch| ch != NULL_CHAR && Piece::from_char(ch).is_none())
        {
            return Err(CoreError::BadFen(piece_chars.to_string()));
        }
        let mut next = Board { seats: [None; SEAT_COUNT], bottom: self.bottom };
        next.place(piece_chars);
        next.bottom = next.find_bottom()?;
        debug!(bottom = %next.bottom, fen = %next.fen(), "board set");
        *self = next;
        Ok(())
    }

    pub fn set_fen(&mut self, fen: &str) -> Result<()> {
        self.set_piece_chars(&fen::fen_to_piece_chars(fen)?)
    }

    fn place(&mut self, piece_chars: &str) {
        for (seat, ch) in self.seats.iter_mut().zip(piece_chars.chars()) {
            *seat = Piece::from_char(ch);
        }
    }

    fn find_bottom(&self) -> Result<Color> {
        let red = self.king_square(Color::Red).ok_or(CoreError::MissingKing(Color::Red))?;
        self.king_square(Color::Black).ok_or(CoreError::MissingKing(Color::Black))?;
        Ok(if red.row < ROWS / 2 { Color::Red } else { Color::Black })
    }

    pub fn piece_chars(&self) -> String {
        self.seats.iter().map(|p| p.map_or(NULL_CHAR, Piece::ch)).collect()
    }

    pub fn fen(&self) -> String {
        let chars: Vec<char> = self.piece_chars().chars().collect();
        fen::encode_rows(&chars)
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.seats[sq.index()]
    }

    pub fn bottom_color(&self) -> Color {
        self.bottom
    }

    pub fn is_bottom_side(&self, color: Color) -> bool {
        self.bottom == color
    }

    /// Occupied seats of `color`, in seat-index order.
    pub fn live_squares(&self, color: Color) -> Vec<Square> {
        Square::all()
            .filter(|&sq| self.piece_at(sq).is_some_and(|p| p.color == color))
            .collect()
    }

    /// Seats holding `piece`, optionally restricted to one column, in seat-index order.
    pub fn squares_of(&self, piece: Piece, col: Option<usize>) -> Vec<Square> {
        Square::all()
            .filter(|&sq| self.piece_at(sq) == Some(piece) && col.map_or(true, |c| c == sq.col))
            .collect()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, Kind::King);
        Square::all().find(|&sq| self.piece_at(sq) == Some(king))
    }

    /// Moves the piece and returns whatever stood on the target seat.
    pub fn apply(&mut self, coords: Coords) -> Option<Piece> {
        let captured = self.seats[coords.to.index()].take();
        self.seats[coords.to.index()] = self.seats[coords.from.index()].take();
        captured
    }

    pub fn unapply(&mut self, coords: Coords, captured: Option<Piece>) {
        self.seats[coords.from.index()] = self.seats[coords.to.index()].take();
        self.seats[coords.to.index()] = captured;
    }

    /// Pattern moves for the piece on `sq`, excluding seats held by its own side.
    /// Does not consider whether the move exposes the mover's king.
    pub fn candidates(&self, sq: Square) -> Vec<Square> {
        let Some(piece) = self.piece_at(sq) else {
            debug_assert!(false, "candidates requested for empty seat {sq}");
            return Vec::new();
        };
        let is_bottom = self.is_bottom_side(piece.color);
        let raw = match piece.kind {
            Kind::King => king_steps(sq, is_bottom),
            Kind::Advisor => advisor_steps(sq, is_bottom),
            Kind::Bishop => self.bishop_steps(sq, is_bottom),
            Kind::Knight => self.knight_steps(sq),
            Kind::Rook => self.rook_steps(sq),
            Kind::Cannon => self.cannon_steps(sq),
            Kind::Pawn => pawn_steps(sq, is_bottom),
        };
        raw.into_iter()
            .filter(|&to| self.piece_at(to).map_or(true, |p| p.color != piece.color))
            .collect()
    }

    /// Candidates that do not leave the mover's own king in check.
    pub fn legal_destinations(&self, sq: Square) -> Vec<Square> {
        let Some(piece) = self.piece_at(sq) else {
            debug_assert!(false, "legal destinations requested for empty seat {sq}");
            return Vec::new();
        };
        let mut trial = self.clone();
        self.candidates(sq)
            .into_iter()
            .filter(|&to| {
                let coords = Coords::new(sq, to);
                let captured = trial.apply(coords);
                let exposed = trial.is_in_check(piece.color);
                trial.unapply(coords, captured);
                !exposed
            })
            .collect()
    }

    pub fn is_legal(&self, coords: Coords) -> bool {
        self.piece_at(coords.from).is_some() && self.legal_destinations(coords.from).contains(&coords.to)
    }

    /// True when the kings face each other on an open file, or an opposing
    /// knight, rook, cannon or pawn attacks the king of `color`.
    pub fn is_in_check(&self, color: Color) -> bool {
        let Some(king) = self.king_square(color) else {
            return false;
        };
        if let Some(rival) = self.king_square(color.other()) {
            if rival.col == king.col {
                let (low, high) = (king.row.min(rival.row), king.row.max(rival.row));
                if (low + 1..high).all(|row| self.piece_at(Square::new(row, king.col)).is_none()) {
                    return true;
                }
            }
        }
        self.live_squares(color.other()).into_iter().any(|sq| {
            self.piece_at(sq).is_some_and(|p| p.kind.is_strong()) && self.candidates(sq).contains(&king)
        })
    }

    /// True when no piece of `color` has a legal destination.
    pub fn is_checkmated(&self, color: Color) -> bool {
        self.live_squares(color)
            .into_iter()
            .all(|sq| self.legal_destinations(sq).is_empty())
    }

    /// Applies a transform in place. Exchange and rotate swap the bottom color.
    pub fn change_side(&mut self, transform: Transform) {
        let old = self.seats;
        match transform.square_map() {
            None => {
                for seat in self.seats.iter_mut() {
                    *seat = seat.map(Piece::swapped);
                }
            }
            Some(map) => {
                for sq in Square::all() {
                    self.seats[map(sq).index()] = old[sq.index()];
                }
            }
        }
        if transform != Transform::Symmetry {
            self.bottom = self.bottom.other();
        }
    }

    pub fn transformed(&self, transform: Transform) -> Board {
        let mut board = self.clone();
        board.change_side(transform);
        board
    }

    fn rook_steps(&self, sq: Square) -> Vec<Square> {
        let mut steps = Vec::new();
        for ray in rays(sq) {
            for to in ray {
                steps.push(to);
                if self.piece_at(to).is_some() {
                    break;
                }
            }
        }
        steps
    }

    fn cannon_steps(&self, sq: Square) -> Vec<Square> {
        let mut steps = Vec::new();
        for ray in rays(sq) {
            let mut screened = false;
            for to in ray {
                let occupied = self.piece_at(to).is_some();
                if !screened {
                    if occupied {
                        screened = true;
                    } else {
                        steps.push(to);
                    }
                } else if occupied {
                    steps.push(to);
                    break;
                }
            }
        }
        steps
    }

    fn bishop_steps(&self, sq: Square, is_bottom: bool) -> Vec<Square> {
        let (r, c) = (sq.row as i32, sq.col as i32);
        [(-1, -1), (-1, 1), (1, -1), (1, 1)]
            .into_iter()
            .filter_map(|(dr, dc)| {
                let to = Square::at(r + 2 * dr, c + 2 * dc)?;
                let eye = Square::at(r + dr, c + dc)?;
                (own_half(to, is_bottom) && self.piece_at(eye).is_none()).then_some(to)
            })
            .collect()
    }

    fn knight_steps(&self, sq: Square) -> Vec<Square> {
        let (r, c) = (sq.row as i32, sq.col as i32);
        // (eye, destination) offsets; each destination is blocked by the one seat beside the knight.
        const LEGS: [((i32, i32), (i32, i32)); 8] = [
            ((-1, 0), (-2, -1)),
            ((-1, 0), (-2, 1)),
            ((0, -1), (-1, -2)),
            ((0, 1), (-1, 2)),
            ((0, -1), (1, -2)),
            ((0, 1), (1, 2)),
            ((1, 0), (2, -1)),
            ((1, 0), (2, 1)),
        ];
        LEGS.into_iter()
            .filter_map(|((er, ec), (tr, tc))| {
                let eye = Square::at(r + er, c + ec)?;
                let to = Square::at(r + tr, c + tc)?;
                self.piece_at(eye).is_none().then_some(to)
            })
            .collect()
    }
}

fn in_palace(sq: Square, is_bottom: bool) -> bool {
    let rows = if is_bottom { 0..=2 } else { 7..=9 };
    rows.contains(&sq.row) && (3..=5).contains(&sq.col)
}

fn own_half(sq: Square, is_bottom: bool) -> bool {
    if is_bottom {
        sq.row < ROWS / 2
    } else {
        sq.row >= ROWS / 2
    }
}

fn offsets(sq: Square, deltas: &[(i32, i32)]) -> impl Iterator<Item = Square> + '_ {
    deltas
        .iter()
        .filter_map(move |&(dr, dc)| Square::at(sq.row as i32 + dr, sq.col as i32 + dc))
}

fn king_steps(sq: Square, is_bottom: bool) -> Vec<Square> {
    offsets(sq, &[(0, -1), (0, 1), (-1, 0), (1, 0)])
        .filter(|&to| in_palace(to, is_bottom))
        .collect()
}

fn advisor_steps(sq: Square, is_bottom: bool) -> Vec<Square> {
    offsets(sq, &[(-1, -1), (-1, 1), (1, -1), (1, 1)])
        .filter(|&to| in_palace(to, is_bottom))
        .collect()
}

fn pawn_steps(sq: Square, is_bottom: bool) -> Vec<Square> {
    let forward = if is_bottom { 1 } else { -1 };
    let crossed = is_bottom == (sq.row >= ROWS / 2);
    let mut deltas = vec![(forward, 0)];
    if crossed {
        deltas.extend([(0, -1), (0, 1)]);
    }
    offsets(sq, &deltas).collect()
}

/// Straight rays from `sq`, nearest seat first: left, right, down, up.
fn rays(sq: Square) -> [Vec<Square>; 4] {
    let (row, col) = (sq.row, sq.col);
    [
        (0..col).rev().map(|c| Square::new(row, c)).collect(),
        (col + 1..COLS).map(|c| Square::new(row, c)).collect(),
        (0..row).rev().map(|r| Square::new(r, col)).collect(),
        (row + 1..ROWS).map(|r| Square::new(r, col)).collect(),
    ]
}

const BOARD_TEMPLATE: [&str; 19] = [
    "┏━┯━┯━┯━┯━┯━┯━┯━┓",
    "┃　│　│　│╲│╱│　│　│　┃",
    "┠─┼─┼─┼─╳─┼─┼─┼─┨",
    "┃　│　│　│╱│╲│　│　│　┃",
    "┠─╬─┼─┼─┼─┼─┼─╬─┨",
    "┃　│　│　│　│　│　│　│　┃",
    "┠─┼─╬─┼─╬─┼─╬─┼─┨",
    "┃　│　│　│　│　│　│　│　┃",
    "┠─┴─┴─┴─┴─┴─┴─┴─┨",
    "┃　　　　　　　　　　　　　　　┃",
    "┠─┬─┬─┬─┬─┬─┬─┬─┨",
    "┃　│　│　│　│　│　│　│　┃",
    "┠─┼─╬─┼─╬─┼─╬─┼─┨",
    "┃　│　│　│　│　│　│　│　┃",
    "┠─╬─┼─┼─┼─┼─┼─╬─┨",
    "┃　│　│　│╲│╱│　│　│　┃",
    "┠─┼─┼─┼─╳─┼─┼─┼─┨",
    "┃　│　│　│╱│╲│　│　│　┃",
    "┗━┷━┷━┷━┷━┷━┷━┷━┛",
];

impl fmt::Display for Board {
    /// Full-width text board with file numbers for both sides.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<Vec<char>> = BOARD_TEMPLATE.iter().map(|l| l.chars().collect()).collect();
        for sq in Square::all() {
            if let Some(piece) = self.piece_at(sq) {
                lines[(ROWS - 1 - sq.row) * 2][sq.col * 2] = piece.print_name();
            }
        }
        let (head, foot) = match self.bottom {
            Color::Red => (
                "　　　　　　　黑　方　　　　　　　\n１　２　３　４　５　６　７　８　９",
                "九　八　七　六　五　四　三　二　一\n　　　　　　　红　方　　　　　　　",
            ),
            Color::Black => (
                "　　　　　　　红　方　　　　　　　\n一　二　三　四　五　六　七　八　九",
                "９　８　７　６　５　４　３　２　１\n　　　　　　　黑　方　　　　　　　",
            ),
        };
        writeln!(f, "{head}")?;
        for line in lines {
            writeln!(f, "{}", line.into_iter().collect::<String>())?;
        }
        writeln!(f, "{foot}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col)
    }

    fn sorted(mut squares: Vec<Square>) -> Vec<Square> {
        squares.sort();
        squares
    }

    #[test]
    fn test_opening_board() {
        let board = Board::new();
        assert_eq!(board.fen(), FIRST_FEN);
        assert_eq!(board.bottom_color(), Color::Red);
        assert_eq!(board.live_squares(Color::Red).len(), 16);
        assert_eq!(board.king_square(Color::Black), Some(sq(9, 4)));
    }

    #[test]
    fn test_missing_king() {
        let err = Board::from_fen("3a5/9/9/9/9/9/9/9/4K4/9").unwrap_err();
        assert_eq!(err, CoreError::MissingKing(Color::Black));
    }

    #[test]
    fn test_opening_destinations() {
        let board = Board::new();
        // Red horse on the second file from red's right.
        assert_eq!(sorted(board.legal_destinations(sq(0, 7))), vec![sq(2, 6), sq(2, 8)]);
        // Cannon slides freely and jumps the horse to take it.
        let cannon = board.legal_destinations(sq(2, 7));
        assert!(cannon.contains(&sq(9, 7)));
        assert!(!cannon.contains(&sq(7, 7)));
        assert!(cannon.contains(&sq(2, 4)));
        // Rook is boxed in by its own horse, but can climb the file.
        assert_eq!(sorted(board.legal_destinations(sq(0, 0))), vec![sq(1, 0), sq(2, 0)]);
        // Unmoved pawn only goes forward.
        assert_eq!(board.legal_destinations(sq(3, 4)), vec![sq(4, 4)]);
        // Bishop cannot cross the river, advisor stays in the palace.
        assert_eq!(sorted(board.legal_destinations(sq(0, 2))), vec![sq(2, 0), sq(2, 4)]);
        assert_eq!(board.legal_destinations(sq(0, 3)), vec![sq(1, 4)]);
    }

    #[test]
    fn test_knight_leg_block() {
        let mut board = Board::new();
        board.apply(Coords::new(sq(2, 1), sq(1, 1)));
        // Cannon on b1 now blocks the b0 horse's upward leg; the bishop blocks the other.
        assert!(board.legal_destinations(sq(0, 1)).is_empty());
    }

    #[test]
    fn test_crossed_pawn_moves_sideways() {
        let pawn = Board::from_fen("3k5/9/9/9/4P4/9/9/9/9/4K4").unwrap();
        assert_eq!(sorted(pawn.legal_destinations(sq(5, 4))), vec![sq(5, 3), sq(5, 5), sq(6, 4)]);
    }

    #[test]
    fn test_facing_kings() {
        let board = Board::from_fen("4k4/9/9/9/9/9/9/9/9/4K4").unwrap();
        assert!(board.is_in_check(Color::Red));
        assert!(board.is_in_check(Color::Black));
        let blocked = Board::from_fen("4k4/9/9/9/4r4/9/9/9/9/4K4").unwrap();
        assert!(!blocked.is_in_check(Color::Red));
        // The blocking rook is pinned to the file.
        let dests = blocked.legal_destinations(sq(5, 4));
        assert!(dests.iter().all(|d| d.col == 4));
        assert_eq!(dests.len(), 8);
    }

    #[test]
    fn test_check_and_mate() {
        let mate = Board::from_fen("3k5/4R4/3R5/9/9/9/9/9/9/5K3").unwrap();
        assert!(mate.is_in_check(Color::Black));
        assert!(mate.is_checkmated(Color::Black));
        assert!(!mate.is_checkmated(Color::Red));
        assert!(!Board::new().is_checkmated(Color::Red));
    }

    #[test]
    fn test_stalemate_counts_as_mate() {
        // Rook covers f9 and f8, the pawn covers e8, the facing kings rule covers d9.
        let board = Board::from_fen("4k4/9/4PR3/9/9/9/9/9/9/3K5").unwrap();
        assert!(!board.is_in_check(Color::Black));
        let king = board.king_square(Color::Black).unwrap();
        assert!(board.legal_destinations(king).is_empty());
        assert!(board.is_checkmated(Color::Black));
        assert!(!board.is_checkmated(Color::Red));
    }

    #[test]
    fn test_legal_moves_never_expose_king() {
        let board = Board::from_fen("5a3/4ak2r/6R2/8p/9/9/9/B4N2B/4K4/3c5").unwrap();
        for color in [Color::Red, Color::Black] {
            for from in board.live_squares(color) {
                for to in board.legal_destinations(from) {
                    let mut after = board.clone();
                    after.apply(Coords::new(from, to));
                    assert!(!after.is_in_check(color), "{from}->{to} exposes {color}");
                }
            }
        }
    }

    #[test]
    fn test_apply_unapply_restores() {
        let mut board = Board::new();
        let before = board.clone();
        let coords = Coords::new(sq(2, 7), sq(9, 7));
        let captured = board.apply(coords);
        assert_eq!(captured, Some(Piece::new(Color::Black, Kind::Knight)));
        board.unapply(coords, captured);
        assert_eq!(board, before);
    }

    #[test]
    fn test_transforms() {
        let board = Board::new();
        let rotated = board.transformed(Transform::Rotate);
        assert_eq!(rotated.bottom_color(), Color::Black);
        assert_eq!(rotated.transformed(Transform::Rotate), board);
        let exchanged = board.transformed(Transform::Exchange);
        assert_eq!(exchanged.bottom_color(), Color::Black);
        assert_eq!(exchanged.piece_at(sq(0, 4)), Some(Piece::new(Color::Black, Kind::King)));
        let endgame = Board::from_fen("5a3/4ak2r/6R2/8p/9/9/9/B4N2B/4K4/3c5").unwrap();
        let mirrored = endgame.transformed(Transform::Symmetry);
        assert_eq!(mirrored.bottom_color(), Color::Red);
        assert_eq!(mirrored.piece_at(sq(7, 2)), endgame.piece_at(sq(7, 6)));
        assert_eq!(mirrored.transformed(Transform::Symmetry), endgame);
    }

    #[test]
    fn test_display_layout() {
        let text = Board::new().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 23);
        assert!(lines[0].contains('黑'));
        assert!(lines[2].starts_with('車'));
        assert!(lines[20].starts_with('车'));
        assert!(lines[22].contains('红'));
    }
}
