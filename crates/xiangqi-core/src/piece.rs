//! Piece catalog: colors, kinds, and the character tables every notation dialect reads from.

use std::fmt;

/// Character marking an empty seat in a 90-character occupancy string.
pub const NULL_CHAR: char = '_';

/// Movement glyphs indexed by direction + 1 (retreat, horizontal, advance).
pub const MOVE_CHARS: [char; 3] = ['退', '平', '进'];

/// File/distance digits per color: red uses ideographs, black full-width numerals.
pub const NUM_CHARS: [[char; 9]; 2] = [
    ['一', '二', '三', '四', '五', '六', '七', '八', '九'],
    ['１', '２', '３', '４', '５', '６', '７', '８', '９'],
];

/// Ordinal prefixes for two, three, and four-or-more pieces sharing a file.
pub const PRE_CHARS_2: [char; 2] = ['前', '后'];
pub const PRE_CHARS_3: [char; 3] = ['前', '中', '后'];
pub const PRE_CHARS_N: [char; 5] = ['一', '二', '三', '四', '五'];

/// ICCS column letters.
pub const ICCS_COLS: [char; 9] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Color whose digit set contains `ch`.
    pub fn from_num_char(ch: char) -> Option<Color> {
        [Color::Red, Color::Black]
            .into_iter()
            .find(|c| NUM_CHARS[c.index()].contains(&ch))
    }

    /// Side-to-move letter used in the position string suffix.
    pub fn fen_char(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    King,
    Advisor,
    Bishop,
    Knight,
    Rook,
    Cannon,
    Pawn,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::King,
        Kind::Advisor,
        Kind::Bishop,
        Kind::Knight,
        Kind::Rook,
        Kind::Cannon,
        Kind::Pawn,
    ];

    /// Pieces whose Chinese notation counts rows rather than naming a target file.
    pub fn is_line_mover(self) -> bool {
        matches!(self, Kind::King | Kind::Rook | Kind::Cannon | Kind::Pawn)
    }

    /// Pieces able to attack across the river; these also take ordinal prefixes.
    pub fn is_strong(self) -> bool {
        matches!(self, Kind::Knight | Kind::Rook | Kind::Cannon | Kind::Pawn)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Looks a kind up from any of its Chinese names, either color, plain or print form.
    pub fn from_name(ch: char) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| {
            NAMES.iter().any(|names| names[k.index()] == ch)
                || PRINT_NAMES.iter().any(|names| names[k.index()] == ch)
        })
    }
}

const CHARS: [[char; 7]; 2] = [
    ['K', 'A', 'B', 'N', 'R', 'C', 'P'],
    ['k', 'a', 'b', 'n', 'r', 'c', 'p'],
];

const NAMES: [[char; 7]; 2] = [
    ['帅', '仕', '相', '马', '车', '炮', '兵'],
    ['将', '士', '象', '马', '车', '炮', '卒'],
];

const PRINT_NAMES: [[char; 7]; 2] = [
    ['帅', '仕', '相', '马', '车', '炮', '兵'],
    ['将', '士', '象', '馬', '車', '砲', '卒'],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: Kind,
}

impl Piece {
    pub fn new(color: Color, kind: Kind) -> Self {
        Self { color, kind }
    }

    pub fn from_char(ch: char) -> Option<Piece> {
        for color in [Color::Red, Color::Black] {
            if let Some(i) = CHARS[color.index()].iter().position(|&c| c == ch) {
                return Some(Piece::new(color, Kind::ALL[i]));
            }
        }
        None
    }

    /// Position-string character (`K`..`P` red, `k`..`p` black).
    pub fn ch(self) -> char {
        CHARS[self.color.index()][self.kind.index()]
    }

    /// Name used in Chinese move notation.
    pub fn name(self) -> char {
        NAMES[self.color.index()][self.kind.index()]
    }

    /// Name drawn on the text board; black major pieces use traditional forms.
    pub fn print_name(self) -> char {
        PRINT_NAMES[self.color.index()][self.kind.index()]
    }

    pub fn swapped(self) -> Piece {
        Piece::new(self.color.other(), self.kind)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ch())
    }
}

/// Every character that may appear inside a 4-character Chinese move token.
pub fn zh_chars() -> String {
    let mut chars: Vec<char> = Vec::new();
    chars.extend(NAMES.iter().flatten());
    chars.extend(PRINT_NAMES.iter().flatten());
    chars.extend(NUM_CHARS.iter().flatten());
    chars.extend(MOVE_CHARS);
    chars.extend(PRE_CHARS_3);
    chars.extend(PRE_CHARS_N);
    chars.sort_unstable();
    chars.dedup();
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_round_trip() {
        for color in [Color::Red, Color::Black] {
            for kind in Kind::ALL {
                let piece = Piece::new(color, kind);
                assert_eq!(Piece::from_char(piece.ch()), Some(piece));
            }
        }
        assert_eq!(Piece::from_char(NULL_CHAR), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Piece::new(Color::Red, Kind::King).name(), '帅');
        assert_eq!(Piece::new(Color::Black, Kind::Rook).name(), '车');
        assert_eq!(Piece::new(Color::Black, Kind::Rook).print_name(), '車');
        assert_eq!(Kind::from_name('砲'), Some(Kind::Cannon));
        assert_eq!(Kind::from_name('卒'), Some(Kind::Pawn));
        assert_eq!(Kind::from_name('进'), None);
    }

    #[test]
    fn test_num_char_color() {
        assert_eq!(Color::from_num_char('五'), Some(Color::Red));
        assert_eq!(Color::from_num_char('５'), Some(Color::Black));
        assert_eq!(Color::from_num_char('5'), None);
    }

    #[test]
    fn test_classification() {
        assert!(Kind::Pawn.is_line_mover() && Kind::Pawn.is_strong());
        assert!(Kind::King.is_line_mover() && !Kind::King.is_strong());
        assert!(!Kind::Knight.is_line_mover() && Kind::Knight.is_strong());
        assert!(!Kind::Bishop.is_line_mover() && !Kind::Advisor.is_strong());
    }
}
