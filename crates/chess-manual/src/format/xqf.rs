//! XQF reader.
//!
//! A 1024-byte header carries the key material, the starting squares of the 32 pieces and
//! fixed-width metadata fields. Move records start at offset 1024 in pre-order, four bytes
//! each (`from`, `to`, flags, spare) plus an optional length-prefixed remark. Files newer
//! than version 10 scramble piece squares, move squares and every byte past the header.
//! Squares are single bytes `col * 10 + row` with the origin at red's bottom-left.

use tracing::{debug, warn};
use xiangqi_core::fen::{fen_plus, piece_chars_to_fen};
use xiangqi_core::piece::NULL_CHAR;
use xiangqi_core::square::SEAT_COUNT;
use xiangqi_core::{Color, CoreError, Coords, Square};

use crate::error::{ManualError, Result};
use crate::manual::{ChessManual, FEN_KEY};
use crate::move_tree::NodeId;

const HEADER_LEN: usize = 1024;
const PIECE_COUNT: usize = 32;
const MAX_VERSION: u8 = 18;
const PIECE_ORDER: &[u8; PIECE_COUNT] = b"RNBAKABNRCCPPPPPrnbakabnrccppppp";
const COPYRIGHT: &[u8; PIECE_COUNT] = b"[(C) Copyright Mr. Dong Shiwei.]";

const HAS_NEXT: u8 = 0x80;
const HAS_OTHER: u8 = 0x40;
const HAS_REMARK: u8 = 0x20;

/// Metadata fields as (key, offset, width). Each is a length byte followed by text.
const TEXT_FIELDS: [(&str, usize, usize); 9] = [
    ("TitleA", 80, 64),
    ("Event", 208, 64),
    ("Date", 272, 16),
    ("Site", 288, 16),
    ("Red", 304, 16),
    ("Black", 320, 16),
    ("Opening", 336, 64),
    ("RMKWriter", 464, 16),
    ("Author", 480, 16),
];

fn calkey(b: u8, c: u8) -> u8 {
    let k = b.wrapping_mul(b).wrapping_mul(3).wrapping_add(9);
    let k = k.wrapping_mul(3).wrapping_add(8).wrapping_mul(2).wrapping_add(1);
    k.wrapping_mul(3).wrapping_add(8).wrapping_mul(c)
}

/// Per-file decryption state derived from the header.
struct Keys {
    encrypted: bool,
    xy: u8,
    xyf: u8,
    xyt: u8,
    remark_size: i32,
    f32: [u8; PIECE_COUNT],
}

impl Keys {
    fn from_header(header: &[u8]) -> Keys {
        let version = header[2];
        let mask = header[3];
        let (sum, key_xy, key_xyf, key_xyt) = (header[12], header[13], header[14], header[15]);
        let key_bytes = [
            (sum & mask) | header[8],
            (key_xy & mask) | header[9],
            (key_xyf & mask) | header[10],
            (key_xyt & mask) | header[11],
        ];
        let mut f32 = [0u8; PIECE_COUNT];
        for (i, key) in f32.iter_mut().enumerate() {
            *key = COPYRIGHT[i] & key_bytes[i % 4];
        }
        if version <= 10 {
            return Keys { encrypted: false, xy: 0, xyf: 0, xyt: 0, remark_size: 0, f32 };
        }
        let xy = calkey(key_xy, key_xy);
        let xyf = calkey(key_xyf, xy);
        let xyt = calkey(key_xyt, xyf);
        let remark_size = (sum as i32 * 256 + key_xy as i32) % 32000 + 767;
        Keys { encrypted: true, xy, xyf, xyt, remark_size, f32 }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    keys: Keys,
}

impl Reader<'_> {
    fn take(&mut self, len: usize) -> Result<Vec<u8>> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.bytes.len());
        let end = end.ok_or(ManualError::Truncated("XQF move data"))?;
        let mut out = self.bytes[self.pos..end].to_vec();
        if self.keys.encrypted {
            for (i, b) in out.iter_mut().enumerate() {
                *b = b.wrapping_sub(self.keys.f32[(self.pos + i) % PIECE_COUNT]);
            }
        }
        self.pos = end;
        Ok(out)
    }

    fn remark(&mut self, len: i32) -> Result<String> {
        if len <= 0 {
            return Ok(String::new());
        }
        let raw = self.take(len as usize)?;
        let text = raw.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    /// One record: squares, normalised flags and remark.
    fn record(&mut self, version: u8) -> Result<(u8, u8, u8, String)> {
        let data = self.take(4)?;
        let (from, to, raw_tag) = (data[0], data[1], data[2]);
        let (tag, has_remark) = if version <= 10 {
            let tag = (if raw_tag & 0xF0 != 0 { HAS_NEXT } else { 0 })
                | (if raw_tag & 0x0F != 0 { HAS_OTHER } else { 0 });
            (tag, true)
        } else {
            (raw_tag & 0xE0, raw_tag & HAS_REMARK != 0)
        };
        let remark = if has_remark {
            let size = self.take(4)?;
            let size = i32::from_le_bytes([size[0], size[1], size[2], size[3]]);
            self.remark(size.wrapping_sub(self.keys.remark_size))?
        } else {
            String::new()
        };
        Ok((from, to, tag, remark))
    }
}

fn xy_square(xy: u8) -> Result<Square> {
    if xy as usize >= SEAT_COUNT {
        return Err(CoreError::BadSquare(xy as i32).into());
    }
    Ok(Square::new((xy % 10) as usize, (xy / 10) as usize))
}

fn pascal_text(field: &[u8]) -> String {
    let len = (field[0] as usize).min(field.len() - 1);
    String::from_utf8_lossy(&field[1..1 + len]).into_owned()
}

fn read_header(manual: &mut ChessManual, header: &[u8], keys: &Keys) -> Result<()> {
    let version = header[2];

    let mut squares = [0u8; PIECE_COUNT];
    squares.copy_from_slice(&header[16..48]);
    if keys.encrypted {
        if version >= 12 {
            let stored = squares;
            for (i, &xy) in stored.iter().enumerate() {
                squares[(i + keys.xy as usize + 1) % PIECE_COUNT] = xy;
            }
        }
        for xy in squares.iter_mut() {
            *xy = xy.wrapping_sub(keys.xy);
        }
    }
    let mut seats = [NULL_CHAR; SEAT_COUNT];
    for (i, &xy) in squares.iter().enumerate() {
        if let Ok(sq) = xy_square(xy) {
            seats[sq.index()] = PIECE_ORDER[i] as char;
        }
    }
    let placement = piece_chars_to_fen(&seats.iter().collect::<String>())?;
    let side = if header[50] == 1 { Color::Black } else { Color::Red };

    let result = match header[51] {
        0 => "未知".to_string(),
        1 => "红胜".to_string(),
        2 => "黑胜".to_string(),
        3 => "和棋".to_string(),
        n => n.to_string(),
    };
    let play_type = match header[64] {
        0 => "全局".to_string(),
        1 => "开局".to_string(),
        2 => "中局".to_string(),
        3 => "残局".to_string(),
        n => n.to_string(),
    };
    let info = &mut manual.info;
    info.insert("Version".to_string(), version.to_string());
    info.insert("Result".to_string(), result);
    info.insert("PlayType".to_string(), play_type);
    for (key, offset, width) in TEXT_FIELDS {
        info.insert(key.to_string(), pascal_text(&header[offset..offset + width]));
    }
    info.insert(FEN_KEY.to_string(), fen_plus(&placement, side));
    Ok(())
}

pub fn read(manual: &mut ChessManual, bytes: &[u8]) -> Result<()> {
    if bytes.len() < 2 || bytes[0] != b'X' || bytes[1] != b'Q' {
        return Err(ManualError::BadSignature);
    }
    if bytes.len() < HEADER_LEN {
        return Err(ManualError::Truncated("XQF header"));
    }
    let header = &bytes[..HEADER_LEN];
    let version = header[2];
    if header[12..16].iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) != 0 {
        return Err(ManualError::BadChecksum);
    }
    if version > MAX_VERSION {
        return Err(ManualError::UnsupportedVersion(version));
    }

    let keys = Keys::from_header(header);
    read_header(manual, header, &keys)?;
    manual.set_board_from_info()?;

    let (xyf, xyt) = (keys.xyf, keys.xyt);
    let mut reader = Reader { bytes, pos: HEADER_LEN, keys };
    let (_, _, root_tag, root_remark) = match reader.record(version) {
        Ok(record) => record,
        Err(ManualError::Truncated(what)) => {
            warn!(what, "XQF record has no move section");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    manual.tree.node_mut(NodeId::ROOT).remark = root_remark;

    let mut pending: Vec<(NodeId, bool)> = Vec::new();
    if root_tag & HAS_NEXT != 0 {
        pending.push((NodeId::ROOT, false));
    }
    while let Some((anchor, is_other)) = pending.pop() {
        let (from, to, tag, remark) = match reader.record(version) {
            Ok(record) => record,
            Err(ManualError::Truncated(what)) => {
                warn!(what, offset = reader.pos, "XQF move data ends early, keeping moves read so far");
                break;
            }
            Err(e) => return Err(e),
        };
        let from = xy_square(from.wrapping_sub(0x18_u8.wrapping_add(xyf)))?;
        let to = xy_square(to.wrapping_sub(0x20_u8.wrapping_add(xyt)))?;
        let coords = Coords::new(from, to);
        let id = if is_other {
            manual.tree.add_other(anchor, coords, remark)
        } else {
            manual.tree.add_next(anchor, coords, remark)
        };
        if tag & HAS_OTHER != 0 {
            pending.push((id, true));
        }
        if tag & HAS_NEXT != 0 {
            pending.push((id, false));
        }
    }
    debug!(version, "XQF record decoded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RecFormat;

    /// Opening squares in file order, `col * 10 + row`.
    const OPENING_XY: [u8; PIECE_COUNT] = [
        0, 10, 20, 30, 40, 50, 60, 70, 80, 12, 72, 3, 23, 43, 63, 83, //
        9, 19, 29, 39, 49, 59, 69, 79, 89, 17, 77, 6, 26, 46, 66, 86,
    ];

    // Version 18 file for `1. 炮二平五 {中炮} (1. 相三进五) 马８进７`: mask FF, or-bytes
    // 11 22 33 44, key bytes 10 36 5A 60. That gives xy = 174, xyf = 134, xyt = 174, a
    // remark size offset of 4917 and pieces rotated by 15 slots.
    const KEYS_V18: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x10, 0x36, 0x5A, 0x60];
    const PIECES_V18: [u8; PIECE_COUNT] = [
        0x01, 0xB7, 0xC1, 0xCB, 0xD5, 0xDF, 0xE9, 0xF3, 0xFD, 0x07, 0xBF, 0xFB, 0xB4, 0xC8, 0xDC, 0xF0, //
        0x04, 0xAE, 0xB8, 0xC2, 0xCC, 0xD6, 0xE0, 0xEA, 0xF4, 0xFE, 0xBA, 0xF6, 0xB1, 0xC5, 0xD9, 0xED,
    ];
    const MOVES_V18: [u8; 26] = [
        0x11, 0x20, 0xC3, 0x20, // root, next
        0xE6, 0xFA, 0x4B, 0x60, 0x4C, 0x45, 0x69, 0x64, 0xE4, 0xEC, 0xCD, 0x2B, 0x92, 0xD4, // h2e2
        0x0D, 0x55, 0x01, 0x26, // h9g7
        0x3D, 0x18, 0x11, 0x20, // g0e2
    ];

    fn header(version: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&[b'X', b'Q', version, 0xFF]);
        bytes[51] = 1;
        bytes[64] = 1;
        bytes[208] = 6;
        bytes[209..215].copy_from_slice("测试".as_bytes());
        bytes
    }

    fn sample_v18() -> Vec<u8> {
        let mut bytes = header(18);
        bytes[8..16].copy_from_slice(&KEYS_V18);
        bytes[16..48].copy_from_slice(&PIECES_V18);
        bytes.extend(MOVES_V18);
        bytes
    }

    /// The same game unscrambled: squares offset by 0x18 and 0x20, tags in nibbles and
    /// a remark size on every record.
    fn sample_v10() -> Vec<u8> {
        let mut bytes = header(10);
        bytes[16..48].copy_from_slice(&OPENING_XY);
        bytes.extend([0x00, 0x00, 0xF0, 0x00, 0, 0, 0, 0]);
        bytes.extend([0x60, 0x4A, 0xFF, 0x00, 6, 0, 0, 0]);
        bytes.extend("中炮".as_bytes());
        bytes.extend([0x67, 0x63, 0x00, 0x00, 0, 0, 0, 0]);
        bytes.extend([0x54, 0x4A, 0x00, 0x00, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_keys_from_header() {
        let keys = Keys::from_header(&sample_v18());
        assert!(keys.encrypted);
        assert_eq!((keys.xy, keys.xyf, keys.xyt), (174, 134, 174));
        assert_eq!(keys.remark_size, 4917);
        // '[' & (0x10 | 0x11), '(' & (0x36 | 0x22)
        assert_eq!(&keys.f32[..2], &[0x11, 0x20]);
        assert!(!Keys::from_header(&sample_v10()).encrypted);
    }

    #[test]
    fn test_read_encrypted() {
        let manual = ChessManual::from_bytes(&sample_v18(), RecFormat::Xqf).unwrap();
        assert_eq!(manual.info()["Event"], "测试");
        assert_eq!(manual.info()["Result"], "红胜");
        assert_eq!(manual.info()["PlayType"], "开局");
        assert_eq!(manual.info()["Version"], "18");
        assert_eq!(manual.fen(), fen_plus(xiangqi_core::FIRST_FEN, Color::Red));
        assert_eq!(manual.mainline_iccs(), vec!["h2e2", "h9g7"]);
        let first = manual.tree().next(NodeId::ROOT).unwrap();
        let node = manual.tree().node(first);
        assert_eq!(node.remark, "中炮");
        assert_eq!(node.zh, "炮二平五");
        let other = node.other().unwrap();
        assert_eq!(manual.tree().node(other).zh, "相三进五");
        assert_eq!(manual.stats().move_count, 3);
    }

    #[test]
    fn test_read_plain_version_10() {
        let plain = ChessManual::from_bytes(&sample_v10(), RecFormat::Xqf).unwrap();
        let scrambled = ChessManual::from_bytes(&sample_v18(), RecFormat::Xqf).unwrap();
        assert_eq!(plain.info()["Version"], "10");
        assert_eq!(plain.fen(), scrambled.fen());
        assert_eq!(plain.move_list(), scrambled.move_list());
    }

    #[test]
    fn test_header_errors() {
        let mut bytes = sample_v18();
        bytes[1] = b'X';
        assert!(matches!(ChessManual::from_bytes(&bytes, RecFormat::Xqf), Err(ManualError::BadSignature)));

        let mut bytes = sample_v18();
        bytes[15] ^= 1;
        assert!(matches!(ChessManual::from_bytes(&bytes, RecFormat::Xqf), Err(ManualError::BadChecksum)));

        let mut bytes = sample_v18();
        bytes[2] = 19;
        assert!(matches!(
            ChessManual::from_bytes(&bytes, RecFormat::Xqf),
            Err(ManualError::UnsupportedVersion(19))
        ));

        assert!(matches!(
            ChessManual::from_bytes(b"XQ\x12", RecFormat::Xqf),
            Err(ManualError::Truncated(_))
        ));
    }

    #[test]
    fn test_truncated_moves_keep_prefix() {
        let mut bytes = sample_v18();
        // Drop the variation record.
        bytes.truncate(bytes.len() - 4);
        let manual = ChessManual::from_bytes(&bytes, RecFormat::Xqf).unwrap();
        assert_eq!(manual.stats().move_count, 2);
        assert_eq!(manual.mainline_iccs(), vec!["h2e2", "h9g7"]);
    }

    #[test]
    fn test_calkey_wraps() {
        assert_eq!(calkey(0, 1), 221);
        assert_eq!(calkey(3, 2), 134);
        assert_eq!(calkey(1, 0), 0);
    }
}
