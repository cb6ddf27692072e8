//! Shared fixtures: sample records and a synthetic XQF encoder.
#![allow(dead_code)]

/// A record with nested variations and remarks, in coordinate notation.
pub const SAMPLE_ICCS: &str = r#"[Event "全国象棋个人赛"]
[Red "红方"]
[Black "黑方"]
[Result "红胜"]

{中炮对屏风马}
1. h2e2 {中炮} h9g7 (1. ... h7e7 {顺炮} 2. h0g2 (2. b0c2)) 2. h0g2 i9h9
3. i0h0 b9c7 (3. ... g6g5 4. h0h6) 4. c3c4
"#;

/// The same game as [`SAMPLE_ICCS`] in Chinese notation.
pub const SAMPLE_ZH: &str = r#"[Event "全国象棋个人赛"]
[Red "红方"]
[Black "黑方"]
[Result "红胜"]

{中炮对屏风马}
1. 炮二平五 {中炮} 马８进７ (1. ... 炮８平５ {顺炮} 2. 马二进三 (2. 马八进七)) 2. 马二进三 车９平８
3. 车一平二 马２进３ (3. ... 卒７进１ 4. 车二进六) 4. 兵七进一
"#;

pub const SAMPLE_MAINLINE: [&str; 7] = ["h2e2", "h9g7", "h0g2", "i9h9", "i0h0", "b9c7", "c3c4"];

/// Standard opening in XQF piece order, `col * 10 + row`.
pub const OPENING_XY: [u8; 32] = [
    0, 10, 20, 30, 40, 50, 60, 70, 80, 12, 72, 3, 23, 43, 63, 83, //
    9, 19, 29, 39, 49, 59, 69, 79, 89, 17, 77, 6, 26, 46, 66, 86,
];

/// Piece square outside the board: the piece is not placed.
pub const OFF_BOARD: u8 = 200;

/// Encodes `row, col` the way XQF does.
pub fn xy(row: u8, col: u8) -> u8 {
    col * 10 + row
}

#[derive(Clone)]
pub struct XqfMove {
    pub from: u8,
    pub to: u8,
    pub next: bool,
    pub other: bool,
    pub remark: &'static str,
}

pub fn xqf_move(from: u8, to: u8, next: bool, other: bool, remark: &'static str) -> XqfMove {
    XqfMove { from, to, next, other, remark }
}

/// Builds XQF files byte for byte, scrambling them when the version asks for it.
pub struct XqfBuilder {
    pub version: u8,
    pub pieces: [u8; 32],
    pub black_to_move: bool,
    pub event: &'static str,
    pub red: &'static str,
    pub root_remark: &'static str,
    /// Records in file order: node, its mainline subtree, then its variation subtree.
    pub moves: Vec<XqfMove>,
}

impl Default for XqfBuilder {
    fn default() -> Self {
        Self {
            version: 18,
            pieces: OPENING_XY,
            black_to_move: false,
            event: "",
            red: "",
            root_remark: "",
            moves: Vec::new(),
        }
    }
}

const KEY_MASK: u8 = 0xFF;
const KEY_OR: [u8; 4] = [0x03, 0x5C, 0x21, 0x48];
// Bytes 12..16 must sum to zero modulo 256.
const KEYS: [u8; 4] = [0x2E, 0x91, 0x07, 0x3A];

fn calkey(b: u8, c: u8) -> u8 {
    let b = b as u32;
    ((((((b * b) * 3 + 9) * 3 + 8) * 2 + 1) * 3 + 8) * c as u32) as u8
}

impl XqfBuilder {
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; 1024];
        out[0] = b'X';
        out[1] = b'Q';
        out[2] = self.version;
        out[3] = KEY_MASK;
        out[8..12].copy_from_slice(&KEY_OR);
        out[12..16].copy_from_slice(&KEYS);
        out[50] = u8::from(self.black_to_move);
        put_text(&mut out[208..272], self.event);
        put_text(&mut out[304..320], self.red);

        let encrypted = self.version > 10;
        let (key_xy, key_xyf, key_xyt, key_rmk) = if encrypted {
            let key_xy = calkey(KEYS[1], KEYS[1]);
            let key_xyf = calkey(KEYS[2], key_xy);
            let key_xyt = calkey(KEYS[3], key_xyf);
            let key_rmk = (KEYS[0] as i32 * 256 + KEYS[1] as i32) % 32000 + 767;
            (key_xy, key_xyf, key_xyt, key_rmk)
        } else {
            (0, 0, 0, 0)
        };

        for i in 0..32 {
            let source = if self.version >= 12 { (i + key_xy as usize + 1) % 32 } else { i };
            out[16 + i] = self.pieces[source].wrapping_add(key_xy);
        }

        let mut body = Vec::new();
        let root_next = !self.moves.is_empty();
        self.push_record(&mut body, 0, 0, root_next, false, self.root_remark, key_rmk);
        for m in &self.moves {
            let from = m.from.wrapping_add(0x18u8.wrapping_add(key_xyf));
            let to = m.to.wrapping_add(0x20u8.wrapping_add(key_xyt));
            self.push_record(&mut body, from, to, m.next, m.other, m.remark, key_rmk);
        }

        let key_bytes: Vec<u8> = (0..4).map(|i| (KEYS[i] & KEY_MASK) | KEY_OR[i]).collect();
        let copyright = b"[(C) Copyright Mr. Dong Shiwei.]";
        for (i, b) in body.into_iter().enumerate() {
            let pos = 1024 + i;
            let b = if encrypted {
                b.wrapping_add(copyright[pos % 32] & key_bytes[pos % 32 % 4])
            } else {
                b
            };
            out.push(b);
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn push_record(
        &self,
        body: &mut Vec<u8>,
        from: u8,
        to: u8,
        next: bool,
        other: bool,
        remark: &str,
        key_rmk: i32,
    ) {
        let tag = if self.version <= 10 {
            (if next { 0xF0 } else { 0 }) | (if other { 0x0F } else { 0 })
        } else {
            (if next { 0x80 } else { 0 })
                | (if other { 0x40 } else { 0 })
                | (if remark.is_empty() { 0 } else { 0x20 })
        };
        body.extend([from, to, tag, 0]);
        if self.version <= 10 || !remark.is_empty() {
            body.extend((remark.len() as i32 + key_rmk).to_le_bytes());
            body.extend(remark.as_bytes());
        }
    }
}

fn put_text(field: &mut [u8], text: &str) {
    field[0] = text.len() as u8;
    field[1..1 + text.len()].copy_from_slice(text.as_bytes());
}
