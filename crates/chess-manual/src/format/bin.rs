//! Compact binary record.
//!
//! Layout: a flag byte (`0x80` metadata, `0x40` root remark, `0x20` moves), then an optional
//! metadata count with key/value strings, an optional root remark, then move records in
//! pre-order. Each record is `from`, `to` (`row * 10 + col`) and a flag byte (`0x80` next,
//! `0x40` other, `0x20` remark) followed by the remark when flagged. Strings are a
//! little-endian `i32` byte length plus UTF-8 bytes.

use xiangqi_core::{Coords, Square};

use crate::error::{ManualError, Result};
use crate::manual::ChessManual;
use crate::move_tree::NodeId;

const HAS_NEXT: u8 = 0x80;
const HAS_OTHER: u8 = 0x40;
const HAS_REMARK: u8 = 0x20;

const HAS_INFO: u8 = 0x80;
const HAS_ROOT_REMARK: u8 = 0x40;
const HAS_MOVES: u8 = 0x20;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.bytes.len());
        let end = end.ok_or(ManualError::Truncated("binary record"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn string(&mut self) -> Result<String> {
        let raw = self.take(4)?;
        let len = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let len = usize::try_from(len)
            .map_err(|_| ManualError::Malformed(format!("negative string length {len}")))?;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn square(&mut self) -> Result<Square> {
        Ok(Square::from_rowcol(self.byte()? as i32)?)
    }
}

pub fn read(manual: &mut ChessManual, bytes: &[u8]) -> Result<()> {
    let mut reader = Reader { bytes, pos: 0 };
    let tag = reader.byte()?;
    if tag & HAS_INFO != 0 {
        let count = reader.byte()?;
        for _ in 0..count {
            let key = reader.string()?;
            let value = reader.string()?;
            manual.info.insert(key, value);
        }
    }
    manual.set_board_from_info()?;
    if tag & HAS_ROOT_REMARK != 0 {
        manual.tree.node_mut(NodeId::ROOT).remark = reader.string()?;
    }
    if tag & HAS_MOVES == 0 {
        return Ok(());
    }

    let mut pending = vec![(NodeId::ROOT, false)];
    while let Some((anchor, is_other)) = pending.pop() {
        let from = reader.square()?;
        let to = reader.square()?;
        let flags = reader.byte()?;
        let remark = if flags & HAS_REMARK != 0 { reader.string()? } else { String::new() };
        let coords = Coords::new(from, to);
        let id = if is_other {
            manual.tree.add_other(anchor, coords, remark)
        } else {
            manual.tree.add_next(anchor, coords, remark)
        };
        if flags & HAS_OTHER != 0 {
            pending.push((id, true));
        }
        if flags & HAS_NEXT != 0 {
            pending.push((id, false));
        }
    }
    Ok(())
}

fn put_string(out: &mut Vec<u8>, text: &str) -> Result<()> {
    let len = i32::try_from(text.len())
        .map_err(|_| ManualError::Malformed(format!("string of {} bytes", text.len())))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

pub fn write(manual: &ChessManual) -> Result<Vec<u8>> {
    let tree = &manual.tree;
    let root = tree.node(NodeId::ROOT);
    let mut out = Vec::new();
    let mut tag = 0;
    if !manual.info.is_empty() {
        tag |= HAS_INFO;
    }
    if !root.remark.is_empty() {
        tag |= HAS_ROOT_REMARK;
    }
    if root.next().is_some() {
        tag |= HAS_MOVES;
    }
    out.push(tag);
    if tag & HAS_INFO != 0 {
        let count = u8::try_from(manual.info.len())
            .map_err(|_| ManualError::Malformed(format!("{} info entries", manual.info.len())))?;
        out.push(count);
        for (key, value) in &manual.info {
            put_string(&mut out, key)?;
            put_string(&mut out, value)?;
        }
    }
    if tag & HAS_ROOT_REMARK != 0 {
        put_string(&mut out, &root.remark)?;
    }
    for id in tree.moves() {
        let node = tree.node(id);
        let Some(coords) = node.coords else { continue };
        let mut flags = 0;
        if node.next().is_some() {
            flags |= HAS_NEXT;
        }
        if node.other().is_some() {
            flags |= HAS_OTHER;
        }
        if !node.remark.is_empty() {
            flags |= HAS_REMARK;
        }
        out.extend_from_slice(&[coords.from.rowcol(), coords.to.rowcol(), flags]);
        if flags & HAS_REMARK != 0 {
            put_string(&mut out, &node.remark)?;
        }
    }
    Ok(out)
}
