//! Game record: metadata, the live board and the move tree with its cursor.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;
use xiangqi_core::fen::{fen_plus, side_of};
use xiangqi_core::{Board, Color, Coords, Transform, FIRST_FEN};

use crate::error::{ManualError, Result};
use crate::format::{self, RecFormat};
use crate::move_tree::{MoveTree, NodeId};

pub const FEN_KEY: &str = "FEN";

/// Notation of a single move token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Iccs,
    Zh,
}

/// Aggregate counters refreshed by every renumbering walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManualStats {
    pub move_count: usize,
    pub remark_count: usize,
    pub remark_len_max: usize,
    pub max_row: usize,
    pub max_col: usize,
}

#[derive(Debug, Clone)]
pub struct ChessManual {
    pub(crate) info: BTreeMap<String, String>,
    pub(crate) board: Board,
    pub(crate) tree: MoveTree,
    pub(crate) current: NodeId,
    pub(crate) stats: ManualStats,
}

impl Default for ChessManual {
    fn default() -> Self {
        Self::new()
    }
}

enum Visit {
    Enter(NodeId),
    Branch(NodeId),
    Leave(NodeId),
}

impl ChessManual {
    /// Empty record at the standard opening.
    pub fn new() -> Self {
        let mut manual = ChessManual {
            info: BTreeMap::new(),
            board: Board::new(),
            tree: MoveTree::new(),
            current: NodeId::ROOT,
            stats: ManualStats::default(),
        };
        manual.reset();
        manual
    }

    pub fn reset(&mut self) {
        self.info.clear();
        self.info.insert(FEN_KEY.to_string(), fen_plus(FIRST_FEN, Color::Red));
        self.board = Board::new();
        self.tree = MoveTree::new();
        self.current = NodeId::ROOT;
        self.stats = ManualStats::default();
    }

    /// Loads a record, choosing the format by extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fmt = RecFormat::from_path(path);
        let bytes = fs::read(path)?;
        let manual = Self::from_bytes(&bytes, fmt)?;
        debug!(path = %path.display(), format = %fmt, moves = manual.stats.move_count, "record loaded");
        Ok(manual)
    }

    pub fn from_bytes(bytes: &[u8], fmt: RecFormat) -> Result<Self> {
        let mut manual = Self::new();
        if fmt.is_text() {
            let text = String::from_utf8_lossy(bytes);
            format::pgn::read(&mut manual, &text, fmt)?;
        } else {
            match fmt {
                RecFormat::Xqf => format::xqf::read(&mut manual, bytes)?,
                RecFormat::Bin => format::bin::read(&mut manual, bytes)?,
                _ => format::json::read(&mut manual, bytes)?,
            }
        }
        manual.set_board_from_info()?;
        manual.current = NodeId::ROOT;
        manual.renumber()?;
        Ok(manual)
    }

    /// Saves the record, choosing the format by extension.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let fmt = RecFormat::from_path(path);
        fs::write(path, self.to_bytes(fmt)?)?;
        debug!(path = %path.display(), format = %fmt, "record saved");
        Ok(())
    }

    pub fn to_bytes(&self, fmt: RecFormat) -> Result<Vec<u8>> {
        if fmt.is_text() {
            return Ok(format::pgn::write(self, fmt).into_bytes());
        }
        Ok(match fmt {
            RecFormat::Xqf => return Err(ManualError::ReadOnly("XQF")),
            RecFormat::Bin => format::bin::write(self)?,
            _ => format::json::write(self)?,
        })
    }

    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    pub fn set_info(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.info.insert(key.into(), value.into());
    }

    /// Starting position with side-to-move suffix.
    pub fn fen(&self) -> &str {
        self.info.get(FEN_KEY).map_or(FIRST_FEN, String::as_str)
    }

    /// Places the pieces named by the `FEN` entry, adding the standard opening when absent.
    pub(crate) fn set_board_from_info(&mut self) -> Result<()> {
        if !self.info.contains_key(FEN_KEY) {
            self.info.insert(FEN_KEY.to_string(), fen_plus(FIRST_FEN, Color::Red));
        }
        let fen = self.fen().to_string();
        self.board.set_fen(&fen)?;
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn stats(&self) -> ManualStats {
        self.stats
    }

    pub fn remark(&self) -> &str {
        &self.tree.node(NodeId::ROOT).remark
    }

    pub fn set_remark(&mut self, id: NodeId, remark: impl Into<String>) -> Result<()> {
        self.tree.node_mut(id).remark = remark.into();
        self.renumber()
    }

    /// Adds `coords` as the continuation of `id` and refreshes numbering.
    pub fn add_next(&mut self, id: NodeId, coords: Coords, remark: &str) -> Result<NodeId> {
        let new_id = self.tree.add_next(id, coords, remark);
        self.renumber_or_cut(id, false)?;
        Ok(new_id)
    }

    /// Adds `coords` as the variation of `id` and refreshes numbering.
    pub fn add_other(&mut self, id: NodeId, coords: Coords, remark: &str) -> Result<NodeId> {
        let new_id = self.tree.add_other(id, coords, remark);
        self.renumber_or_cut(id, true)?;
        Ok(new_id)
    }

    fn renumber_or_cut(&mut self, id: NodeId, other: bool) -> Result<()> {
        let result = self.renumber();
        if result.is_err() {
            if other {
                self.tree.cut_other(id);
            } else {
                self.tree.cut_next(id);
            }
            self.renumber()?;
        }
        result
    }

    /// Like [`add_next`](Self::add_next) with the move given as notation text,
    /// read from the position after `id`.
    pub fn add_next_text(&mut self, id: NodeId, text: &str, notation: Notation, remark: &str) -> Result<NodeId> {
        let coords = self.decode_at(id, text, notation)?;
        self.add_next(id, coords, remark)
    }

    /// Like [`add_other`](Self::add_other) with the move given as notation text,
    /// read from the position `id` is played from.
    pub fn add_other_text(&mut self, id: NodeId, text: &str, notation: Notation, remark: &str) -> Result<NodeId> {
        let parent = self
            .tree
            .parent(id)
            .ok_or_else(|| ManualError::Malformed("the root has no variation".to_string()))?;
        let coords = self.decode_at(parent, text, notation)?;
        self.add_other(id, coords, remark)
    }

    fn decode_at(&self, id: NodeId, text: &str, notation: Notation) -> Result<Coords> {
        let board = self.board_after(id)?;
        let coords = match notation {
            Notation::Iccs => Coords::from_iccs(text)?,
            Notation::Zh => board.coords_from_zh(text)?,
        };
        if !board.is_legal(coords) {
            return Err(ManualError::Malformed(format!("illegal move {text}")));
        }
        Ok(coords)
    }

    /// Position after `id` is played, leaving the cursor alone.
    pub fn board_after(&self, id: NodeId) -> Result<Board> {
        let mut board = Board::from_fen(self.fen())?;
        for node in self.tree.path_to(id) {
            if let Some(coords) = self.tree.coords(node) {
                board.apply(coords);
            }
        }
        Ok(board)
    }

    /// Decodes a move token against the board at the cursor and appends it there.
    pub fn append(&mut self, text: &str, notation: Notation, remark: &str) -> Result<NodeId> {
        let coords = self.decode(text, notation)?;
        self.add_next(self.current, coords, remark)
    }

    /// Reads a move token on the live board; a move the board does not allow is rejected.
    pub(crate) fn decode(&self, text: &str, notation: Notation) -> Result<Coords> {
        let coords = match notation {
            Notation::Iccs => Coords::from_iccs(text)?,
            Notation::Zh => self.board.coords_from_zh(text)?,
        };
        if !self.board.is_legal(coords) {
            return Err(ManualError::Malformed(format!("illegal move {text}")));
        }
        Ok(coords)
    }

    pub fn cut_next(&mut self, id: NodeId) -> Result<()> {
        if self.tree.path_to(self.current).iter().any(|&n| self.tree.parent(n) == Some(id)) {
            self.back_to(id);
        }
        self.tree.cut_next(id);
        self.renumber()
    }

    pub fn cut_other(&mut self, id: NodeId) -> Result<()> {
        self.go_to(NodeId::ROOT);
        self.tree.cut_other(id);
        self.renumber()
    }

    pub(crate) fn done(&mut self, id: NodeId) {
        let node = self.tree.node_mut(id);
        if let Some(coords) = node.coords {
            node.captured = self.board.apply(coords);
        }
    }

    pub(crate) fn undo(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        if let Some(coords) = node.coords {
            self.board.unapply(coords, node.captured);
        }
    }

    /// Advances along the mainline; no-op at the end of a line.
    pub fn go(&mut self) {
        if let Some(next) = self.tree.next(self.current) {
            self.current = next;
            self.done(next);
        }
    }

    /// Steps back to the position the current move was played from; no-op at the root.
    pub fn back(&mut self) {
        if self.current != NodeId::ROOT {
            self.undo(self.current);
            self.current = self.tree.parent(self.current).unwrap_or(NodeId::ROOT);
        }
    }

    /// Swaps the current move for its variation.
    pub fn go_other(&mut self) {
        if self.current == NodeId::ROOT {
            return;
        }
        if let Some(other) = self.tree.other(self.current) {
            self.undo(self.current);
            self.current = other;
            self.done(other);
        }
    }

    /// Retreats until `id` (an ancestor of the cursor) or the root is reached.
    pub fn back_to(&mut self, id: NodeId) {
        while self.current != NodeId::ROOT && self.current != id {
            self.back();
        }
    }

    /// Positive values advance along the mainline, negative values retreat.
    pub fn go_inc(&mut self, inc: i32) {
        for _ in 0..inc.unsigned_abs() {
            if inc > 0 {
                self.go();
            } else {
                self.back();
            }
        }
    }

    /// Moves the cursor to any node, replaying its path from the root.
    pub fn go_to(&mut self, id: NodeId) {
        self.back_to(NodeId::ROOT);
        for node in self.tree.path_to(id) {
            self.done(node);
            self.current = node;
        }
    }

    /// Transforms the starting position and every stored move, keeping the cursor's path.
    pub fn change_side(&mut self, transform: Transform) -> Result<()> {
        let path = self.tree.path_to(self.current);
        self.back_to(NodeId::ROOT);
        self.board.change_side(transform);
        if let Some(map) = transform.square_map() {
            self.tree.map_coords(|c| c.map(map));
        }
        let side = side_of(self.fen());
        let side = if transform == Transform::Exchange { side.other() } else { side };
        self.info.insert(FEN_KEY.to_string(), fen_plus(&self.board.fen(), side));
        self.renumber()?;
        for id in path {
            self.done(id);
            self.current = id;
        }
        Ok(())
    }

    /// Full walk refreshing Chinese notation, layout counters and aggregate totals.
    /// Moves are applied on the way down so each node is described from its own position.
    pub(crate) fn renumber(&mut self) -> Result<()> {
        let path = self.tree.path_to(self.current);
        self.back_to(NodeId::ROOT);
        let result = self.walk_numbers();
        if result.is_err() {
            self.set_board_from_info()?;
            self.current = NodeId::ROOT;
            return result;
        }
        for id in path {
            self.done(id);
            self.current = id;
        }
        Ok(())
    }

    fn walk_numbers(&mut self) -> Result<()> {
        let mut stats = ManualStats::default();
        let mut stack: Vec<Visit> = self.tree.next(NodeId::ROOT).map(Visit::Enter).into_iter().collect();
        while let Some(visit) = stack.pop() {
            let id = match visit {
                Visit::Leave(id) => {
                    self.undo(id);
                    continue;
                }
                Visit::Branch(id) => {
                    stats.max_col += 1;
                    id
                }
                Visit::Enter(id) => id,
            };
            let coords = self
                .tree
                .coords(id)
                .ok_or_else(|| ManualError::Malformed("move without squares".to_string()))?;
            let zh = self.board.zh(coords)?;

            let node = self.tree.node_mut(id);
            node.zh = zh;
            stats.move_count += 1;
            stats.max_col = stats.max_col.max(node.other_no);
            stats.max_row = stats.max_row.max(node.next_no);
            node.cc_col_no = stats.max_col;
            if !node.remark.is_empty() {
                stats.remark_count += 1;
                stats.remark_len_max = stats.remark_len_max.max(node.remark.chars().count());
            }
            let (next_no, other_no) = (node.next_no, node.other_no);
            let (next, other) = (node.next(), node.other());

            if let Some(other) = other {
                let o = self.tree.node_mut(other);
                (o.next_no, o.other_no) = (next_no, other_no + 1);
                stack.push(Visit::Branch(other));
            }
            stack.push(Visit::Leave(id));
            if let Some(next) = next {
                let n = self.tree.node_mut(next);
                (n.next_no, n.other_no) = (next_no + 1, other_no);
                stack.push(Visit::Enter(next));
            }
            self.done(id);
        }
        self.stats = stats;
        Ok(())
    }

    /// Debug dump of every move, one summary line each.
    pub fn move_list(&self) -> String {
        let mut out = String::new();
        for id in self.tree.preorder(NodeId::ROOT) {
            out.push_str(&self.tree.node(id).summary());
            out.push('\n');
        }
        out
    }

    /// Mainline moves from the root, as coordinate notation.
    pub fn mainline_iccs(&self) -> Vec<String> {
        let mut moves = Vec::new();
        let mut cur = self.tree.next(NodeId::ROOT);
        while let Some(id) = cur {
            moves.push(self.tree.node(id).iccs());
            cur = self.tree.next(id);
        }
        moves
    }
}

impl fmt::Display for ChessManual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::pgn::write_info(self))?;
        f.write_str(&format::cc::write_moves(self))
    }
}
