//! Xiangqi game records: a move tree with variations and remarks, a navigation cursor over
//! the live board, and readers/writers for the XQF, BIN, JSON and PGN family of formats.

pub mod error;
pub mod format;
pub mod manual;
pub mod move_tree;

#[cfg(test)]
mod testing;

pub use error::{ManualError, Result};
pub use format::RecFormat;
pub use manual::{ChessManual, ManualStats, Notation, FEN_KEY};
pub use move_tree::{MoveNode, MoveTree, NodeId};
