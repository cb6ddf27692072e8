//! Fixtures shared by the format tests.

use xiangqi_core::{Coords, Square};

use crate::manual::ChessManual;
use crate::move_tree::NodeId;

pub(crate) fn mv(from: i32, to: i32) -> Coords {
    Coords::new(Square::from_rowcol(from).unwrap(), Square::from_rowcol(to).unwrap())
}

/// Opening with two nested variations and remarks on the root, a mainline move and a variation.
///
/// ```text
/// 1. 炮二平五 马８进７ 2. 马二进三 车９平８
///    (1... 炮８平５ 2. 马二进三 (2. 马八进七))
///    (1. 相三进五)
/// ```
pub(crate) fn sample_manual() -> ChessManual {
    let mut m = ChessManual::new();
    m.set_info("Event", "测试");
    m.set_info("Red", "红方");
    m.set_info("Black", "黑方");
    m.set_remark(NodeId::ROOT, "开局注释").unwrap();
    let a = m.add_next(NodeId::ROOT, mv(27, 24), "中炮").unwrap();
    m.add_other(a, mv(6, 24), "").unwrap();
    let b = m.add_next(a, mv(97, 76), "").unwrap();
    let c = m.add_other(b, mv(77, 74), "顺炮").unwrap();
    let c2 = m.add_next(c, mv(7, 26), "").unwrap();
    m.add_other(c2, mv(1, 22), "").unwrap();
    let d = m.add_next(b, mv(7, 26), "").unwrap();
    m.add_next(d, mv(98, 97), "").unwrap();
    m
}
