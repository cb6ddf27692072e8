//! JSON record: `{"info": {..}, "remark": "..", "moves": {"f", "t", "r"?, "n"?, "o"?}}`.
//!
//! Squares are `row * 10 + col`. `n` nests the mainline continuation, `o` the variation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use xiangqi_core::{Coords, Square};

use crate::error::Result;
use crate::manual::ChessManual;
use crate::move_tree::NodeId;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonRecord {
    #[serde(default)]
    info: BTreeMap<String, String>,
    #[serde(default)]
    remark: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    moves: Option<JsonMove>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonMove {
    f: i32,
    t: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<Box<JsonMove>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    o: Option<Box<JsonMove>>,
}

pub fn read(manual: &mut ChessManual, bytes: &[u8]) -> Result<()> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let record = JsonRecord::deserialize(&mut de)?;
    de.end()?;

    manual.info.extend(record.info);
    manual.set_board_from_info()?;
    manual.tree.node_mut(NodeId::ROOT).remark = record.remark;

    let mut pending: Vec<(NodeId, bool, JsonMove)> =
        record.moves.map(|m| (NodeId::ROOT, false, m)).into_iter().collect();
    while let Some((anchor, is_other, item)) = pending.pop() {
        let JsonMove { f, t, r, n, o } = item;
        let coords = Coords::new(Square::from_rowcol(f)?, Square::from_rowcol(t)?);
        let remark = r.unwrap_or_default();
        let id = if is_other {
            manual.tree.add_other(anchor, coords, remark)
        } else {
            manual.tree.add_next(anchor, coords, remark)
        };
        if let Some(o) = o {
            pending.push((id, true, *o));
        }
        if let Some(n) = n {
            pending.push((id, false, *n));
        }
    }
    Ok(())
}

pub fn write(manual: &ChessManual) -> Result<Vec<u8>> {
    let tree = &manual.tree;
    // Children follow their parent in pre-order, so the reverse builds leaves first.
    let order: Vec<NodeId> = tree.moves().collect();
    let mut built: HashMap<NodeId, JsonMove> = HashMap::with_capacity(order.len());
    for id in order.into_iter().rev() {
        let node = tree.node(id);
        let Some(coords) = node.coords else { continue };
        let item = JsonMove {
            f: coords.from.rowcol() as i32,
            t: coords.to.rowcol() as i32,
            r: (!node.remark.is_empty()).then(|| node.remark.clone()),
            n: node.next().and_then(|n| built.remove(&n)).map(Box::new),
            o: node.other().and_then(|o| built.remove(&o)).map(Box::new),
        };
        built.insert(id, item);
    }
    let record = JsonRecord {
        info: manual.info.clone(),
        remark: tree.node(NodeId::ROOT).remark.clone(),
        moves: tree.next(NodeId::ROOT).and_then(|id| built.remove(&id)),
    };
    Ok(serde_json::to_vec(&record)?)
}
