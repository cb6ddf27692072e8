//! PGN-style text records: a `[Key "Value"]` block, a blank line, then the moves.
//!
//! Move text uses coordinate (`h2e2`) or Chinese (`炮二平五`) tokens, bout numbers as `N.`,
//! `{...}` remarks after a move, and `(...)` around a variation of the preceding move.

use regex::Regex;
use xiangqi_core::piece::zh_chars;

use crate::error::{ManualError, Result};
use crate::format::{cc, RecFormat};
use crate::manual::{ChessManual, Notation};
use crate::move_tree::NodeId;

/// Splits text at the first blank line into the metadata block and the move section.
fn split_sections(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end_matches(['\r', '\n']).is_empty() {
            return (&text[..offset - line.len()], &text[offset..]);
        }
    }
    (text, "")
}

fn read_info(manual: &mut ChessManual, block: &str) -> Result<()> {
    let header_re = Regex::new(r#"^\[(\w+)\s+"(.*)"\]$"#)?;
    for line in block.lines() {
        if let Some(cap) = header_re.captures(line.trim_end()) {
            manual.info.insert(cap[1].to_string(), cap[2].to_string());
        }
    }
    Ok(())
}

pub fn read(manual: &mut ChessManual, text: &str, fmt: RecFormat) -> Result<()> {
    let (block, moves) = split_sections(text);
    read_info(manual, block)?;
    manual.set_board_from_info()?;
    match fmt {
        RecFormat::PgnCc => cc::read_moves(manual, moves),
        RecFormat::PgnZh => read_moves(manual, moves, Notation::Zh),
        _ => read_moves(manual, moves, Notation::Iccs),
    }
}

fn read_moves(manual: &mut ChessManual, text: &str, notation: Notation) -> Result<()> {
    let token = match notation {
        Notation::Iccs => "[a-i][0-9][a-i][0-9]".to_string(),
        Notation::Zh => format!("[{}]{{4}}", regex::escape(&zh_chars())),
    };
    let move_re = Regex::new(&format!(
        r"(\()?(?:\d+\.)?[\s.]*\b({token})\b(?:\s*\{{([^}}]*)\}})?\s*(\)+)?"
    ))?;
    let root_remark_re = Regex::new(r"\A\s*\{([^}]*)\}")?;

    let mut text = text;
    if let Some(cap) = root_remark_re.captures(text) {
        manual.tree.node_mut(NodeId::ROOT).remark = cap[1].to_string();
        text = &text[cap[0].len()..];
    }

    // Every move is replayed so each token is read and checked on its own position.
    let mut pre = NodeId::ROOT;
    let mut openings: Vec<NodeId> = Vec::new();
    for cap in move_re.captures_iter(text) {
        let remark = cap.get(3).map_or("", |m| m.as_str());
        let id = if cap.get(1).is_some() {
            openings.push(pre);
            manual.undo(pre);
            let coords = manual.decode(&cap[2], notation)?;
            // A second bracket after a closed one extends the sibling chain.
            let mut tail = pre;
            while let Some(o) = manual.tree.other(tail) {
                tail = o;
            }
            manual.tree.add_other(tail, coords, remark)
        } else {
            let coords = manual.decode(&cap[2], notation)?;
            manual.tree.add_next(pre, coords, remark)
        };
        manual.done(id);
        pre = id;

        let closes = cap.get(4).map_or(0, |m| m.as_str().len());
        for _ in 0..closes {
            let anchor = openings
                .pop()
                .ok_or_else(|| ManualError::Malformed("unbalanced ')'".to_string()))?;
            // Unwind to the position the anchor is played from; sibling links are not plies.
            let base = manual.tree.parent(anchor).unwrap_or(NodeId::ROOT);
            let mut cur = pre;
            while cur != base {
                manual.undo(cur);
                cur = manual
                    .tree
                    .parent(cur)
                    .ok_or_else(|| ManualError::Malformed("variation without anchor".to_string()))?;
            }
            manual.done(anchor);
            pre = anchor;
        }
    }
    Ok(())
}

pub fn write_info(manual: &ChessManual) -> String {
    let mut out = String::new();
    for (key, value) in &manual.info {
        out.push_str(&format!("[{key} \"{value}\"]\n"));
    }
    out.push('\n');
    out
}

fn remark_text(remark: &str) -> String {
    if remark.is_empty() {
        String::new()
    } else {
        format!(" \n{{{remark}}}\n ")
    }
}

enum Emit {
    Move(NodeId, bool),
    Close,
}

fn write_moves(manual: &ChessManual, notation: Notation) -> String {
    let tree = &manual.tree;
    let mut out = remark_text(&tree.node(NodeId::ROOT).remark);
    let mut stack: Vec<Emit> = tree.next(NodeId::ROOT).map(|id| Emit::Move(id, false)).into_iter().collect();
    while let Some(emit) = stack.pop() {
        let (id, is_other) = match emit {
            Emit::Close => {
                out.push(')');
                continue;
            }
            Emit::Move(id, is_other) => (id, is_other),
        };
        let node = tree.node(id);
        let bout = format!("{}. ", (node.next_no + 1) / 2);
        let even = node.next_no % 2 == 0;
        if is_other {
            out.push('(');
            out.push_str(&bout);
            if even {
                out.push_str("... ");
            }
        } else if even {
            out.push(' ');
        } else {
            out.push_str(&bout);
        }
        match notation {
            Notation::Iccs => out.push_str(&node.iccs()),
            Notation::Zh => out.push_str(&node.zh),
        }
        out.push(' ');
        out.push_str(&remark_text(&node.remark));

        if let Some(next) = node.next() {
            stack.push(Emit::Move(next, false));
        }
        if let Some(other) = node.other() {
            stack.push(Emit::Close);
            stack.push(Emit::Move(other, true));
        }
    }
    out
}

pub fn write(manual: &ChessManual, fmt: RecFormat) -> String {
    let mut out = write_info(manual);
    match fmt {
        RecFormat::PgnCc => out.push_str(&cc::write_moves(manual)),
        RecFormat::PgnZh => out.push_str(&write_moves(manual, Notation::Zh)),
        _ => out.push_str(&write_moves(manual, Notation::Iccs)),
    }
    out
}
