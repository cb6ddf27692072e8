//! Tabular move text.
//!
//! Each ply occupies two text lines: the move row and a connector row carrying `↓` under
//! moves that continue. Cells are five full-width characters wide. A variation sits to the
//! right of the move it replaces on the same row, joined by a run of `…`. Remarks follow the
//! grid as `(row,col): {text}` lines and a summary line closes the section.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{ManualError, Result};
use crate::manual::{ChessManual, Notation};
use crate::move_tree::NodeId;

const BLANK: char = '　';
const DOWN: char = '↓';
const LINK: char = '…';
const CELL: usize = 5;

pub fn write_moves(manual: &ChessManual) -> String {
    let tree = &manual.tree;
    let stats = manual.stats;
    let width = (stats.max_col + 1) * CELL;
    let mut lines: Vec<Vec<char>> = vec![vec![BLANK; width]; (stats.max_row + 1) * 2];
    lines[0][1] = '开';
    lines[0][2] = '始';
    if tree.next(NodeId::ROOT).is_some() {
        lines[1][2] = DOWN;
    }

    for id in tree.moves() {
        let node = tree.node(id);
        let row = node.next_no * 2;
        let col = node.cc_col_no * CELL;
        for (i, ch) in node.zh.chars().take(4).enumerate() {
            lines[row][col + i] = ch;
        }
        if let Some(other) = node.other() {
            let end = tree.node(other).cc_col_no * CELL;
            for cell in &mut lines[row][col + 4..end] {
                *cell = LINK;
            }
        }
        if node.next().is_some() {
            lines[row + 1][col + 2] = DOWN;
        }
    }

    let mut out = String::new();
    for line in &lines {
        out.extend(line.iter());
        out.push('\n');
    }
    for id in tree.preorder(NodeId::ROOT) {
        let node = tree.node(id);
        if !node.remark.is_empty() {
            out.push_str(&format!("({},{}): {{{}}}\n", node.next_no, node.cc_col_no, node.remark));
        }
    }
    out.push_str(&format!(
        "【着法深度：{}, 视图宽度：{}, 着法数量：{}, 注解数量：{}, 注解最长：{}】\n",
        stats.max_row, stats.max_col, stats.move_count, stats.remark_count, stats.remark_len_max
    ));
    out
}

struct Grid {
    lines: Vec<Vec<char>>,
}

impl Grid {
    fn char_at(&self, line: usize, pos: usize) -> char {
        self.lines.get(line).and_then(|l| l.get(pos)).copied().unwrap_or(BLANK)
    }

    fn cell(&self, row: usize, col: usize) -> Vec<char> {
        (0..CELL).map(|i| self.char_at(row * 2, col * CELL + i)).collect()
    }

    fn token(&self, row: usize, col: usize) -> Result<String> {
        let cell = self.cell(row, col);
        if cell[..4].iter().any(|&c| c == BLANK || c == LINK) {
            return Err(ManualError::Malformed(format!("no move at ({row},{col})")));
        }
        Ok(cell[..4].iter().collect())
    }

    fn has_next(&self, row: usize, col: usize) -> bool {
        self.char_at(row * 2 + 1, col * CELL + 2) == DOWN
    }

    /// Column of the variation linked from `(row, col)`, if any.
    fn other_col(&self, row: usize, col: usize) -> Result<Option<usize>> {
        if self.cell(row, col)[4] != LINK {
            return Ok(None);
        }
        let line_len = self.lines.get(row * 2).map_or(0, Vec::len);
        let mut c = col + 1;
        while c * CELL < line_len {
            if self.char_at(row * 2, c * CELL) != LINK {
                return Ok(Some(c));
            }
            c += 1;
        }
        Err(ManualError::Malformed(format!("dangling variation at ({row},{col})")))
    }
}

enum Step {
    Read { anchor: NodeId, is_other: bool, row: usize, col: usize },
    Undo(NodeId),
}

pub fn read_moves(manual: &mut ChessManual, text: &str) -> Result<()> {
    let mut grid_lines = Vec::new();
    let mut rest = "";
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with('(') || line.starts_with('【') {
            rest = &text[offset..];
            break;
        }
        offset += line.len();
        grid_lines.push(line.trim_end_matches(['\r', '\n']).chars().collect::<Vec<char>>());
    }
    let grid = Grid { lines: grid_lines };

    let remark_re = Regex::new(r"(?m)^\((\d+),(\d+)\): \{([^}]*)\}")?;
    let mut remarks: HashMap<(usize, usize), String> = HashMap::new();
    for cap in remark_re.captures_iter(rest) {
        let row = cap[1].parse().map_err(|_| ManualError::Malformed(cap[0].to_string()))?;
        let col = cap[2].parse().map_err(|_| ManualError::Malformed(cap[0].to_string()))?;
        remarks.insert((row, col), cap[3].to_string());
    }
    if let Some(remark) = remarks.remove(&(0, 0)) {
        manual.tree.node_mut(NodeId::ROOT).remark = remark;
    }

    let mut steps: Vec<Step> = Vec::new();
    if grid.has_next(0, 0) {
        steps.push(Step::Read { anchor: NodeId::ROOT, is_other: false, row: 1, col: 0 });
    }
    while let Some(step) = steps.pop() {
        let (anchor, is_other, row, col) = match step {
            Step::Undo(id) => {
                manual.undo(id);
                continue;
            }
            Step::Read { anchor, is_other, row, col } => (anchor, is_other, row, col),
        };
        let token = grid.token(row, col)?;
        let coords = manual.decode(&token, Notation::Zh)?;
        let remark = remarks.remove(&(row, col)).unwrap_or_default();
        let id = if is_other {
            manual.tree.add_other(anchor, coords, remark)
        } else {
            manual.tree.add_next(anchor, coords, remark)
        };

        if let Some(other_col) = grid.other_col(row, col)? {
            steps.push(Step::Read { anchor: id, is_other: true, row, col: other_col });
        }
        steps.push(Step::Undo(id));
        if grid.has_next(row, col) {
            steps.push(Step::Read { anchor: id, is_other: false, row: row + 1, col });
        }
        manual.done(id);
    }
    Ok(())
}
