//! Keystroke-level editing on the document tree.
//!
//! Edits address content through *visual positions*: every character, chip,
//! line break and block boundary is exactly one unit, so a chip can never be
//! entered or split by caret arithmetic.

use crate::mention::MentionChip;
use crate::tree::{Caret, DocumentTree, Flow, Node, NodeId, Slot, TextRun, Visitor, traverse};

/// One caret step of content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Char { node: NodeId, offset: usize },
    Chip(NodeId),
    Break(NodeId),
    /// Implicit line boundary in front of the given node.
    Boundary(NodeId),
}

impl Unit {
    fn node(self) -> NodeId {
        match self {
            Self::Char { node, .. } => node,
            Self::Chip(node) | Self::Break(node) | Self::Boundary(node) => node,
        }
    }

    fn is_line_end(self) -> bool {
        matches!(self, Self::Break(_) | Self::Boundary(_))
    }
}

struct UnitCollector {
    caret: Option<Caret>,
    caret_position: Option<usize>,
    units: Vec<Unit>,
}

impl UnitCollector {
    fn mark_caret(&mut self, position: usize) {
        if self.caret_position.is_none() {
            self.caret_position = Some(position);
        }
    }
}

impl Visitor for UnitCollector {
    fn visit(&mut self, tree: &DocumentTree, id: NodeId, slot: Slot) -> Flow {
        if self.caret.is_some_and(|caret| caret.is_before(slot)) {
            self.mark_caret(self.units.len());
        }
        if tree.block_boundary_before(id, slot) {
            self.units.push(Unit::Boundary(id));
        }

        match tree.node(id) {
            Some(Node::Text(run)) => {
                let len = run.char_len();
                if let Some(caret) = self.caret.filter(|caret| caret.node == id) {
                    self.mark_caret(self.units.len() + caret.offset.min(len));
                }
                self.units
                    .extend((0..len).map(|offset| Unit::Char { node: id, offset }));

                Flow::Skip
            }
            Some(Node::Chip(_)) => {
                self.units.push(Unit::Chip(id));

                Flow::Skip
            }
            Some(Node::LineBreak) => {
                self.units.push(Unit::Break(id));

                Flow::Skip
            }
            Some(Node::Block) => Flow::Descend,
            _ => Flow::Skip,
        }
    }

    fn leave(&mut self, tree: &DocumentTree, container: NodeId) {
        let at_end = |caret: Caret| {
            caret.node == container && caret.offset == tree.children(container).len()
        };
        if self.caret.is_some_and(at_end) {
            self.mark_caret(self.units.len());
        }
    }
}

/// Returns every content unit in document order.
pub fn units(tree: &DocumentTree) -> Vec<Unit> {
    collect(tree, None).units
}

/// Returns the number of content units.
pub fn content_len(tree: &DocumentTree) -> usize {
    units(tree).len()
}

/// Maps a tree-space caret to its visual position.
///
/// Returns `None` when the caret no longer points into the tree.
pub fn caret_position(tree: &DocumentTree, caret: Caret) -> Option<usize> {
    let caret = normalize_atomic(tree, caret)?;

    collect(tree, Some(caret)).caret_position
}

/// Maps a visual position (clamped) back into tree space.
///
/// Ties resolve to the end of the preceding text run so typed text joins
/// what the user sees on its left.
pub fn caret_at(tree: &DocumentTree, position: usize) -> Caret {
    let units = units(tree);
    let position = position.min(units.len());

    if let Some(previous) = position.checked_sub(1)
        && let Some(Unit::Char { node, offset }) = units.get(previous)
    {
        return Caret::new(*node, offset + 1);
    }
    if let Some(Unit::Char { node, offset }) = units.get(position) {
        return Caret::new(*node, *offset);
    }
    if let Some(slot) = units.get(position).and_then(|unit| tree.slot(unit.node())) {
        return Caret::new(slot.parent, slot.index);
    }

    let root = tree.root();

    Caret::new(root, tree.children(root).len())
}

/// Returns the caret at the end of the document.
pub fn end_caret(tree: &DocumentTree) -> Caret {
    caret_at(tree, usize::MAX)
}

/// Returns a valid caret equivalent to `caret`, or the document end when the
/// caret went stale.
pub fn sanitize(tree: &DocumentTree, caret: Caret) -> Caret {
    caret_position(tree, caret).map_or_else(|| end_caret(tree), |position| caret_at(tree, position))
}

/// Returns the chips whose unit lies inside `[start, end)`.
pub fn chips_in_range(tree: &DocumentTree, start: usize, end: usize) -> Vec<NodeId> {
    units(tree)
        .into_iter()
        .enumerate()
        .filter(|(index, _)| (start..end).contains(index))
        .filter_map(|(_, unit)| match unit {
            Unit::Chip(id) => Some(id),
            _ => None,
        })
        .collect()
}

/// Inserts `text` at `caret`; newlines become line breaks. Returns the caret
/// after the inserted text.
pub fn insert_text(tree: &mut DocumentTree, caret: Caret, text: &str) -> Caret {
    let mut caret = sanitize(tree, caret);
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            caret = insert_break_raw(tree, caret);
        }
        caret = insert_plain(tree, caret, line);
    }

    normalize(tree, caret)
}

/// Inserts a line break at `caret` and returns the caret after it.
pub fn insert_line_break(tree: &mut DocumentTree, caret: Caret) -> Caret {
    let caret = sanitize(tree, caret);
    let caret = insert_break_raw(tree, caret);

    normalize(tree, caret)
}

/// Inserts `chip` followed by one space at `caret` and returns the caret
/// right after that space.
pub fn insert_chip(tree: &mut DocumentTree, caret: Caret, chip: MentionChip) -> Caret {
    let caret = sanitize(tree, caret);
    let Some((parent, index)) = split_point(tree, caret) else {
        return caret;
    };
    if tree.insert(parent, index, Node::Chip(chip)).is_none() {
        return caret;
    }
    let Some(space) = tree.insert(parent, index + 1, Node::Text(TextRun::new(" "))) else {
        return caret;
    };

    normalize(tree, Caret::new(space, 1))
}

/// Deletes the unit before `caret`. A chip goes away whole.
pub fn delete_backward(tree: &mut DocumentTree, caret: Caret) -> Caret {
    let Some(position) = caret_position(tree, caret) else {
        return sanitize(tree, caret);
    };
    let Some(previous) = position.checked_sub(1) else {
        return caret_at(tree, 0);
    };

    delete_range(tree, previous, position)
}

/// Deletes the unit after `caret`. A chip goes away whole.
pub fn delete_forward(tree: &mut DocumentTree, caret: Caret) -> Caret {
    let Some(position) = caret_position(tree, caret) else {
        return sanitize(tree, caret);
    };

    delete_range(tree, position, position + 1)
}

/// Deletes every unit in `[start, end)` and returns the caret at `start`.
pub fn delete_range(tree: &mut DocumentTree, start: usize, end: usize) -> Caret {
    let units = units(tree);
    let end = end.min(units.len());
    let start = start.min(end);

    for unit in units[start..end].iter().rev() {
        remove_unit(tree, *unit);
    }
    tree.merge_text_runs();

    caret_at(tree, start)
}

/// Moves `position` one logical line up, keeping the column when possible.
pub fn line_up(tree: &DocumentTree, position: usize) -> usize {
    let starts = line_starts(&units(tree));
    let (line, column) = line_column(&starts, position);
    let Some(previous) = line.checked_sub(1) else {
        return 0;
    };

    starts[previous] + column.min(starts[line] - 1 - starts[previous])
}

/// Moves `position` one logical line down, keeping the column when possible.
pub fn line_down(tree: &DocumentTree, position: usize) -> usize {
    let units = units(tree);
    let starts = line_starts(&units);
    let (line, column) = line_column(&starts, position);
    let Some(next_start) = starts.get(line + 1).copied() else {
        return units.len();
    };
    let next_end = starts
        .get(line + 2)
        .map_or(units.len(), |after| after - 1);

    next_start + column.min(next_end - next_start)
}

/// Returns the first position of the logical line holding `position`.
pub fn line_start(tree: &DocumentTree, position: usize) -> usize {
    let starts = line_starts(&units(tree));
    let (line, _) = line_column(&starts, position);

    starts[line]
}

/// Returns the last position of the logical line holding `position`.
pub fn line_end(tree: &DocumentTree, position: usize) -> usize {
    let units = units(tree);
    let starts = line_starts(&units);
    let (line, _) = line_column(&starts, position);

    starts.get(line + 1).map_or(units.len(), |next| next - 1)
}

fn collect(tree: &DocumentTree, caret: Option<Caret>) -> UnitCollector {
    let mut collector = UnitCollector {
        caret,
        caret_position: None,
        units: Vec::new(),
    };
    traverse(tree, &mut collector);

    collector
}

/// Lifts carets that point into a chip (or its decorations) or at a leaf
/// onto the position right after that node.
fn normalize_atomic(tree: &DocumentTree, caret: Caret) -> Option<Caret> {
    let node = tree.node(caret.node)?;
    if node.is_container() {
        return Some(Caret::new(
            caret.node,
            caret.offset.min(tree.children(caret.node).len()),
        ));
    }
    if matches!(node, Node::Text(_)) {
        return Some(caret);
    }

    let mut atomic = caret.node;
    while let Some(parent) = tree.parent(atomic) {
        if tree.is_container(parent) {
            break;
        }
        atomic = parent;
    }
    let slot = tree.slot(atomic)?;

    Some(Caret::new(slot.parent, slot.index + 1))
}

fn normalize(tree: &mut DocumentTree, caret: Caret) -> Caret {
    let Some(position) = caret_position(tree, caret) else {
        tree.merge_text_runs();

        return end_caret(tree);
    };
    tree.merge_text_runs();

    caret_at(tree, position)
}

fn insert_plain(tree: &mut DocumentTree, caret: Caret, text: &str) -> Caret {
    if text.is_empty() {
        return caret;
    }
    let inserted = text.chars().count();

    if let Some(run) = tree.text_mut(caret.node) {
        let offset = caret.offset.min(run.char_len());
        run.insert(offset, text);

        return Caret::new(caret.node, offset + inserted);
    }

    let container = caret.node;
    let index = caret.offset;
    let children = tree.children(container);
    let previous = index.checked_sub(1).and_then(|previous| children.get(previous)).copied();
    let next = children.get(index).copied();

    if let Some(previous) = previous.filter(|id| tree.is_hard_text(*id))
        && let Some(run) = tree.text_mut(previous)
    {
        let len = run.char_len();
        run.insert(len, text);

        return Caret::new(previous, len + inserted);
    }
    if let Some(next) = next.filter(|id| tree.is_hard_text(*id))
        && let Some(run) = tree.text_mut(next)
    {
        run.insert(0, text);

        return Caret::new(next, inserted);
    }

    tree.insert(container, index, Node::Text(TextRun::new(text)))
        .map_or(caret, |id| Caret::new(id, inserted))
}

fn insert_break_raw(tree: &mut DocumentTree, caret: Caret) -> Caret {
    let Some((parent, index)) = split_point(tree, caret) else {
        return caret;
    };
    if tree.insert(parent, index, Node::LineBreak).is_none() {
        return caret;
    }

    match tree.children(parent).get(index + 1) {
        Some(next) if tree.text(*next).is_some() => Caret::new(*next, 0),
        _ => Caret::new(parent, index + 1),
    }
}

/// Resolves `caret` to a `(container, child index)` insertion point,
/// splitting a text run when the caret sits inside it. A synthetic separator
/// that is about to get content after it becomes a real space.
fn split_point(tree: &mut DocumentTree, caret: Caret) -> Option<(NodeId, usize)> {
    if tree.is_container(caret.node) {
        return Some((caret.node, caret.offset));
    }

    let slot = tree.slot(caret.node)?;
    let run = tree.text_mut(caret.node)?;
    let len = run.char_len();
    if caret.offset == 0 {
        return Some((slot.parent, slot.index));
    }
    if caret.offset >= len {
        run.synthetic = false;

        return Some((slot.parent, slot.index + 1));
    }
    tree.split_text(caret.node, caret.offset)?;

    Some((slot.parent, slot.index + 1))
}

fn remove_unit(tree: &mut DocumentTree, unit: Unit) {
    match unit {
        Unit::Char { node, offset } => {
            let Some(run) = tree.text_mut(node) else {
                return;
            };
            if run.synthetic {
                tree.remove(node);
            } else {
                run.remove_char(offset);
            }
        }
        Unit::Chip(node) | Unit::Break(node) => tree.remove(node),
        Unit::Boundary(node) => remove_boundary(tree, node),
    }
}

/// Joins the line starting at `node` with the line before it.
fn remove_boundary(tree: &mut DocumentTree, node: NodeId) {
    let Some(slot) = tree.slot(node) else {
        return;
    };
    let previous_block = tree
        .previous_sibling(node)
        .filter(|previous| matches!(tree.node(*previous), Some(Node::Block)));

    if matches!(tree.node(node), Some(Node::Block)) {
        let children = tree.children(node).to_vec();
        match previous_block {
            Some(target) => {
                for child in children {
                    tree.move_node(child, target, usize::MAX);
                }
            }
            None => {
                for (offset, child) in children.into_iter().enumerate() {
                    tree.move_node(child, slot.parent, slot.index + 1 + offset);
                }
            }
        }
        tree.remove(node);

        return;
    }

    let Some(target) = previous_block else {
        return;
    };
    let trailing: Vec<NodeId> = tree.children(slot.parent)[slot.index..]
        .iter()
        .copied()
        .take_while(|id| !matches!(tree.node(*id), Some(Node::Block)))
        .collect();
    for id in trailing {
        tree.move_node(id, target, usize::MAX);
    }
}

fn line_starts(units: &[Unit]) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            units
                .iter()
                .enumerate()
                .filter(|(_, unit)| unit.is_line_end())
                .map(|(index, _)| index + 1),
        )
        .collect()
}

fn line_column(starts: &[usize], position: usize) -> (usize, usize) {
    let line = starts
        .iter()
        .rposition(|start| *start <= position)
        .unwrap_or(0);

    (line, position - starts[line])
}
