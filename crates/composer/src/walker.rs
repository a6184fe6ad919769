//! Unified single-pass analysis of the document around the caret.
//!
//! One traversal yields the serialized value, the serialized text before the
//! caret and both trigger spans, so all of them describe the same snapshot.
//! Indices are counted in characters of the serialized value.

use tracing::debug;

use crate::tree::{Caret, DocumentTree, Flow, Node, NodeId, Slot, Visitor, traverse};

/// Caret-anchored `@` or `/` span that is still being typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerSpan {
    /// Index of the trigger character in the serialized value.
    pub start_index: usize,
    /// Text between the trigger character and the caret.
    pub search_text: String,
}

/// Result of one walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub serialized: String,
    pub text_before_caret: String,
    pub mention_trigger: Option<TriggerSpan>,
    /// Always `None` while a mention trigger is active.
    pub slash_trigger: Option<TriggerSpan>,
}

struct UnifiedWalk {
    accumulating: bool,
    before: String,
    caret: Caret,
    caret_found: bool,
    last_char: Option<char>,
    mention_start: Option<usize>,
    serialized: String,
    serialized_len: usize,
    slash_start: Option<usize>,
}

impl UnifiedWalk {
    fn new(caret: Caret) -> Self {
        Self {
            accumulating: true,
            before: String::new(),
            caret,
            caret_found: false,
            last_char: None,
            mention_start: None,
            serialized: String::new(),
            serialized_len: 0,
            slash_start: None,
        }
    }

    fn stop_at_caret(&mut self) {
        self.accumulating = false;
        self.caret_found = true;
    }

    fn push_serialized(&mut self, text: &str) {
        self.serialized.push_str(text);
        self.serialized_len += text.chars().count();
        if let Some(last) = text.chars().next_back() {
            self.last_char = Some(last);
        }
    }

    fn push_line_break(&mut self) {
        if self.accumulating {
            self.before.push('\n');
        }
        self.push_serialized("\n");
    }

    /// Records provisional trigger starts found in before-caret `text`, which
    /// is about to be appended at the current serialized length.
    fn scan(&mut self, text: &str) {
        let mut previous = self.last_char;
        for (offset, ch) in text.chars().enumerate() {
            let index = self.serialized_len + offset;
            if ch == '@' {
                self.mention_start = Some(index);
            }
            if ch == '/' && (index == 0 || previous == Some('\n')) {
                self.slash_start = Some(index);
            }
            previous = Some(ch);
        }
    }

    fn visit_text(&mut self, id: NodeId, text: &str) {
        if !self.accumulating {
            self.push_serialized(text);

            return;
        }

        if self.caret.node == id {
            let prefix: String = text.chars().take(self.caret.offset).collect();
            self.scan(&prefix);
            self.before.push_str(&prefix);
            self.stop_at_caret();
        } else {
            self.scan(text);
            self.before.push_str(text);
        }
        self.push_serialized(text);
    }

    fn finish(self) -> WalkOutcome {
        if !self.caret_found {
            debug!("caret does not map into the tree; reporting no triggers");

            return WalkOutcome {
                text_before_caret: self.serialized.clone(),
                serialized: self.serialized,
                mention_trigger: None,
                slash_trigger: None,
            };
        }

        let before: Vec<char> = self.before.chars().collect();
        let span = |start: usize| {
            let search = before.get(start + 1..)?;
            if search.iter().any(|ch| ch.is_whitespace()) {
                return None;
            }

            Some(TriggerSpan {
                start_index: start,
                search_text: search.iter().collect(),
            })
        };

        let mention_trigger = self.mention_start.and_then(span);
        let slash_trigger = self
            .slash_start
            .filter(|start| *start == 0 || before.get(start - 1) == Some(&'\n'))
            .and_then(span)
            .filter(|_| mention_trigger.is_none());

        WalkOutcome {
            serialized: self.serialized,
            text_before_caret: self.before,
            mention_trigger,
            slash_trigger,
        }
    }
}

impl Visitor for UnifiedWalk {
    fn visit(&mut self, tree: &DocumentTree, id: NodeId, slot: Slot) -> Flow {
        if self.accumulating && self.caret.is_before(slot) {
            self.stop_at_caret();
        }
        if tree.block_boundary_before(id, slot) {
            self.push_line_break();
        }

        match tree.node(id) {
            Some(Node::Text(run)) if run.synthetic => {
                if self.accumulating && self.caret.node == id {
                    self.stop_at_caret();
                }
            }
            Some(Node::Text(run)) => self.visit_text(id, &run.text),
            Some(Node::Chip(chip)) => {
                let token = chip.token();
                if self.accumulating {
                    self.before.push_str(&token);
                    self.mention_start = None;
                    self.slash_start = None;
                }
                self.push_serialized(&token);
            }
            Some(Node::LineBreak) => self.push_line_break(),
            Some(Node::Block) => return Flow::Descend,
            _ => {}
        }

        Flow::Skip
    }

    fn leave(&mut self, tree: &DocumentTree, container: NodeId) {
        if self.accumulating
            && self.caret.node == container
            && self.caret.offset == tree.children(container).len()
        {
            self.stop_at_caret();
        }
    }
}

/// Runs the unified walk for `caret`.
pub fn walk(tree: &DocumentTree, caret: Caret) -> WalkOutcome {
    let mut walker = UnifiedWalk::new(caret);
    traverse(tree, &mut walker);

    walker.finish()
}

struct Locator {
    consumed: usize,
    found: Option<Caret>,
    target: usize,
}

impl Visitor for Locator {
    fn visit(&mut self, tree: &DocumentTree, id: NodeId, slot: Slot) -> Flow {
        if tree.block_boundary_before(id, slot) {
            self.consumed += 1;
        }

        let len = match tree.node(id) {
            Some(Node::Text(run)) => run.serialized().chars().count(),
            Some(Node::Chip(chip)) => chip.token_len(),
            Some(Node::LineBreak) => 1,
            Some(Node::Block) => return Flow::Descend,
            _ => 0,
        };
        if self.target < self.consumed + len {
            if tree.is_hard_text(id) {
                self.found = Some(Caret::new(id, self.target - self.consumed));
            }

            return Flow::Stop;
        }
        self.consumed += len;

        Flow::Skip
    }
}

/// Finds the text run holding serialized character `index` and the offset
/// inside it, by summing the serialized lengths of everything before it
/// (chip tokens included).
///
/// Returns `None` when `index` falls on a chip, a line break or past the end.
pub fn locate_text_index(tree: &DocumentTree, index: usize) -> Option<Caret> {
    let mut locator = Locator {
        consumed: 0,
        found: None,
        target: index,
    };
    traverse(tree, &mut locator);

    locator.found
}
