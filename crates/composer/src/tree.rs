use crate::mention::MentionChip;

/// Stable handle of a node inside a [`DocumentTree`].
///
/// Handles are never reused after removal, so a caret pointing at a removed
/// node is detectable instead of silently landing somewhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Plain text content of the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    /// Display-only separator placed after a chip by the builder. It renders
    /// as a space but contributes nothing to the serialized value until the
    /// user types into it.
    pub synthetic: bool,
}

impl TextRun {
    /// Creates a regular text run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            synthetic: false,
        }
    }

    /// Creates the builder's display-only chip separator.
    pub fn synthetic_space() -> Self {
        Self {
            text: " ".to_string(),
            synthetic: true,
        }
    }

    /// Returns the run length in Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns the text this run contributes to the serialized value.
    pub fn serialized(&self) -> &str {
        if self.synthetic { "" } else { &self.text }
    }

    /// Inserts `text` at character `offset` and turns a synthetic run into a
    /// regular one.
    pub fn insert(&mut self, offset: usize, text: &str) {
        self.synthetic = false;
        let byte_offset = byte_offset_at(&self.text, offset);
        self.text.insert_str(byte_offset, text);
    }

    /// Removes the character at `offset`, if any.
    pub fn remove_char(&mut self, offset: usize) {
        let start = byte_offset_at(&self.text, offset);
        let end = byte_offset_at(&self.text, offset + 1);
        self.text.replace_range(start..end, "");
    }
}

/// Tagged node variant stored in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// The single root container.
    Root,
    /// A line grouped as a block; its leading boundary serializes as `\n`.
    Block,
    Text(TextRun),
    /// Atomic mention reference. Its children are display decorations.
    Chip(MentionChip),
    LineBreak,
    /// Chip-internal display sub-structure (icon, label).
    Decoration(String),
}

impl Node {
    /// Returns whether carets may sit between this node's children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Root | Self::Block)
    }
}

/// Location of a node inside its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub parent: NodeId,
    pub index: usize,
}

/// Caret in tree space.
///
/// For text runs `offset` counts characters; for containers it is a child
/// index, like a DOM range boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

impl Caret {
    /// Creates a caret at `offset` inside `node`.
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Returns whether this caret sits right before the node at `slot`.
    pub fn is_before(self, slot: Slot) -> bool {
        self.node == slot.parent && self.offset == slot.index
    }
}

#[derive(Clone, Debug)]
struct Entry {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ordered, mutable node arena holding composer content.
#[derive(Clone, Debug)]
pub struct DocumentTree {
    entries: Vec<Option<Entry>>,
    root: NodeId,
}

impl DocumentTree {
    /// Creates an empty tree holding only the root container.
    pub fn new() -> Self {
        Self {
            entries: vec![Some(Entry {
                node: Node::Root,
                parent: None,
                children: Vec::new(),
            })],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Returns the node behind `id`, or `None` once it was removed.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entry(id).map(|entry| &entry.node)
    }

    /// Returns the text run behind `id`, if `id` is a text node.
    pub fn text(&self, id: NodeId) -> Option<&TextRun> {
        match self.node(id)? {
            Node::Text(run) => Some(run),
            _ => None,
        }
    }

    /// Returns the mutable text run behind `id`, if `id` is a text node.
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut TextRun> {
        match self.entries.get_mut(id.0)?.as_mut().map(|entry| &mut entry.node)? {
            Node::Text(run) => Some(run),
            _ => None,
        }
    }

    /// Returns the chip behind `id`, if `id` is a chip node.
    pub fn chip(&self, id: NodeId) -> Option<&MentionChip> {
        match self.node(id)? {
            Node::Chip(chip) => Some(chip),
            _ => None,
        }
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_container)
    }

    /// Returns whether `id` is a regular (non-synthetic) text run.
    pub fn is_hard_text(&self, id: NodeId) -> bool {
        self.text(id).is_some_and(|run| !run.synthetic)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id)?.parent
    }

    /// Returns the children of `id`; empty for leaves and removed nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map_or(&[], |entry| entry.children.as_slice())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Returns the parent and index of `id`.
    pub fn slot(&self, id: NodeId) -> Option<Slot> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|child| *child == id)?;

        Some(Slot { parent, index })
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.slot(id)?;

        self.children(slot.parent).get(slot.index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.slot(id)?;
        let index = slot.index.checked_sub(1)?;

        self.children(slot.parent).get(index).copied()
    }

    /// Returns whether a block boundary (serialized as `\n`) precedes the
    /// node at `slot`: the node is a non-first block, or it directly follows
    /// a block.
    pub fn block_boundary_before(&self, id: NodeId, slot: Slot) -> bool {
        if slot.index == 0 {
            return false;
        }
        if matches!(self.node(id), Some(Node::Block)) {
            return true;
        }

        self.children(slot.parent)
            .get(slot.index - 1)
            .is_some_and(|previous| matches!(self.node(*previous), Some(Node::Block)))
    }

    /// Returns the display decorations of a chip, in order.
    pub fn decorations(&self, chip: NodeId) -> Vec<&str> {
        self.children(chip)
            .iter()
            .filter_map(|child| match self.node(*child) {
                Some(Node::Decoration(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Inserts `node` as child `index` of `parent` (clamped to the child
    /// count). Chips get their icon and label decorations attached.
    ///
    /// Returns `None` when `parent` does not exist.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: Node) -> Option<NodeId> {
        self.entry(parent)?;
        let decorations = match &node {
            Node::Chip(chip) => vec![chip.kind.icon().to_string(), chip.label.clone()],
            _ => Vec::new(),
        };
        let id = self.allocate(node, Some(parent));
        if let Some(entry) = self.entry_mut(parent) {
            let index = index.min(entry.children.len());
            entry.children.insert(index, id);
        }
        for decoration in decorations {
            let child = self.allocate(Node::Decoration(decoration), Some(id));
            if let Some(entry) = self.entry_mut(id) {
                entry.children.push(child);
            }
        }

        Some(id)
    }

    /// Appends `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        let index = self.children(parent).len();

        self.insert(parent, index, node)
    }

    /// Removes `id` and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(entry) = self.entries.get_mut(current.0).and_then(Option::take) {
                pending.extend(entry.children);
            }
        }
    }

    /// Moves `id` to child `index` of `parent` (clamped).
    pub fn move_node(&mut self, id: NodeId, parent: NodeId, index: usize) {
        if id == self.root || self.entry(parent).is_none() {
            return;
        }
        self.detach(id);
        if let Some(entry) = self.entry_mut(parent) {
            let index = index.min(entry.children.len());
            entry.children.insert(index, id);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = Some(parent);
        }
    }

    /// Splits the text run `id` at character `offset`, moving the tail into a
    /// new sibling run right after it.
    ///
    /// Returns the new run, or `None` when `id` is not a text run.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let slot = self.slot(id)?;
        let run = self.text_mut(id)?;
        let byte_offset = byte_offset_at(&run.text, offset);
        let tail = TextRun {
            text: run.text.split_off(byte_offset),
            synthetic: run.synthetic,
        };

        self.insert(slot.parent, slot.index + 1, Node::Text(tail))
    }

    /// Merges adjacent regular text runs and drops empty regular runs in
    /// every container. Synthetic separators are left alone.
    pub fn merge_text_runs(&mut self) {
        let containers: Vec<NodeId> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry
                    .as_ref()
                    .filter(|entry| entry.node.is_container())
                    .map(|_| NodeId(index))
            })
            .collect();

        for container in containers {
            let children = self.children(container).to_vec();
            let mut previous_text: Option<NodeId> = None;
            for child in children {
                let Some(run) = self.text(child).filter(|run| !run.synthetic).cloned() else {
                    previous_text = None;
                    continue;
                };
                if run.text.is_empty() {
                    self.remove(child);
                    continue;
                }
                if let Some(previous) = previous_text
                    && let Some(previous_run) = self.text_mut(previous)
                {
                    previous_run.text.push_str(&run.text);
                    self.remove(child);
                    continue;
                }
                previous_text = Some(child);
            }
        }
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.entries.get(id.0)?.as_ref()
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.entries.get_mut(id.0)?.as_mut()
    }

    fn allocate(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Some(Entry {
            node,
            parent,
            children: Vec::new(),
        }));

        id
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.retain(|child| *child != id);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// What the traversal does after visiting a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Walk into the node's children.
    Descend,
    /// Continue with the next sibling (or ancestor's sibling).
    Skip,
    /// End the traversal.
    Stop,
}

/// Accumulator driven by [`traverse`].
pub trait Visitor {
    /// Called for every reached node in document order.
    fn visit(&mut self, tree: &DocumentTree, id: NodeId, slot: Slot) -> Flow;

    /// Called when the walk leaves a container after its last child, or
    /// right after visiting an empty container it descended into.
    fn leave(&mut self, _tree: &DocumentTree, _container: NodeId) {}
}

/// Walks the tree in document order with an explicit iterative
/// next-sibling-else-ascend step. Nodes answered with [`Flow::Skip`] (chips)
/// are never descended into.
pub fn traverse<V: Visitor + ?Sized>(tree: &DocumentTree, visitor: &mut V) {
    let root = tree.root();
    let mut current = tree.first_child(root);
    if current.is_none() {
        visitor.leave(tree, root);

        return;
    }

    while let Some(id) = current {
        let Some(slot) = tree.slot(id) else {
            return;
        };

        match visitor.visit(tree, id, slot) {
            Flow::Stop => return,
            Flow::Descend => {
                if let Some(child) = tree.first_child(id) {
                    current = Some(child);

                    continue;
                }
                if tree.is_container(id) {
                    visitor.leave(tree, id);
                }
            }
            Flow::Skip => {}
        }

        current = advance(tree, visitor, id);
    }
}

fn advance<V: Visitor + ?Sized>(
    tree: &DocumentTree,
    visitor: &mut V,
    mut id: NodeId,
) -> Option<NodeId> {
    loop {
        if let Some(next) = tree.next_sibling(id) {
            return Some(next);
        }

        let parent = tree.parent(id)?;
        if tree.is_container(parent) {
            visitor.leave(tree, parent);
        }
        id = parent;
    }
}

fn byte_offset_at(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(index, _)| index)
}
