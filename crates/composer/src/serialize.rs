use crate::tree::{DocumentTree, Flow, Node, NodeId, Slot, Visitor, traverse};

struct Serializer {
    out: String,
}

impl Visitor for Serializer {
    fn visit(&mut self, tree: &DocumentTree, id: NodeId, slot: Slot) -> Flow {
        if tree.block_boundary_before(id, slot) {
            self.out.push('\n');
        }

        match tree.node(id) {
            Some(Node::Text(run)) => self.out.push_str(run.serialized()),
            Some(Node::Chip(chip)) => self.out.push_str(&chip.token()),
            Some(Node::LineBreak) => self.out.push('\n'),
            Some(Node::Block) => return Flow::Descend,
            _ => {}
        }

        Flow::Skip
    }
}

/// Serializes the tree into the portable `@[id]` token form.
pub fn serialize(tree: &DocumentTree) -> String {
    let mut serializer = Serializer { out: String::new() };
    traverse(tree, &mut serializer);

    serializer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::MentionId;
    use crate::tree::TextRun;

    #[test]
    fn test_serialize_encodes_chips_and_breaks() {
        // Arrange
        let mut tree = DocumentTree::new();
        let root = tree.root();
        tree.append(root, Node::Text(TextRun::new("see ")));
        tree.append(
            root,
            Node::Chip(
                MentionId::File {
                    repository: "acme/repo".to_string(),
                    path: "src/a.ts".to_string(),
                }
                .to_chip(),
            ),
        );
        tree.append(root, Node::Text(TextRun::synthetic_space()));
        tree.append(root, Node::LineBreak);
        tree.append(root, Node::Text(TextRun::new("bye")));

        // Act
        let value = serialize(&tree);

        // Assert
        assert_eq!(value, "see @[file:acme/repo:src/a.ts]\nbye");
    }

    #[test]
    fn test_serialize_emits_block_boundaries() {
        // Arrange
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let first = tree.append(root, Node::Block).expect("root exists");
        tree.append(first, Node::Text(TextRun::new("one")));
        let second = tree.append(root, Node::Block).expect("root exists");
        tree.append(second, Node::Text(TextRun::new("two")));

        // Act
        let value = serialize(&tree);

        // Assert
        assert_eq!(value, "one\ntwo");
    }

    #[test]
    fn test_serialize_skips_stray_decorations() {
        // Arrange
        let mut tree = DocumentTree::new();
        let root = tree.root();
        tree.append(root, Node::Decoration("icon".to_string()));
        tree.append(root, Node::Text(TextRun::new("x")));

        // Act
        let value = serialize(&tree);

        // Assert
        assert_eq!(value, "x");
    }
}
