use tracing::debug;

use crate::mention::{FileMentionOption, MentionChip, MentionId, TOKEN_CLOSE, TOKEN_OPEN};
use crate::tree::{DocumentTree, Node, NodeId, TextRun};

/// Looks up mention metadata for a token identifier.
#[cfg_attr(test, mockall::automock)]
pub trait MentionResolver {
    /// Returns the option describing `id`, or `None` when unknown.
    fn resolve(&self, id: &str) -> Option<FileMentionOption>;
}

/// Resolver that knows nothing; tokens fall back to structural parsing.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralResolver;

impl MentionResolver for StructuralResolver {
    fn resolve(&self, _id: &str) -> Option<FileMentionOption> {
        None
    }
}

/// Rebuilds a document tree from its serialized form.
///
/// Never fails and never drops characters: tokens that neither `resolver`
/// nor structural parsing understand stay as literal text. Each resolved
/// chip is followed by a separating space; when the source has none a
/// display-only separator is inserted so the value still round-trips.
pub fn build(value: &str, resolver: &dyn MentionResolver) -> DocumentTree {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let mut literal = String::new();
    let mut rest = value;

    while let Some(at) = rest.find(TOKEN_OPEN) {
        let body_start = at + TOKEN_OPEN.len();
        let Some(body_len) = matching_close(&rest[body_start..]) else {
            literal.push_str(&rest[..body_start]);
            rest = &rest[body_start..];

            continue;
        };
        let id = &rest[body_start..body_start + body_len];
        let token_end = body_start + body_len + TOKEN_CLOSE.len_utf8();
        literal.push_str(&rest[..at]);

        match resolve_chip(id, resolver) {
            Some(chip) => {
                flush_literal(&mut tree, root, &mut literal);
                tree.append(root, Node::Chip(chip));
                rest = &rest[token_end..];
                if !rest.starts_with(' ') {
                    tree.append(root, Node::Text(TextRun::synthetic_space()));
                }
            }
            None => {
                debug!(id, "keeping unresolvable mention token as text");
                literal.push_str(&rest[at..token_end]);
                rest = &rest[token_end..];
            }
        }
    }
    literal.push_str(rest);
    flush_literal(&mut tree, root, &mut literal);

    tree
}

fn resolve_chip(id: &str, resolver: &dyn MentionResolver) -> Option<MentionChip> {
    let mut chip = resolver
        .resolve(id)
        .map(|option| MentionChip::from(&option))
        .or_else(|| match id.parse::<MentionId>() {
            Ok(parsed) => Some(parsed.to_chip()),
            Err(error) => {
                debug!(%error, "mention token failed structural parsing");

                None
            }
        })?;
    chip.id = id.to_string();

    Some(chip)
}

/// Returns the byte length of the token body up to its balancing `]`.
/// Tokens never span lines.
fn matching_close(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (index, ch) in body.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            '\n' => return None,
            _ => {}
        }
    }

    None
}

fn flush_literal(tree: &mut DocumentTree, parent: NodeId, literal: &mut String) {
    if literal.is_empty() {
        return;
    }

    for (index, line) in literal.split('\n').enumerate() {
        if index > 0 {
            tree.append(parent, Node::LineBreak);
        }
        if !line.is_empty() {
            tree.append(parent, Node::Text(TextRun::new(line)));
        }
    }
    literal.clear();
}
