//! Display layout of the document for cell-based renderers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::edit::{Unit, caret_position, units};
use crate::host::CaretRect;
use crate::tree::{Caret, DocumentTree, NodeId};

/// Piece of one display line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Chip {
        label: String,
        /// Whether the chip lies inside the current range selection.
        selected: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayLine {
    pub segments: Vec<Segment>,
    /// Width in terminal cells.
    pub width: usize,
}

impl DisplayLine {
    fn push_char(&mut self, ch: char, width: usize) {
        if let Some(Segment::Text(text)) = self.segments.last_mut() {
            text.push(ch);
        } else {
            self.segments.push(Segment::Text(ch.to_string()));
        }
        self.width += width;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerLayout {
    pub lines: Vec<DisplayLine>,
    pub caret: CaretRect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Wrap width in cells; `0` disables wrapping.
    pub width: u16,
    pub show_icons: bool,
}

/// Returns the text chip `node` renders as: its decorations when icons are
/// shown, `@label` otherwise.
pub fn chip_label(tree: &DocumentTree, node: NodeId, show_icons: bool) -> Option<String> {
    let chip = tree.chip(node)?;
    if !show_icons {
        return Some(format!("@{}", chip.label));
    }

    let decorations = tree.decorations(node);
    if decorations.is_empty() {
        Some(chip.label.clone())
    } else {
        Some(decorations.join(" "))
    }
}

/// Wraps the document into display lines and finds the caret cell.
///
/// Chips are never split across lines; a chip wider than the wrap width gets
/// a line of its own.
pub fn layout(
    tree: &DocumentTree,
    caret: Caret,
    options: LayoutOptions,
    highlighted: &[NodeId],
) -> ComposerLayout {
    let max_width = match options.width {
        0 => usize::MAX,
        width => usize::from(width),
    };
    let caret_position = caret_position(tree, caret);
    let mut lines = vec![DisplayLine::default()];
    let mut caret_cell: Option<(usize, usize)> = None;
    let mut cached_run: Option<(NodeId, Vec<char>)> = None;

    for (position, unit) in units(tree).into_iter().enumerate() {
        let at_caret = caret_position == Some(position);
        let current_width = lines.last().map_or(0, |line| line.width);

        match unit {
            Unit::Break(_) | Unit::Boundary(_) => {
                if at_caret {
                    caret_cell = Some((current_width, lines.len() - 1));
                }
                lines.push(DisplayLine::default());
            }
            Unit::Char { node, offset } => {
                if cached_run.as_ref().is_none_or(|(id, _)| *id != node) {
                    let chars = tree
                        .text(node)
                        .map(|run| run.text.chars().collect())
                        .unwrap_or_default();
                    cached_run = Some((node, chars));
                }
                let ch = cached_run
                    .as_ref()
                    .and_then(|(_, chars)| chars.get(offset))
                    .copied()
                    .unwrap_or(' ');
                let width = ch.width().unwrap_or(0);
                if current_width > 0 && current_width + width > max_width {
                    lines.push(DisplayLine::default());
                }
                if at_caret {
                    caret_cell = Some(last_cell(&lines));
                }
                if let Some(line) = lines.last_mut() {
                    line.push_char(ch, width);
                }
            }
            Unit::Chip(node) => {
                let label = chip_label(tree, node, options.show_icons).unwrap_or_default();
                let width = label.width();
                if current_width > 0 && current_width + width > max_width {
                    lines.push(DisplayLine::default());
                }
                if at_caret {
                    caret_cell = Some(last_cell(&lines));
                }
                if let Some(line) = lines.last_mut() {
                    line.segments.push(Segment::Chip {
                        label,
                        selected: highlighted.contains(&node),
                    });
                    line.width += width;
                }
            }
        }
    }

    let (x, y) = caret_cell.unwrap_or_else(|| {
        let (width, row) = last_cell(&lines);
        if width > 0 && width >= max_width {
            (0, row + 1)
        } else {
            (width, row)
        }
    });

    ComposerLayout {
        lines,
        caret: CaretRect {
            x: u16::try_from(x).unwrap_or(u16::MAX),
            y: u16::try_from(y).unwrap_or(u16::MAX),
            width: 1,
            height: 1,
        },
    }
}

fn last_cell(lines: &[DisplayLine]) -> (usize, usize) {
    let row = lines.len().saturating_sub(1);

    (lines.last().map_or(0, |line| line.width), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{StructuralResolver, build};
    use crate::edit::{caret_at, end_caret};

    fn options(width: u16) -> LayoutOptions {
        LayoutOptions {
            width,
            show_icons: true,
        }
    }

    fn line_text(line: &DisplayLine) -> String {
        line.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.clone(),
                Segment::Chip { label, .. } => format!("[{label}]"),
            })
            .collect()
    }

    #[test]
    fn test_layout_wraps_text_and_places_caret_at_end() {
        // Arrange
        let tree = build("abcdef", &StructuralResolver);

        // Act
        let layout = layout(&tree, end_caret(&tree), options(4), &[]);

        // Assert
        let texts: Vec<String> = layout.lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["abcd", "ef"]);
        assert_eq!((layout.caret.x, layout.caret.y), (2, 1));
    }

    #[test]
    fn test_layout_keeps_chip_on_one_line() {
        // Arrange
        let tree = build("abc @[skill:deploy] ", &StructuralResolver);

        // Act
        let layout = layout(&tree, end_caret(&tree), options(8), &[]);

        // Assert
        let texts: Vec<String> = layout.lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["abc ", "[✦ deploy]", " "]);
    }

    #[test]
    fn test_layout_reports_caret_after_line_break() {
        // Arrange
        let tree = build("ab\ncd", &StructuralResolver);
        let caret = caret_at(&tree, 3);

        // Act
        let layout = layout(&tree, caret, options(0), &[]);

        // Assert
        assert_eq!(layout.lines.len(), 2);
        assert_eq!((layout.caret.x, layout.caret.y), (0, 1));
    }

    #[test]
    fn test_layout_marks_highlighted_chip_and_measures_wide_chars() {
        // Arrange
        let tree = build("日本@[skill:x] ", &StructuralResolver);
        let chip = tree.children(tree.root())[1];

        // Act
        let layout = layout(&tree, caret_at(&tree, 2), options(0), &[chip]);

        // Assert
        assert_eq!(layout.lines[0].width, 4 + 3 + 1);
        assert!(layout.lines[0].segments.contains(&Segment::Chip {
            label: "✦ x".to_string(),
            selected: true,
        }));
        assert_eq!(layout.caret.x, 4);
    }

    #[test]
    fn test_chip_label_renders_decorations_or_at_sign() {
        // Arrange
        let tree = build("@[skill:deploy]", &StructuralResolver);
        let chip = tree.children(tree.root())[0];

        // Act
        let with_icons = chip_label(&tree, chip, true);
        let without_icons = chip_label(&tree, chip, false);

        // Assert
        assert_eq!(with_icons.as_deref(), Some("✦ deploy"));
        assert_eq!(without_icons.as_deref(), Some("@deploy"));
    }
}
