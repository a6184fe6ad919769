use composer::layout::{ComposerLayout, DisplayLine, Segment};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ui::{Component, INPUT_PREFIX_WIDTH};

/// Most draft lines shown before the input scrolls.
pub const MAX_VISIBLE_LINES: u16 = 6;

const PROMPT_PREFIX: &str = " › ";

/// Bordered draft editor that renders text runs and mention chips.
pub struct ComposerInput<'a> {
    focused: bool,
    layout: ComposerLayout,
    placeholder: &'a str,
}

impl<'a> ComposerInput<'a> {
    pub fn new(layout: ComposerLayout, placeholder: &'a str) -> Self {
        Self {
            focused: true,
            layout,
            placeholder,
        }
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn is_empty(&self) -> bool {
        matches!(self.layout.lines.as_slice(), [line] if line.segments.is_empty())
    }

    fn border_color(&self) -> Color {
        if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }
    }

    fn prefix(&self, row: usize) -> Span<'static> {
        if row == 0 {
            Span::styled(
                PROMPT_PREFIX,
                Style::default()
                    .fg(self.border_color())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(" ".repeat(usize::from(INPUT_PREFIX_WIDTH)))
        }
    }

    fn render_line(&self, row: usize, line: &DisplayLine) -> Line<'static> {
        let mut spans = vec![self.prefix(row)];
        spans.extend(line.segments.iter().map(|segment| match segment {
            Segment::Text(text) => Span::raw(text.clone()),
            Segment::Chip { label, selected } => {
                let mut style = Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD);
                if *selected {
                    style = style.add_modifier(Modifier::REVERSED);
                }

                Span::styled(label.clone(), style)
            }
        }));

        Line::from(spans)
    }
}

/// Returns the first visible row so `cursor_row` stays on screen.
fn scroll_offset(cursor_row: u16, viewport_height: u16) -> u16 {
    if viewport_height == 0 {
        return 0;
    }

    cursor_row.saturating_sub(viewport_height - 1)
}

impl Component for ComposerInput<'_> {
    fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color()));

        f.render_widget(Clear, area);

        if self.is_empty() {
            let line = Line::from(vec![
                self.prefix(0),
                Span::styled(self.placeholder, Style::default().fg(Color::DarkGray)),
            ]);
            f.render_widget(Paragraph::new(line).block(block), area);
            if self.focused {
                f.set_cursor_position((
                    area.x.saturating_add(1 + INPUT_PREFIX_WIDTH),
                    area.y.saturating_add(1),
                ));
            }

            return;
        }

        let lines: Vec<Line<'static>> = self
            .layout
            .lines
            .iter()
            .enumerate()
            .map(|(row, line)| self.render_line(row, line))
            .collect();
        let viewport_height = area.height.saturating_sub(2).min(MAX_VISIBLE_LINES);
        let offset = scroll_offset(self.layout.caret.y, viewport_height);

        f.render_widget(Paragraph::new(lines).scroll((offset, 0)).block(block), area);
        if self.focused {
            f.set_cursor_position((
                area.x
                    .saturating_add(1 + INPUT_PREFIX_WIDTH)
                    .saturating_add(self.layout.caret.x),
                area.y
                    .saturating_add(1)
                    .saturating_add(self.layout.caret.y - offset),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use composer::CaretRect;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn text_line(text: &str) -> DisplayLine {
        DisplayLine {
            segments: vec![Segment::Text(text.to_string())],
            width: text.len(),
        }
    }

    fn caret(x: u16, y: u16) -> CaretRect {
        CaretRect {
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        // Arrange & Act
        let visible = scroll_offset(2, 6);
        let below = scroll_offset(8, 6);
        let collapsed = scroll_offset(3, 0);

        // Assert
        assert_eq!(visible, 0);
        assert_eq!(below, 3);
        assert_eq!(collapsed, 0);
    }

    #[test]
    fn test_render_draws_chip_label_and_cursor() {
        // Arrange
        let backend = TestBackend::new(40, 4);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let layout = ComposerLayout {
            lines: vec![
                DisplayLine {
                    segments: vec![
                        Segment::Text("see ".to_string()),
                        Segment::Chip {
                            label: "@main.rs".to_string(),
                            selected: false,
                        },
                    ],
                    width: 12,
                },
                text_line("next"),
            ],
            caret: caret(4, 1),
        };
        let input = ComposerInput::new(layout, "unused");

        // Act
        terminal
            .draw(|f| {
                let area = f.area();
                input.render(f, area);
            })
            .expect("failed to draw");

        // Assert
        let buffer = terminal.backend().buffer();
        let text: String = buffer
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(text.contains("see @main.rs"));
        assert!(text.contains("next"));
        assert!(!text.contains("unused"));
        let chip_cell = &buffer[(1 + INPUT_PREFIX_WIDTH + 4, 1)];
        assert!(chip_cell.modifier.contains(Modifier::BOLD));
        let cursor = terminal
            .get_cursor_position()
            .expect("cursor position should be readable");
        assert_eq!((cursor.x, cursor.y), (1 + INPUT_PREFIX_WIDTH + 4, 2));
    }

    #[test]
    fn test_render_selected_chip_is_reversed() {
        // Arrange
        let backend = TestBackend::new(30, 3);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let layout = ComposerLayout {
            lines: vec![DisplayLine {
                segments: vec![Segment::Chip {
                    label: "@lib.rs".to_string(),
                    selected: true,
                }],
                width: 7,
            }],
            caret: caret(7, 0),
        };

        // Act
        terminal
            .draw(|f| {
                let area = f.area();
                ComposerInput::new(layout, "").render(f, area);
            })
            .expect("failed to draw");

        // Assert
        let cell = &terminal.backend().buffer()[(1 + INPUT_PREFIX_WIDTH, 1)];
        assert_eq!(cell.symbol(), "@");
        assert!(cell.modifier.contains(Modifier::REVERSED));
    }
}
