use composer::CaretRect;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::{PopupKind, PopupRow};
use crate::ui::{Component, INPUT_PREFIX_WIDTH};

const MAX_VISIBLE_ROWS: usize = 8;
const MAX_WIDTH: u16 = 60;

/// Dropdown of mention or slash-command options anchored at the caret.
pub struct PopupMenu {
    kind: PopupKind,
    rows: Vec<PopupRow>,
    selected: usize,
}

impl PopupMenu {
    pub fn new(kind: PopupKind, rows: Vec<PopupRow>, selected: usize) -> Self {
        Self {
            kind,
            rows,
            selected,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            PopupKind::Mention => " Mentions ",
            PopupKind::Slash => " Commands ",
        }
    }

    /// Index of the first visible row so the selection stays in view.
    fn first_visible(&self) -> usize {
        self.selected.saturating_sub(MAX_VISIBLE_ROWS - 1)
    }

    /// Places the menu just above the composer, starting at the caret column
    /// and shifted left when it would leave `bounds`.
    pub fn area(&self, input_area: Rect, anchor: CaretRect, bounds: Rect) -> Rect {
        let content_width = self
            .rows
            .iter()
            .map(|row| row.label.width() + row.detail.width() + 4)
            .max()
            .unwrap_or(0)
            .max(self.title().width());
        let width = u16::try_from(content_width)
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(MAX_WIDTH)
            .min(bounds.width);
        let rows = self.rows.len().clamp(1, MAX_VISIBLE_ROWS);
        let height = u16::try_from(rows)
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(input_area.y.saturating_sub(bounds.y));

        let caret_x = input_area
            .x
            .saturating_add(1 + INPUT_PREFIX_WIDTH)
            .saturating_add(anchor.x);
        let x = caret_x.min(bounds.right().saturating_sub(width));

        Rect::new(x, input_area.y.saturating_sub(height), width, height)
    }
}

impl Component for PopupMenu {
    fn render(&self, f: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }

        let lines = if self.rows.is_empty() {
            vec![Line::from(Span::styled(
                "  No matches",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.rows
                .iter()
                .enumerate()
                .skip(self.first_visible())
                .take(MAX_VISIBLE_ROWS)
                .map(|(index, row)| {
                    let is_selected = index == self.selected;
                    let prefix = if is_selected { ">" } else { " " };
                    let label_style = if is_selected {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    let detail_style = if is_selected {
                        Style::default().fg(Color::Gray)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };

                    Line::from(vec![
                        Span::styled(format!("{prefix} {}", row.label), label_style),
                        Span::styled(format!("  {}", row.detail), detail_style),
                    ])
                })
                .collect()
        };

        let dropdown = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(self.title(), Style::default().fg(Color::Cyan))),
        );

        f.render_widget(Clear, area);
        f.render_widget(dropdown, area);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn rows(count: usize) -> Vec<PopupRow> {
        (0..count)
            .map(|index| PopupRow {
                label: format!("file_{index}.rs"),
                detail: format!("src/file_{index}.rs"),
            })
            .collect()
    }

    fn caret_at(x: u16) -> CaretRect {
        CaretRect {
            x,
            y: 0,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_area_sits_above_input_at_caret_column() {
        // Arrange
        let menu = PopupMenu::new(PopupKind::Mention, rows(2), 0);
        let bounds = Rect::new(0, 0, 80, 24);
        let input_area = Rect::new(0, 18, 80, 3);

        // Act
        let area = menu.area(input_area, caret_at(5), bounds);

        // Assert
        assert_eq!(area.x, 1 + INPUT_PREFIX_WIDTH + 5);
        assert_eq!(area.height, 4);
        assert_eq!(area.bottom(), input_area.y);
    }

    #[test]
    fn test_area_shifts_left_at_right_edge() {
        // Arrange
        let menu = PopupMenu::new(PopupKind::Slash, rows(1), 0);
        let bounds = Rect::new(0, 0, 40, 24);
        let input_area = Rect::new(0, 18, 40, 3);

        // Act
        let area = menu.area(input_area, caret_at(30), bounds);

        // Assert
        assert!(area.right() <= bounds.right());
    }

    #[test]
    fn test_first_visible_follows_selection() {
        // Arrange
        let menu = PopupMenu::new(PopupKind::Mention, rows(20), 10);

        // Act
        let first = menu.first_visible();

        // Assert
        assert_eq!(first, 10 - (MAX_VISIBLE_ROWS - 1));
    }

    #[test]
    fn test_render_marks_selected_row_and_empty_state() {
        // Arrange
        let backend = TestBackend::new(50, 7);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let menu = PopupMenu::new(PopupKind::Mention, rows(2), 1);
        let empty = PopupMenu::new(PopupKind::Mention, Vec::new(), 0);

        // Act
        terminal
            .draw(|f| {
                menu.render(f, Rect::new(0, 0, 50, 4));
                empty.render(f, Rect::new(0, 4, 50, 3));
            })
            .expect("failed to draw");

        // Assert
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(text.contains("> file_1.rs"));
        assert!(text.contains("  file_0.rs"));
        assert!(text.contains("Mentions"));
        assert!(text.contains("No matches"));
    }
}
