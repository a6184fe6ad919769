use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::TranscriptEntry;
use crate::ui::Component;

const HELP_LINES: [(&str, &str); 7] = [
    ("enter", "send the draft"),
    ("alt+enter", "insert a line break"),
    ("@", "mention a file, folder or skill"),
    ("/", "run a command"),
    ("↑ ↓ tab", "pick from the open popup"),
    ("esc", "close the popup"),
    ("shift+tab", "toggle act / plan"),
];

/// Submitted drafts and notices, newest at the bottom.
pub struct Transcript<'a> {
    entries: &'a [TranscriptEntry],
    show_help: bool,
}

impl<'a> Transcript<'a> {
    pub fn new(entries: &'a [TranscriptEntry], show_help: bool) -> Self {
        Self { entries, show_help }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                TranscriptEntry::Message { mode, value } => {
                    lines.push(Line::from(Span::styled(
                        format!("[{}]", mode.label()),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(value.split('\n').map(|text| Line::from(format!("  {text}"))));
                }
                TranscriptEntry::Notice(text) => lines.push(Line::from(Span::styled(
                    text.as_str(),
                    Style::default().fg(Color::DarkGray),
                ))),
            }
        }

        if self.show_help {
            lines.push(Line::from(""));
            lines.extend(HELP_LINES.iter().map(|(key, description)| {
                Line::from(vec![
                    Span::styled(format!("{key:>10} "), Style::default().fg(Color::Cyan)),
                    Span::raw(*description),
                ])
            }));
        }

        lines
    }
}

impl Component for Transcript<'_> {
    fn render(&self, f: &mut Frame, area: Rect) {
        let lines = self.lines();
        let overflow = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .saturating_sub(area.height);

        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((overflow, 0)),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AgentMode;

    #[test]
    fn test_lines_split_messages_and_append_help() {
        // Arrange
        let entries = vec![
            TranscriptEntry::Message {
                mode: AgentMode::Plan,
                value: "one\ntwo".to_string(),
            },
            TranscriptEntry::Notice("value: \"\"".to_string()),
        ];

        // Act
        let plain = Transcript::new(&entries, false).lines();
        let with_help = Transcript::new(&entries, true).lines();

        // Assert
        assert_eq!(plain.len(), 4);
        assert_eq!(plain[0].to_string(), "[plan]");
        assert_eq!(plain[2].to_string(), "  two");
        assert_eq!(with_help.len(), 4 + 1 + HELP_LINES.len());
    }
}
