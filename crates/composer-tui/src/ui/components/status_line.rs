use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::AgentMode;
use crate::ui::Component;

/// One-row footer with the agent mode and key hints.
pub struct StatusLine {
    has_content: bool,
    mode: AgentMode,
}

impl StatusLine {
    pub fn new(mode: AgentMode, has_content: bool) -> Self {
        Self { has_content, mode }
    }

    fn hints(&self) -> &'static str {
        if self.has_content {
            "enter send · alt+enter newline · shift+tab mode · ctrl+c quit"
        } else {
            "@ mention · / command · shift+tab mode · ctrl+c quit"
        }
    }
}

impl Component for StatusLine {
    fn render(&self, f: &mut Frame, area: Rect) {
        let mode_color = match self.mode {
            AgentMode::Act => Color::Green,
            AgentMode::Plan => Color::Yellow,
        };
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.mode.label()),
                Style::default()
                    .fg(Color::Black)
                    .bg(mode_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", self.hints()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        f.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_follow_draft_content() {
        // Arrange
        let empty = StatusLine::new(AgentMode::Act, false);
        let drafted = StatusLine::new(AgentMode::Plan, true);

        // Act
        let empty_hints = empty.hints();
        let drafted_hints = drafted.hints();

        // Assert
        assert!(empty_hints.contains("@ mention"));
        assert!(drafted_hints.contains("enter send"));
    }
}
