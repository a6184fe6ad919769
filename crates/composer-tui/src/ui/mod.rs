pub mod components;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::app::App;
use components::composer_input::{ComposerInput, MAX_VISIBLE_LINES};
use components::popup_menu::PopupMenu;
use components::status_line::StatusLine;
use components::transcript::Transcript;

/// Cells taken by the ` › ` prompt prefix.
pub const INPUT_PREFIX_WIDTH: u16 = 3;

/// A trait for UI components that enforces a standard rendering interface.
pub trait Component {
    fn render(&self, f: &mut Frame, area: Rect);
}

/// Returns the wrap width left for text inside the bordered input.
pub fn composer_text_width(terminal_width: u16) -> u16 {
    terminal_width.saturating_sub(2 + INPUT_PREFIX_WIDTH)
}

pub fn render(f: &mut Frame, app: &App) {
    let layout = app.composer.layout();
    let visible_lines = u16::try_from(layout.lines.len())
        .unwrap_or(u16::MAX)
        .clamp(1, MAX_VISIBLE_LINES);

    let chunks = Layout::default()
        .constraints([
            Constraint::Min(0),                    // Transcript
            Constraint::Length(visible_lines + 2), // Composer
            Constraint::Length(1),                 // Status line
        ])
        .split(f.area());
    let transcript_area = chunks[0];
    let input_area = chunks[1];
    let status_area = chunks[2];

    Transcript::new(app.transcript(), app.show_help()).render(f, transcript_area);
    StatusLine::new(app.mode(), app.composer.host().has_content()).render(f, status_area);

    ComposerInput::new(layout, app.placeholder())
        .focused(app.composer.is_focused())
        .render(f, input_area);

    if let Some(popup) = app.popup() {
        let menu = PopupMenu::new(popup.kind, app.popup_rows(), popup.selected);
        let area = menu.area(input_area, popup.anchor, f.area());
        menu.render(f, area);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::mentions::MentionCatalog;
    use crate::settings::Settings;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_composer_text_width_subtracts_borders_and_prefix() {
        // Arrange & Act
        let width = composer_text_width(40);
        let tiny = composer_text_width(3);

        // Assert
        assert_eq!(width, 35);
        assert_eq!(tiny, 0);
    }

    #[test]
    fn test_render_empty_composer_shows_placeholder_and_mode() {
        // Arrange
        let backend = TestBackend::new(60, 12);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let app = App::new(&Settings::default(), MentionCatalog::default(), None);

        // Act
        terminal
            .draw(|f| render(f, &app))
            .expect("failed to draw");

        // Assert
        let text = buffer_text(&terminal);
        assert!(text.contains("Ask anything"));
        assert!(text.contains("act"));
    }

    #[test]
    fn test_render_slash_popup_lists_commands() {
        // Arrange
        let backend = TestBackend::new(60, 16);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let mut app = App::new(&Settings::default(), MentionCatalog::default(), None);
        app.resize(composer_text_width(60));
        app.handle_key(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE));

        // Act
        terminal
            .draw(|f| render(f, &app))
            .expect("failed to draw");

        // Assert
        let text = buffer_text(&terminal);
        assert!(text.contains("/clear"));
        assert!(text.contains("/quit"));
        assert!(text.contains("Commands"));
    }

    #[test]
    fn test_render_places_cursor_after_prefix() {
        // Arrange
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        let app = App::new(&Settings::default(), MentionCatalog::default(), Some("ab"));

        // Act
        terminal
            .draw(|f| render(f, &app))
            .expect("failed to draw");

        // Assert
        let cursor = terminal
            .get_cursor_position()
            .expect("cursor position should be readable");
        assert_eq!(cursor.x, 1 + INPUT_PREFIX_WIDTH + 2);
        assert_eq!(cursor.y, 10 - 1 - 3 + 1);
    }
}
