use composer::{CaretRect, Composer, ComposerHost, KeyInput, KeyOutcome, TriggerEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::mentions::MentionCatalog;
use crate::runtime::EventResult;
use crate::settings::Settings;
use crate::slash::SlashCommand;

/// Label toggled with Shift+Tab and stamped on submitted messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgentMode {
    #[default]
    Act,
    Plan,
}

impl AgentMode {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Act => Self::Plan,
            Self::Plan => Self::Act,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Act => "act",
            Self::Plan => "plan",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupKind {
    Mention,
    Slash,
}

/// Popup opened by a composer trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub kind: PopupKind,
    pub search_text: String,
    /// Caret cell inside the composer when the trigger last changed.
    pub anchor: CaretRect,
    pub selected: usize,
}

/// Composer host that turns callbacks into popup and request state.
#[derive(Debug, Default)]
pub struct PopupHost {
    has_content: bool,
    mode_toggle_requested: bool,
    popup: Option<Popup>,
    submit_requested: bool,
}

impl PopupHost {
    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    fn open(&mut self, kind: PopupKind, event: TriggerEvent) {
        self.popup = Some(Popup {
            kind,
            search_text: event.search_text,
            anchor: event.rect,
            selected: 0,
        });
    }

    fn close(&mut self, kind: PopupKind) {
        if self.popup.as_ref().is_some_and(|popup| popup.kind == kind) {
            self.popup = None;
        }
    }
}

impl ComposerHost for PopupHost {
    fn on_trigger(&mut self, event: TriggerEvent) {
        self.open(PopupKind::Mention, event);
    }

    fn on_close_trigger(&mut self) {
        self.close(PopupKind::Mention);
    }

    fn on_slash_trigger(&mut self, event: TriggerEvent) {
        self.open(PopupKind::Slash, event);
    }

    fn on_close_slash_trigger(&mut self) {
        self.close(PopupKind::Slash);
    }

    fn on_content_change(&mut self, has_content: bool) {
        self.has_content = has_content;
    }

    fn on_submit(&mut self) {
        self.submit_requested = true;
    }

    fn on_shift_tab(&mut self) {
        self.mode_toggle_requested = true;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message { mode: AgentMode, value: String },
    Notice(String),
}

/// One row of the open popup, ready to draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupRow {
    pub label: String,
    pub detail: String,
}

pub struct App {
    pub composer: Composer<PopupHost>,
    catalog: MentionCatalog,
    /// Wrap width from settings; `0` follows the terminal.
    configured_width: u16,
    mode: AgentMode,
    placeholder: String,
    should_quit: bool,
    show_help: bool,
    transcript: Vec<TranscriptEntry>,
}

impl App {
    pub fn new(settings: &Settings, catalog: MentionCatalog, initial_value: Option<&str>) -> Self {
        let initial_value = initial_value.unwrap_or_default();
        let host = PopupHost {
            has_content: !initial_value.trim().is_empty(),
            ..PopupHost::default()
        };
        let mut composer = Composer::new(host, settings.composer)
            .with_resolver(Box::new(catalog.clone()))
            .with_value(initial_value);
        composer.focus();

        Self {
            composer,
            catalog,
            configured_width: settings.composer.wrap_width,
            mode: AgentMode::default(),
            placeholder: settings.placeholder.clone(),
            should_quit: false,
            show_help: false,
            transcript: Vec::new(),
        }
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.composer.host().popup()
    }

    /// Fits the composer wrap width into `available` cells.
    pub fn resize(&mut self, available: u16) {
        let width = match self.configured_width {
            0 => available,
            configured => configured.min(available),
        };
        self.composer.set_wrap_width(width.max(1));
    }

    /// Returns the rows of the open popup.
    pub fn popup_rows(&self) -> Vec<PopupRow> {
        let Some(popup) = self.popup() else {
            return Vec::new();
        };

        match popup.kind {
            PopupKind::Mention => self
                .catalog
                .filter(&popup.search_text)
                .into_iter()
                .map(|entry| PopupRow {
                    label: format!("{} {}", entry.option.kind.icon(), entry.option.label),
                    detail: entry.detail.clone(),
                })
                .collect(),
            PopupKind::Slash => SlashCommand::matching(&popup.search_text)
                .into_iter()
                .map(|command| PopupRow {
                    label: command.name().to_string(),
                    detail: command.description().to_string(),
                })
                .collect(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return EventResult::Quit;
        }
        let Some(input) = key_input(key) else {
            return EventResult::Continue;
        };

        if self.composer.handle_key(input) == KeyOutcome::Forwarded {
            self.handle_popup_key(input);
        }
        let host = self.composer.host_mut();
        let submit = std::mem::take(&mut host.submit_requested);
        if std::mem::take(&mut host.mode_toggle_requested) {
            self.mode = self.mode.toggle();
        }
        if submit {
            self.submit();
        }

        if self.should_quit {
            EventResult::Quit
        } else {
            EventResult::Continue
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.paste(&text.replace("\r\n", "\n").replace('\r', "\n"));
    }

    /// Tracks terminal focus. Regaining focus keeps the caret where it was.
    pub fn handle_focus(&mut self, gained: bool) {
        if gained {
            self.composer.restore_focus();
        } else {
            self.composer.blur();
        }
    }

    fn handle_popup_key(&mut self, input: KeyInput) {
        match input {
            // Nothing to pick: close the popup and let Enter submit.
            KeyInput::Enter { .. } | KeyInput::Tab if self.popup_rows().is_empty() => {
                self.composer.handle_key(KeyInput::Escape);
                if input != KeyInput::Tab {
                    self.composer.handle_key(input);
                }
            }
            KeyInput::Enter { .. } | KeyInput::Tab => self.commit_popup(),
            KeyInput::Up | KeyInput::Down => {
                let count = self.popup_rows().len();
                let Some(popup) = self.composer.host_mut().popup.as_mut() else {
                    return;
                };
                if count == 0 {
                    return;
                }
                popup.selected = if input == KeyInput::Up {
                    popup.selected.checked_sub(1).unwrap_or(count - 1)
                } else {
                    (popup.selected + 1) % count
                };
            }
            _ => {}
        }
    }

    fn commit_popup(&mut self) {
        let Some(popup) = self.popup().cloned() else {
            return;
        };

        match popup.kind {
            PopupKind::Mention => {
                let option = self
                    .catalog
                    .filter(&popup.search_text)
                    .get(popup.selected)
                    .map(|entry| entry.option.clone());
                if let Some(option) = option {
                    self.composer.insert_mention(&option);
                }
            }
            PopupKind::Slash => {
                let command = SlashCommand::matching(&popup.search_text)
                    .get(popup.selected)
                    .copied();
                if let Some(command) = command {
                    self.composer.clear_slash_command();
                    self.run_command(command);
                }
            }
        }
    }

    fn run_command(&mut self, command: SlashCommand) {
        debug!(command = command.name(), "running slash command");

        match command {
            SlashCommand::Clear => self.transcript.clear(),
            SlashCommand::Help => self.show_help = !self.show_help,
            SlashCommand::Quit => self.should_quit = true,
            SlashCommand::Value => {
                let value = self.composer.get_value();
                self.transcript
                    .push(TranscriptEntry::Notice(format!("value: {value:?}")));
            }
        }
    }

    fn submit(&mut self) {
        if !self.composer.host().has_content() {
            return;
        }

        let value = self.composer.get_value();
        debug!(mode = self.mode.label(), chars = value.chars().count(), "submitting draft");
        self.transcript.push(TranscriptEntry::Message {
            mode: self.mode,
            value,
        });
        self.composer.clear();
    }
}

/// Maps a terminal key to a composer key. Alt or Shift with Enter inserts a
/// line break.
fn key_input(key: KeyEvent) -> Option<KeyInput> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    let input = match key.code {
        KeyCode::Enter | KeyCode::Char('\r' | '\n') => KeyInput::Enter {
            shift: shift || key.modifiers.contains(KeyModifiers::ALT),
        },
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => return None,
        KeyCode::Char(character) => KeyInput::Char(character),
        KeyCode::Backspace => KeyInput::Backspace,
        KeyCode::Delete => KeyInput::Delete,
        KeyCode::Left => KeyInput::Left { shift },
        KeyCode::Right => KeyInput::Right { shift },
        KeyCode::Up => KeyInput::Up,
        KeyCode::Down => KeyInput::Down,
        KeyCode::Home => KeyInput::Home,
        KeyCode::End => KeyInput::End,
        KeyCode::Tab => KeyInput::Tab,
        KeyCode::BackTab => KeyInput::ShiftTab,
        KeyCode::Esc => KeyInput::Escape,
        _ => return None,
    };

    Some(input)
}
