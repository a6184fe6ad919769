use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::build::{MentionResolver, StructuralResolver, build};
use crate::edit::{
    self, caret_at, caret_position, chips_in_range, content_len, delete_backward,
    delete_forward, delete_range, end_caret, insert_chip, insert_line_break, line_down,
    line_end, line_start, line_up,
};
use crate::host::{CaretRect, ComposerHost, TriggerEvent};
use crate::layout::{ComposerLayout, LayoutOptions, layout};
use crate::mention::{FileMentionOption, MentionChip};
use crate::serialize::serialize;
use crate::tree::{Caret, DocumentTree, NodeId};
use crate::trigger::{TriggerKind, TriggerState, TriggerTracker, TriggerTransition};
use crate::walker::{WalkOutcome, locate_text_index, walk};

const DEFAULT_WRAP_WIDTH: u16 = 80;

/// Presentation settings of a composer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposerConfig {
    /// Wrap width in terminal cells; `0` disables wrapping.
    pub wrap_width: u16,
    pub show_chip_icons: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            show_chip_icons: true,
        }
    }
}

/// Key press delivered by the host, already decoded from its event system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter { shift: bool },
    Backspace,
    Delete,
    Left { shift: bool },
    Right { shift: bool },
    Up,
    Down,
    Home,
    End,
    Tab,
    ShiftTab,
    Escape,
}

/// What the composer did with a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Consumed by the composer.
    Handled,
    /// Left for the open popup (navigation or selection).
    Forwarded,
    /// Enter without a modifier; the host was told to submit.
    Submitted,
    /// Nothing to do.
    Ignored,
}

/// Mention-aware text composer.
///
/// Owns its document tree, caret, trigger state and host. Every content or
/// selection change runs one unified walk and reports trigger transitions
/// and content changes to the host.
pub struct Composer<H: ComposerHost> {
    /// Selection anchor as a visual position; `None` for a collapsed caret.
    anchor: Option<usize>,
    caret: Caret,
    config: ComposerConfig,
    focused: bool,
    highlighted: Vec<NodeId>,
    host: H,
    last_walk: WalkOutcome,
    resolver: Box<dyn MentionResolver>,
    tree: DocumentTree,
    triggers: TriggerTracker,
}

impl<H: ComposerHost> Composer<H> {
    /// Creates an empty composer that resolves tokens structurally.
    pub fn new(host: H, config: ComposerConfig) -> Self {
        let tree = DocumentTree::new();
        let caret = end_caret(&tree);

        Self {
            anchor: None,
            caret,
            config,
            focused: false,
            highlighted: Vec::new(),
            host,
            last_walk: WalkOutcome::default(),
            resolver: Box::new(StructuralResolver),
            tree,
            triggers: TriggerTracker::new(),
        }
    }

    /// Replaces the resolver used by [`Self::set_value`] and initial values.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Box<dyn MentionResolver>) -> Self {
        self.resolver = resolver;

        self
    }

    /// Builds the initial content from `value` without notifying the host.
    #[must_use]
    pub fn with_value(mut self, value: &str) -> Self {
        self.tree = build(value, self.resolver.as_ref());
        self.caret = end_caret(&self.tree);
        self.last_walk = walk(&self.tree, self.caret);

        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn caret(&self) -> Caret {
        self.caret
    }

    /// Changes the wrap width used for layout and trigger rectangles.
    pub fn set_wrap_width(&mut self, width: u16) {
        self.config.wrap_width = width;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn trigger_state(&self) -> &TriggerState {
        self.triggers.state()
    }

    /// Result of the walk that ran after the last change.
    pub fn last_walk(&self) -> &WalkOutcome {
        &self.last_walk
    }

    /// Chips overlapping the current range selection.
    pub fn highlighted(&self) -> &[NodeId] {
        &self.highlighted
    }

    /// Returns the caret as a visual position.
    pub fn caret_position(&self) -> usize {
        caret_position(&self.tree, self.caret).unwrap_or_else(|| content_len(&self.tree))
    }

    /// Returns the selected `[start, end)` visual range, if not collapsed.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        let focus = self.caret_position();

        (anchor != focus).then(|| (anchor.min(focus), anchor.max(focus)))
    }

    /// Focuses the composer and puts the caret at the end of the content.
    pub fn focus(&mut self) {
        self.focused = true;
        self.anchor = None;
        self.caret = end_caret(&self.tree);
        self.host.on_focus();
        self.refresh(false);
    }

    /// Marks the composer focused again, keeping caret, selection and any
    /// open trigger as they were.
    pub fn restore_focus(&mut self) {
        self.focused = true;
        self.host.on_focus();
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.host.on_blur();
    }

    /// Returns the serialized value.
    pub fn get_value(&self) -> String {
        serialize(&self.tree)
    }

    /// Rebuilds the content from `value`, closing any open popup.
    pub fn set_value(&mut self, value: &str) {
        let changed = self.get_value() != value;
        self.tree = build(value, self.resolver.as_ref());
        self.caret = end_caret(&self.tree);
        self.anchor = None;
        self.highlighted.clear();
        if let Some(transition) = self.triggers.reset() {
            self.notify(transition, CaretRect::default());
        }
        self.last_walk = walk(&self.tree, self.caret);
        if changed {
            self.host.on_content_change(has_content(&self.last_walk));
        }
    }

    /// Empties the composer. Calling it again changes nothing.
    pub fn clear(&mut self) {
        self.set_value("");
    }

    /// Replaces the open `@` trigger span with a chip for `option`, followed
    /// by one space. Without an open mention trigger the chip goes to the
    /// caret.
    pub fn insert_mention(&mut self, option: &FileMentionOption) {
        let chip = MentionChip::from(option);
        let state = self.triggers.state().clone();

        let caret = match state {
            TriggerState::MentionOpen { start_index, .. } => {
                let Some((start, end)) = self.trigger_range(start_index, '@') else {
                    self.abandon_trigger();

                    return;
                };
                let caret = delete_range(&mut self.tree, start, end);
                if let Some(transition) = self.triggers.commit() {
                    self.notify(transition, CaretRect::default());
                }

                caret
            }
            TriggerState::Idle | TriggerState::SlashOpen { .. } => {
                self.delete_selection();

                self.caret
            }
        };
        debug!(id = %chip.id, "inserting mention chip");
        self.caret = insert_chip(&mut self.tree, caret, chip);
        self.anchor = None;
        self.refresh(true);
    }

    /// Removes the open `/` trigger span and leaves the caret where it was.
    pub fn clear_slash_command(&mut self) {
        let TriggerState::SlashOpen { start_index, .. } = *self.triggers.state() else {
            return;
        };
        let Some((start, end)) = self.trigger_range(start_index, '/') else {
            self.abandon_trigger();

            return;
        };

        self.caret = delete_range(&mut self.tree, start, end);
        self.anchor = None;
        if let Some(transition) = self.triggers.commit() {
            self.notify(transition, CaretRect::default());
        }
        self.refresh(true);
    }

    /// Inserts plain text at the caret, replacing any selection.
    pub fn insert_text(&mut self, text: &str) {
        self.delete_selection();
        self.caret = edit::insert_text(&mut self.tree, self.caret, text);
        self.refresh(true);
    }

    /// Offers `text` to the host and inserts it unless the host consumed it.
    pub fn paste(&mut self, text: &str) {
        if self.host.on_paste(text) {
            return;
        }

        self.insert_text(text);
    }

    /// Selects from visual position `anchor` to `focus`.
    pub fn set_selection(&mut self, anchor: usize, focus: usize) {
        let len = content_len(&self.tree);
        let anchor = anchor.min(len);
        let focus = focus.min(len);
        self.caret = caret_at(&self.tree, focus);
        self.anchor = (anchor != focus).then_some(anchor);
        self.refresh(false);
    }

    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        let trigger_open = self.triggers.state().is_open();

        match key {
            KeyInput::Char(ch) => {
                self.insert_text(ch.encode_utf8(&mut [0; 4]));

                KeyOutcome::Handled
            }
            KeyInput::Enter { shift: true } => {
                self.delete_selection();
                self.caret = insert_line_break(&mut self.tree, self.caret);
                self.refresh(true);

                KeyOutcome::Handled
            }
            KeyInput::Enter { shift: false } | KeyInput::Tab | KeyInput::Up | KeyInput::Down
                if trigger_open =>
            {
                KeyOutcome::Forwarded
            }
            KeyInput::Enter { shift: false } => {
                self.host.on_submit();

                KeyOutcome::Submitted
            }
            KeyInput::Tab => KeyOutcome::Ignored,
            KeyInput::Backspace | KeyInput::Delete => {
                if !self.delete_selection() {
                    self.caret = if key == KeyInput::Backspace {
                        delete_backward(&mut self.tree, self.caret)
                    } else {
                        delete_forward(&mut self.tree, self.caret)
                    };
                }
                self.refresh(true);

                KeyOutcome::Handled
            }
            KeyInput::Left { shift } => {
                let target = match self.selection() {
                    Some((start, _)) if !shift => start,
                    _ => self.caret_position().saturating_sub(1),
                };
                self.move_caret(target, shift);

                KeyOutcome::Handled
            }
            KeyInput::Right { shift } => {
                let target = match self.selection() {
                    Some((_, end)) if !shift => end,
                    _ => self.caret_position() + 1,
                };
                self.move_caret(target, shift);

                KeyOutcome::Handled
            }
            KeyInput::Up => {
                self.move_caret(line_up(&self.tree, self.caret_position()), false);

                KeyOutcome::Handled
            }
            KeyInput::Down => {
                self.move_caret(line_down(&self.tree, self.caret_position()), false);

                KeyOutcome::Handled
            }
            KeyInput::Home => {
                self.move_caret(line_start(&self.tree, self.caret_position()), false);

                KeyOutcome::Handled
            }
            KeyInput::End => {
                self.move_caret(line_end(&self.tree, self.caret_position()), false);

                KeyOutcome::Handled
            }
            KeyInput::ShiftTab => {
                self.host.on_shift_tab();

                KeyOutcome::Handled
            }
            KeyInput::Escape => {
                if let Some(transition) = self.triggers.cancel() {
                    self.notify(transition, CaretRect::default());

                    return KeyOutcome::Handled;
                }
                if self.selection().is_some() {
                    self.move_caret(self.caret_position(), false);

                    return KeyOutcome::Handled;
                }

                KeyOutcome::Ignored
            }
        }
    }

    /// Lays the content out with the configured width and icon setting.
    pub fn layout(&self) -> ComposerLayout {
        layout(
            &self.tree,
            self.caret,
            LayoutOptions {
                width: self.config.wrap_width,
                show_icons: self.config.show_chip_icons,
            },
            &self.highlighted,
        )
    }

    /// Runs the unified walk and tells the host what changed.
    fn refresh(&mut self, content_changed: bool) {
        let selection = self.selection();
        self.highlighted = selection.map_or_else(Vec::new, |(start, end)| {
            chips_in_range(&self.tree, start, end)
        });

        let walk = walk(&self.tree, self.caret);
        let transitions = self.triggers.sync(&walk, selection.is_none());
        let needs_rect = transitions
            .iter()
            .any(|transition| !matches!(transition, TriggerTransition::Closed { .. }));
        let rect = if needs_rect {
            self.layout().caret
        } else {
            CaretRect::default()
        };
        for transition in transitions {
            self.notify(transition, rect);
        }

        if content_changed {
            self.host.on_content_change(has_content(&walk));
        }
        self.last_walk = walk;
    }

    fn notify(&mut self, transition: TriggerTransition, rect: CaretRect) {
        match transition {
            TriggerTransition::Opened { kind, search_text }
            | TriggerTransition::Updated { kind, search_text } => {
                let event = TriggerEvent { search_text, rect };
                match kind {
                    TriggerKind::Mention => self.host.on_trigger(event),
                    TriggerKind::Slash => self.host.on_slash_trigger(event),
                }
            }
            TriggerTransition::Closed { kind, .. } => match kind {
                TriggerKind::Mention => self.host.on_close_trigger(),
                TriggerKind::Slash => self.host.on_close_slash_trigger(),
            },
        }
    }

    /// Maps the trigger starting at serialized `start_index` to the visual
    /// range `[trigger, caret)`, checking that `marker` still sits there.
    fn trigger_range(&self, start_index: usize, marker: char) -> Option<(usize, usize)> {
        let start_caret = locate_text_index(&self.tree, start_index)?;
        let found = self
            .tree
            .text(start_caret.node)
            .and_then(|run| run.text.chars().nth(start_caret.offset));
        if found != Some(marker) {
            return None;
        }
        let start = caret_position(&self.tree, start_caret)?;
        let end = caret_position(&self.tree, self.caret)?;

        (start < end).then_some((start, end))
    }

    /// Closes the open trigger without touching content.
    fn abandon_trigger(&mut self) {
        warn!(state = ?self.triggers.state(), "trigger start no longer maps onto the document");
        if let Some(transition) = self.triggers.abandon() {
            self.notify(transition, CaretRect::default());
        }
    }

    /// Deletes the selected range; returns whether anything was selected.
    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection() else {
            self.anchor = None;

            return false;
        };
        self.caret = delete_range(&mut self.tree, start, end);
        self.anchor = None;

        true
    }

    fn move_caret(&mut self, target: usize, extend: bool) {
        let current = self.caret_position();
        if extend {
            self.anchor.get_or_insert(current);
        } else {
            self.anchor = None;
        }
        self.caret = caret_at(&self.tree, target);
        self.refresh(false);
    }
}

fn has_content(walk: &WalkOutcome) -> bool {
    !walk.serialized.trim().is_empty()
}
