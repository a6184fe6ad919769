use tracing::debug;

use crate::walker::{TriggerSpan, WalkOutcome};

/// Which popup a trigger drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// `@` file, folder and skill mentions.
    Mention,
    /// `/` commands at the start of a line.
    Slash,
}

/// Open trigger, if any. Mention and slash are mutually exclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TriggerState {
    #[default]
    Idle,
    MentionOpen {
        start_index: usize,
        search_text: String,
    },
    SlashOpen {
        start_index: usize,
        search_text: String,
    },
}

impl TriggerState {
    fn open(kind: TriggerKind, span: &TriggerSpan) -> Self {
        let start_index = span.start_index;
        let search_text = span.search_text.clone();

        match kind {
            TriggerKind::Mention => Self::MentionOpen {
                start_index,
                search_text,
            },
            TriggerKind::Slash => Self::SlashOpen {
                start_index,
                search_text,
            },
        }
    }

    pub fn kind(&self) -> Option<TriggerKind> {
        match self {
            Self::Idle => None,
            Self::MentionOpen { .. } => Some(TriggerKind::Mention),
            Self::SlashOpen { .. } => Some(TriggerKind::Slash),
        }
    }

    pub fn start_index(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::MentionOpen { start_index, .. } | Self::SlashOpen { start_index, .. } => {
                Some(*start_index)
            }
        }
    }

    pub fn search_text(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::MentionOpen { search_text, .. } | Self::SlashOpen { search_text, .. } => {
                Some(search_text)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Why an open trigger closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The walk no longer reports the trigger.
    Vanished,
    /// A range is selected instead of a collapsed caret.
    SelectionRange,
    /// A mention trigger took over an open slash trigger.
    Preempted,
    /// Explicit cancel, e.g. escape.
    Cancelled,
    /// The host picked an item from the popup.
    Committed,
    /// The whole value was replaced or cleared.
    Reset,
    /// The tracked start no longer maps onto the tree.
    Desync,
}

/// Side effect the host must be told about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerTransition {
    Opened {
        kind: TriggerKind,
        search_text: String,
    },
    /// Still open, but the search text changed.
    Updated {
        kind: TriggerKind,
        search_text: String,
    },
    Closed {
        kind: TriggerKind,
        reason: CloseReason,
    },
}

/// Instance-scoped trigger state machine fed by walk outcomes.
#[derive(Clone, Debug, Default)]
pub struct TriggerTracker {
    state: TriggerState,
    /// Trigger dismissed by the user; it stays closed until the walk stops
    /// reporting it.
    suppressed: Option<(TriggerKind, usize)>,
}

impl TriggerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    /// Reconciles the state with a fresh walk and returns the transitions to
    /// report, closes first.
    pub fn sync(
        &mut self,
        walk: &WalkOutcome,
        selection_collapsed: bool,
    ) -> Vec<TriggerTransition> {
        let mut candidate = walk
            .mention_trigger
            .as_ref()
            .map(|span| (TriggerKind::Mention, span))
            .or_else(|| {
                walk.slash_trigger
                    .as_ref()
                    .map(|span| (TriggerKind::Slash, span))
            });

        if let Some(suppressed) = self.suppressed {
            if candidate.is_some_and(|(kind, span)| (kind, span.start_index) == suppressed) {
                candidate = None;
            } else {
                self.suppressed = None;
            }
        }

        let mut close_reason = CloseReason::Vanished;
        if !selection_collapsed {
            candidate = None;
            close_reason = CloseReason::SelectionRange;
        }

        let mut transitions = Vec::new();
        match (self.state.kind(), candidate) {
            (None, None) => {}
            (Some(kind), None) => {
                self.state = TriggerState::Idle;
                transitions.push(TriggerTransition::Closed {
                    kind,
                    reason: close_reason,
                });
            }
            (current, Some((kind, span))) => {
                let same_trigger =
                    current == Some(kind) && self.state.start_index() == Some(span.start_index);
                if same_trigger {
                    if self.state.search_text() != Some(span.search_text.as_str()) {
                        transitions.push(TriggerTransition::Updated {
                            kind,
                            search_text: span.search_text.clone(),
                        });
                    }
                } else {
                    if let Some(current) = current {
                        let preempted =
                            current == TriggerKind::Slash && kind == TriggerKind::Mention;
                        let reason = if preempted {
                            CloseReason::Preempted
                        } else {
                            CloseReason::Vanished
                        };
                        transitions.push(TriggerTransition::Closed {
                            kind: current,
                            reason,
                        });
                    }
                    transitions.push(TriggerTransition::Opened {
                        kind,
                        search_text: span.search_text.clone(),
                    });
                }
                self.state = TriggerState::open(kind, span);
            }
        }

        transitions
    }

    /// Dismisses the open trigger and keeps it closed while it persists.
    pub fn cancel(&mut self) -> Option<TriggerTransition> {
        let kind = self.state.kind()?;
        self.suppressed = self.state.start_index().map(|start| (kind, start));
        debug!(?kind, "trigger cancelled");

        self.close(CloseReason::Cancelled)
    }

    /// Closes the trigger after the host committed a popup item.
    pub fn commit(&mut self) -> Option<TriggerTransition> {
        self.close(CloseReason::Committed)
    }

    /// Closes the trigger because its start no longer maps onto the tree.
    pub fn abandon(&mut self) -> Option<TriggerTransition> {
        self.close(CloseReason::Desync)
    }

    /// Returns to `Idle` and forgets any suppression.
    pub fn reset(&mut self) -> Option<TriggerTransition> {
        self.suppressed = None;

        self.close(CloseReason::Reset)
    }

    fn close(&mut self, reason: CloseReason) -> Option<TriggerTransition> {
        let kind = self.state.kind()?;
        self.state = TriggerState::Idle;

        Some(TriggerTransition::Closed { kind, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_with(mention: Option<(usize, &str)>, slash: Option<(usize, &str)>) -> WalkOutcome {
        let to_span = |(start_index, search_text): (usize, &str)| TriggerSpan {
            start_index,
            search_text: search_text.to_string(),
        };

        WalkOutcome {
            mention_trigger: mention.map(to_span),
            slash_trigger: slash.map(to_span),
            ..WalkOutcome::default()
        }
    }

    #[test]
    fn test_idle_to_mention_open() {
        // Arrange
        let mut tracker = TriggerTracker::new();

        // Act
        let transitions = tracker.sync(&walk_with(Some((0, "")), None), true);

        // Assert
        assert_eq!(
            transitions,
            vec![TriggerTransition::Opened {
                kind: TriggerKind::Mention,
                search_text: String::new(),
            }]
        );
        assert_eq!(
            tracker.state(),
            &TriggerState::MentionOpen {
                start_index: 0,
                search_text: String::new(),
            }
        );
    }

    #[test]
    fn test_search_change_updates_without_reopening() {
        // Arrange
        let mut tracker = TriggerTracker::new();
        tracker.sync(&walk_with(Some((2, "a")), None), true);

        // Act
        let changed = tracker.sync(&walk_with(Some((2, "ab")), None), true);
        let unchanged = tracker.sync(&walk_with(Some((2, "ab")), None), true);

        // Assert
        assert_eq!(
            changed,
            vec![TriggerTransition::Updated {
                kind: TriggerKind::Mention,
                search_text: "ab".to_string(),
            }]
        );
        assert!(unchanged.is_empty());
    }

    #[test]
    fn test_mention_preempts_open_slash() {
        // Arrange
        let mut tracker = TriggerTracker::new();
        tracker.sync(&walk_with(None, Some((0, "cmd"))), true);

        // Act
        let transitions = tracker.sync(&walk_with(Some((4, "")), None), true);

        // Assert
        assert_eq!(
            transitions,
            vec![
                TriggerTransition::Closed {
                    kind: TriggerKind::Slash,
                    reason: CloseReason::Preempted,
                },
                TriggerTransition::Opened {
                    kind: TriggerKind::Mention,
                    search_text: String::new(),
                },
            ]
        );
        assert_eq!(tracker.state().kind(), Some(TriggerKind::Mention));
    }

    #[test]
    fn test_range_selection_closes_trigger() {
        // Arrange
        let mut tracker = TriggerTracker::new();
        let walk = walk_with(None, Some((0, "x")));
        tracker.sync(&walk, true);

        // Act
        let transitions = tracker.sync(&walk, false);

        // Assert
        assert_eq!(
            transitions,
            vec![TriggerTransition::Closed {
                kind: TriggerKind::Slash,
                reason: CloseReason::SelectionRange,
            }]
        );
        assert_eq!(tracker.state(), &TriggerState::Idle);
    }

    #[test]
    fn test_cancelled_trigger_stays_closed_until_it_disappears() {
        // Arrange
        let mut tracker = TriggerTracker::new();
        tracker.sync(&walk_with(Some((0, "a")), None), true);

        // Act
        let cancelled = tracker.cancel();
        let same_trigger = tracker.sync(&walk_with(Some((0, "ab")), None), true);
        tracker.sync(&walk_with(None, None), true);
        let retyped = tracker.sync(&walk_with(Some((0, "")), None), true);

        // Assert
        assert_eq!(
            cancelled,
            Some(TriggerTransition::Closed {
                kind: TriggerKind::Mention,
                reason: CloseReason::Cancelled,
            })
        );
        assert!(same_trigger.is_empty());
        assert_eq!(retyped.len(), 1);
        assert!(tracker.state().is_open());
    }

    #[test]
    fn test_commit_and_reset_from_idle_report_nothing() {
        // Arrange
        let mut tracker = TriggerTracker::new();

        // Act & Assert
        assert_eq!(tracker.commit(), None);
        assert_eq!(tracker.reset(), None);
        assert_eq!(tracker.abandon(), None);
    }
}
