/// Screen cell of the caret, in composer-relative terminal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaretRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Payload sent when a trigger opens or its search text changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerEvent {
    pub search_text: String,
    /// Where the popup should anchor.
    pub rect: CaretRect,
}

/// Callbacks from a composer to the surface embedding it.
///
/// Every method has a no-op default so hosts implement only what they
/// render.
#[cfg_attr(test, mockall::automock)]
pub trait ComposerHost {
    /// A mention trigger opened or its search text changed.
    fn on_trigger(&mut self, _event: TriggerEvent) {}

    fn on_close_trigger(&mut self) {}

    /// A slash trigger opened or its search text changed.
    fn on_slash_trigger(&mut self, _event: TriggerEvent) {}

    fn on_close_slash_trigger(&mut self) {}

    /// Content changed; `has_content` is false for whitespace-only values.
    fn on_content_change(&mut self, _has_content: bool) {}

    /// Enter was pressed without a modifier and no trigger was open.
    fn on_submit(&mut self) {}

    fn on_shift_tab(&mut self) {}

    /// Offers pasted text to the host. Returning `true` consumes it.
    fn on_paste(&mut self, _text: &str) -> bool {
        false
    }

    fn on_focus(&mut self) {}

    fn on_blur(&mut self) {}
}

impl ComposerHost for () {}
