use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};
use tokio::sync::mpsc;

use crate::app::App;
use crate::runtime::EventResult;

pub(crate) fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) {
    std::thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(250)) {
                Ok(true) => {
                    if let Ok(event) = crossterm::event::read()
                        && event_tx.send(event).is_err()
                    {
                        break;
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
}

pub(crate) async fn process_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    tick: &mut tokio::time::Interval,
) -> EventResult {
    // The tick only forces a redraw, which picks up terminal resizes.
    let maybe_event = tokio::select! {
        biased;
        event = event_rx.recv() => {
            let Some(event) = event else {
                return EventResult::Quit;
            };

            Some(event)
        }
        _ = tick.tick() => None,
    };

    if process_event(app, maybe_event) == EventResult::Quit {
        return EventResult::Quit;
    }

    // Drain queued events before re-rendering so a burst of keys is handled
    // in one frame.
    while let Ok(event) = event_rx.try_recv() {
        if process_event(app, Some(event)) == EventResult::Quit {
            return EventResult::Quit;
        }
    }

    EventResult::Continue
}

fn process_event(app: &mut App, event: Option<Event>) -> EventResult {
    match event {
        Some(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
        Some(Event::Paste(text)) => {
            app.handle_paste(&text);

            EventResult::Continue
        }
        Some(Event::FocusGained) => {
            app.handle_focus(true);

            EventResult::Continue
        }
        Some(Event::FocusLost) => {
            app.handle_focus(false);

            EventResult::Continue
        }
        _ => EventResult::Continue,
    }
}
