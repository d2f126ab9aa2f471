//! Keyboard translation: crossterm key events become the raw input strings
//! the pipeline understands. The mapping has to agree with the token
//! vocabulary in `core::machine::normalize_token`.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// What the input thread forwards to the session.
pub enum TuiEvent {
    /// A raw input string for the pipeline ("a", "1", "space", "enter", ...).
    Raw(String),
    /// Esc or Ctrl+C: leave immediately, bypassing screen navigation.
    ForceQuit,
    Resize,
}

/// Poll for one event, blocking up to `timeout`.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<TuiEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    let tui_event = match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
                (_, KeyCode::Esc) => Some(TuiEvent::ForceQuit),
                (_, KeyCode::Char(' ')) => Some(TuiEvent::Raw("space".to_string())),
                (_, KeyCode::Char(c)) => Some(TuiEvent::Raw(c.to_string())),
                (_, KeyCode::Enter) => Some(TuiEvent::Raw("enter".to_string())),
                (_, KeyCode::Backspace) => Some(TuiEvent::Raw("backspace".to_string())),
                _ => None,
            }
        }
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    };
    Ok(tui_event)
}
