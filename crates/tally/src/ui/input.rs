//! Mapping terminal events to screen actions.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the screen should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Press the increment button.
    Increment,
    /// Save and leave.
    Quit,
    /// The terminal lost focus.
    Background,
    /// The terminal regained focus.
    Foreground,
}

/// Translate a terminal event, ignoring anything the screen doesn't handle.
#[must_use]
pub fn action_for(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) => action_for_key(key),
        Event::FocusLost => Some(Action::Background),
        Event::FocusGained => Some(Action::Foreground),
        _ => None,
    }
}

fn action_for_key(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Enter | KeyCode::Char(' ' | '+' | 'i') => Some(Action::Increment),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}
