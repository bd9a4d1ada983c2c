//! crossterm events to controller events.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use focusroom_core::{ControllerEvent, Key};

pub fn translate(event: Event) -> Option<ControllerEvent> {
    match event {
        Event::Key(key) => translate_key(key).map(ControllerEvent::Key),
        Event::Resize(width, height) => Some(ControllerEvent::Resize { width, height }),
        _ => None,
    }
}

fn translate_key(event: KeyEvent) -> Option<Key> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(Key::Cancel),
            _ => None,
        };
    }
    match event.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Tab => Some(Key::Tab),
        _ => None,
    }
}
