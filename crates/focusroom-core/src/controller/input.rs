//! Event vocabulary accepted by the controller.

use crate::session::{SessionSnapshot, Task};

/// Terminal-independent key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Tab,
    /// Ctrl-C or equivalent; always exits immediately.
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Key(Key),
    Resize { width: u16, height: u16 },
    Tick,
    SnapshotFetched(SessionSnapshot),
    TasksLoaded {
        recent: Vec<Task>,
        highlight: Option<Task>,
    },
}

impl From<Key> for ControllerEvent {
    fn from(key: Key) -> Self {
        ControllerEvent::Key(key)
    }
}

/// Result of feeding one key to a [`LineInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Editing,
    Submitted(String),
    Abandoned,
}

/// Single-line free-text capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInput {
    buffer: String,
}

impl LineInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            buffer: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn handle(&mut self, key: Key) -> InputOutcome {
        match key {
            Key::Char(c) if !c.is_control() => {
                self.buffer.push(c);
                InputOutcome::Editing
            }
            Key::Backspace => {
                self.buffer.pop();
                InputOutcome::Editing
            }
            Key::Enter => InputOutcome::Submitted(self.buffer.trim().to_string()),
            Key::Esc | Key::Cancel => InputOutcome::Abandoned,
            _ => InputOutcome::Editing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(input: &mut LineInput, s: &str) {
        for c in s.chars() {
            assert_eq!(input.handle(Key::Char(c)), InputOutcome::Editing);
        }
    }

    #[test]
    fn typing_and_backspace() {
        let mut input = LineInput::new();
        type_str(&mut input, "draftt");
        input.handle(Key::Backspace);
        assert_eq!(input.text(), "draft");
        assert_eq!(
            input.handle(Key::Enter),
            InputOutcome::Submitted("draft".into())
        );
    }

    #[test]
    fn submit_trims_whitespace() {
        let mut input = LineInput::with_text("  hello ");
        assert_eq!(
            input.handle(Key::Enter),
            InputOutcome::Submitted("hello".into())
        );
    }

    #[test]
    fn esc_abandons() {
        let mut input = LineInput::new();
        assert_eq!(input.handle(Key::Esc), InputOutcome::Abandoned);
    }

    #[test]
    fn backspace_on_empty_is_harmless() {
        let mut input = LineInput::new();
        input.handle(Key::Backspace);
        assert_eq!(input.text(), "");
    }
}
