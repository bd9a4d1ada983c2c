use serde::{Deserialize, Serialize};

/// One step of the setup / timer interaction.
///
/// ```text
/// Welcome -> MainMenu -> ModePicker -> DurationPicker -> [LaserChecklist]
///    |                                    ^   -> [TaskSelect] -> TaskName
///    +------------- (locked) -------------+   -> [OutcomePrompt] -> Timer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Welcome,
    MainMenu,
    ModePicker,
    DurationPicker,
    LaserChecklist,
    TaskSelect,
    TaskName,
    OutcomePrompt,
    Timer,
}

impl Phase {
    pub fn title(self) -> &'static str {
        match self {
            Phase::Welcome => "Welcome",
            Phase::MainMenu => "Menu",
            Phase::ModePicker => "Choose a method",
            Phase::DurationPicker => "How long?",
            Phase::LaserChecklist => "Laser checklist",
            Phase::TaskSelect => "Pick a task",
            Phase::TaskName => "Name the task",
            Phase::OutcomePrompt => "Intended outcome",
            Phase::Timer => "Session",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    StartSession,
    ViewStats,
    Reflect,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::StartSession, MenuItem::ViewStats, MenuItem::Reflect];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::StartSession => "Start a session",
            MenuItem::ViewStats => "View today's stats",
            MenuItem::Reflect => "Reflect on today",
        }
    }
}

/// Laser checklist items shown before highlight sessions.
pub const LASER_ITEMS: [&str; 3] = [
    "Phone on do-not-disturb",
    "Email and chat closed",
    "Work full-screen",
];

/// Numeric shortcuts are only offered on lists this short.
pub const MAX_SHORTCUT_ITEMS: usize = 3;

/// Cursor over a list of `len` items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    index: usize,
}

impl Selection {
    pub fn index(self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn up(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
    }

    pub fn down(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    /// Clamp after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }
}

/// Map `1`/`2`/`3` to a zero-based index when the list is short enough and
/// the digit is in range.
pub fn shortcut_index(c: char, len: usize) -> Option<usize> {
    if len > MAX_SHORTCUT_ITEMS {
        return None;
    }
    let n = c.to_digit(10)? as usize;
    (1..=len).contains(&n).then(|| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_in_range_only() {
        assert_eq!(shortcut_index('1', 3), Some(0));
        assert_eq!(shortcut_index('3', 3), Some(2));
        assert_eq!(shortcut_index('3', 2), None);
        assert_eq!(shortcut_index('0', 3), None);
        assert_eq!(shortcut_index('x', 3), None);
    }

    #[test]
    fn no_shortcuts_on_long_lists() {
        assert_eq!(shortcut_index('1', 4), None);
    }

    #[test]
    fn selection_wraps() {
        let mut sel = Selection::default();
        sel.up(3);
        assert_eq!(sel.index(), 2);
        sel.down(3);
        assert_eq!(sel.index(), 0);
        sel.down(0);
        assert_eq!(sel.index(), 0);
    }

    #[test]
    fn selection_clamps() {
        let mut sel = Selection::default();
        sel.down(3);
        sel.down(3);
        sel.clamp(1);
        assert_eq!(sel.index(), 0);
    }
}
