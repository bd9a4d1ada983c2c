//! Shutdown ritual: four reflective free-text steps closing a deep-focus
//! block. Blank answers are accepted; stepping through is what counts.

use serde::{Deserialize, Serialize};

pub const RITUAL_STEPS: usize = 4;

const STEP_PROMPTS: [&str; RITUAL_STEPS] = [
    "Review pending tasks: anything left open?",
    "Check the calendar: what's coming up?",
    "Plan tomorrow: what comes first?",
    "Say your closing phrase.",
];

/// Answers captured by one completed ritual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RitualRecord {
    pub pending_tasks: String,
    pub calendar: String,
    pub tomorrow_plan: String,
    pub closing_phrase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownRitual {
    active: bool,
    step: usize,
    answers: Vec<String>,
    complete: bool,
}

impl ShutdownRitual {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Prompt for the current step, if the ritual is running.
    pub fn prompt(&self) -> Option<&'static str> {
        if self.active {
            STEP_PROMPTS.get(self.step).copied()
        } else {
            None
        }
    }

    /// Begin stepping. Returns false when already running or already done.
    pub fn begin(&mut self) -> bool {
        if self.active || self.complete {
            return false;
        }
        self.active = true;
        self.step = 0;
        self.answers.clear();
        true
    }

    /// Accept the answer for the current step and advance.
    ///
    /// Returns the finished record once the fourth step is confirmed.
    pub fn confirm(&mut self, answer: &str) -> Option<RitualRecord> {
        if !self.active {
            return None;
        }
        self.answers.push(answer.trim().to_string());
        self.step += 1;
        if self.step < RITUAL_STEPS {
            return None;
        }

        self.active = false;
        self.complete = true;
        let mut answers = std::mem::take(&mut self.answers).into_iter();
        let mut next = || answers.next().unwrap_or_default();
        Some(RitualRecord {
            pending_tasks: next(),
            calendar: next(),
            tomorrow_plan: next(),
            closing_phrase: next(),
        })
    }

    /// Leave the ritual without completing it.
    pub fn abandon(&mut self) {
        self.active = false;
        self.step = 0;
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_blank_confirms_complete_the_ritual() {
        let mut ritual = ShutdownRitual::new();
        assert!(ritual.begin());
        for _ in 0..3 {
            assert!(ritual.confirm("").is_none());
        }
        let record = ritual.confirm("").expect("fourth step finalizes");
        assert_eq!(record, RitualRecord::default());
        assert!(ritual.is_complete());
        assert!(!ritual.is_active());
        assert_eq!(ritual.step(), RITUAL_STEPS);
    }

    #[test]
    fn answers_land_in_order() {
        let mut ritual = ShutdownRitual::new();
        ritual.begin();
        ritual.confirm("inbox zero");
        ritual.confirm(" standup at 10 ");
        ritual.confirm("write tests");
        let record = ritual.confirm("shutdown complete").unwrap();
        assert_eq!(record.pending_tasks, "inbox zero");
        assert_eq!(record.calendar, "standup at 10");
        assert_eq!(record.tomorrow_plan, "write tests");
        assert_eq!(record.closing_phrase, "shutdown complete");
    }

    #[test]
    fn abandon_resets_without_completing() {
        let mut ritual = ShutdownRitual::new();
        ritual.begin();
        ritual.confirm("a");
        ritual.confirm("b");
        ritual.abandon();
        assert!(!ritual.is_complete());
        assert!(!ritual.is_active());
        assert_eq!(ritual.step(), 0);
        assert!(ritual.prompt().is_none());
        assert!(ritual.begin());
        assert_eq!(ritual.prompt(), Some(STEP_PROMPTS[0]));
    }

    #[test]
    fn confirm_outside_ritual_is_ignored() {
        let mut ritual = ShutdownRitual::new();
        assert!(ritual.confirm("x").is_none());
        assert_eq!(ritual.step(), 0);
    }

    #[test]
    fn completed_ritual_cannot_restart() {
        let mut ritual = ShutdownRitual::new();
        ritual.begin();
        for _ in 0..RITUAL_STEPS {
            ritual.confirm("");
        }
        assert!(!ritual.begin());
    }
}
