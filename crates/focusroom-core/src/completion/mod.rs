//! Completion gating.
//!
//! After a work session ends, a methodology may require rituals before the
//! next session can start. [`CompletionState`] accumulates the user's
//! answers for one completion and [`CompletionState::prompts_done`] decides
//! whether "start new session" is allowed.
//!
//! ## Rules
//!
//! - Break completions never require anything.
//! - Shutdown ritual: ritual stepped through *or* accomplishment noted, and
//!   the distraction log empty *or* reviewed.
//! - Focus score: a rating saved *and* a recharge activity chosen.

mod ritual;

pub use ritual::{RitualRecord, ShutdownRitual, RITUAL_STEPS};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::methodology::Descriptor;
use crate::session::SessionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistractionCategory {
    Internal,
    External,
    Uncategorized,
}

impl DistractionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DistractionCategory::Internal => "internal",
            DistractionCategory::External => "external",
            DistractionCategory::Uncategorized => "uncategorized",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "internal" => DistractionCategory::Internal,
            "external" => DistractionCategory::External,
            _ => DistractionCategory::Uncategorized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distraction {
    pub text: String,
    pub category: DistractionCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RechargeActivity {
    Walk,
    Stretch,
    Exercise,
    None,
}

impl RechargeActivity {
    pub const ALL: [RechargeActivity; 4] = [
        RechargeActivity::Walk,
        RechargeActivity::Stretch,
        RechargeActivity::Exercise,
        RechargeActivity::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RechargeActivity::Walk => "walk",
            RechargeActivity::Stretch => "stretch",
            RechargeActivity::Exercise => "exercise",
            RechargeActivity::None => "none",
        }
    }

    /// Key that selects this activity on the completion screen.
    pub fn key(self) -> char {
        match self {
            RechargeActivity::Walk => 'w',
            RechargeActivity::Stretch => 't',
            RechargeActivity::Exercise => 'e',
            RechargeActivity::None => 'n',
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == c)
    }
}

impl fmt::Display for RechargeActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt still blocking the next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outstanding {
    Ritual,
    DistractionReview,
    FocusRating,
    Recharge,
}

impl Outstanding {
    /// Human-readable hint naming the key that satisfies it.
    pub fn hint(self) -> &'static str {
        match self {
            Outstanding::Ritual => "r: shutdown ritual  (or a: note what you got done)",
            Outstanding::DistractionReview => "v: review logged distractions",
            Outstanding::FocusRating => "1-5: rate your focus",
            Outstanding::Recharge => "w/t/e/n: pick a recharge (walk, stretch, exercise, none)",
        }
    }
}

/// Per-completion ritual progress. Reset whenever a new session begins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionState {
    distractions: Vec<Distraction>,
    distractions_reviewed: bool,
    ritual: ShutdownRitual,
    accomplishment_saved: bool,
    focus_rating: Option<u8>,
    recharge: Option<RechargeActivity>,
}

impl CompletionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn distractions(&self) -> &[Distraction] {
        &self.distractions
    }

    pub fn distractions_reviewed(&self) -> bool {
        self.distractions_reviewed
    }

    pub fn ritual(&self) -> &ShutdownRitual {
        &self.ritual
    }

    pub fn shutdown_complete(&self) -> bool {
        self.ritual.is_complete()
    }

    pub fn accomplishment_saved(&self) -> bool {
        self.accomplishment_saved
    }

    pub fn focus_rating(&self) -> Option<u8> {
        self.focus_rating
    }

    pub fn recharge(&self) -> Option<RechargeActivity> {
        self.recharge
    }

    /// Prompts still blocking a new session, in the order they should be
    /// tackled.
    pub fn outstanding(&self, descriptor: &Descriptor, completed: SessionType) -> Vec<Outstanding> {
        let mut missing = Vec::new();
        if completed == SessionType::Break {
            return missing;
        }

        let caps = descriptor.capabilities;
        if caps.shutdown_ritual && !(self.ritual.is_complete() || self.accomplishment_saved) {
            missing.push(Outstanding::Ritual);
        }
        if (caps.shutdown_ritual || caps.distraction_log)
            && !(self.distractions.is_empty() || self.distractions_reviewed)
        {
            missing.push(Outstanding::DistractionReview);
        }
        if caps.focus_score && self.focus_rating.is_none() {
            missing.push(Outstanding::FocusRating);
        }
        if (caps.focus_score || caps.energize_reminder) && self.recharge.is_none() {
            missing.push(Outstanding::Recharge);
        }
        missing
    }

    /// Whether every prompt the methodology requires after a `completed`
    /// session has been satisfied.
    pub fn prompts_done(&self, descriptor: &Descriptor, completed: SessionType) -> bool {
        self.outstanding(descriptor, completed).is_empty()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append to the log. A fresh entry needs reviewing again.
    pub fn log_distraction(&mut self, text: &str, category: DistractionCategory) -> Distraction {
        let entry = Distraction {
            text: text.trim().to_string(),
            category,
        };
        self.distractions.push(entry.clone());
        self.distractions_reviewed = false;
        entry
    }

    pub fn mark_reviewed(&mut self) {
        self.distractions_reviewed = true;
    }

    pub fn ritual_mut(&mut self) -> &mut ShutdownRitual {
        &mut self.ritual
    }

    pub fn save_accomplishment(&mut self) {
        self.accomplishment_saved = true;
    }

    /// Record a 1-5 rating. Out-of-range values are rejected.
    pub fn set_focus_rating(&mut self, rating: u8) -> bool {
        if !(1..=5).contains(&rating) {
            return false;
        }
        self.focus_rating = Some(rating);
        true
    }

    pub fn set_recharge(&mut self, activity: RechargeActivity) {
        self.recharge = Some(activity);
    }

    /// Back to the zero state for a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
