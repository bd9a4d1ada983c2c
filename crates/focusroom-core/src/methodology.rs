//! Methodology provider.
//!
//! Each of the three built-in work methodologies is described by an
//! immutable [`Descriptor`]: its duration presets, the prompts shown during
//! setup and the capability flags that decide which post-completion rituals
//! apply. [`for_methodology`] is a pure function of its inputs.
//!
//! | methodology | rituals after a work session |
//! |-------------|------------------------------|
//! | baseline    | none                         |
//! | deep-focus  | shutdown ritual, distraction review |
//! | highlight   | focus score, recharge activity |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::storage::{BreaksConfig, Config, PresetConfig};

/// Upper bound on presets; list pickers only offer numeric shortcuts 1-3.
pub const MAX_PRESETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Methodology {
    Baseline,
    DeepFocus,
    Highlight,
}

impl Methodology {
    pub const ALL: [Methodology; 3] = [
        Methodology::Baseline,
        Methodology::DeepFocus,
        Methodology::Highlight,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Methodology::Baseline => "baseline",
            Methodology::DeepFocus => "deep-focus",
            Methodology::Highlight => "highlight",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Methodology::Baseline => "Pomodoro",
            Methodology::DeepFocus => "Deep Focus",
            Methodology::Highlight => "Daily Highlight",
        }
    }

    pub fn tagline(self) -> &'static str {
        match self {
            Methodology::Baseline => "Short timed sprints with regular breaks",
            Methodology::DeepFocus => "Long distraction-free blocks with a shutdown ritual",
            Methodology::Highlight => "One highlight a day, laser focus, recharge after",
        }
    }

    /// Lines shown in the onboarding overlay after picking this mode.
    pub fn onboarding_lines(self) -> &'static [&'static str] {
        match self {
            Methodology::Baseline => &[
                "Pick a duration, name the task, and go.",
                "When the timer ends, take a break or start again.",
            ],
            Methodology::DeepFocus => &[
                "Work in long blocks. Press d to park a distraction without leaving the block.",
                "After each block, run the shutdown ritual (or jot what you got done).",
                "Parked distractions must be reviewed before the next block.",
            ],
            Methodology::Highlight => &[
                "Choose one highlight worth your day.",
                "Clear the decks with the laser checklist before starting.",
                "Afterwards, rate your focus and pick how you will recharge.",
            ],
        }
    }

    /// Break length for this methodology.
    pub fn break_minutes(self, breaks: &BreaksConfig) -> u32 {
        match self {
            Methodology::Baseline => breaks.short_break_min,
            Methodology::DeepFocus => breaks.deep_focus_break_min,
            Methodology::Highlight => breaks.highlight_break_min,
        }
    }

    fn default_presets(self) -> Vec<DurationPreset> {
        let presets: &[(&str, u32)] = match self {
            Methodology::Baseline => &[("Pomodoro", 25), ("Long focus", 50), ("Short focus", 15)],
            Methodology::DeepFocus => &[
                ("Deep block", 90),
                ("Standard block", 60),
                ("Short block", 45),
            ],
            Methodology::Highlight => &[("Highlight", 60), ("Sprint", 30), ("Marathon", 90)],
        };
        presets
            .iter()
            .map(|(name, minutes)| DurationPreset::new(*name, *minutes))
            .collect()
    }

    fn configured_presets(self, config: &Config) -> &[PresetConfig] {
        match self {
            Methodology::Baseline => &config.presets.baseline,
            Methodology::DeepFocus => &config.presets.deep_focus,
            Methodology::Highlight => &config.presets.highlight,
        }
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Methodology {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "baseline" | "pomodoro" => Ok(Methodology::Baseline),
            "deep-focus" | "deepfocus" | "deep-work" => Ok(Methodology::DeepFocus),
            "highlight" | "make-time" => Ok(Methodology::Highlight),
            _ => Err(ValidationError::UnknownMethodology(s.to_string())),
        }
    }
}

/// A named session length offered by the duration picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationPreset {
    pub name: String,
    pub minutes: u32,
}

impl DurationPreset {
    pub fn new(name: impl Into<String>, minutes: u32) -> Self {
        Self {
            name: name.into(),
            minutes,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.minutes) * 60
    }

    /// Short label, e.g. `90m`.
    pub fn short_label(&self) -> String {
        format!("{}m", self.minutes)
    }
}

/// Post-completion feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub distraction_log: bool,
    pub energize_reminder: bool,
    pub focus_score: bool,
    pub shutdown_ritual: bool,
    pub highlight: bool,
}

/// Immutable description of one methodology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub methodology: Methodology,
    pub presets: Vec<DurationPreset>,
    pub task_prompt: String,
    /// Empty when the methodology skips the outcome prompt.
    pub outcome_prompt: String,
    pub capabilities: Capabilities,
}

impl Descriptor {
    pub fn has_outcome_prompt(&self) -> bool {
        !self.outcome_prompt.is_empty()
    }

    pub fn requires_laser_checklist(&self) -> bool {
        self.capabilities.highlight
    }

    pub fn has_distraction_categories(&self) -> bool {
        self.capabilities.distraction_log
    }
}

/// Build the descriptor for `methodology`, applying preset overrides from
/// `config` when present.
///
/// Overrides longer than [`MAX_PRESETS`] are truncated and an empty
/// override falls back to the built-ins, so the result always carries
/// between one and three presets.
pub fn for_methodology(methodology: Methodology, config: Option<&Config>) -> Descriptor {
    let presets = config
        .map(|cfg| methodology.configured_presets(cfg))
        .filter(|overrides| !overrides.is_empty())
        .map(|overrides| {
            overrides
                .iter()
                .take(MAX_PRESETS)
                .map(|p| DurationPreset::new(p.name.clone(), p.minutes.max(1)))
                .collect()
        })
        .unwrap_or_else(|| methodology.default_presets());

    match methodology {
        Methodology::Baseline => Descriptor {
            methodology,
            presets,
            task_prompt: "What are you working on?".into(),
            outcome_prompt: String::new(),
            capabilities: Capabilities::default(),
        },
        Methodology::DeepFocus => Descriptor {
            methodology,
            presets,
            task_prompt: "What deep work will you do?".into(),
            outcome_prompt: "What will be true when this block ends?".into(),
            capabilities: Capabilities {
                distraction_log: true,
                shutdown_ritual: true,
                ..Capabilities::default()
            },
        },
        Methodology::Highlight => Descriptor {
            methodology,
            presets,
            task_prompt: "What's today's highlight?".into(),
            outcome_prompt: String::new(),
            capabilities: Capabilities {
                energize_reminder: true,
                focus_score: true,
                highlight: true,
                ..Capabilities::default()
            },
        },
    }
}
