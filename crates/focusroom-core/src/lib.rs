//! # Focusroom Core Library
//!
//! Core logic for the Focusroom focus timer. Everything here is free of
//! terminal I/O: the CLI crate renders the controller state and executes
//! the effects it asks for.
//!
//! ## Architecture
//!
//! - **Controller**: a phase state machine driven by key, tick and snapshot
//!   events. Returns effects instead of calling collaborators directly.
//! - **Completion gating**: per-methodology rituals that must be satisfied
//!   before the next work session may start
//! - **Methodologies**: pure descriptors for the three built-in ways of
//!   working
//! - **Session service**: owns the countdown; the controller only reads its
//!   snapshots
//! - **Storage**: SQLite history and TOML configuration
//!
//! ## Key Components
//!
//! - [`Controller`]: the interactive session controller
//! - [`CompletionState`]: post-completion progress and `prompts_done`
//! - [`for_methodology`]: methodology provider
//! - [`LocalSessionService`]: SQLite-backed [`SessionService`]
//! - [`Config`]: application configuration

pub mod completion;
pub mod controller;
pub mod error;
pub mod methodology;
pub mod session;
pub mod storage;

pub use completion::{
    CompletionState, Distraction, DistractionCategory, Outstanding, RechargeActivity,
    RitualRecord, ShutdownRitual,
};
pub use controller::{
    Controller, ControllerEvent, ControllerOptions, Effect, ExitAction, Key, Phase,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use methodology::{for_methodology, Capabilities, Descriptor, DurationPreset, Methodology};
pub use session::{
    best_effort, ActiveSession, CommandKind, CompletionRecorder, DailyStats,
    LocalSessionService, SessionService, SessionSnapshot, SessionStatus, SessionType,
    StartRequest, Task,
};
pub use storage::{Config, Database};
