pub mod completions;
pub mod config;
pub mod modes;
pub mod run;
pub mod stats;
