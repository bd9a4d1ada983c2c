//! Tracing setup.
//!
//! The interactive controller owns the terminal, so its logs go to
//! `<data_dir>/focusroom.log`. One-shot subcommands log to stderr.
//! `FOCUSROOM_LOG` takes an `EnvFilter` directive and wins over `-v`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "FOCUSROOM_LOG";
pub const LOG_FILE: &str = "focusroom.log";

/// 0 = info, 1 = debug, 2+ = trace
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
        _ => EnvFilter::new(level_for(verbosity)),
    }
}

pub fn init(verbosity: u8, interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter(verbosity))
        .with_target(true);

    if interactive {
        let path = focusroom_core::storage::data_dir()?.join(LOG_FILE);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init().map_err(|e| -> Box<dyn std::error::Error> { e })?;
    } else {
        builder.with_writer(std::io::stderr).try_init().map_err(|e| -> Box<dyn std::error::Error> { e })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(2), "trace");
        assert_eq!(level_for(9), "trace");
    }
}
