use std::sync::Arc;

use clap::Args;
use focusroom_core::{
    Config, Controller, ControllerOptions, Database, ExitAction, LocalSessionService, Methodology,
    SessionService,
};

use crate::host;
use crate::ui::{self, Mode};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Methodology to use (baseline, deep-focus, highlight); skips the mode picker
    #[arg(long, short)]
    pub mode: Option<Methodology>,
    /// Compact display below the prompt instead of the full screen
    #[arg(long)]
    pub inline: bool,
    /// Start a break automatically after each work session
    #[arg(long)]
    pub auto_break: bool,
}

impl RunArgs {
    /// Combine top-level flags with those given after `run`.
    pub fn merge(self, other: RunArgs) -> RunArgs {
        RunArgs {
            mode: other.mode.or(self.mode),
            inline: self.inline || other.inline,
            auto_break: self.auto_break || other.auto_break,
        }
    }

    fn apply(&self, config: &Config) -> ControllerOptions {
        let mut options = ControllerOptions::from_config(config);
        if let Some(mode) = self.mode {
            options.methodology = mode;
            options.locked = true;
        }
        options.auto_break |= self.auto_break;
        options
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let options = args.apply(&config);
    let mode = if args.inline || config.general.inline {
        Mode::Inline
    } else {
        Mode::Fullscreen
    };

    let service = Arc::new(LocalSessionService::new(
        Database::open()?,
        config.breaks.clone(),
    ));
    let snapshot = service.fetch_snapshot()?;
    tracing::info!(
        methodology = %options.methodology,
        locked = options.locked,
        resumed = snapshot.has_active(),
        "starting controller"
    );
    let controller = Controller::new(options, snapshot);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut terminal = ui::init_terminal(mode)?;
    let result = runtime.block_on(host::drive(
        &mut terminal,
        controller,
        Arc::clone(&service),
        ui::draw(mode),
    ));
    ui::restore_terminal(&mut terminal, mode)?;
    if mode == Mode::Inline {
        println!();
    }
    let controller = result?;

    match controller.exit_action() {
        Some(ExitAction::ViewStats) => service.with_db(super::stats::print_today)?,
        Some(ExitAction::Reflect) => service.with_db(super::stats::print_reflection)?,
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flag_locks_methodology() {
        let args = RunArgs {
            mode: Some(Methodology::Highlight),
            ..RunArgs::default()
        };
        let options = args.apply(&Config::default());
        assert_eq!(options.methodology, Methodology::Highlight);
        assert!(options.locked);
    }

    #[test]
    fn flags_after_run_win() {
        let top = RunArgs {
            mode: Some(Methodology::Baseline),
            inline: true,
            auto_break: false,
        };
        let sub = RunArgs {
            mode: Some(Methodology::DeepFocus),
            inline: false,
            auto_break: true,
        };
        let merged = top.merge(sub);
        assert_eq!(merged.mode, Some(Methodology::DeepFocus));
        assert!(merged.inline);
        assert!(merged.auto_break);
    }
}
