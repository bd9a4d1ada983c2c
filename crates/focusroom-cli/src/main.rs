use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod host;
mod keys;
mod logging;
mod ui;

#[derive(Parser)]
#[command(name = "focusroom", version, about = "Focus timer with methodology-aware rituals")]
struct Cli {
    #[command(flatten)]
    run: commands::run::RunArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session controller (default)
    Run(commands::run::RunArgs),
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List methodologies and their presets as JSON
    Modes,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Run(_)));
    if let Err(e) = logging::init(cli.verbose, interactive) {
        eprintln!("warning: logging disabled: {e}");
    }

    let result = match cli.command {
        None => commands::run::run(cli.run),
        Some(Commands::Run(args)) => commands::run::run(cli.run.merge(args)),
        Some(Commands::Stats { action }) => commands::stats::run(action),
        Some(Commands::Config { action }) => commands::config::run(action),
        Some(Commands::Modes) => commands::modes::run(),
        Some(Commands::Completions { shell }) => {
            commands::completions::run(shell, &mut Cli::command())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
