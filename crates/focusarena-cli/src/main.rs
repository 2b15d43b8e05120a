use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use focusarena_core::storage::LoggingConfig;
use focusarena_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusarena", version, about = "Focus Arena CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive focus session
    Run {
        /// Focus mode (quick-sprint, deep-work, marathon)
        #[arg(long)]
        mode: Option<String>,
    },
    /// Focus statistics from the reward ledger
    Stats,
    /// Local profile: XP, gold, HP, streak and level
    Profile,
    /// Recently finished sessions
    History {
        /// Maximum number of sessions to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only sessions in this mode
        #[arg(long)]
        mode: Option<String>,
        /// Only sessions with this status (completed, gave-up)
        #[arg(long)]
        status: Option<String>,
    },
    /// List the focus modes
    Modes,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate a shell completion script
    Completions {
        shell: Shell,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    match Config::peek() {
        Ok(config) => init_tracing(&config.unwrap_or_default().logging.level),
        Err(e) => {
            init_tracing(&LoggingConfig::default().level);
            tracing::warn!(error = %e, "config unreadable, logging at the default level");
        }
    }

    let result = match cli.command {
        Commands::Run { mode } => commands::run::run(mode.as_deref()),
        Commands::Stats => commands::stats::run(),
        Commands::Profile => commands::profile::run(),
        Commands::History {
            limit,
            mode,
            status,
        } => commands::history::run(limit, mode.as_deref(), status.as_deref()),
        Commands::Modes => commands::modes::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "focusarena",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
