use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fitpace", version, about = "Fasting, meditation and breathing timer")]
struct Cli {
    /// Log more to stderr (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run, simulate and browse timers
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Finished sessions and statistics
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Search presets and manage recent searches
    Search {
        #[command(subcommand)]
        action: commands::search::SearchAction,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "fitpace=warn,fitpace_core=warn",
        1 => "fitpace=debug,fitpace_core=debug",
        _ => "fitpace=trace,fitpace_core=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Search { action } => commands::search::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
