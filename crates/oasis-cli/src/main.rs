use clap::{Parser, Subcommand};
use oasis_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "oasis", version, about = "Oasis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Walk through onboarding
    Onboard,
    /// Focus sessions
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Today's progress
    Dashboard,
    /// Sign in with a magic link
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Locally recorded focus sessions
    History {
        /// How many days back to list
        #[arg(long, default_value = "7")]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    oasis_core::logging::init(&config.logging.filter);

    let result = match cli.command {
        Commands::Prefs { action } => commands::prefs::run(action, &config).await,
        Commands::Onboard => commands::onboard::run(&config).await,
        Commands::Focus { action } => commands::focus::run(action, &config).await,
        Commands::Dashboard => commands::dashboard::run(&config).await,
        Commands::Auth { action } => commands::auth::run(action, &config).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::History { days } => commands::history::run(days),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
