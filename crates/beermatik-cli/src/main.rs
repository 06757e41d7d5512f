use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "beermatik", version, about = "Beer session tracker with adaptive reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log beers and inspect the session
    Beer {
        #[command(subcommand)]
        action: commands::beer::BeerAction,
    },
    /// Session lifecycle: reset, export, import, clear
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Reminder notifications
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Beer { action } => commands::beer::run(action).await,
        Commands::Session { action } => commands::session::run(action).await,
        Commands::Notify { action } => commands::notify::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
