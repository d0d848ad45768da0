mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use moodlog::config::MoodlogConfig;

#[derive(Parser)]
#[command(name = "moodlog", version, about = "Terminal client for the Eli mood journal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and start a session
    Login {
        #[arg(long)]
        username: Option<String>,
    },
    /// Create an account and start a session
    Signup,
    /// End the session and clear all local data
    Logout,
    /// Continue as a guest (clears any session and local data)
    Guest,
    /// Show who is signed in
    Whoami,
    /// Overview: stats, recent mood trend and weekly insight
    Home,
    /// Full analytics: adds today's summary and the weekly distribution
    Dashboard,
    /// Talk to Eli. Without --message, starts an interactive session.
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show or change remote settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Turn safe mode on or off
    SafeMode {
        #[command(subcommand)]
        action: SafeModeAction,
    },
    /// Run the daily check-in reminder until interrupted
    Remind {
        /// Send one prompt right away and exit
        #[arg(long)]
        test: bool,
    },
    /// Check the local store and backend connectivity
    Doctor,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Change one or more settings
    Set {
        /// Enable or disable the daily reminder
        #[arg(long)]
        reminder: Option<bool>,
        /// Reminder time of day, HH:MM
        #[arg(long)]
        time: Option<String>,
        /// Enable or disable privacy mode
        #[arg(long)]
        privacy: Option<bool>,
    },
}

#[derive(Subcommand)]
enum SafeModeAction {
    On,
    /// Requires the account password
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = MoodlogConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Login { username } => cli::auth::login(&config, username).await?,
        Command::Signup => cli::auth::signup(&config).await?,
        Command::Logout => cli::auth::logout(&config)?,
        Command::Guest => cli::auth::guest(&config)?,
        Command::Whoami => cli::auth::whoami(&config)?,
        Command::Home => cli::pages::home(&config).await?,
        Command::Dashboard => cli::pages::dashboard(&config).await?,
        Command::Chat { message } => cli::chat::chat(&config, message).await?,
        Command::Settings { action } => match action {
            SettingsAction::Show => cli::settings::show(&config).await?,
            SettingsAction::Set {
                reminder,
                time,
                privacy,
            } => cli::settings::set(&config, reminder, time, privacy).await?,
        },
        Command::SafeMode { action } => match action {
            SafeModeAction::On => cli::settings::safe_mode(&config, true).await?,
            SafeModeAction::Off => cli::settings::safe_mode(&config, false).await?,
        },
        Command::Remind { test } => cli::remind::remind(&config, test).await?,
        Command::Doctor => cli::doctor::doctor(&config).await?,
    }

    Ok(())
}
