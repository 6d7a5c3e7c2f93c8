use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lifeloop-cli", version, about = "Lifeloop CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign out and session status
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Habit tracking and streaks
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Tasks and one-off reminders
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Food, water and sleep log
    Food {
        #[command(subcommand)]
        action: commands::food::FoodAction,
    },
    /// Income and expense ledger
    Finance {
        #[command(subcommand)]
        action: commands::finance::FinanceAction,
    },
    /// Routines and their ordered steps
    Routine {
        #[command(subcommand)]
        action: commands::routine::RoutineAction,
    },
    /// Notification planning (dry run)
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
    lifeloop_core::logging::init("warn");

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action).await,
        Commands::Habit { action } => commands::habit::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Food { action } => commands::food::run(action).await,
        Commands::Finance { action } => commands::finance::run(action).await,
        Commands::Routine { action } => commands::routine::run(action).await,
        Commands::Notify { action } => commands::notify::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
