//! SupplyHub CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sh-cli migrate
//!
//! # Load the demo accounts and catalog
//! sh-cli seed
//!
//! # Create an account
//! sh-cli user create -e buyer@example.com -n "Buyer Org" -r user
//!
//! # Approve an account
//! sh-cli user approve 3
//!
//! # Walk one order through its lifecycle in memory
//! sh-cli demo
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with demo accounts and products
//! - `user create` / `user approve` - Manage accounts
//! - `demo` - Run the order lifecycle against the in-memory store

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sh-cli")]
#[command(author, version, about = "SupplyHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo accounts and products
    Seed,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Walk one order through its lifecycle against the in-memory store
    Demo,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`user`, `admin`, `super_admin`)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Create the account already approved
        #[arg(long)]
        approved: bool,
    },
    /// Approve an existing account
    Approve {
        /// Account ID
        id: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                approved,
            } => {
                commands::user::create(&email, &name, &role, approved).await?;
            }
            UserAction::Approve { id } => commands::user::approve(id).await?,
        },
        Commands::Demo => commands::demo::run().await?,
    }
    Ok(())
}
