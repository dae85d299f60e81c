//! Corner Shop CLI - session table and account tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! cs-cli migrate
//!
//! # Create an account (password from CS_USER_PASSWORD if not given)
//! cs-cli user create -e ana@example.com -n "Ana"
//!
//! # Print the cart stored in a session
//! cs-cli cart show --session-id <id>
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the session table
//! - `user create` - Create an account with its profile document
//! - `cart show` - Inspect a session's cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "cs-cli")]
#[command(author, version, about = "Corner Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session table in the storefront database
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Inspect carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "CS_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart stored in a session
    Show {
        /// Session id (the `cs_session` cookie value)
        #[arg(short, long)]
        session_id: String,
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
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
            } => {
                commands::user::create(&name, &email, &SecretString::from(password)).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { session_id } => commands::cart::show(&session_id).await?,
        },
    }
    Ok(())
}
