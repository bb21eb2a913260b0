//! Bookshelf CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (including the session table)
//! bookshelf migrate
//!
//! # Create a staff account
//! bookshelf user create -e admin@example.com -p 'a long password' --staff
//!
//! # Let a user read book details and post reviews
//! bookshelf user grant -e reader@example.com -p books.special_status
//!
//! # Add one book, or seed many from YAML
//! bookshelf books add -t "Dune" -a "Frank Herbert" --price 9.99
//! bookshelf books seed books.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(author, version, about = "Bookshelf CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and create the session table
    Migrate,
    /// Manage user accounts and permissions
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the catalog
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address (login name)
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Display name (defaults to the part of the email before `@`)
        #[arg(short, long)]
        username: Option<String>,

        /// Give the user access to the admin pages
        #[arg(long)]
        staff: bool,
    },
    /// Grant a permission, e.g. `books.special_status`
    Grant {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        permission: String,
    },
    /// Revoke a permission
    Revoke {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        permission: String,
    },
}

#[derive(Subcommand)]
enum BooksAction {
    /// Add a single book
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        author: String,

        /// Price with at most two decimal places
        #[arg(long)]
        price: String,
    },
    /// Add every book listed in a YAML file
    Seed {
        /// YAML list of `{title, author, price}` entries
        file: PathBuf,
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                username,
                staff,
            } => {
                commands::user::create(&email, &password, username.as_deref(), staff).await?;
            }
            UserAction::Grant { email, permission } => {
                commands::user::grant(&email, &permission).await?;
            }
            UserAction::Revoke { email, permission } => {
                commands::user::revoke(&email, &permission).await?;
            }
        },
        Commands::Books { action } => match action {
            BooksAction::Add {
                title,
                author,
                price,
            } => {
                commands::books::add(&title, &author, &price).await?;
            }
            BooksAction::Seed { file } => commands::books::seed(&file).await?,
        },
    }
    Ok(())
}
