//! One-off maintenance against a savebox database: password hashing, admin
//! password resets and table listings.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use savebox_api::password::{generate_password, hash_password};
use savebox_db::Database;
use savebox_db::saved::SavedOrder;
use savebox_server::{config, report};
use savebox_types::Role;

const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "savebox-admin")]
#[command(about = "Maintenance tasks for a savebox database", long_about = None)]
struct Cli {
    /// Database file (default: $SAVEBOX_DB_PATH or savebox.db)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Argon2id hash of a password
    HashPassword { password: String },

    /// Set a user's password, generating one if none is given
    ResetPassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Grant or revoke the admin role
    SetRole {
        #[arg(long)]
        username: String,
        #[arg(long, value_parser = ["user", "admin"])]
        role: String,
    },

    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },

    /// List a user's saved messages, oldest first
    Saved {
        #[arg(long)]
        username: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    savebox_server::init_tracing("savebox=info");

    let cli = Cli::parse();
    let db_path = cli
        .db
        .unwrap_or_else(|| config::db_path_from(|key| std::env::var(key).ok()));
    let open_db = || {
        Database::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))
    };

    match cli.command {
        Command::HashPassword { password } => {
            println!("{}", hash(&password)?);
        }
        Command::ResetPassword { username, password } => {
            let db = open_db()?;
            let user = db
                .get_user_by_username(&username)?
                .with_context(|| format!("No such user: {username}"))?;

            let generated = password.is_none();
            let password = password.unwrap_or_else(|| generate_password(GENERATED_PASSWORD_LEN));
            if password.len() < 8 {
                bail!("Password must be at least 8 characters");
            }

            db.update_user_password(&user.id, &hash(&password)?)?;
            info!("Password reset for {} ({})", user.username, user.id);

            if generated {
                println!("New password for {}: {}", user.username, password);
            }
        }
        Command::SetRole { username, role } => {
            let role: Role = role.parse()?;
            let db = open_db()?;
            let user = db
                .get_user_by_username(&username)?
                .with_context(|| format!("No such user: {username}"))?;
            db.set_user_role(&user.id, role)?;
            info!("Role for {} ({}) set to {}", user.username, user.id, role);
        }
        Command::Users { page, per_page } => {
            let users = open_db()?.list_users()?;
            println!("{}", report::users_page(&users, page, per_page));
        }
        Command::Saved {
            username,
            page,
            per_page,
        } => {
            let db = open_db()?;
            let user = db
                .get_user_by_username(&username)?
                .with_context(|| format!("No such user: {username}"))?;
            let entries = db.find_saved_entries(&user.id, SavedOrder::Oldest)?;
            println!("{}", report::saved_page(&entries, page, per_page));
        }
    }

    Ok(())
}

fn hash(password: &str) -> Result<String> {
    hash_password(password).map_err(|e| anyhow!("Failed to hash password: {e}"))
}
