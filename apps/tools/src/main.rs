use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared::{
    domain::{Category, UserId},
    progress::WorkbookProgress,
};
use storage::Storage;

/// Operator access to the workbook database. Talks to SQLite directly; the server need not run.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/lifealigner.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListUsers,
    Progress {
        user_id: i64,
    },
    ShowEntry {
        user_id: i64,
        category: Category,
    },
    DeleteEntry {
        user_id: i64,
        category: Category,
    },
    /// Delete revoked sessions and sessions that have expired.
    PurgeSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    match cli.command {
        Command::ListUsers => {
            for user in storage.list_users().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    user.user_id,
                    user.email,
                    user.full_name,
                    user.created_at.to_rfc3339()
                );
            }
        }
        Command::Progress { user_id } => {
            let completed = storage.completed_categories(UserId(user_id)).await?;
            let progress = WorkbookProgress::from_completed(&completed);
            for category in Category::ALL {
                let mark = if progress.is_complete(category) { "x" } else { " " };
                println!("[{mark}] {category}");
            }
            let lifeframe = if progress.lifeframe { "x" } else { " " };
            println!("[{lifeframe}] lifeframe");
            println!(
                "{}/{} steps ({}%)",
                progress.completed_count(),
                WorkbookProgress::TOTAL_STEPS,
                progress.percentage()
            );
        }
        Command::ShowEntry { user_id, category } => {
            match storage.load_entry(UserId(user_id), category).await? {
                Some(entry) => {
                    println!("updated_at={}", entry.updated_at.to_rfc3339());
                    println!("{}", serde_json::to_string_pretty(&entry.content)?);
                }
                None => println!("no {category} entry for user {user_id}"),
            }
        }
        Command::DeleteEntry { user_id, category } => {
            let deleted = storage.delete_entry(UserId(user_id), category).await?;
            if deleted {
                println!("deleted {category} entry for user {user_id}");
            } else {
                println!("no {category} entry for user {user_id}");
            }
        }
        Command::PurgeSessions => {
            let deleted = storage.purge_sessions(Utc::now()).await?;
            println!("purged {deleted} sessions");
        }
    }

    Ok(())
}
