use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    session, Gate, HttpAdapter, InterestsEditor, LifeCategoriesEditor, PersistenceAdapter,
    PrerequisiteGate, PriorityEditor, SaveGuard, Session,
};
use shared::{
    catalog::Catalog,
    domain::Category,
    progress::WorkbookProgress,
    worksheet::WorksheetContent,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lifealigner", about = "Fill in the LifeAligner workbook from the terminal")]
struct Cli {
    #[arg(long, env = "LIFEALIGNER_SERVER", default_value = "http://127.0.0.1:8443")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, env = "LIFEALIGNER_EMAIL")]
    email: String,
    #[arg(long, env = "LIFEALIGNER_PASSWORD")]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show the signed-in profile.
    Whoami {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Dashboard completion.
    Progress {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Browse the values or interests catalog.
    Catalog {
        #[arg(long)]
        interests: bool,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Pick and rank values. Without --pick the saved ranking is edited.
    Values {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long = "pick")]
        picks: Vec<String>,
        /// NAME=RANK, applied in order after picking.
        #[arg(long = "rank", value_parser = parse_assignment)]
        ranks: Vec<(String, String)>,
        #[arg(long = "remove")]
        removals: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Record existing and to-explore interests.
    Interests {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long = "existing")]
        existing: Vec<String>,
        #[arg(long = "exploring")]
        exploring: Vec<String>,
    },
    /// Adjust life categories and purpose elements.
    LifeCategories {
        #[command(flatten)]
        credentials: Credentials,
        /// Deselect a category.
        #[arg(long = "drop")]
        drops: Vec<String>,
        #[arg(long = "add")]
        additions: Vec<String>,
        /// CATEGORY=SUB
        #[arg(long = "sub", value_parser = parse_assignment)]
        subs: Vec<(String, String)>,
        /// NAME=DESCRIPTION
        #[arg(long = "purpose", value_parser = parse_assignment)]
        purposes: Vec<(String, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let adapter = Arc::new(HttpAdapter::new(&cli.server_url)?);

    match cli.command {
        Command::Signup {
            full_name,
            email,
            password,
            confirm_password,
        } => {
            let session =
                session::sign_up(adapter.as_ref(), &full_name, &email, &password, &confirm_password)
                    .await?;
            println!("Welcome, {}!", session.greeting_name());
            session::sign_out(adapter.as_ref(), session).await?;
        }
        Command::Whoami { credentials } => {
            let session = sign_in(adapter.as_ref(), &credentials).await?;
            let outcome = async {
                let profile = adapter.current_user(&session).await?;
                println!("{} <{}> (user {})", profile.full_name, profile.email, profile.user_id);
                Ok::<_, anyhow::Error>(())
            }
            .await;
            session::end_after(adapter.as_ref(), session, outcome).await?;
        }
        Command::Progress { credentials } => {
            let session = sign_in(adapter.as_ref(), &credentials).await?;
            let outcome = async {
                let completed = adapter.completed_categories(&session).await?;
                print_progress(&WorkbookProgress::from_completed(&completed));
                Ok::<_, anyhow::Error>(())
            }
            .await;
            session::end_after(adapter.as_ref(), session, outcome).await?;
        }
        Command::Catalog { interests, search } => {
            let catalog = if interests {
                Catalog::interests()
            } else {
                Catalog::values()
            };
            for (group, items) in catalog.search_groups(&search) {
                if !group.is_empty() {
                    println!("{group}:");
                }
                for item in items {
                    if item.description.is_empty() {
                        println!("  {}", item.name);
                    } else {
                        println!("  {} - {}", item.name, item.description);
                    }
                }
            }
        }
        Command::Values {
            credentials,
            picks,
            ranks,
            removals,
            dry_run,
        } => {
            let session = sign_in(adapter.as_ref(), &credentials).await?;
            let outcome = async {
                let mut editor = PriorityEditor::new(Catalog::values());
                if picks.is_empty() {
                    let saved = adapter
                        .load(&session, Category::Values)
                        .await?
                        .ok_or_else(|| anyhow!("no saved values yet; choose some with --pick"))?
                        .into_values()?;
                    editor.resume(saved);
                } else {
                    for pick in &picks {
                        if !editor.catalog().contains(pick) {
                            bail!("'{pick}' is not in the values catalog");
                        }
                        editor.toggle(pick);
                    }
                    editor.commit()?;
                }
                for (name, rank) in &ranks {
                    let rank: i64 = rank
                        .parse()
                        .with_context(|| format!("rank for '{name}' must be a number"))?;
                    editor.set_priority(name, rank)?;
                }
                for name in &removals {
                    editor.remove(name)?;
                }

                for item in editor.ranked() {
                    println!("{:>2}. {}", item.priority, item.name);
                }
                if !dry_run {
                    let content = WorksheetContent::Values(editor.to_content()?);
                    save(adapter.as_ref(), &session, &content).await?;
                }
                Ok::<_, anyhow::Error>(())
            }
            .await;
            session::end_after(adapter.as_ref(), session, outcome).await?;
        }
        Command::Interests {
            credentials,
            existing,
            exploring,
        } => {
            let session = sign_in(adapter.as_ref(), &credentials).await?;
            let outcome = async {
                require_open(adapter.clone(), &session, Category::Interests).await?;
                let mut editor = InterestsEditor::new(Catalog::interests());
                if let Some(saved) = adapter.load(&session, Category::Interests).await? {
                    editor.resume(saved.into_interests()?);
                }
                for name in &existing {
                    editor.toggle_existing(name);
                }
                for name in &exploring {
                    editor.toggle_exploring(name);
                }
                let content = editor.to_content();
                println!("existing:  {}", content.existing.join(", "));
                println!("exploring: {}", content.exploring.join(", "));
                save(adapter.as_ref(), &session, &WorksheetContent::Interests(content)).await?;
                Ok::<_, anyhow::Error>(())
            }
            .await;
            session::end_after(adapter.as_ref(), session, outcome).await?;
        }
        Command::LifeCategories {
            credentials,
            drops,
            additions,
            subs,
            purposes,
        } => {
            let session = sign_in(adapter.as_ref(), &credentials).await?;
            let outcome = async {
                require_open(adapter.clone(), &session, Category::LifeCategories).await?;
                let mut editor = LifeCategoriesEditor::new();
                if let Some(saved) = adapter.load(&session, Category::LifeCategories).await? {
                    editor.resume(saved.into_life_categories()?);
                }
                for name in &drops {
                    if editor.is_selected(name) {
                        editor.toggle_category(name);
                    }
                }
                for name in &additions {
                    if LifeCategoriesEditor::is_default(name) && !editor.is_selected(name) {
                        editor.toggle_category(name);
                    } else {
                        editor.add_custom_category(name)?;
                    }
                }
                for (category, sub) in &subs {
                    editor.add_sub_category(category, sub)?;
                }
                for (name, description) in &purposes {
                    let index = editor.add_purpose_element();
                    editor.update_purpose_element(index, name, description);
                }

                let content = editor.to_content()?;
                for category in &content.categories {
                    println!("{}: {}", category.name, category.sub_categories.join(", "));
                }
                save(
                    adapter.as_ref(),
                    &session,
                    &WorksheetContent::LifeCategories(content),
                )
                .await?;
                Ok::<_, anyhow::Error>(())
            }
            .await;
            session::end_after(adapter.as_ref(), session, outcome).await?;
        }
    }

    Ok(())
}

async fn sign_in(adapter: &dyn PersistenceAdapter, credentials: &Credentials) -> Result<Session> {
    Ok(session::sign_in(adapter, &credentials.email, &credentials.password).await?)
}

async fn require_open(
    adapter: Arc<HttpAdapter>,
    session: &Session,
    category: Category,
) -> Result<()> {
    match PrerequisiteGate::new(adapter).check(session, category).await? {
        Gate::Open => Ok(()),
        Gate::Redirect(required) => {
            bail!("complete the {required} worksheet before {category}")
        }
    }
}

async fn save(
    adapter: &dyn PersistenceAdapter,
    session: &Session,
    content: &WorksheetContent,
) -> Result<()> {
    let record = SaveGuard::new().save(adapter, session, content).await?;
    info!(category = %content.category(), "saved");
    println!("Saved at {}", record.updated_at.to_rfc3339());
    Ok(())
}

fn print_progress(progress: &WorkbookProgress) {
    let steps = [
        ("Values", progress.values),
        ("Interests", progress.interests),
        ("Life Categories", progress.life_categories),
        ("Lifeframe", progress.lifeframe),
        ("Roadmap", progress.roadmap),
    ];
    for (label, done) in steps {
        println!("[{}] {label}", if done { "x" } else { " " });
    }
    println!("{}% complete", progress.percentage());
    match progress.next_step() {
        Some(next) => println!("next: {next}"),
        None => println!("workbook complete"),
    }
}
