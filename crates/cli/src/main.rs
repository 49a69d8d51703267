//! CatalyX CLI - Command-line client for the CatalyX IDE backend

use anyhow::{Context, Result};
use catalyx_core::domain::{FileNode, FileTree, RunJob, RunStatus};
use catalyx_sdk::CatalyxClient;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "catalyx")]
#[command(about = "CatalyX IDE command-line client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(long, env = "CATALYX_URL", default_value = DEFAULT_API_URL)]
    url: String,

    /// Session token (from `catalyx login`)
    #[arg(long, env = "CATALYX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CATALYX_PASSWORD", hide_env_values = true)]
        password: String,

        /// Full name
        #[arg(short, long)]
        name: String,
    },

    /// Log in and print a session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CATALYX_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the logged-in user
    Whoami,

    /// List your projects
    Projects,

    /// Create a project
    Create {
        name: String,

        /// python, javascript, java, cpp, c or typescript
        #[arg(short, long, default_value = "python")]
        language: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Print a project's file tree
    Tree { project_id: String },

    /// Run a file of a project
    Run {
        project_id: String,

        /// Node id or slash path in the tree (default: first file)
        #[arg(short, long)]
        file: Option<String>,

        /// Local file whose content replaces the stored code
        #[arg(long)]
        code: Option<PathBuf>,
    },

    /// Show recent runs of a project
    History {
        project_id: String,

        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },

    /// Share a local file as a snippet
    Share {
        path: PathBuf,

        /// Language label (default: from the file extension)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Print a shared snippet
    OpenShare { share_id: String },
}

#[derive(Tabled)]
struct ProjectRow {
    id: String,
    name: String,
    language: String,
    updated: String,
}

#[derive(Tabled)]
struct RunRow {
    id: String,
    entry: String,
    status: String,
    queued: String,
    duration: String,
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn colored_status(status: RunStatus) -> String {
    match status {
        RunStatus::Queued => status.as_str().yellow().to_string(),
        RunStatus::Running => status.as_str().cyan().to_string(),
        RunStatus::Success => status.as_str().green().to_string(),
        RunStatus::Failed => status.as_str().red().to_string(),
    }
}

impl From<&RunJob> for RunRow {
    fn from(job: &RunJob) -> Self {
        let duration = match (job.started_at, job.finished_at) {
            (Some(start), Some(end)) => format!("{} ms", end - start),
            _ => "-".to_string(),
        };
        Self {
            id: job.id.clone(),
            entry: job.entry_point.clone(),
            status: colored_status(job.status),
            queued: format_millis(job.queued_at),
            duration,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tree(nodes: &[FileNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        if node.is_folder() {
            println!("{}{}/", indent, node.name.blue().bold());
            print_tree(&node.children, depth + 1);
        } else {
            println!("{}{}  {}", indent, node.name, node.id.dimmed());
        }
    }
}

/// Resolve `--file` as a node id first, then as a path
fn resolve_file<'a>(tree: &'a FileTree, selector: Option<&str>) -> Result<&'a FileNode> {
    let node = match selector {
        Some(sel) => tree.find(sel).or_else(|| tree.find_by_path(sel)),
        None => tree.first_file(),
    };
    match node {
        Some(node) if node.is_file() => Ok(node),
        Some(node) => anyhow::bail!("'{}' is a folder", node.name),
        None => anyhow::bail!("No such file in project"),
    }
}

fn authed(client: CatalyxClient, token: Option<String>) -> Result<CatalyxClient> {
    let token = token.context("Not logged in: pass --token or set CATALYX_TOKEN")?;
    Ok(client.with_token(token))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = CatalyxClient::new(&cli.url).context("Invalid server URL")?;

    match cli.command {
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let user_id = client.sign_up(&email, &password, &name).await?;
            println!("{}", "✓ Account created".green().bold());
            println!("  {} {}", "User ID:".bold(), user_id);
        }

        Commands::Login { email, password } => {
            let login = client.login(&email, &password).await?;
            if cli.json {
                return print_json(&serde_json::json!({ "token": login.token, "user": login.user }));
            }
            println!(
                "{}",
                format!("✓ Logged in as {}", login.user.name).green().bold()
            );
            println!();
            println!("export CATALYX_TOKEN={}", login.token);
        }

        Commands::Whoami => {
            let client = authed(client, cli.token)?;
            let user = client.get_user_data().await?.user;
            if cli.json {
                return print_json(&user);
            }
            println!("  {} {}", "Name:".bold(), user.name);
            println!("  {} {}", "Email:".bold(), user.email);
            println!("  {} {}", "ID:".bold(), user.id);
            println!("  {} {}", "Joined:".bold(), format_millis(user.created_at));
        }

        Commands::Projects => {
            let client = authed(client, cli.token)?;
            let list = client.get_projects().await?;
            if cli.json {
                return print_json(&list.projects);
            }
            if list.projects.is_empty() {
                println!("{}", "No projects yet".yellow());
                return Ok(());
            }
            let rows: Vec<ProjectRow> = list
                .projects
                .iter()
                .map(|p| ProjectRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    language: p.language.as_str().to_string(),
                    updated: format_millis(p.updated_at),
                })
                .collect();
            println!("{}", Table::new(rows));
            println!("{} project(s)", list.total);
        }

        Commands::Create {
            name,
            language,
            description,
        } => {
            let client = authed(client, cli.token)?;
            let created = client
                .create_project(&name, description.as_deref(), Some(&language))
                .await?;
            if cli.json {
                return print_json(&created.project);
            }
            println!("{}", "✓ Project created".green().bold());
            println!("  {} {}", "Project ID:".bold(), created.project_id);
        }

        Commands::Tree { project_id } => {
            let client = authed(client, cli.token)?;
            let project = client.get_project(&project_id).await?.project;
            let tree = project.effective_tree();
            if cli.json {
                return print_json(&tree);
            }
            println!("{}", project.name.cyan().bold());
            print_tree(tree.nodes(), 1);
        }

        Commands::Run {
            project_id,
            file,
            code,
        } => {
            let client = authed(client, cli.token)?;
            let project = client.get_project(&project_id).await?.project;
            let tree = project.effective_tree();
            let node = resolve_file(&tree, file.as_deref())?;

            let code = match code {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                None => None,
            };

            let result = client
                .run_file(&project_id, &node.id, code.as_deref())
                .await?;
            if cli.json {
                return print_json(&serde_json::json!({
                    "job": result.job,
                    "output": result.output,
                    "hasError": result.has_error,
                    "preview": result.preview,
                }));
            }

            match (&result.preview, &result.job) {
                (Some(kind), _) => {
                    println!("{}", format!("Preview ({:?}) of {}", kind, node.name).cyan().bold())
                }
                (None, Some(job)) => println!(
                    "{} {} {}",
                    node.name.bold(),
                    colored_status(job.status),
                    job.id.dimmed()
                ),
                (None, None) => {}
            }
            println!();
            if result.has_error {
                eprintln!("{}", result.output.red());
                std::process::exit(1);
            }
            println!("{}", result.output);
        }

        Commands::History { project_id, limit } => {
            let client = authed(client, cli.token)?;
            let jobs = client.get_run_history(&project_id, Some(limit)).await?.jobs;
            if cli.json {
                return print_json(&jobs);
            }
            if jobs.is_empty() {
                println!("{}", "No runs yet".yellow());
                return Ok(());
            }
            let rows: Vec<RunRow> = jobs.iter().map(RunRow::from).collect();
            println!("{}", Table::new(rows));
        }

        Commands::Share { path, language } => {
            let code = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "snippet.txt".to_string());
            let language =
                language.unwrap_or_else(|| catalyx_core::domain::editor_language(&file_name));

            // Anonymous share when no token is configured
            let client = match cli.token {
                Some(token) => client.with_token(token),
                None => client,
            };
            let share_id = client.create_share(&code, &language, &file_name).await?;
            println!("{}", "✓ Snippet shared".green().bold());
            println!("  {} {}", "Share ID:".bold(), share_id);
        }

        Commands::OpenShare { share_id } => {
            let share = client.get_share(&share_id).await?.share;
            if cli.json {
                return print_json(&share);
            }
            println!(
                "{} {} {}",
                share.file_name.cyan().bold(),
                format!("({})", share.language).dimmed(),
                format!("{} views", share.view_count).dimmed()
            );
            println!();
            println!("{}", share.code);
        }
    }

    Ok(())
}
