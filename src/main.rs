use std::io::Write;

use clap::{Parser, Subcommand};
use colored::*;
use anyhow::Result;

mod api;
mod app;
mod config;
mod handler;
mod logging;
mod status;
mod stream;
mod tui;
mod ui;

use api::AgentClient;
use app::App;
use config::{Config, DEFAULT_BACKEND_URL};

#[derive(Parser)]
#[command(name = "flowdeck")]
#[command(about = "Terminal client for an n8n AI agent backend")]
struct Cli {
    /// Agent backend base URL (overrides FLOWDECK_BACKEND_URL and the config file)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List workflows from the connected n8n instance
    Workflows,
    /// Show one workflow with its nodes
    Workflow {
        /// Workflow id
        id: String,
    },
    /// Send one message to the agent and stream the reply
    Chat {
        /// Your message
        message: String,
    },
    /// Print the backend settings map
    Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    let base_url = cli
        .backend
        .or_else(|| std::env::var("FLOWDECK_BACKEND_URL").ok())
        .or(config.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let client = AgentClient::new(&base_url);

    match cli.command {
        None => {
            logging::init_file()?;
            run_tui(client).await
        }
        Some(command) => {
            logging::init_stderr();
            match command {
                Commands::Workflows => list_workflows(&client).await,
                Commands::Workflow { id } => show_workflow(&client, &id).await,
                Commands::Chat { message } => chat_once(&client, &message).await,
                Commands::Settings => print_settings(&client).await,
            }
        }
    }
}

async fn run_tui(client: AgentClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    // The status subscription lives for the whole session and is torn
    // down explicitly on exit.
    let status_task = status::spawn_subscriber(client.clone(), events.sender());

    let mut app = App::new(client, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    status_task.abort();
    tui::restore()?;
    Ok(())
}

fn backend_hint(client: &AgentClient) {
    println!(
        "Is the agent backend running at {}?",
        client.base_url().bold()
    );
}

async fn list_workflows(client: &AgentClient) -> Result<()> {
    match client.workflows().await {
        Ok(workflows) => {
            if workflows.is_empty() {
                println!("{}", "No workflows found.".yellow());
                return Ok(());
            }
            println!(
                "\n{}\n",
                format!("{} workflows", workflows.len()).bold().green()
            );
            for workflow in &workflows {
                let status = if workflow.active {
                    "active".green()
                } else {
                    "inactive".dimmed()
                };
                println!(
                    "  {} [{}] - {} nodes ({})",
                    workflow.name.bold(),
                    status,
                    workflow.nodes.len(),
                    workflow.id.dimmed()
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("{}: {}", "Error listing workflows".red(), e);
            backend_hint(client);
            std::process::exit(1);
        }
    }
}

async fn show_workflow(client: &AgentClient, id: &str) -> Result<()> {
    match client.workflow(id).await {
        Ok(workflow) => {
            println!("\n{}", workflow.name.bold().green());
            println!("{}", "=".repeat(40).dimmed());
            println!("Id:      {}", workflow.id);
            println!(
                "Status:  {}",
                if workflow.active {
                    "active".green()
                } else {
                    "inactive".dimmed()
                }
            );
            if let Some(updated) = &workflow.updated_at {
                println!("Updated: {}", updated);
            }
            println!("\n{} nodes:", workflow.nodes.len().to_string().bold());
            for node in &workflow.nodes {
                println!("  \u{2022} {} {}", node.name, format!("({})", node.node_type).dimmed());
            }
            Ok(())
        }
        Err(e) => {
            println!("{}: {}", "Error fetching workflow".red(), e);
            backend_hint(client);
            std::process::exit(1);
        }
    }
}

async fn chat_once(client: &AgentClient, message: &str) -> Result<()> {
    println!("{}", "Agent:".bold().yellow());
    let result = client
        .stream_chat(message, &[], |token| {
            print!("{token}");
            let _ = std::io::stdout().flush();
        })
        .await;

    match result {
        Ok(()) => {
            println!();
            Ok(())
        }
        Err(e) => {
            println!("\n{}: {}", "Error talking to the agent".red(), e);
            backend_hint(client);
            std::process::exit(1);
        }
    }
}

async fn print_settings(client: &AgentClient) -> Result<()> {
    match client.settings().await {
        Ok(settings) => {
            if settings.is_empty() {
                println!("{}", "No settings stored yet.".yellow());
                return Ok(());
            }
            for (key, value) in &settings {
                let shown = if app::is_secret_field(key) && !value.is_empty() {
                    "\u{2022}".repeat(8)
                } else {
                    value.clone()
                };
                println!("{:<16} {}", key.bold(), shown);
            }
            Ok(())
        }
        Err(e) => {
            println!("{}: {}", "Error fetching settings".red(), e);
            backend_hint(client);
            std::process::exit(1);
        }
    }
}
