mod agents;
mod client;
mod config;
mod etl;
mod render;
mod travel;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use client::McpClient;
use config::Config;
use ui::ChatSession;

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Front-ends for the switchboard agent servers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with one of the analysts (the default).
    Chat {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        llm: Option<String>,
    },
    /// Explore a CSV with the ETL agent.
    Etl {
        #[arg(long)]
        csv: Option<PathBuf>,
        /// MCP endpoint of the ETL agent.
        #[arg(long)]
        server: Option<String>,
        /// Encoding of the CSV files, utf-8 or latin-1.
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },
    /// Fill in a trip and get flights, stays and things to do.
    Travel {
        #[arg(long)]
        server: Option<String>,
    },
    /// Send a single question and print the answer.
    Ask {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        llm: Option<String>,
        message: String,
    },
    /// List the analysts.
    Agents,
    /// Show the configuration, or change one key.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Set { key: String, value: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli.command.unwrap_or(Command::Chat { agent: None, llm: None })).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            render::error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let mut config = Config::load()?;

    match command {
        Command::Chat { agent, llm } => {
            let session = ChatSession::new(&config, agent.as_deref(), llm.as_deref())?;
            ui::interactive_chat(session).await
        }
        Command::Etl {
            csv,
            server,
            encoding,
        } => {
            let url = server.unwrap_or_else(|| config.etl_url.clone());
            let client = McpClient::new(url, config.client_name.clone());
            let session = etl::EtlSession::new(client, encoding);
            etl::interactive_etl(session, csv).await
        }
        Command::Travel { server } => {
            let url = server.unwrap_or_else(|| config.travel_url.clone());
            travel::interactive_travel(McpClient::new(url, config.client_name.clone())).await
        }
        Command::Ask { agent, llm, message } => {
            let mut session = ChatSession::new(&config, agent.as_deref(), llm.as_deref())?;
            session.ask(&message).await;
            Ok(())
        }
        Command::Agents => {
            ui::print_agents(agents::find(&config.agent));
            Ok(())
        }
        Command::Config { action: None } => {
            println!("Current config ({}):", Config::config_path()?.display());
            println!("  host:       {}", config.host);
            println!("  client:     {}", config.client_name);
            println!("  agent:      {}", config.agent);
            println!("  llm:        {}", config.llm);
            println!("  etl-url:    {}", config.etl_url);
            println!("  travel-url: {}", config.travel_url);
            Ok(())
        }
        Command::Config {
            action: Some(ConfigAction::Set { key, value }),
        } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} updated to: {}", key, value);
            Ok(())
        }
    }
}
