use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use switchboard_engine::mcp::stdio::serve_stdio;
use switchboard_engine::servers::ServerKind;
use switchboard_engine::{McpServer, Server, api};

#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about = "MCP tool servers and agent servers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one server over HTTP, or over stdio with --stdio.
    Serve {
        /// Server id, see `switchboard list`.
        server: String,
        #[arg(long, env = "SWITCHBOARD_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        stdio: bool,
    },
    /// List the available servers.
    List,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries protocol traffic in stdio mode.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::List => {
            list_servers();
            Ok(())
        }
        Command::Serve {
            server,
            host,
            port,
            stdio,
        } => {
            let server = Server::from_id(&server).ok_or_else(|| {
                anyhow!("Unknown server '{}'. Run `switchboard list` to see the options.", server)
            })?;
            let mcp = Arc::new(McpServer::new(server));

            if stdio {
                serve_stdio(&mcp).await
            } else {
                let addr = SocketAddr::new(host, server.port(port)?);
                serve_http(mcp, addr).await
            }
        }
    }
}

async fn serve_http(mcp: Arc<McpServer>, addr: SocketAddr) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut api_handle = tokio::spawn(api::start_server(mcp, addr, shutdown_rx));

    tokio::select! {
        // Ends on its own only when it fails, e.g. the port is taken.
        result = &mut api_handle => return result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received shutdown signal...");
            let _ = shutdown_tx.send(true);
            api_handle.await??;
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

fn list_servers() {
    println!("{:<10} {:<24} {:>5}  tools", "id", "name", "port");
    for server in Server::all() {
        let kind = match server.kind() {
            ServerKind::Direct(_) => "direct",
            ServerKind::Agent(_) => "agent",
            ServerKind::Travel => "crew",
        };
        let tools: Vec<String> = server.tools().into_iter().map(|t| t.name).collect();
        println!(
            "{:<10} {:<24} {:>5}  {} ({})",
            server.id(),
            server.name(),
            server.default_port(),
            tools.join(", "),
            kind
        );
    }
}
