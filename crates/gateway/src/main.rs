//! LightRAG MCP Gateway binary
//!
//! Runs the stdio JSON-RPC server by default, or the HTTP front-end with
//! `--http`. Logs go to stderr; stdout belongs to the RPC transport.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lightrag_mcp_gateway::{
    mcp::StdioServer,
    routes::create_router,
    tools::{tool_descriptors, validate_descriptors, ToolPrefix},
    AppState, ClientTable, Config, LightRagClient,
};

#[derive(Debug, Parser)]
#[command(name = "lightrag-mcp-gateway", version, about = "Expose a LightRAG backend as MCP tools")]
struct Cli {
    /// Serve the HTTP front-end instead of stdio JSON-RPC
    #[arg(long)]
    http: bool,

    /// HTTP bind host
    #[arg(long, env = "LIGHTRAG_HTTP_HOST")]
    host: Option<String>,

    /// HTTP bind port
    #[arg(long, env = "LIGHTRAG_HTTP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.http_host = host;
    }
    if let Some(port) = cli.port {
        config.http_port = port;
    }

    if cli.http {
        serve_http(config).await
    } else {
        serve_stdio(config).await
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lightrag_mcp_gateway=info,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

async fn serve_stdio(config: Config) -> anyhow::Result<()> {
    let client = LightRagClient::new(&config.base_url, config.api_key.as_deref(), config.timeout)
        .context("Failed to create backend client")?;
    let server = StdioServer::new(Arc::new(client), ToolPrefix::new(config.tool_prefix.clone()))
        .context("Tool registry is malformed")?;

    tracing::info!(
        base_url = %config.base_url,
        prefix = %config.tool_prefix,
        tools = server.tools().len(),
        "Starting stdio server"
    );

    server.run().await.context("stdio transport failed")?;
    Ok(())
}

async fn serve_http(config: Config) -> anyhow::Result<()> {
    validate_descriptors(&tool_descriptors()).context("Tool registry is malformed")?;

    let clients = ClientTable::from_backends(&config.backends).context("Failed to create backend clients")?;
    let prefixes = clients.prefixes();
    let app = create_router(AppState::new(clients));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, prefixes = ?prefixes, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
