use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mockapi_server::observability::init_tracing;
use mockapi_server::{ConfigOverrides, ServerConfig, serve};

#[derive(Debug, Parser)]
#[command(name = "mockapi", version)]
#[command(about = "Request-fixture server for HTTP and GraphQL integration tests")]
struct Args {
    /// Address to listen on [default: 127.0.0.1:5000]
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory holding persisted fixtures [default: ./mockData]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding index.html for the home page
    #[arg(long)]
    web_root: Option<PathBuf>,

    /// Log level when RUST_LOG is unset [default: info]
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            data_dir: args.data_dir,
            web_root: args.web_root,
            log_level: args.log_level,
            json_logs: args.json_logs.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    #[cfg(feature = "env")]
    let base = ServerConfig::from_env()?;
    #[cfg(not(feature = "env"))]
    let base = ServerConfig::default();

    let config = base.merge(args.into());
    init_tracing(&config).map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))?;

    serve(config).await
}
