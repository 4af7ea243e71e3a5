use anyhow::Context;
use output_store::OutputStore;
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "127.0.0.1:8501";
const DEFAULT_OUTPUT_DIR: &str = "output";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard_server=info,tower_http=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let flag_value = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let addr = flag_value("--addr")
        .or_else(|| std::env::var("DASHBOARD_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid dashboard address: {}", addr))?;

    let output_dir = flag_value("--output")
        .or_else(|| std::env::var("OUTPUT_DIR").ok())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

    dashboard_server::run_server(addr, OutputStore::existing(output_dir)).await
}
