use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use gradebook::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Init logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))?;
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "startup", "gradebook {} starting: RUST_LOG='{}', log_level='{}'", env!("CARGO_PKG_VERSION"), rust_log, args.log_level);

    gradebook::server::run(args).await
}
