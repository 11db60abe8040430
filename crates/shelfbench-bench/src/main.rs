//! shelfbench - seed, verify, and time query variants.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfbench_bench::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shelfbench=info,shelfbench_core=info,shelfbench_bench=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::debug!(command = ?args.command, config = ?args.config, "starting shelfbench");

    if let Err(e) = args.execute() {
        tracing::error!(error = %e, "command failed");
        return Err(e.into());
    }
    Ok(())
}
