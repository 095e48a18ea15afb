//! Room server binary.
//!
//! Starts dual logging, registers the graceful-shutdown signal handler, and
//! serves the WebSocket/HTTP app on the given bind address.

use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "server", about = "No-Limit Hold'em room server")]
struct Args {
    /// Address to bind the HTTP/WebSocket listener to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8888")]
    bind_addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cr_core::init_logging();
    cr_core::register_interrupt_handler();
    let storage = Arc::new(cr_records::InMemoryStorage::new());
    cr_hosting::serve(&args.bind_addr, storage).await?;
    Ok(())
}
