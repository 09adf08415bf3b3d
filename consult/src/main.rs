mod args;
mod logger;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use args::Args;
use clap::Parser;
use server::ServeConfig;

/// Used when neither the command line nor the configuration names an address.
const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.config()?;

    logger::init(&args);

    let listen_address = args
        .listen_address
        .or(config.server.listen_address)
        .unwrap_or(DEFAULT_LISTEN_ADDRESS);

    if config.llm.enabled() {
        log::info!(
            "Generating with provider '{}' using the {:?} preset",
            config.llm.provider,
            config.llm.preset
        );
    }

    if let Err(e) = server::serve(ServeConfig { listen_address, config }).await {
        log::error!("Consult stopped: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
