mod cli;
mod config;

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let config = config::load(&args.config)?;
    let payload = config::read_payload(&config)?;

    let addr = SocketAddr::new(args.target, args.port);
    log::info!("connecting to {addr}");
    let stream = TcpStream::connect(addr).await?;
    log::info!("connected, starting handshake with {:?}", config.proposed);

    let stats = transfer_core::run_sender(stream, config.proposed, payload).await?;
    log::info!(
        "transfer finished: {} bytes sent, {} retransmissions, {} resizes, negotiated {:?}",
        stats.bytes_transferred,
        stats.retransmissions,
        stats.dynamic_resizes,
        stats.negotiated
    );

    Ok(())
}
