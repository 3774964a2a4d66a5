mod cli;
mod config;

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let proposed = config::load(args.config.as_deref())?;

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        log::info!("accepted connection from {peer}");

        tokio::spawn(async move {
            match transfer_core::run_receiver(stream, proposed).await {
                Ok((reconstructed, stats)) => {
                    log::info!(
                        "session with {peer} complete: {} bytes, {} resizes, negotiated {:?}",
                        stats.bytes_transferred,
                        stats.dynamic_resizes,
                        stats.negotiated
                    );
                    log::debug!("reconstructed payload from {peer}: {reconstructed:?}");
                }
                Err(err) => {
                    log::error!("session with {peer} failed: {err}");
                }
            }
        });
    }
}
