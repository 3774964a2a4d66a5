//! Command-line surface for the receiver binary.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Accepts reliable-transfer sessions and reconstructs the sent payload.
#[derive(Debug, Parser)]
#[command(name = "receiver", about = "Reliable-transfer receiver")]
pub struct Args {
    /// Address to bind the listening socket to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port to listen on.
    #[arg(long, default_value_t = 5555)]
    pub port: u16,

    /// Optional TOML file overriding the proposed parameters. Absent by
    /// default, in which case built-in defaults are proposed.
    #[arg(long)]
    pub config: Option<PathBuf>,
}
