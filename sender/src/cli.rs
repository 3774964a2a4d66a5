//! Command-line surface for the sender binary.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Sends a file to a receiver over a reliable, ordered transfer session.
#[derive(Debug, Parser)]
#[command(name = "sender", about = "Reliable-transfer sender")]
pub struct Args {
    /// Path to a TOML file describing the proposed parameters and payload.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Address of the receiver to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub target: IpAddr,

    /// Port the receiver is listening on.
    #[arg(long, default_value_t = 5555)]
    pub port: u16,
}
