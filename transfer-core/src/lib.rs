//! Core protocol logic for a reliable, ordered byte-stream transport layered
//! on top of an already-connected duplex byte stream.
//!
//! This crate is transport-agnostic: it only ever sees an
//! `AsyncRead + AsyncWrite` stream and a handful of negotiated parameters. It
//! knows nothing about sockets, files, or command-line arguments — those are
//! the concern of the `sender` and `receiver` binary crates.

pub mod buffer;
pub mod channel;
pub mod error;
pub mod handshake;
pub mod params;
pub mod record;
pub mod session;
pub mod teardown;

pub use error::{Error, Result};
pub use params::{NegotiatedParameters, ProposedParameters};
pub use record::Record;
pub use session::{run_receiver, run_sender, SessionStats};
