//! Top-level session drivers: handshake, transfer, and teardown in sequence
//! (C6 operation). These are what the `sender` and `receiver` binaries call;
//! everything below this module only ever sees a duplex byte stream.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::buffer::PayloadBuffer;
use crate::channel::{Framer, Reassembler};
use crate::error::Result;
use crate::handshake::{receiver_handshake, sender_handshake};
use crate::params::{NegotiatedParameters, ProposedParameters};
use crate::teardown::{receiver_teardown, sender_teardown};

/// Summary of a completed transfer, returned to the caller for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Parameters both sides settled on during the handshake.
    pub negotiated: NegotiatedParameters,
    /// Number of bytes of payload that crossed the wire.
    pub bytes_transferred: usize,
    /// Segments retransmitted, whether by timeout or fast retransmit.
    /// Always zero on the Receiver side, which never retransmits.
    pub retransmissions: usize,
    /// Dynamic segment-size changes applied during the transfer.
    pub dynamic_resizes: usize,
}

/// Runs a complete Sender session: handshake, transfer `payload` to
/// completion, then teardown.
pub async fn run_sender<S>(mut stream: S, proposed: ProposedParameters, payload: String) -> Result<SessionStats>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (negotiated, leftover) = sender_handshake(&mut stream, proposed).await?;
    log::info!("handshake complete, negotiated {negotiated:?}");

    let bytes_transferred = payload.len();
    let payload_buffer = PayloadBuffer::new(payload, negotiated.window_size, negotiated.maximum_msg_size);
    let framer = Framer::new(stream, negotiated, payload_buffer, leftover);
    let (mut stream, leftover, transfer_stats) = framer.run().await?;
    log::info!("transfer complete, {bytes_transferred} bytes sent, {} retransmissions", transfer_stats.retransmissions);

    sender_teardown(&mut stream, leftover).await?;
    log::info!("teardown complete");

    Ok(SessionStats {
        negotiated,
        bytes_transferred,
        retransmissions: transfer_stats.retransmissions,
        dynamic_resizes: transfer_stats.resizes_applied,
    })
}

/// Runs a complete Receiver session: handshake, receive until `FIN`, then
/// teardown. Returns the reassembled payload alongside session statistics.
///
/// `handshake_complete` in the returned tuple's stats is implicit in the
/// `Result` itself: a session that never completed the handshake returns
/// `Err` rather than a `SessionStats` with a flag to check, so callers can't
/// accidentally read `reconstructed` from a connection that never
/// negotiated parameters.
pub async fn run_receiver<S>(mut stream: S, proposed: ProposedParameters) -> Result<(String, SessionStats)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (negotiated, leftover) = receiver_handshake(&mut stream, proposed).await?;
    log::info!("handshake complete, negotiated {negotiated:?}");

    let reassembler = Reassembler::new(stream, negotiated, leftover);
    let (mut stream, leftover, reconstructed, transfer_stats) = reassembler.run().await?;
    log::info!("transfer complete, {} bytes received", reconstructed.len());

    receiver_teardown(&mut stream, leftover).await?;
    log::info!("teardown complete");

    let stats = SessionStats {
        negotiated,
        bytes_transferred: reconstructed.len(),
        retransmissions: 0,
        dynamic_resizes: transfer_stats.resizes_issued,
    };
    Ok((reconstructed, stats))
}
