//! Sender side of the transport channel.
//!
//! Drives [`PayloadBuffer`] over an async duplex stream: transmits whatever
//! the sliding window currently offers, waits for an `ACK` with the
//! negotiated timeout, and falls back to a full-window retransmit when the
//! timer fires.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Duration;

use crate::buffer::PayloadBuffer;
use crate::error::Result;
use crate::params::NegotiatedParameters;
use crate::record::{decode, Record};

use super::read_more;

/// Counters surfaced to [`crate::session`] for logging — not part of the
/// protocol itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub retransmissions: usize,
    pub resizes_applied: usize,
}

/// Drives a [`PayloadBuffer`] to completion over a duplex stream.
pub struct Framer<S> {
    stream: S,
    read_buf: String,
    params: NegotiatedParameters,
    payload: PayloadBuffer,
    stats: TransferStats,
}

impl<S> Framer<S>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    /// `initial_buf` carries over any bytes already read past the last
    /// record the handshake phase consumed.
    pub fn new(stream: S, params: NegotiatedParameters, payload: PayloadBuffer, initial_buf: String) -> Self {
        Self {
            stream,
            read_buf: initial_buf,
            params,
            payload,
            stats: TransferStats::default(),
        }
    }

    /// Runs the send loop until every segment has been acknowledged.
    /// Returns the stream, any bytes already read past the last decoded
    /// record (for the teardown phase), and transfer counters.
    pub async fn run(mut self) -> Result<(S, String, TransferStats)> {
        while !self.payload.is_complete() {
            self.send_window().await?;

            let timeout_duration = Duration::from_millis(self.params.timeout_ms);
            match tokio::time::timeout(timeout_duration, read_more(&mut self.stream, &mut self.read_buf)).await {
                Ok(Ok(0)) => {
                    return Err(crate::Error::ChannelClosed(
                        "peer closed the connection mid-transfer".into(),
                    ))
                }
                Ok(Ok(_)) => self.handle_acks().await?,
                Ok(Err(err)) => return Err(err.into()),
                Err(_elapsed) => log::warn!("read timed out waiting for an ACK"),
            }

            // Checked every iteration regardless of what the read above
            // returned: a trickle of bytes that never advances the
            // cumulative ACK must not keep postponing this check forever.
            if self.payload.check_timeout(self.params.timeout_ms) {
                log::warn!("retransmit timer fired, resending unacknowledged window");
                self.stats.retransmissions += 1;
            }
        }

        Ok((self.stream, self.read_buf, self.stats))
    }

    async fn send_window(&mut self) -> Result<()> {
        for (sequence, chunk) in self.payload.next_sends() {
            let record = Record::Push {
                sequence: sequence as i64,
                payload: chunk,
            };
            self.stream.write_all(&record.encode()).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

    async fn handle_acks(&mut self) -> Result<()> {
        for record in decode(&mut self.read_buf) {
            let Record::Ack { ack, new_block_size } = record else {
                log::debug!("ignoring unexpected record during transfer: {record:?}");
                continue;
            };

            let outcome = self.payload.apply_ack(ack, new_block_size, self.params.dynamic_size);

            if let Some(resliced_to) = outcome.resliced_to {
                log::info!("resliced unacknowledged payload to {resliced_to}-char segments");
                self.stats.resizes_applied += 1;
            }

            if let Some(sequence) = outcome.fast_retransmit {
                if let Some(chunk) = self.payload.segment(sequence) {
                    log::debug!("fast retransmit of segment {sequence} after triplicate ACK");
                    let record = Record::Push {
                        sequence: sequence as i64,
                        payload: chunk.to_string(),
                    };
                    self.stream.write_all(&record.encode()).await?;
                    self.stream.flush().await?;
                    self.stats.retransmissions += 1;
                }
            }
        }
        Ok(())
    }
}
