//! Receiver side of the transport channel.
//!
//! Drives [`ReassemblyStore`] over an async duplex stream: decodes `PUSH`
//! records, replies with cumulative `ACK`s, and occasionally piggy-backs a
//! dynamic segment-size change when the negotiated parameters allow it.

use rand::Rng;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::buffer::ReassemblyStore;
use crate::error::Result;
use crate::params::NegotiatedParameters;
use crate::record::{decode, Record};

use super::read_more;

/// The dynamic segment-size range the Receiver picks from, per the
/// negotiated resize policy: every third segment it accepts, it commands a
/// fresh uniformly-random size in this range.
const DYNAMIC_SIZE_RANGE: std::ops::RangeInclusive<i64> = 5..=20;

/// Counters surfaced to [`crate::session`] for logging — not part of the
/// protocol itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub resizes_issued: usize,
}

/// Drives a [`ReassemblyStore`] until a `FIN` record is seen.
pub struct Reassembler<S> {
    stream: S,
    read_buf: String,
    params: NegotiatedParameters,
    store: ReassemblyStore,
    fin_seen: bool,
    stats: TransferStats,
}

impl<S> Reassembler<S>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    /// `initial_buf` carries over any bytes already read past the last
    /// record the handshake phase consumed.
    pub fn new(stream: S, params: NegotiatedParameters, initial_buf: String) -> Self {
        Self {
            stream,
            read_buf: initial_buf,
            params,
            store: ReassemblyStore::new(),
            fin_seen: false,
            stats: TransferStats::default(),
        }
    }

    /// Runs the receive loop until the peer sends `FIN`. Returns the stream,
    /// any bytes read past the `FIN` record, the reassembled payload, and
    /// transfer counters, so the caller can hand the first two off to the
    /// teardown phase.
    pub async fn run(mut self) -> Result<(S, String, String, TransferStats)> {
        self.handle_records().await?;

        while !self.fin_seen {
            if read_more(&mut self.stream, &mut self.read_buf).await? == 0 {
                return Err(crate::Error::ChannelClosed(
                    "peer closed the connection before sending FIN".into(),
                ));
            }
            self.handle_records().await?;
        }

        Ok((self.stream, self.read_buf, self.store.reconstructed().to_string(), self.stats))
    }

    async fn handle_records(&mut self) -> Result<()> {
        for record in decode(&mut self.read_buf) {
            match record {
                Record::Push { sequence, payload } => {
                    let outcome = self.store.push(sequence, payload);

                    let new_block_size = self.resize_decision(sequence);
                    if new_block_size.is_some() {
                        self.stats.resizes_issued += 1;
                    }
                    let ack = Record::Ack {
                        ack: outcome.ack,
                        new_block_size,
                    };
                    self.stream.write_all(&ack.encode()).await?;
                    self.stream.flush().await?;

                    if !outcome.delivered.is_empty() {
                        log::debug!("delivered {} bytes in order", outcome.delivered.len());
                    }
                }
                Record::Fin => {
                    self.fin_seen = true;
                    return Ok(());
                }
                other => {
                    log::debug!("ignoring unexpected record during transfer: {other:?}");
                }
            }
        }
        Ok(())
    }

    /// Decides whether this push should carry a dynamic resize command:
    /// every third accepted segment, when both sides agreed to allow it.
    fn resize_decision(&self, sequence: i64) -> Option<i64> {
        if self.params.dynamic_size && sequence >= 0 && sequence % 3 == 0 {
            Some(rand::thread_rng().gen_range(DYNAMIC_SIZE_RANGE))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_decision_only_fires_on_every_third_segment_when_enabled() {
        let params = NegotiatedParameters {
            window_size: 4,
            maximum_msg_size: 64,
            timeout_ms: 500,
            dynamic_size: true,
        };
        let reassembler = Reassembler {
            stream: tokio::io::empty(),
            read_buf: String::new(),
            params,
            store: ReassemblyStore::new(),
            fin_seen: false,
            stats: TransferStats::default(),
        };

        assert!(reassembler.resize_decision(0).is_some());
        assert!(reassembler.resize_decision(1).is_none());
        assert!(reassembler.resize_decision(2).is_none());
        assert!(reassembler.resize_decision(3).is_some());
    }

    #[test]
    fn resize_decision_never_fires_when_disabled() {
        let params = NegotiatedParameters {
            window_size: 4,
            maximum_msg_size: 64,
            timeout_ms: 500,
            dynamic_size: false,
        };
        let reassembler = Reassembler {
            stream: tokio::io::empty(),
            read_buf: String::new(),
            params,
            store: ReassemblyStore::new(),
            fin_seen: false,
            stats: TransferStats::default(),
        };

        for sequence in 0..10 {
            assert!(reassembler.resize_decision(sequence).is_none());
        }
    }
}
