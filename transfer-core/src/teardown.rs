//! Graceful teardown: `FIN` / `FIN/ACK` / `ACK` (C5 operation).
//!
//! Both sides drain the stream strictly by decoding records until the
//! expected one appears, rather than scanning the raw bytes for a
//! substring — a record that happens to straddle two reads, or arrives
//! alongside other records, is still handled correctly.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::channel::read_more;
use crate::error::Result;
use crate::record::{decode, Record};

/// The ACK value carried on the final teardown `ACK`.
const TEARDOWN_ACK: i64 = 0;

/// Sender-initiated teardown: send `FIN`, wait for `FIN/ACK`, send the final
/// `ACK`. `read_buf` carries over any bytes already read past the last
/// record the transfer phase consumed.
pub async fn sender_teardown<S>(stream: &mut S, mut read_buf: String) -> Result<()>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&Record::Fin.encode()).await?;
    stream.flush().await?;

    loop {
        for record in decode(&mut read_buf) {
            if record == Record::FinAck {
                let ack = Record::Ack {
                    ack: TEARDOWN_ACK,
                    new_block_size: None,
                };
                stream.write_all(&ack.encode()).await?;
                stream.flush().await?;
                return Ok(());
            }
            log::warn!("ignoring unexpected record during teardown: {record:?}");
        }

        if read_more(stream, &mut read_buf).await? == 0 {
            return Err(crate::Error::ChannelClosed(
                "peer closed the connection before sending FIN/ACK".into(),
            ));
        }
    }
}

/// Receiver-initiated teardown: the caller has already observed the peer's
/// `FIN` (via [`crate::channel::receiver::Reassembler::run`]). Sends
/// `FIN/ACK` and waits for the final `ACK`.
pub async fn receiver_teardown<S>(stream: &mut S, mut read_buf: String) -> Result<()>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&Record::FinAck.encode()).await?;
    stream.flush().await?;

    loop {
        for record in decode(&mut read_buf) {
            if let Record::Ack { .. } = record {
                return Ok(());
            }
            log::warn!("ignoring unexpected record during teardown: {record:?}");
        }

        if read_more(stream, &mut read_buf).await? == 0 {
            return Err(crate::Error::ChannelClosed(
                "peer closed the connection before sending the final ACK".into(),
            ));
        }
    }
}
