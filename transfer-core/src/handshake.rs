//! Three-way handshake: parameter proposal, negotiation, and the completing
//! `ACK` (C4 operation).

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::channel::read_more;
use crate::error::Result;
use crate::params::{NegotiatedParameters, ProposedParameters};
use crate::record::{decode_handshake, Record};

/// The `ack` value carried on the handshake-completing `ACK`: there is
/// nothing to acknowledge yet, so it is the sentinel "before segment zero"
/// value.
const HANDSHAKE_ACK: i64 = 0;

/// Performs the Sender's half of the three-way handshake: send `SYN`
/// proposing `local`, wait for the peer's `SYN/ACK`, negotiate the effective
/// parameters, then send the completing `ACK`. Returns the negotiated
/// parameters along with any bytes read past the last handshake record.
pub async fn sender_handshake<S>(
    stream: &mut S,
    local: ProposedParameters,
) -> Result<(NegotiatedParameters, String)>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    let syn = Record::Syn {
        window_size: local.window_size,
        maximum_msg_size: local.maximum_msg_size,
        timeout: local.timeout,
        dynamic_size: local.dynamic_size,
    };
    stream.write_all(&syn.encode()).await?;
    stream.flush().await?;

    let mut read_buf = String::new();
    let negotiated = loop {
        if read_more(stream, &mut read_buf).await? == 0 {
            return Err(crate::Error::ChannelClosed(
                "peer closed the connection during handshake".into(),
            ));
        }

        let mut found = None;
        for record in decode_handshake(&mut read_buf, "SYN/ACK")? {
            if let Record::SynAck {
                window_size,
                maximum_msg_size,
                timeout,
                dynamic_size,
            } = record
            {
                let remote = ProposedParameters {
                    window_size,
                    maximum_msg_size,
                    timeout,
                    dynamic_size,
                };
                found = Some(NegotiatedParameters::negotiate(local, remote));
                break;
            }
            log::warn!("ignoring unexpected record during handshake: {record:?}");
        }

        if let Some(negotiated) = found {
            break negotiated;
        }
    };

    let ack = Record::Ack {
        ack: HANDSHAKE_ACK,
        new_block_size: None,
    };
    stream.write_all(&ack.encode()).await?;
    stream.flush().await?;

    Ok((negotiated, read_buf))
}

/// Performs the Receiver's half of the three-way handshake: wait for the
/// peer's `SYN`, reply with `SYN/ACK` proposing `local`, then wait for the
/// completing `ACK` before returning. A `PUSH` arriving before that `ACK` is
/// impossible by construction: this function only returns once the
/// handshake is fully complete, so [`crate::channel::receiver::Reassembler`]
/// never exists in a state where it could see one early.
pub async fn receiver_handshake<S>(
    stream: &mut S,
    local: ProposedParameters,
) -> Result<(NegotiatedParameters, String)>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    let mut read_buf = String::new();
    let negotiated = loop {
        if read_more(stream, &mut read_buf).await? == 0 {
            return Err(crate::Error::ChannelClosed(
                "peer closed the connection during handshake".into(),
            ));
        }

        let mut found = None;
        for record in decode_handshake(&mut read_buf, "SYN")? {
            if let Record::Syn {
                window_size,
                maximum_msg_size,
                timeout,
                dynamic_size,
            } = record
            {
                let remote = ProposedParameters {
                    window_size,
                    maximum_msg_size,
                    timeout,
                    dynamic_size,
                };
                found = Some(NegotiatedParameters::negotiate(local, remote));
                break;
            }
            log::warn!("ignoring unexpected record during handshake: {record:?}");
        }

        if let Some(negotiated) = found {
            break negotiated;
        }
    };

    let syn_ack = Record::SynAck {
        window_size: local.window_size,
        maximum_msg_size: local.maximum_msg_size,
        timeout: local.timeout,
        dynamic_size: local.dynamic_size,
    };
    stream.write_all(&syn_ack.encode()).await?;
    stream.flush().await?;

    loop {
        let mut saw_ack = false;
        for record in decode_handshake(&mut read_buf, "ACK")? {
            match record {
                Record::Ack { .. } => {
                    saw_ack = true;
                    break;
                }
                other => log::warn!("ignoring unexpected record during handshake: {other:?}"),
            }
        }

        if saw_ack {
            return Ok((negotiated, read_buf));
        }

        if read_more(stream, &mut read_buf).await? == 0 {
            return Err(crate::Error::ChannelClosed(
                "peer closed the connection before completing the handshake".into(),
            ));
        }
    }
}
