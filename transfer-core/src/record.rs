//! Wire record definitions and the newline-delimited JSON codec.
//!
//! A record is a single JSON object terminated by one line-feed byte.
//! Records may be coalesced within a single channel read; [`decode`] splits
//! on the terminator and leaves any trailing partial record in the caller's
//! buffer.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single protocol message.
///
/// Modeled as a sum type with one variant per wire `flag`, rather than a
/// class hierarchy with a shared abstract base — the field set is closed and
/// known per kind, so an exhaustive `match` replaces virtual dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag")]
pub enum Record {
    /// Connection-setup proposal, sent by the Sender.
    #[serde(rename = "SYN")]
    Syn {
        window_size: i64,
        maximum_msg_size: i64,
        timeout: i64,
        dynamic_size: bool,
    },

    /// Connection-setup counter-proposal, sent by the Receiver.
    #[serde(rename = "SYN/ACK")]
    SynAck {
        window_size: i64,
        maximum_msg_size: i64,
        timeout: i64,
        dynamic_size: bool,
    },

    /// Cumulative acknowledgement, optionally piggy-backing a dynamic
    /// segment-size change request.
    #[serde(rename = "ACK")]
    Ack {
        ack: i64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        new_block_size: Option<i64>,
    },

    /// One payload segment.
    #[serde(rename = "PUSH")]
    Push { sequence: i64, payload: String },

    /// Graceful-close request.
    #[serde(rename = "FIN")]
    Fin,

    /// Graceful-close acknowledgement.
    #[serde(rename = "FIN/ACK")]
    FinAck,
}

impl Record {
    /// Encodes this record as a JSON object followed by a single `\n`.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).expect("Record serialization is infallible");
        bytes.push(b'\n');
        bytes
    }
}

/// Decodes as many complete, newline-terminated records as `buffer` holds.
///
/// Any trailing partial record (no terminating `\n` yet seen) is left in
/// `buffer` untouched. A record that fails to parse, or whose `flag` is
/// unrecognised, is dropped and scanning continues — individual malformed
/// records are never fatal to the stream.
pub fn decode(buffer: &mut String) -> Vec<Record> {
    let mut records = Vec::new();

    loop {
        let Some(newline_at) = buffer.find('\n') else {
            break;
        };

        let line = buffer[..newline_at].to_string();
        *buffer = buffer[newline_at + 1..].to_string();

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                log::warn!("dropping unparseable record {line:?}: {err}");
            }
        }
    }

    records
}

/// Like [`decode`], but a line whose `flag` matches `expected_flag` and
/// still fails to deserialize — a required field is missing or malformed —
/// is reported as a fatal negotiation failure instead of being silently
/// dropped. General protocol noise tolerance doesn't extend to the
/// handshake's own messages: a corrupt `SYN` isn't "unexpected chatter to
/// ignore", it's the negotiation itself breaking.
pub fn decode_handshake(buffer: &mut String, expected_flag: &str) -> Result<Vec<Record>, Error> {
    let mut records = Vec::new();

    loop {
        let Some(newline_at) = buffer.find('\n') else {
            break;
        };

        let line = buffer[..newline_at].to_string();
        *buffer = buffer[newline_at + 1..].to_string();

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                let matches_expected = serde_json::from_str::<serde_json::Value>(&line)
                    .ok()
                    .and_then(|value| value.get("flag").and_then(|f| f.as_str().map(str::to_string)))
                    .is_some_and(|flag| flag == expected_flag);

                if matches_expected {
                    return Err(Error::NegotiationFailure(format!(
                        "malformed {expected_flag} record: {err}"
                    )));
                }

                log::warn!("dropping unparseable record {line:?}: {err}");
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let record = Record::Push {
            sequence: 3,
            payload: "hello".to_string(),
        };
        let mut buf = String::from_utf8(record.encode()).unwrap();
        let decoded = decode(&mut buf);
        assert_eq!(decoded, vec![record]);
        assert!(buf.is_empty());
    }

    #[test]
    fn ack_omits_new_block_size_when_absent() {
        let record = Record::Ack {
            ack: 4,
            new_block_size: None,
        };
        let encoded = String::from_utf8(record.encode()).unwrap();
        assert!(!encoded.contains("new_block_size"));
    }

    #[test]
    fn ack_carries_new_block_size_when_present() {
        let record = Record::Ack {
            ack: 4,
            new_block_size: Some(7),
        };
        let encoded = String::from_utf8(record.encode()).unwrap();
        assert!(encoded.contains("\"new_block_size\":7"));
    }

    #[test]
    fn decode_leaves_partial_record_in_buffer() {
        let mut buf = String::from("{\"flag\":\"FIN\"}\n{\"flag\":\"PUS");
        let records = decode(&mut buf);
        assert_eq!(records, vec![Record::Fin]);
        assert_eq!(buf, "{\"flag\":\"PUS");
    }

    #[test]
    fn decode_drops_malformed_record_and_continues() {
        let mut buf = String::from("not json\n{\"flag\":\"FIN\"}\n");
        let records = decode(&mut buf);
        assert_eq!(records, vec![Record::Fin]);
    }

    #[test]
    fn decode_coalesced_records() {
        let mut buf = String::new();
        buf.push_str(&String::from_utf8(Record::Fin.encode()).unwrap());
        buf.push_str(&String::from_utf8(Record::FinAck.encode()).unwrap());
        let records = decode(&mut buf);
        assert_eq!(records, vec![Record::Fin, Record::FinAck]);
    }

    #[test]
    fn decode_handshake_passes_through_well_formed_records() {
        let mut buf = String::from_utf8(
            Record::Syn {
                window_size: 4,
                maximum_msg_size: 64,
                timeout: 500,
                dynamic_size: false,
            }
            .encode(),
        )
        .unwrap();
        let records = decode_handshake(&mut buf, "SYN").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn decode_handshake_rejects_a_syn_missing_a_required_field() {
        let mut buf = String::from("{\"flag\":\"SYN\",\"window_size\":4}\n");
        let err = decode_handshake(&mut buf, "SYN").unwrap_err();
        assert!(matches!(err, Error::NegotiationFailure(_)));
    }

    #[test]
    fn decode_handshake_tolerates_noise_with_a_different_flag() {
        // Malformed, but not the flag this caller is waiting on — dropped as
        // noise rather than treated as a negotiation failure.
        let mut buf = String::from("{\"flag\":\"PUSH\",\"sequence\":1}\n");
        let records = decode_handshake(&mut buf, "SYN").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn flag_values_match_wire_spelling() {
        let syn_ack = Record::SynAck {
            window_size: 1,
            maximum_msg_size: 1,
            timeout: 1,
            dynamic_size: false,
        };
        let encoded = String::from_utf8(syn_ack.encode()).unwrap();
        assert!(encoded.contains("\"flag\":\"SYN/ACK\""));
    }
}
