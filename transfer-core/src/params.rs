//! Handshake parameter proposal and negotiation (C4 data model).

use serde::{Deserialize, Serialize};

/// The parameters one side proposes before negotiation, carried by `SYN` and
/// `SYN/ACK` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedParameters {
    pub window_size: i64,
    pub maximum_msg_size: i64,
    pub timeout: i64,
    pub dynamic_size: bool,
}

impl Default for ProposedParameters {
    fn default() -> Self {
        Self {
            window_size: 4,
            maximum_msg_size: 64,
            timeout: 500,
            dynamic_size: false,
        }
    }
}

/// Parameters both sides have agreed on; immutable for the rest of the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParameters {
    pub window_size: u32,
    pub maximum_msg_size: u32,
    pub timeout_ms: u64,
    pub dynamic_size: bool,
}

impl NegotiatedParameters {
    /// Computes the effective parameters each side settles on independently:
    /// component-wise minimum for the numeric fields, logical AND for
    /// `dynamic_size`. Both sides compute the same result given the same
    /// pair of proposals, in either order.
    pub fn negotiate(local: ProposedParameters, remote: ProposedParameters) -> Self {
        Self {
            window_size: local.window_size.min(remote.window_size).max(1) as u32,
            maximum_msg_size: local.maximum_msg_size.min(remote.maximum_msg_size).max(1) as u32,
            timeout_ms: local.timeout.min(remote.timeout).max(1) as u64,
            dynamic_size: local.dynamic_size && remote.dynamic_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_takes_the_minimum_and_ands_dynamic_size() {
        let sender = ProposedParameters {
            window_size: 8,
            maximum_msg_size: 10,
            timeout: 2000,
            dynamic_size: true,
        };
        let receiver = ProposedParameters {
            window_size: 4,
            maximum_msg_size: 20,
            timeout: 500,
            dynamic_size: false,
        };

        let effective = NegotiatedParameters::negotiate(sender, receiver);
        assert_eq!(effective.window_size, 4);
        assert_eq!(effective.maximum_msg_size, 10);
        assert_eq!(effective.timeout_ms, 500);
        assert!(!effective.dynamic_size);

        // Order independence: the same pair negotiated from the other side
        // yields the identical result.
        let effective_reversed = NegotiatedParameters::negotiate(receiver, sender);
        assert_eq!(effective, effective_reversed);
    }
}
