//! Sender-side sliding-window payload state (C3 data model).
//!
//! [`PayloadBuffer`] is deliberately free of any I/O: it tracks segments,
//! the window, and the fast-retransmit/timeout bookkeeping as pure data, so
//! its invariants can be exercised directly in unit tests without a channel.
//! [`crate::channel::sender::Framer`] drives it.

use std::time::{Duration, Instant};

/// What happened as a result of feeding one `ACK` into [`PayloadBuffer::apply_ack`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AckOutcome {
    /// Set when three identical cumulative ACKs triggered a fast
    /// retransmit: the lowest unacknowledged sequence number to resend.
    pub fast_retransmit: Option<usize>,
    /// Set when the ACK carried a dynamic size change that was applied.
    pub resliced_to: Option<usize>,
}

/// The Sender's view of the payload: the raw text, its current slicing into
/// segments, and the sliding-window cursors over those segments.
#[derive(Debug)]
pub struct PayloadBuffer {
    raw: String,
    segments: Vec<String>,
    window_size: usize,
    segment_size: usize,
    frame_cursor: usize,
    sequence_tracker: usize,
    byte_position: usize,
    last_ack_time: Instant,
    last_ack_seq: Option<i64>,
    dup_ack_count: u32,
    drop_seq: Option<usize>,
    dropped_once: bool,
}

impl PayloadBuffer {
    /// Creates a new buffer, slicing `raw` into segments of `segment_size`
    /// characters (the last segment may be shorter). An empty payload
    /// produces zero segments.
    pub fn new(raw: String, window_size: u32, segment_size: u32) -> Self {
        let segment_size = segment_size.max(1) as usize;
        let segments = slice_into(&raw, segment_size);
        Self {
            raw,
            segments,
            window_size: window_size.max(1) as usize,
            segment_size,
            frame_cursor: 0,
            sequence_tracker: 0,
            byte_position: 0,
            last_ack_time: Instant::now(),
            last_ack_seq: None,
            dup_ack_count: 0,
            drop_seq: None,
            dropped_once: false,
        }
    }

    /// Like [`Self::new`], but arranges for the segment at `drop_seq` to be
    /// silently swallowed the first (and only the first) time the send step
    /// would transmit it. Used by tests to exercise fast retransmit
    /// deterministically; never enabled outside test builds.
    #[cfg(test)]
    pub fn with_test_drop(raw: String, window_size: u32, segment_size: u32, drop_seq: usize) -> Self {
        let mut buf = Self::new(raw, window_size, segment_size);
        buf.drop_seq = Some(drop_seq);
        buf
    }

    /// True once every segment has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.frame_cursor >= self.segments.len()
    }

    /// Returns the `(sequence, payload)` pairs the send step should transmit
    /// right now, advancing `sequence_tracker` past each of them (including
    /// ones swallowed by the test-only drop).
    pub fn next_sends(&mut self) -> Vec<(usize, String)> {
        let upper_bound = (self.frame_cursor + self.window_size).min(self.segments.len());
        let mut out = Vec::new();

        while self.sequence_tracker < upper_bound {
            let idx = self.sequence_tracker;

            if self.drop_seq == Some(idx) && !self.dropped_once {
                self.dropped_once = true;
                self.sequence_tracker += 1;
                continue;
            }

            out.push((idx, self.segments[idx].clone()));
            self.sequence_tracker += 1;
        }

        out
    }

    /// Applies a received cumulative `ACK`, per §4.3: the byte-position
    /// update happens before any re-slice, and duplicate-ACK tracking runs
    /// last.
    pub fn apply_ack(&mut self, ack: i64, new_block_size: Option<i64>, dynamic_size: bool) -> AckOutcome {
        let mut outcome = AckOutcome::default();

        if ack >= 0 {
            let cum = ack as usize;
            if cum >= self.frame_cursor {
                for i in self.frame_cursor..=cum.min(self.segments.len().saturating_sub(1)) {
                    self.byte_position += self.segments[i].len();
                }
                self.frame_cursor = cum + 1;
                self.sequence_tracker = self.sequence_tracker.max(self.frame_cursor);
                self.last_ack_time = Instant::now();
            }
        }

        if dynamic_size {
            if let Some(new_size) = new_block_size {
                if new_size > 0 && new_size as usize != self.segment_size {
                    self.reslice(new_size as usize);
                    outcome.resliced_to = Some(new_size as usize);
                }
            }
        }

        if self.last_ack_seq == Some(ack) {
            self.dup_ack_count += 1;
        } else {
            self.last_ack_seq = Some(ack);
            self.dup_ack_count = 1;
        }

        if self.dup_ack_count >= 3 && self.frame_cursor < self.segments.len() {
            outcome.fast_retransmit = Some(self.frame_cursor);
            self.dup_ack_count = 0;
        }

        outcome
    }

    /// Checks the retransmission timer. Returns `true` (and rewinds
    /// `sequence_tracker` back to `frame_cursor` so the whole window is
    /// resent) if the timeout has fired.
    pub fn check_timeout(&mut self, timeout_ms: u64) -> bool {
        if self.last_ack_time.elapsed() > Duration::from_millis(timeout_ms) {
            self.sequence_tracker = self.frame_cursor;
            self.last_ack_time = Instant::now();
            true
        } else {
            false
        }
    }

    /// Re-partitions the unacknowledged suffix of `raw` into segments of
    /// `new_size`, leaving the acknowledged prefix untouched, and rewinds
    /// `sequence_tracker` to `frame_cursor` so the new segments get sent.
    fn reslice(&mut self, new_size: usize) {
        let suffix = &self.raw[self.byte_position..];
        let mut new_segments = slice_into(suffix, new_size);

        self.segments.truncate(self.frame_cursor);
        self.segments.append(&mut new_segments);

        self.segment_size = new_size;
        self.sequence_tracker = self.frame_cursor;
    }

    /// Segment payload for `sequence`, used to look up what to resend on a
    /// fast retransmit.
    pub fn segment(&self, sequence: usize) -> Option<&str> {
        self.segments.get(sequence).map(String::as_str)
    }

    pub fn frame_cursor(&self) -> usize {
        self.frame_cursor
    }

    pub fn sequence_tracker(&self) -> usize {
        self.sequence_tracker
    }

    pub fn byte_position(&self) -> usize {
        self.byte_position
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Checks internal consistency between `byte_position`, `frame_cursor`,
    /// and the segment list. Only used by tests and debug assertions — the
    /// production code paths maintain these by construction.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        let expected_byte_position: usize =
            self.segments[..self.frame_cursor].iter().map(|s| s.len()).sum();
        assert_eq!(self.byte_position, expected_byte_position);
        assert!(self.frame_cursor <= self.sequence_tracker);
        assert!(self.sequence_tracker <= self.frame_cursor + self.window_size);
        assert!(self.sequence_tracker <= self.segments.len());
    }
}

fn slice_into(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_has_zero_segments() {
        let buf = PayloadBuffer::new(String::new(), 4, 5);
        assert_eq!(buf.segment_count(), 0);
        assert!(buf.is_complete());
    }

    #[test]
    fn exact_multiple_of_segment_size() {
        let buf = PayloadBuffer::new("HELLOWORLD".to_string(), 4, 5);
        assert_eq!(buf.segment_count(), 2);
        assert_eq!(buf.segment(0), Some("HELLO"));
        assert_eq!(buf.segment(1), Some("WORLD"));
    }

    #[test]
    fn send_step_respects_window() {
        let mut buf = PayloadBuffer::new("AAAAABBBBBCCCCCDDDDD".to_string(), 2, 5);
        let sent = buf.next_sends();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (0, "AAAAA".to_string()));
        assert_eq!(sent[1], (1, "BBBBB".to_string()));
        // Window is full: nothing further offered until an ACK advances it.
        assert!(buf.next_sends().is_empty());
        buf.check_invariants();
    }

    #[test]
    fn cumulative_ack_advances_frame_cursor_and_byte_position() {
        let mut buf = PayloadBuffer::new("AAAAABBBBB".to_string(), 4, 5);
        buf.next_sends();
        buf.apply_ack(1, None, false);
        assert_eq!(buf.frame_cursor(), 2);
        assert_eq!(buf.byte_position(), 10);
        buf.check_invariants();
    }

    #[test]
    fn stale_ack_is_a_no_op() {
        let mut buf = PayloadBuffer::new("AAAAABBBBB".to_string(), 4, 5);
        buf.next_sends();
        buf.apply_ack(1, None, false);
        let byte_position_before = buf.byte_position();
        let frame_cursor_before = buf.frame_cursor();
        buf.apply_ack(0, None, false);
        assert_eq!(buf.byte_position(), byte_position_before);
        assert_eq!(buf.frame_cursor(), frame_cursor_before);
    }

    #[test]
    fn three_duplicate_acks_trigger_fast_retransmit() {
        let mut buf = PayloadBuffer::with_test_drop("AAAAABBBBBCCCCCDDDDD".to_string(), 4, 5, 1);
        buf.next_sends(); // 0,1(dropped),2,3
        let mut last = AckOutcome::default();
        for _ in 0..3 {
            last = buf.apply_ack(0, None, false);
        }
        assert_eq!(last.fast_retransmit, Some(1));
    }

    #[test]
    fn timeout_rewinds_sequence_tracker_without_touching_frame_cursor() {
        let mut buf = PayloadBuffer::new("AB".to_string(), 2, 2);
        buf.next_sends();
        assert_eq!(buf.sequence_tracker(), 1);
        std::thread::sleep(Duration::from_millis(5));
        assert!(buf.check_timeout(1));
        assert_eq!(buf.sequence_tracker(), buf.frame_cursor());
        assert_eq!(buf.byte_position(), 0);
    }

    #[test]
    fn reslice_after_ack_keeps_acknowledged_prefix_and_repartitions_suffix() {
        let mut buf = PayloadBuffer::new("ABCDEFGHIJKLMNO".to_string(), 4, 5);
        buf.next_sends(); // sends segment 0 ("ABCDE")
        let outcome = buf.apply_ack(0, Some(3), true);
        assert_eq!(outcome.resliced_to, Some(3));
        assert_eq!(buf.segment(0), Some("ABCDE"));
        assert_eq!(buf.segment(1), Some("FGH"));
        assert_eq!(buf.segment(2), Some("IJK"));
        assert_eq!(buf.segment(3), Some("LMN"));
        assert_eq!(buf.segment(4), Some("O"));
        assert_eq!(buf.segment_count(), 5);
        assert_eq!(buf.sequence_tracker(), buf.frame_cursor());
    }

    #[test]
    fn dynamic_size_toggled_off_ignores_new_block_size() {
        let mut buf = PayloadBuffer::new("ABCDEFGHIJKLMNO".to_string(), 4, 5);
        buf.next_sends();
        let outcome = buf.apply_ack(0, Some(3), false);
        assert_eq!(outcome.resliced_to, None);
        assert_eq!(buf.segment(1), Some("FGHIJ"));
    }
}
