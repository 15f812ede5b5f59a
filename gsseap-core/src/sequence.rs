//! Sequence/replay window (C3): per-direction counters with an optional
//! replay-detecting bitmap window.

use crate::errors::{GssError, MajorStatus, MinorStatus};

/// Window width; spec §4.3 requires at least 64 entries.
const WINDOW_SIZE: u64 = 64;

/// Outcome of checking one received sequence number against the window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeqOutcome {
    Ok,
    Unseq,
    Gap,
    Old,
    Duplicate,
}

/// Per-direction sequence counter plus replay window.
#[derive(Clone, Debug)]
pub struct SequenceState {
    pub replay_detect: bool,
    pub sequence_enforce: bool,
    next_send: u64,
    highest_recv: Option<u64>,
    /// Bit `i` set means `highest_recv - i` has been seen, for `i` in
    /// `0..WINDOW_SIZE`.
    window: u64,
}

impl SequenceState {
    pub fn new(initial_recv: u64, replay_detect: bool, sequence_enforce: bool) -> Self {
        Self {
            replay_detect,
            sequence_enforce,
            next_send: 0,
            highest_recv: initial_recv.checked_sub(1),
            window: 0,
        }
    }

    pub fn next_send_seq(&mut self) -> u64 {
        let seq = self.next_send;
        self.next_send += 1;
        seq
    }

    pub fn send_seq(&self) -> u64 {
        self.next_send
    }

    pub fn recv_seq(&self) -> u64 {
        self.highest_recv.map_or(0, |h| h + 1)
    }

    /// Check and record a received sequence number.
    pub fn check_recv(&mut self, seq: u64) -> SeqOutcome {
        let outcome = match self.highest_recv {
            None => SeqOutcome::Ok,
            Some(highest) => {
                if seq > highest {
                    if seq - highest > 1 { SeqOutcome::Gap } else { SeqOutcome::Ok }
                } else {
                    let age = highest - seq;
                    if age >= WINDOW_SIZE {
                        SeqOutcome::Old
                    } else if self.window & (1 << age) != 0 {
                        SeqOutcome::Duplicate
                    } else {
                        SeqOutcome::Unseq
                    }
                }
            }
        };

        match self.highest_recv {
            None => {
                self.highest_recv = Some(seq);
                self.window = 1;
            }
            Some(highest) if seq > highest => {
                let shift = seq - highest;
                self.window = if shift >= WINDOW_SIZE { 1 } else { (self.window << shift) | 1 };
                self.highest_recv = Some(seq);
            }
            Some(highest) => {
                let age = highest - seq;
                if age < WINDOW_SIZE && outcome != SeqOutcome::Duplicate {
                    self.window |= 1 << age;
                }
            }
        }

        outcome
    }

    /// Apply the `replay_detect`/`sequence_enforce` policy matrix (spec
    /// §4.3) to an outcome, returning an error if it's fatal under the
    /// configured policy.
    pub fn enforce(&self, outcome: SeqOutcome) -> Result<(), GssError> {
        match outcome {
            SeqOutcome::Ok => Ok(()),
            SeqOutcome::Duplicate | SeqOutcome::Old if self.replay_detect => {
                Err(GssError::new(MajorStatus::Failure, MinorStatus::BadDirection))
            }
            SeqOutcome::Unseq | SeqOutcome::Gap if self.sequence_enforce => {
                Err(GssError::new(MajorStatus::Failure, MinorStatus::BadDirection))
            }
            _ => Ok(()),
        }
    }

    /// Serialize for the export blob: `recv_seq(u64) | send_seq(u64) |
    /// window(u64) | flags(u8)`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(25);
        out.extend_from_slice(&self.recv_seq().to_be_bytes());
        out.extend_from_slice(&self.next_send.to_be_bytes());
        out.extend_from_slice(&self.window.to_be_bytes());
        let mut flags = 0u8;
        if self.replay_detect {
            flags |= 0x1;
        }
        if self.sequence_enforce {
            flags |= 0x2;
        }
        out.push(flags);
        out
    }

    pub fn deserialize(buf: &[u8]) -> Result<Self, GssError> {
        if buf.len() != 25 {
            return Err(GssError::new(MajorStatus::DefectiveToken, MinorStatus::WrongSize));
        }
        let recv_seq = u64::from_be_bytes(buf[0..8].try_into().unwrap());
        let next_send = u64::from_be_bytes(buf[8..16].try_into().unwrap());
        let window = u64::from_be_bytes(buf[16..24].try_into().unwrap());
        let flags = buf[24];
        Ok(Self {
            replay_detect: flags & 0x1 != 0,
            sequence_enforce: flags & 0x2 != 0,
            next_send,
            highest_recv: recv_seq.checked_sub(1),
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_receipt_is_ok() {
        let mut seq = SequenceState::new(0, true, true);
        assert_eq!(seq.check_recv(0), SeqOutcome::Ok);
        assert_eq!(seq.check_recv(1), SeqOutcome::Ok);
        assert_eq!(seq.check_recv(2), SeqOutcome::Ok);
    }

    #[test]
    fn duplicate_is_detected() {
        let mut seq = SequenceState::new(0, true, true);
        seq.check_recv(0);
        seq.check_recv(1);
        assert_eq!(seq.check_recv(1), SeqOutcome::Duplicate);
    }

    #[test]
    fn gap_then_old_beyond_window() {
        let mut seq = SequenceState::new(0, true, true);
        seq.check_recv(0);
        assert_eq!(seq.check_recv(100), SeqOutcome::Gap);
        assert_eq!(seq.check_recv(0), SeqOutcome::Old);
    }

    #[test]
    fn replay_detect_makes_duplicate_fatal() {
        let mut seq = SequenceState::new(0, true, false);
        seq.check_recv(0);
        let outcome = seq.check_recv(0);
        assert!(seq.enforce(outcome).is_err());
    }

    #[test]
    fn without_replay_detect_duplicate_is_not_fatal() {
        let mut seq = SequenceState::new(0, false, false);
        seq.check_recv(0);
        let outcome = seq.check_recv(0);
        assert!(seq.enforce(outcome).is_ok());
    }

    #[test]
    fn serialize_roundtrips() {
        let mut seq = SequenceState::new(5, true, false);
        seq.check_recv(5);
        seq.check_recv(6);
        seq.next_send_seq();
        let bytes = seq.serialize();
        let restored = SequenceState::deserialize(&bytes).unwrap();
        assert_eq!(restored.recv_seq(), seq.recv_seq());
        assert_eq!(restored.send_seq(), seq.send_seq());
        assert_eq!(restored.replay_detect, seq.replay_detect);
        assert_eq!(restored.sequence_enforce, seq.sequence_enforce);
    }
}
