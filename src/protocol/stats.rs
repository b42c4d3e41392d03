//! Per-decoder counters
//!
//! Each parser and reader owns its own counters; nothing here is shared
//! between instances.

/// Decode outcome counters for one parser or reader.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames that validated and were handed out
    pub frames: u64,
    /// Frames rejected for a bad checksum
    pub checksum_errors: u64,
    /// Frames dropped because the message ID had no known length, or the
    /// length field disagreed with the known length
    pub unknown_ids: u64,
    /// Frames whose length could never fit the decoder's buffer
    pub oversize: u64,
    /// Bytes skipped while searching for a start sequence
    pub bytes_discarded: u64,
}

impl DecodeStats {
    /// Total frames rejected for any reason
    #[must_use]
    pub const fn total_errors(&self) -> u64 {
        self.checksum_errors + self.unknown_ids + self.oversize
    }

    /// Fraction of attempted frames that were rejected
    #[must_use]
    pub fn error_rate(&self) -> Option<f64> {
        let attempts = self.frames + self.total_errors();
        if attempts == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.total_errors() as f64 / attempts as f64)
    }

    pub(crate) fn record_rejection(&mut self, error: &super::Error) {
        use super::Error;

        match error {
            Error::ChecksumMismatch { .. } => self.checksum_errors += 1,
            Error::UnknownMessage { .. } | Error::LengthMismatch { .. } => self.unknown_ids += 1,
            Error::Capacity { .. } => self.oversize += 1,
            _ => {}
        }
    }
}
