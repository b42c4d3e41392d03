//! Accumulating stream reader
//!
//! Callers push arbitrarily sized chunks with [`AccumulatingReader::add_data`]
//! and drain validated frames with [`AccumulatingReader::next`]. A frame
//! split across chunks, at any byte offset, is held until its last byte
//! arrives. Bytes that cannot start a frame are skipped one at a time.

use tracing::{debug, trace};

use super::frame::{FrameMsgInfo, Probe, detect, probe};
use super::message::{LengthResolver, NoLengths};
use super::stats::DecodeStats;
use super::{Error, HeaderType, PayloadType, ProfileConfig, Result};

/// Stream reader with a fixed `N`-byte buffer
#[derive(Debug, Clone)]
pub struct AccumulatingReader<const N: usize, R = NoLengths> {
    header_type: HeaderType,
    /// `None` accepts any payload type the start bytes announce
    fixed: Option<ProfileConfig>,
    resolver: R,
    buf: [u8; N],
    start: usize,
    end: usize,
    stats: DecodeStats,
}

impl<const N: usize> AccumulatingReader<N> {
    /// Reader for exactly one profile, trusting length fields
    #[must_use]
    pub fn new(config: ProfileConfig) -> Self {
        Self::with_resolver(config, NoLengths)
    }

    /// Reader that accepts every payload type under `header_type`.
    ///
    /// `HeaderType::None` cannot announce a payload type and behaves like a
    /// fixed `Minimal` reader.
    #[must_use]
    pub fn auto(header_type: HeaderType) -> Self {
        Self::auto_with_resolver(header_type, NoLengths)
    }
}

impl<const N: usize, R: LengthResolver> AccumulatingReader<N, R> {
    /// Reader for one profile with a length resolver
    pub fn with_resolver(config: ProfileConfig, resolver: R) -> Self {
        Self::build(config.header_type(), Some(config), resolver)
    }

    /// Auto-detecting reader with a length resolver
    pub fn auto_with_resolver(header_type: HeaderType, resolver: R) -> Self {
        let fixed = match header_type {
            HeaderType::None => Some(ProfileConfig::new(HeaderType::None, PayloadType::Minimal)),
            HeaderType::Tiny | HeaderType::Basic => None,
        };
        Self::build(header_type, fixed, resolver)
    }

    fn build(header_type: HeaderType, fixed: Option<ProfileConfig>, resolver: R) -> Self {
        Self {
            header_type,
            fixed,
            resolver,
            buf: [0u8; N],
            start: 0,
            end: 0,
            stats: DecodeStats::default(),
        }
    }

    /// Buffer capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes held but not yet consumed
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.end - self.start
    }

    /// Whether bytes of an incomplete frame are being held
    #[must_use]
    pub fn has_partial(&self) -> bool {
        self.buffered() > 0
    }

    /// Bytes of the incomplete frame being held
    #[must_use]
    pub fn partial_size(&self) -> usize {
        self.buffered()
    }

    /// Decode counters
    #[must_use]
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Length resolver
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Discard everything held, including a partial frame
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Append a chunk.
    ///
    /// Consumed bytes are dropped first to make room. The buffer must be
    /// provisioned for the largest frame plus the largest burst.
    ///
    /// # Errors
    ///
    /// [`Error::Capacity`] when the chunk does not fit; nothing is copied.
    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        self.compact();
        let needed = self.end + data.len();
        if needed > N {
            debug!(needed, capacity = N, "chunk does not fit reader buffer");
            return Err(Error::Capacity {
                needed,
                capacity: N,
            });
        }
        self.buf[self.end..needed].copy_from_slice(data);
        self.end = needed;
        Ok(())
    }

    /// Next validated frame, or `None` when the buffered bytes hold no
    /// complete frame.
    ///
    /// Corrupt frames and unknown IDs are skipped (and counted in
    /// [`stats`](Self::stats)); scanning resumes one byte past their start.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<FrameMsgInfo<'_>> {
        while self.start < self.end {
            let available = &self.buf[self.start..self.end];
            let outcome = match self.front_config(available) {
                Ok(Some(config)) => {
                    match probe(&config, available, Some(&self.resolver)) {
                        Probe::Incomplete { needed } if needed > N => Probe::Invalid(Error::Capacity {
                            needed,
                            capacity: N,
                        }),
                        other => other,
                    }
                }
                Ok(None) => return None,
                Err(err) => Probe::Invalid(err),
            };

            match outcome {
                Probe::Complete(span) => {
                    let frame_start = self.start;
                    self.start += span.frame_len;
                    self.stats.frames += 1;
                    return Some(span.info(&self.buf[frame_start..]));
                }
                Probe::Incomplete { needed } => {
                    trace!(needed, buffered = self.buffered(), "waiting for more bytes");
                    return None;
                }
                Probe::Invalid(err) => {
                    self.skip(&err);
                }
            }
        }
        None
    }

    /// Profile of the frame at the front, if the start bytes have arrived
    fn front_config(&self, available: &[u8]) -> Result<Option<ProfileConfig>> {
        match self.fixed {
            Some(config) => Ok(Some(config)),
            None => detect(self.header_type, available),
        }
    }

    fn skip(&mut self, err: &Error) {
        match err {
            Error::InvalidStartByte { .. } => {
                self.stats.bytes_discarded += 1;
            }
            _ => {
                debug!(error = %err, "dropping frame, resynchronising");
                self.stats.record_rejection(err);
            }
        }
        self.start += 1;
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }
}
