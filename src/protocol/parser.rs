//! Byte-at-a-time frame parser
//!
//! For bytes that arrive one by one with nowhere to accumulate them, such
//! as a UART receive interrupt. The parser owns a fixed `N`-byte frame
//! buffer, never blocks and never allocates.
//!
//! ```text
//! AwaitingStart1 -> AwaitingStart2 -> ReadingHeader -> ReadingPayload
//!       ^                                                    |
//!       +------------------ frame done or rejected ----------+
//! ```
//!
//! Every rejection returns to `AwaitingStart1`, so a parser cannot get
//! stuck: garbage is skipped byte by byte until a start sequence shows up.

use tracing::{debug, trace};

use super::frame::{FrameMsgInfo, FrameSpan, payload_len, verify_checksum};
use super::header::FrameHeader;
use super::message::{LengthResolver, NoLengths};
use super::stats::DecodeStats;
use super::{BASIC_START_BYTE, Error, HeaderType, PayloadType, ProfileConfig, Result};

/// Byte parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Looking for the first start byte
    AwaitingStart1,
    /// Sync byte seen, looking for the payload-type byte
    AwaitingStart2,
    /// Collecting header fields up to `msg_id`
    ReadingHeader,
    /// Collecting payload and checksum
    ReadingPayload,
}

/// Result of feeding one byte, before a frame view is built.
enum Step {
    Pending,
    Complete(FrameSpan),
    Rejected(Error),
}

/// Incremental frame parser with an `N`-byte buffer
#[derive(Debug, Clone)]
pub struct FrameParser<const N: usize, R = NoLengths> {
    header_type: HeaderType,
    /// `None` accepts any payload type the start byte announces
    fixed: Option<PayloadType>,
    config: ProfileConfig,
    resolver: R,
    state: ParserState,
    buf: [u8; N],
    len: usize,
    total: usize,
    span: Option<FrameSpan>,
    stats: DecodeStats,
}

impl<const N: usize> FrameParser<N> {
    /// Parser for exactly one profile, trusting length fields
    #[must_use]
    pub fn new(config: ProfileConfig) -> Self {
        Self::with_resolver(config, NoLengths)
    }

    /// Parser that accepts every payload type under `header_type`.
    ///
    /// `HeaderType::None` has no start byte to announce a payload type, so
    /// that case behaves like a fixed `Minimal` parser.
    #[must_use]
    pub fn auto(header_type: HeaderType) -> Self {
        Self::auto_with_resolver(header_type, NoLengths)
    }
}

impl<const N: usize, R: LengthResolver> FrameParser<N, R> {
    /// Parser for one profile with a length resolver
    pub fn with_resolver(config: ProfileConfig, resolver: R) -> Self {
        Self::build(config.header_type(), Some(config.payload_type()), resolver)
    }

    /// Auto-detecting parser with a length resolver
    pub fn auto_with_resolver(header_type: HeaderType, resolver: R) -> Self {
        let fixed = match header_type {
            HeaderType::None => Some(PayloadType::Minimal),
            HeaderType::Tiny | HeaderType::Basic => None,
        };
        Self::build(header_type, fixed, resolver)
    }

    fn build(header_type: HeaderType, fixed: Option<PayloadType>, resolver: R) -> Self {
        Self {
            header_type,
            fixed,
            config: ProfileConfig::new(header_type, fixed.unwrap_or(PayloadType::Minimal)),
            resolver,
            state: ParserState::AwaitingStart1,
            buf: [0u8; N],
            len: 0,
            total: 0,
            span: None,
            stats: DecodeStats::default(),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Profile of the frame in progress (or the fixed profile)
    #[must_use]
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Bytes of the frame in progress
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.len
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

    /// Drop any partial frame and wait for a start byte
    pub fn reset(&mut self) {
        self.state = ParserState::AwaitingStart1;
        self.len = 0;
        self.total = 0;
        if self.fixed.is_none() {
            self.config = ProfileConfig::new(self.header_type, PayloadType::Minimal);
        }
    }

    /// Feed one byte.
    ///
    /// Returns `None` while a frame is incomplete (or nothing is being
    /// parsed), `Some(Ok(frame))` once a frame validates, and `Some(Err(_))`
    /// when a complete frame fails its checksum. Frames dropped earlier
    /// (unknown ID, oversize length) are counted in [`stats`](Self::stats)
    /// but produce no result.
    pub fn push(&mut self, byte: u8) -> Option<Result<FrameMsgInfo<'_>>> {
        match self.step(byte) {
            Step::Pending => None,
            Step::Complete(span) => {
                self.stats.frames += 1;
                self.span = Some(span);
                Some(Ok(span.info(&self.buf)))
            }
            Step::Rejected(err) => {
                self.stats.record_rejection(&err);
                match err {
                    Error::ChecksumMismatch { .. } => Some(Err(err)),
                    _ => None,
                }
            }
        }
    }

    /// Feed bytes until one produces a result.
    ///
    /// Returns how many bytes were consumed along with the result, so the
    /// caller can continue from `&bytes[consumed..]`.
    pub fn push_slice(&mut self, bytes: &[u8]) -> (usize, Option<Result<FrameMsgInfo<'_>>>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.step(byte) {
                Step::Pending => {}
                Step::Complete(span) => {
                    self.stats.frames += 1;
                    self.span = Some(span);
                    return (i + 1, Some(Ok(span.info(&self.buf))));
                }
                Step::Rejected(err) => {
                    self.stats.record_rejection(&err);
                    if matches!(err, Error::ChecksumMismatch { .. }) {
                        return (i + 1, Some(Err(err)));
                    }
                }
            }
        }
        (bytes.len(), None)
    }

    /// Last frame that validated, if the buffer still holds it
    #[must_use]
    pub fn last_frame(&self) -> Option<FrameMsgInfo<'_>> {
        match self.state {
            ParserState::AwaitingStart1 => self.span.map(|span| span.info(&self.buf)),
            _ => None,
        }
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            ParserState::AwaitingStart1 => self.on_start1(byte),
            ParserState::AwaitingStart2 => self.on_start2(byte),
            ParserState::ReadingHeader => {
                self.store(byte);
                self.on_header_byte()
            }
            ParserState::ReadingPayload => {
                self.store(byte);
                if self.len == self.total {
                    self.complete()
                } else {
                    Step::Pending
                }
            }
        }
    }

    fn store(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.len += 1;
    }

    fn begin(&mut self) {
        self.span = None;
        self.len = 0;
        self.total = 0;
    }

    fn on_start1(&mut self, byte: u8) -> Step {
        self.begin();
        match self.header_type {
            HeaderType::None => {
                if let Some(rejected) = self.reject_oversize_header() {
                    return rejected;
                }
                self.store(byte);
                self.state = ParserState::ReadingHeader;
                self.on_header_byte()
            }
            HeaderType::Tiny => {
                if self.accept_type_byte(byte) {
                    if let Some(rejected) = self.reject_oversize_header() {
                        return rejected;
                    }
                    self.store(byte);
                    self.state = ParserState::ReadingHeader;
                    self.on_header_byte()
                } else {
                    self.stats.bytes_discarded += 1;
                    Step::Pending
                }
            }
            HeaderType::Basic => {
                if byte != BASIC_START_BYTE {
                    self.stats.bytes_discarded += 1;
                    return Step::Pending;
                }
                // Until the type byte arrives `config` holds the smallest
                // header this style can have
                if let Some(rejected) = self.reject_oversize_header() {
                    return rejected;
                }
                self.store(byte);
                self.state = ParserState::AwaitingStart2;
                Step::Pending
            }
        }
    }

    fn on_start2(&mut self, byte: u8) -> Step {
        if self.accept_type_byte(byte) {
            if let Some(rejected) = self.reject_oversize_header() {
                return rejected;
            }
            self.store(byte);
            self.state = ParserState::ReadingHeader;
            return self.on_header_byte();
        }

        // The sync byte we held was not a frame start
        self.stats.bytes_discarded += 1;
        if byte == BASIC_START_BYTE {
            trace!("re-arming on repeated sync byte");
            self.begin();
            self.store(byte);
        } else {
            self.stats.bytes_discarded += 1;
            self.reset();
        }
        Step::Pending
    }

    /// Abort when the header alone cannot fit the `N`-byte buffer
    fn reject_oversize_header(&mut self) -> Option<Step> {
        let needed = self.config.header_size();
        if needed <= N {
            return None;
        }
        debug!(needed, capacity = N, "header exceeds parser buffer");
        self.reset();
        Some(Step::Rejected(Error::Capacity {
            needed,
            capacity: N,
        }))
    }

    fn accept_type_byte(&mut self, byte: u8) -> bool {
        match self.fixed {
            Some(payload_type) => byte == payload_type.start_byte(),
            None => match ProfileConfig::from_start_byte(self.header_type, byte) {
                Some(config) => {
                    self.config = config;
                    true
                }
                None => false,
            },
        }
    }

    fn on_header_byte(&mut self) -> Step {
        let header_size = self.config.header_size();
        if self.len < header_size {
            return Step::Pending;
        }

        let fields = FrameHeader::read(&self.config, &self.buf[..header_size]);
        let payload = match payload_len(fields.msg_id, fields.length, Some(&self.resolver)) {
            Ok(len) => len,
            Err(err) => {
                debug!(msg_id = fields.msg_id, error = %err, "dropping frame");
                self.reset();
                return Step::Rejected(err);
            }
        };

        let total = self.config.frame_len(payload);
        if total > N {
            debug!(msg_id = fields.msg_id, total, capacity = N, "frame exceeds parser buffer");
            self.reset();
            return Step::Rejected(Error::Capacity {
                needed: total,
                capacity: N,
            });
        }

        self.total = total;
        self.span = Some(FrameSpan {
            msg_id: fields.msg_id,
            header: fields.header,
            payload_type: self.config.payload_type(),
            payload_offset: header_size,
            payload_len: payload,
            frame_len: total,
        });

        if self.len == total {
            self.complete()
        } else {
            self.state = ParserState::ReadingPayload;
            Step::Pending
        }
    }

    fn complete(&mut self) -> Step {
        let span = self.span.take();
        let checked = verify_checksum(&self.config, &self.buf[..self.total]);
        self.state = ParserState::AwaitingStart1;

        match (checked, span) {
            (Ok(()), Some(span)) => Step::Complete(span),
            (Err(err), _) => {
                debug!(error = %err, "frame failed checksum");
                Step::Rejected(err)
            }
            (Ok(()), None) => Step::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EncodeBuffer, MessageRegistry};

    fn encode(config: &ProfileConfig, msg_id: u16, payload: &[u8]) -> Vec<u8> {
        let mut storage = vec![0u8; config.frame_len(payload.len())];
        EncodeBuffer::new(&mut storage).encode(config, msg_id, payload).unwrap();
        storage
    }

    /// Feed every byte, collecting `(msg_id, payload)` of valid frames and a
    /// count of checksum failures.
    fn feed<const N: usize, R: LengthResolver>(
        parser: &mut FrameParser<N, R>,
        bytes: &[u8],
    ) -> (Vec<(u16, Vec<u8>)>, usize) {
        let mut frames = Vec::new();
        let mut bad = 0;
        for &byte in bytes {
            match parser.push(byte) {
                Some(Ok(info)) => frames.push((info.msg_id, info.payload.to_vec())),
                Some(Err(_)) => bad += 1,
                None => {}
            }
        }
        (frames, bad)
    }

    #[test]
    fn test_standard_one_result_after_last_byte() {
        let frame = encode(&ProfileConfig::STANDARD, 7, &[1, 2, 3, 4]);
        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);

        for &byte in &frame[..frame.len() - 1] {
            assert!(parser.push(byte).is_none());
        }
        let info = parser.push(frame[frame.len() - 1]).unwrap().unwrap();
        assert_eq!(info.msg_id, 7);
        assert_eq!(info.payload, &[1, 2, 3, 4]);
        assert_eq!(parser.state(), ParserState::AwaitingStart1);
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_checksum_failure_then_restart() {
        let good = encode(&ProfileConfig::STANDARD, 7, &[1, 2, 3, 4]);
        let mut bad = good.clone();
        bad[9] ^= 0xFF;

        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);
        let (frames, failures) = feed(&mut parser, &bad);
        assert!(frames.is_empty());
        assert_eq!(failures, 1);
        assert_eq!(parser.state(), ParserState::AwaitingStart1);

        let (frames, failures) = feed(&mut parser, &good);
        assert_eq!(frames, vec![(7, vec![1, 2, 3, 4])]);
        assert_eq!(failures, 0);
        assert_eq!(parser.stats().checksum_errors, 1);
    }

    #[test]
    fn test_garbage_prefix_skipped() {
        let mut stream = vec![0x00, 0x13, 0x90, 0x42, 0xFF];
        stream.extend(encode(&ProfileConfig::BULK, 0x0A0B, b"payload"));

        let mut parser = FrameParser::<128>::new(ProfileConfig::BULK);
        let (frames, failures) = feed(&mut parser, &stream);
        assert_eq!(frames, vec![(0x0A0B, b"payload".to_vec())]);
        assert_eq!(failures, 0);
        assert_eq!(parser.stats().bytes_discarded, 5);
    }

    #[test]
    fn test_repeated_sync_byte_rearms() {
        let mut stream = vec![0x90, 0x90, 0x90];
        stream.extend(encode(&ProfileConfig::STANDARD, 1, b"x"));
        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);
        let (frames, _) = feed(&mut parser, &stream);
        assert_eq!(frames, vec![(1, b"x".to_vec())]);
    }

    #[test]
    fn test_oversize_length_aborts() {
        let frame = encode(&ProfileConfig::BULK, 1, &[0; 100]);
        let mut parser = FrameParser::<32>::new(ProfileConfig::BULK);
        let (frames, failures) = feed(&mut parser, &frame);
        assert!(frames.is_empty());
        assert_eq!(failures, 0);
        assert_eq!(parser.stats().oversize, 1);

        let small = encode(&ProfileConfig::BULK, 2, &[0; 4]);
        let (frames, _) = feed(&mut parser, &small);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_lengthless_profile_uses_resolver() {
        let registry = MessageRegistry::new(&[(3, 2), (4, 0)]);
        let mut stream = encode(&ProfileConfig::COMPACT, 3, b"ab");
        stream.extend(encode(&ProfileConfig::COMPACT, 4, b""));
        stream.extend(encode(&ProfileConfig::COMPACT, 9, b"zz"));
        stream.extend(encode(&ProfileConfig::COMPACT, 3, b"cd"));

        let mut parser = FrameParser::<16, _>::with_resolver(ProfileConfig::COMPACT, registry);
        let (frames, _) = feed(&mut parser, &stream);
        assert_eq!(
            frames,
            vec![(3, b"ab".to_vec()), (4, Vec::new()), (3, b"cd".to_vec())]
        );
        assert_eq!(parser.stats().unknown_ids, 1);
    }

    #[test]
    fn test_lengthless_without_resolver_drops_everything() {
        let stream = encode(&ProfileConfig::COMPACT, 3, b"ab");
        let mut parser = FrameParser::<16>::new(ProfileConfig::COMPACT);
        let (frames, _) = feed(&mut parser, &stream);
        assert!(frames.is_empty());
        assert_eq!(parser.stats().unknown_ids, 1);
    }

    #[test]
    fn test_auto_mode_mixed_payload_types() {
        let mut stream = encode(&ProfileConfig::STANDARD, 1, b"std");
        stream.extend(encode(&ProfileConfig::NETWORKED, 0x0203, b"net"));
        stream.extend(encode(&ProfileConfig::BULK, 0x0405, b"bulk"));

        let mut parser = FrameParser::<64>::auto(HeaderType::Basic);
        let mut seen = Vec::new();
        for &byte in &stream {
            if let Some(Ok(info)) = parser.push(byte) {
                seen.push((info.payload_type, info.msg_id));
            }
        }
        assert_eq!(
            seen,
            vec![
                (PayloadType::Default, 1),
                (PayloadType::ExtendedMultiSystemStream, 0x0203),
                (PayloadType::Extended, 0x0405),
            ]
        );
    }

    #[test]
    fn test_fixed_mode_ignores_other_payload_types() {
        let stream = encode(&ProfileConfig::BULK, 1, b"bulk");
        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);
        let (frames, failures) = feed(&mut parser, &stream);
        assert!(frames.is_empty());
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_minimal_single_byte_frames() {
        let resolver = |id: u16| (id == 0x10).then_some(0usize);
        let mut parser = FrameParser::<8, _>::with_resolver(ProfileConfig::MINIMAL, resolver);
        let info = parser.push(0x10).unwrap().unwrap();
        assert_eq!(info.msg_id, 0x10);
        assert!(info.payload.is_empty());
    }

    #[test]
    fn test_push_slice_resumes() {
        let mut stream = encode(&ProfileConfig::STANDARD, 1, b"a");
        stream.extend(encode(&ProfileConfig::STANDARD, 2, b"b"));

        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);
        let (used, result) = parser.push_slice(&stream);
        assert_eq!(result.unwrap().unwrap().msg_id, 1);
        let (rest, result) = parser.push_slice(&stream[used..]);
        assert_eq!(result.unwrap().unwrap().msg_id, 2);
        assert_eq!(used + rest, stream.len());
        assert_eq!(parser.last_frame().unwrap().payload, b"b");
    }

    #[test]
    fn test_auto_header_larger_than_buffer() {
        let mut parser = FrameParser::<8>::auto(HeaderType::Basic);
        let mut stream = vec![0x90, 0x78];
        stream.extend(1..=9u8);
        let (frames, failures) = feed(&mut parser, &stream);
        assert!(frames.is_empty());
        assert_eq!(failures, 0);
        assert_eq!(parser.stats().oversize, 1);
        assert_eq!(parser.state(), ParserState::AwaitingStart1);

        // A frame that fits still decodes afterwards
        let small = encode(&ProfileConfig::STANDARD, 4, b"ok");
        let (frames, _) = feed(&mut parser, &small);
        assert_eq!(frames, vec![(4, b"ok".to_vec())]);
    }

    #[test]
    fn test_fixed_header_larger_than_buffer() {
        let frame = encode(&ProfileConfig::STANDARD, 7, &[1, 2, 3, 4]);
        let mut parser = FrameParser::<3>::new(ProfileConfig::STANDARD);
        let (frames, failures) = feed(&mut parser, &frame);
        assert!(frames.is_empty());
        assert_eq!(failures, 0);
        assert_eq!(parser.stats().oversize, 1);
        assert_eq!(parser.state(), ParserState::AwaitingStart1);

        let mut tiny = FrameParser::<1>::new(ProfileConfig::new(HeaderType::Tiny, PayloadType::Seq));
        assert!(tiny.push(0x76).is_none());
        assert_eq!(tiny.stats().oversize, 1);

        let mut empty = FrameParser::<0, _>::with_resolver(ProfileConfig::MINIMAL, |_: u16| Some(0usize));
        assert!(empty.push(0x01).is_none());
        assert_eq!(empty.stats().oversize, 1);
    }

    #[test]
    fn test_reset_drops_partial() {
        let frame = encode(&ProfileConfig::STANDARD, 1, b"abc");
        let mut parser = FrameParser::<64>::new(ProfileConfig::STANDARD);
        for &byte in &frame[..5] {
            parser.push(byte);
        }
        assert_eq!(parser.state(), ParserState::ReadingPayload);
        parser.reset();
        assert_eq!(parser.state(), ParserState::AwaitingStart1);
        assert_eq!(parser.buffered(), 0);
    }
}
