//! Decoded frames and the buffer parser
//!
//! [`validate`] checks one complete frame held contiguously in memory, such
//! as a UDP datagram. The same probing logic backs the accumulating reader,
//! which additionally needs to tell "not enough bytes yet" apart from
//! "not a frame".

use bytes::Bytes;
use tracing::trace;

use super::checksum::Checksum;
use super::header::FrameHeader;
use super::message::{LengthResolver, Message, NoLengths};
use super::{BASIC_START_BYTE, CHECKSUM_SIZE, Error, HeaderType, PayloadType, ProfileConfig, Result};

/// A validated frame, borrowing its payload from the decoder's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMsgInfo<'a> {
    /// Message ID (16-bit when the profile carries a package id)
    pub msg_id: u16,
    /// Payload length
    pub msg_len: usize,
    /// Payload bytes
    pub payload: &'a [u8],
    /// Routing fields; zero where the profile has none
    pub header: FrameHeader,
    /// Payload style the frame was encoded with
    pub payload_type: PayloadType,
    /// Bytes the whole frame occupied, header through checksum
    pub frame_len: usize,
}

impl FrameMsgInfo<'_> {
    /// Package id, the high byte of a 16-bit message ID
    #[must_use]
    pub const fn package_id(&self) -> u8 {
        self.msg_id.to_le_bytes()[1]
    }

    /// Whether this frame carries message `M`
    #[must_use]
    pub fn is<M: Message>(&self) -> bool {
        self.msg_id == M::MSG_ID
    }

    /// Decode the payload as `M`.
    ///
    /// Returns `None` when the ID differs or the payload does not hold a
    /// valid `M`.
    #[must_use]
    pub fn decode<M: Message>(&self) -> Option<M> {
        if !self.is::<M>() {
            return None;
        }
        M::read_bytes(self.payload)
    }

    /// Copy the payload out so it can outlive the decoder's buffer
    #[must_use]
    pub fn to_owned_frame(&self) -> OwnedFrame {
        OwnedFrame {
            msg_id: self.msg_id,
            header: self.header,
            payload_type: self.payload_type,
            payload: Bytes::copy_from_slice(self.payload),
        }
    }
}

/// A decoded frame that owns its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    /// Message ID
    pub msg_id: u16,
    /// Routing fields
    pub header: FrameHeader,
    /// Payload style the frame was encoded with
    pub payload_type: PayloadType,
    /// Payload bytes
    pub payload: Bytes,
}

impl OwnedFrame {
    /// Decode the payload as `M`
    #[must_use]
    pub fn decode<M: Message>(&self) -> Option<M> {
        if self.msg_id != M::MSG_ID {
            return None;
        }
        M::read_bytes(&self.payload)
    }
}

/// Position and metadata of a validated frame, independent of any borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameSpan {
    pub msg_id: u16,
    pub header: FrameHeader,
    pub payload_type: PayloadType,
    pub payload_offset: usize,
    pub payload_len: usize,
    pub frame_len: usize,
}

impl FrameSpan {
    /// Attach the span to the buffer the frame starts at
    pub fn info<'a>(&self, frame: &'a [u8]) -> FrameMsgInfo<'a> {
        FrameMsgInfo {
            msg_id: self.msg_id,
            msg_len: self.payload_len,
            payload: &frame[self.payload_offset..self.payload_offset + self.payload_len],
            header: self.header,
            payload_type: self.payload_type,
            frame_len: self.frame_len,
        }
    }
}

/// Outcome of looking for a frame at the front of a byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Probe {
    /// A whole, valid frame
    Complete(FrameSpan),
    /// Consistent so far; at least `needed` bytes are required
    Incomplete { needed: usize },
    /// Not a valid frame at this position
    Invalid(Error),
}

/// Payload length for a decoded header, consulting the resolver.
pub(crate) fn payload_len<R: LengthResolver + ?Sized>(
    msg_id: u16,
    length_field: Option<usize>,
    resolver: Option<&R>,
) -> Result<usize> {
    let known = resolver.and_then(|r| r.resolve_length(msg_id));
    match (length_field, known) {
        (Some(found), Some(expected)) if found != expected => Err(Error::LengthMismatch {
            id: msg_id,
            expected,
            found,
        }),
        (Some(len), _) | (None, Some(len)) => Ok(len),
        (None, None) => Err(Error::UnknownMessage { id: msg_id }),
    }
}

/// Compare the checksum trailer of a complete frame.
pub(crate) fn verify_checksum(config: &ProfileConfig, frame: &[u8]) -> Result<()> {
    if !config.has_crc() {
        return Ok(());
    }
    let crc_at = frame.len() - CHECKSUM_SIZE;
    let expected = Checksum::compute(&frame[config.crc_start()..crc_at]);
    let found = Checksum::from_bytes([frame[crc_at], frame[crc_at + 1]]);
    if expected == found {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.as_u16(),
            found: found.as_u16(),
        })
    }
}

/// Look for a frame of `config` at the start of `bytes`.
pub(crate) fn probe<R: LengthResolver + ?Sized>(
    config: &ProfileConfig,
    bytes: &[u8],
    resolver: Option<&R>,
) -> Probe {
    let start = config.start_bytes();
    let start_len = config.start_len();
    if let Some(i) = (0..start_len.min(bytes.len())).find(|&i| bytes[i] != start[i]) {
        return Probe::Invalid(Error::InvalidStartByte { found: bytes[i] });
    }

    let header_size = config.header_size();
    if bytes.len() < header_size {
        return Probe::Incomplete {
            needed: config.overhead(),
        };
    }

    let fields = FrameHeader::read(config, bytes);
    let payload_len = match payload_len(fields.msg_id, fields.length, resolver) {
        Ok(len) => len,
        Err(err) => return Probe::Invalid(err),
    };

    let frame_len = config.frame_len(payload_len);
    if bytes.len() < frame_len {
        return Probe::Incomplete { needed: frame_len };
    }

    if let Err(err) = verify_checksum(config, &bytes[..frame_len]) {
        return Probe::Invalid(err);
    }

    Probe::Complete(FrameSpan {
        msg_id: fields.msg_id,
        header: fields.header,
        payload_type: config.payload_type(),
        payload_offset: header_size,
        payload_len,
        frame_len,
    })
}

/// Resolve the profile announced by the start bytes at the front of `bytes`.
///
/// `Ok(None)` means the bytes so far are a valid prefix but the payload type
/// byte has not arrived yet.
pub(crate) fn detect(header_type: HeaderType, bytes: &[u8]) -> Result<Option<ProfileConfig>> {
    let Some(slot) = header_type.payload_type_slot() else {
        return Ok(None);
    };
    if header_type == HeaderType::Basic {
        if let Some(&first) = bytes.first() {
            if first != BASIC_START_BYTE {
                return Err(Error::InvalidStartByte { found: first });
            }
        }
    }
    match bytes.get(slot) {
        None => Ok(None),
        Some(&byte) => ProfileConfig::from_start_byte(header_type, byte)
            .map(Some)
            .ok_or(Error::InvalidStartByte { found: byte }),
    }
}

fn finish_validate<'a>(
    config: &ProfileConfig,
    bytes: &'a [u8],
    probe: Probe,
) -> Result<FrameMsgInfo<'a>> {
    match probe {
        Probe::Complete(span) => Ok(span.info(bytes)),
        Probe::Incomplete { needed } => Err(Error::Truncated {
            needed,
            got: bytes.len(),
        }),
        Probe::Invalid(err) => {
            trace!(profile = %config, error = %err, "frame rejected");
            Err(err)
        }
    }
}

/// Validate one complete frame at the start of `bytes`.
///
/// Trailing bytes after the frame are ignored; `frame_len` reports how many
/// were used. Length-less profiles need [`validate_with`].
///
/// # Errors
///
/// - [`Error::Truncated`] when the slice is shorter than the frame
/// - [`Error::InvalidStartByte`] on a start-byte mismatch
/// - [`Error::ChecksumMismatch`] when the trailer disagrees
/// - [`Error::UnknownMessage`] on a profile without a length field
pub fn validate<'a>(config: &ProfileConfig, bytes: &'a [u8]) -> Result<FrameMsgInfo<'a>> {
    validate_inner::<NoLengths>(config, bytes, None)
}

/// Validate one complete frame, resolving lengths through `resolver`.
///
/// Length-less profiles need the resolver to know the ID; length-carrying
/// profiles reject frames whose length field disagrees with a known length.
pub fn validate_with<'a, R: LengthResolver + ?Sized>(
    config: &ProfileConfig,
    bytes: &'a [u8],
    resolver: &R,
) -> Result<FrameMsgInfo<'a>> {
    validate_inner(config, bytes, Some(resolver))
}

fn validate_inner<'a, R: LengthResolver + ?Sized>(
    config: &ProfileConfig,
    bytes: &'a [u8],
    resolver: Option<&R>,
) -> Result<FrameMsgInfo<'a>> {
    if bytes.len() < config.overhead() {
        return Err(Error::Truncated {
            needed: config.overhead(),
            got: bytes.len(),
        });
    }
    let probe = probe(config, bytes, resolver);
    finish_validate(config, bytes, probe)
}

/// Validate one frame whose payload type is announced by its start bytes.
///
/// # Errors
///
/// As [`validate`], plus [`Error::InvalidStartByte`] when the start bytes
/// name no payload type (always the case for [`HeaderType::None`]).
pub fn validate_any(header_type: HeaderType, bytes: &[u8]) -> Result<FrameMsgInfo<'_>> {
    match detect(header_type, bytes)? {
        Some(config) => validate(&config, bytes),
        None => Err(match bytes.get(header_type.start_len().saturating_sub(1)) {
            Some(&found) => Error::InvalidStartByte { found },
            None => Error::Truncated {
                needed: header_type.start_len().max(1),
                got: bytes.len(),
            },
        }),
    }
}
