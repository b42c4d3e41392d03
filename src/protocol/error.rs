//! Framing error types

use thiserror::Error;

/// Framing errors
///
/// Every failure in the codec is reported as a value at the point of
/// detection. None of these are fatal: callers may retry with a larger
/// buffer, feed more bytes, or drop the frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Output buffer cannot hold the frame
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual free space
        got: usize,
    },

    /// Payload exceeds what the profile's length field can express
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Message ID does not fit in the profile's ID fields
    #[error("message id {id:#x} out of range (max {max:#x})")]
    MessageIdOutOfRange {
        /// Requested ID
        id: u16,
        /// Largest encodable ID
        max: u16,
    },

    /// A reservation is already open on this buffer
    #[error("a reservation is already in progress")]
    ReservationInProgress,

    /// `finish` or `abort` called with no open reservation
    #[error("no reservation in progress")]
    NoReservation,

    /// Leading bytes do not match the profile's start sequence
    #[error("invalid start byte: {found:#04x}")]
    InvalidStartByte {
        /// Offending byte
        found: u8,
    },

    /// Fewer bytes than the frame's declared length
    #[error("truncated frame: need {needed} bytes, got {got}")]
    Truncated {
        /// Declared frame length
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// Recomputed checksum disagrees with the trailer
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Computed checksum (`byte1 | byte2 << 8`)
        expected: u16,
        /// Checksum carried by the frame
        found: u16,
    },

    /// Length-less profile and the resolver does not know this ID
    #[error("unknown message id {id:#x}")]
    UnknownMessage {
        /// Message ID
        id: u16,
    },

    /// Length field disagrees with the resolver's known length
    #[error("length mismatch for message {id:#x}: expected {expected}, got {found}")]
    LengthMismatch {
        /// Message ID
        id: u16,
        /// Length known to the resolver
        expected: usize,
        /// Length carried by the frame
        found: usize,
    },

    /// Frame would not fit in the decoder's fixed buffer
    #[error("frame of {needed} bytes exceeds decoder capacity {capacity}")]
    Capacity {
        /// Frame size
        needed: usize,
        /// Decoder capacity
        capacity: usize,
    },

    /// Profile name not recognised
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
