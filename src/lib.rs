//! msgframe - Profile-driven binary message framing
//!
//! Wraps opaque message payloads in a configurable header/footer envelope
//! (start bytes, optional length, optional routing fields, optional
//! checksum) so a byte stream can be split back into validated messages.
//! Built for constrained links: serial, UART, IPC, UDP.
//!
//! # Quick Start
//!
//! ```rust
//! use msgframe::{AccumulatingReader, EncodeBuffer, ProfileConfig, validate};
//!
//! let mut storage = [0u8; 64];
//! let mut buffer = EncodeBuffer::new(&mut storage);
//! buffer.encode(&ProfileConfig::STANDARD, 7, &[1, 2, 3, 4])?;
//!
//! // One contiguous frame
//! let info = validate(&ProfileConfig::STANDARD, buffer.as_bytes())?;
//! assert_eq!(info.msg_id, 7);
//! assert_eq!(info.payload, &[1, 2, 3, 4]);
//!
//! // Or a stream delivered in pieces
//! let bytes = buffer.as_bytes();
//! let mut reader = AccumulatingReader::<256>::new(ProfileConfig::STANDARD);
//! reader.add_data(&bytes[..3])?;
//! assert!(reader.next().is_none());
//! reader.add_data(&bytes[3..])?;
//! assert_eq!(reader.next().unwrap().msg_id, 7);
//! # Ok::<(), msgframe::Error>(())
//! ```
//!
//! # Profiles
//!
//! | Profile | Start | Header (after start) | Footer |
//! |---|---|---|---|
//! | Minimal | none | `msg_id` | none |
//! | Compact | `0x70+type` | `msg_id` | none |
//! | Standard | `0x90 0x70+type` | `len msg_id` | crc(2) |
//! | Bulk | `0x90 0x70+type` | `len16 pkg_id msg_id` | crc(2) |
//! | Networked | `0x90 0x70+type` | `seq sys comp len16 pkg_id msg_id` | crc(2) |
//!
//! Any other header/payload combination is available through
//! [`ProfileConfig::new`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    AccumulatingReader, Checksum, DecodeStats, EncodeBuffer, Error, FrameFormat, FrameHeader,
    FrameMsgInfo, FrameParser, HeaderType, LengthResolver, Message, MessageRegistry, NoLengths,
    OwnedFrame, ParserState, PayloadType, Profile, ProfileConfig, Result, fletcher16, validate,
    validate_any, validate_with,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
