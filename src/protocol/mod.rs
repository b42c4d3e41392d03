//! Frame codec core
//!
//! This module provides the profiles, checksum, encoder and the three
//! decoders (byte parser, buffer parser, accumulating reader).

mod checksum;
mod encoder;
mod error;
mod frame;
mod header;
mod message;
mod parser;
mod profile;
mod reader;
mod stats;

pub use checksum::{Checksum, fletcher16};
pub use encoder::EncodeBuffer;
pub use error::{Error, Result};
pub use frame::{FrameMsgInfo, OwnedFrame, validate, validate_any, validate_with};
pub use header::FrameHeader;
pub use message::{LengthResolver, Message, MessageRegistry, NoLengths};
pub use parser::{FrameParser, ParserState};
pub use profile::{FrameFormat, HeaderType, PayloadType, Profile, ProfileConfig};
pub use reader::AccumulatingReader;
pub use stats::DecodeStats;

/// Fixed sync byte leading every `Basic` header
pub const BASIC_START_BYTE: u8 = 0x90;

/// Payload-type start bytes are `PAYLOAD_TYPE_BASE + code`
pub const PAYLOAD_TYPE_BASE: u8 = 0x70;

/// Checksum trailer size in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// Largest header any profile produces (networked)
pub const MAX_HEADER_SIZE: usize = ProfileConfig::NETWORKED.header_size();

/// Largest per-frame overhead any profile produces
pub const MAX_OVERHEAD: usize = ProfileConfig::NETWORKED.overhead();
