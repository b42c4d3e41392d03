//! Frame header fields
//!
//! The header is everything before the payload. Which fields exist, and
//! where, comes from the [`ProfileConfig`]; this module only moves bytes.

use super::{Error, ProfileConfig, Result};

/// Routing fields carried by networked payload styles.
///
/// Fields the profile does not carry are written as nothing and read back
/// as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Sequence number (wraps at 256)
    pub sequence: u8,
    /// Originating system
    pub system_id: u8,
    /// Originating component within the system
    pub component_id: u8,
}

/// Everything a decoder learns from a complete header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderFields {
    pub header: FrameHeader,
    pub msg_id: u16,
    /// Value of the length field, when the profile has one
    pub length: Option<usize>,
}

impl FrameHeader {
    /// Create a header with explicit routing fields
    #[must_use]
    pub const fn new(sequence: u8, system_id: u8, component_id: u8) -> Self {
        Self {
            sequence,
            system_id,
            component_id,
        }
    }

    /// Same header with a different sequence number
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    /// Write start bytes and header fields into `out[..config.header_size()]`.
    ///
    /// `msg_id` and `payload_len` must already be checked with
    /// [`check_encodable`].
    pub(crate) fn write(
        &self,
        config: &ProfileConfig,
        msg_id: u16,
        payload_len: usize,
        out: &mut [u8],
    ) {
        let start = config.start_bytes();
        out[..config.start_len()].copy_from_slice(&start[..config.start_len()]);

        if let Some(at) = config.seq_offset() {
            out[at] = self.sequence;
        }
        if let Some(at) = config.sys_offset() {
            out[at] = self.system_id;
        }
        if let Some(at) = config.comp_offset() {
            out[at] = self.component_id;
        }
        if let Some(at) = config.len_offset() {
            // `check_encodable` bounds the length to the field width
            let len = u16::try_from(payload_len).unwrap_or(u16::MAX).to_le_bytes();
            out[at..at + config.length_width()].copy_from_slice(&len[..config.length_width()]);
        }

        let [low, high] = msg_id.to_le_bytes();
        if let Some(at) = config.pkg_offset() {
            out[at] = high;
        }
        out[config.msg_id_offset()] = low;
    }

    /// Read header fields from `bytes[..config.header_size()]`.
    ///
    /// Start bytes are not checked here.
    pub(crate) fn read(config: &ProfileConfig, bytes: &[u8]) -> HeaderFields {
        let byte_at = |offset: Option<usize>| offset.map_or(0, |at| bytes[at]);

        let header = Self {
            sequence: byte_at(config.seq_offset()),
            system_id: byte_at(config.sys_offset()),
            component_id: byte_at(config.comp_offset()),
        };

        let length = config.len_offset().map(|at| match config.length_width() {
            1 => usize::from(bytes[at]),
            _ => usize::from(u16::from_le_bytes([bytes[at], bytes[at + 1]])),
        });

        let package = byte_at(config.pkg_offset());
        let msg_id = u16::from_le_bytes([bytes[config.msg_id_offset()], package]);

        HeaderFields {
            header,
            msg_id,
            length,
        }
    }
}

/// Check that `msg_id` and `payload_len` fit the profile's fields
pub(crate) fn check_encodable(config: &ProfileConfig, msg_id: u16, payload_len: usize) -> Result<()> {
    if msg_id > config.max_msg_id() {
        return Err(Error::MessageIdOutOfRange {
            id: msg_id,
            max: config.max_msg_id(),
        });
    }
    if payload_len > config.max_payload() {
        return Err(Error::PayloadTooLarge {
            size: payload_len,
            max: config.max_payload(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HeaderType, PayloadType};

    #[test]
    fn test_standard_header_bytes() {
        let config = ProfileConfig::STANDARD;
        let mut out = [0u8; 4];
        FrameHeader::default().write(&config, 7, 4, &mut out);
        assert_eq!(out, [0x90, 0x71, 0x04, 0x07]);
    }

    #[test]
    fn test_networked_header_roundtrip() {
        let config = ProfileConfig::NETWORKED;
        let header = FrameHeader::new(9, 3, 4);
        let mut out = [0u8; 9];
        header.write(&config, 0x0207, 300, &mut out);
        assert_eq!(out, [0x90, 0x78, 9, 3, 4, 0x2C, 0x01, 0x02, 0x07]);

        let fields = FrameHeader::read(&config, &out);
        assert_eq!(fields.header, header);
        assert_eq!(fields.msg_id, 0x0207);
        assert_eq!(fields.length, Some(300));
    }

    #[test]
    fn test_absent_fields_read_as_zero() {
        let config = ProfileConfig::new(HeaderType::Tiny, PayloadType::Seq);
        let mut out = [0u8; 4];
        FrameHeader::new(5, 6, 7).write(&config, 0x11, 2, &mut out);
        assert_eq!(out, [0x76, 5, 2, 0x11]);

        let fields = FrameHeader::read(&config, &out);
        assert_eq!(fields.header, FrameHeader::new(5, 0, 0));
        assert_eq!(fields.length, Some(2));
    }

    #[test]
    fn test_length_field_limits() {
        let mut out = [0u8; 6];
        FrameHeader::default().write(&ProfileConfig::BULK, 0x0102, 65_535, &mut out);
        assert_eq!(out, [0x90, 0x74, 0xFF, 0xFF, 0x01, 0x02]);
        assert_eq!(FrameHeader::read(&ProfileConfig::BULK, &out).length, Some(65_535));

        let mut out = [0u8; 4];
        FrameHeader::default().write(&ProfileConfig::STANDARD, 9, 255, &mut out);
        assert_eq!(out, [0x90, 0x71, 0xFF, 0x09]);
    }

    #[test]
    fn test_minimal_has_no_length() {
        let fields = FrameHeader::read(&ProfileConfig::MINIMAL, &[0x2A]);
        assert_eq!(fields.msg_id, 0x2A);
        assert_eq!(fields.length, None);
    }

    #[test]
    fn test_check_encodable() {
        assert!(check_encodable(&ProfileConfig::STANDARD, 255, 255).is_ok());
        assert_eq!(
            check_encodable(&ProfileConfig::STANDARD, 256, 0),
            Err(Error::MessageIdOutOfRange { id: 256, max: 255 })
        );
        assert_eq!(
            check_encodable(&ProfileConfig::STANDARD, 1, 256),
            Err(Error::PayloadTooLarge { size: 256, max: 255 })
        );
        assert!(check_encodable(&ProfileConfig::BULK, 0x1234, 65535).is_ok());
        assert!(check_encodable(&ProfileConfig::MINIMAL, 1, 100_000).is_ok());
    }
}
