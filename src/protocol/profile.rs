//! Wire format profiles
//!
//! A profile is one header style crossed with one payload style. The codec
//! never branches on the style names: everything it needs is resolved once
//! into a [`ProfileConfig`] (field presence, offsets, sizes) by a `const fn`.

use std::fmt;
use std::str::FromStr;

use super::{BASIC_START_BYTE, CHECKSUM_SIZE, Error, PAYLOAD_TYPE_BASE};

/// Header styles (the start-byte axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderType {
    /// No start bytes
    None,
    /// One start byte carrying the payload type
    Tiny,
    /// Fixed sync byte followed by a payload-type byte
    Basic,
}

impl HeaderType {
    /// Number of start bytes
    #[must_use]
    pub const fn start_len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Tiny => 1,
            Self::Basic => 2,
        }
    }

    /// Number of fixed sync bytes (excluded from checksum coverage)
    #[must_use]
    pub const fn sync_len(self) -> usize {
        match self {
            Self::Basic => 1,
            Self::None | Self::Tiny => 0,
        }
    }

    /// Index of the start byte that carries the payload type
    #[must_use]
    pub const fn payload_type_slot(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Tiny => Some(0),
            Self::Basic => Some(1),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tiny => "tiny",
            Self::Basic => "basic",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "tiny" => Some(Self::Tiny),
            "basic" => Some(Self::Basic),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload styles (the routing/length/integrity axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum PayloadType {
    /// `msg_id` only, no length, no checksum
    Minimal = 0,
    /// `len(1) msg_id`
    Default = 1,
    /// `len(1) pkg_id msg_id`
    ExtendedMsgIds = 2,
    /// `len(2) msg_id`
    ExtendedLength = 3,
    /// `len(2) pkg_id msg_id`
    Extended = 4,
    /// `sys comp len(1) msg_id`
    SysComp = 5,
    /// `seq len(1) msg_id`
    Seq = 6,
    /// `seq sys comp len(1) msg_id`
    MultiSystemStream = 7,
    /// `seq sys comp len(2) pkg_id msg_id`
    ExtendedMultiSystemStream = 8,
}

/// Field presence for one payload style
#[derive(Debug, Clone, Copy)]
struct PayloadLayout {
    sequence: bool,
    system_id: bool,
    component_id: bool,
    length_width: usize,
    package_id: bool,
    crc: bool,
}

impl PayloadLayout {
    const fn new(
        sequence: bool,
        routing: bool,
        length_width: usize,
        package_id: bool,
        crc: bool,
    ) -> Self {
        Self {
            sequence,
            system_id: routing,
            component_id: routing,
            length_width,
            package_id,
            crc,
        }
    }
}

impl PayloadType {
    /// Every payload style, in code order
    pub const ALL: [Self; 9] = [
        Self::Minimal,
        Self::Default,
        Self::ExtendedMsgIds,
        Self::ExtendedLength,
        Self::Extended,
        Self::SysComp,
        Self::Seq,
        Self::MultiSystemStream,
        Self::ExtendedMultiSystemStream,
    ];

    /// Convert from the payload-type code
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Minimal),
            1 => Some(Self::Default),
            2 => Some(Self::ExtendedMsgIds),
            3 => Some(Self::ExtendedLength),
            4 => Some(Self::Extended),
            5 => Some(Self::SysComp),
            6 => Some(Self::Seq),
            7 => Some(Self::MultiSystemStream),
            8 => Some(Self::ExtendedMultiSystemStream),
            _ => None,
        }
    }

    /// Convert to the payload-type code
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Start byte that announces this payload style
    #[must_use]
    pub const fn start_byte(self) -> u8 {
        PAYLOAD_TYPE_BASE + self.as_u8()
    }

    /// Decode a payload-type start byte
    #[must_use]
    pub const fn from_start_byte(byte: u8) -> Option<Self> {
        match byte.checked_sub(PAYLOAD_TYPE_BASE) {
            Some(code) => Self::from_u8(code),
            None => None,
        }
    }

    const fn layout(self) -> PayloadLayout {
        match self {
            Self::Minimal => PayloadLayout::new(false, false, 0, false, false),
            Self::Default => PayloadLayout::new(false, false, 1, false, true),
            Self::ExtendedMsgIds => PayloadLayout::new(false, false, 1, true, true),
            Self::ExtendedLength => PayloadLayout::new(false, false, 2, false, true),
            Self::Extended => PayloadLayout::new(false, false, 2, true, true),
            Self::SysComp => PayloadLayout::new(false, true, 1, false, true),
            Self::Seq => PayloadLayout::new(true, false, 1, false, true),
            Self::MultiSystemStream => PayloadLayout::new(true, true, 1, false, true),
            Self::ExtendedMultiSystemStream => PayloadLayout::new(true, true, 2, true, true),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::ExtendedMsgIds => "extended_msg_ids",
            Self::ExtendedLength => "extended_length",
            Self::Extended => "extended",
            Self::SysComp => "sys_comp",
            Self::Seq => "seq",
            Self::MultiSystemStream => "multi_system_stream",
            Self::ExtendedMultiSystemStream => "extended_multi_system_stream",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|payload| payload.name() == name)
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved description of one wire format.
///
/// Header layout, in wire order:
///
/// ```text
/// [start bytes] [seq] [sys] [comp] [len (1|2, LE)] [pkg_id] msg_id | payload | [crc1 crc2]
/// ```
///
/// Sizes and offsets are fixed at construction; only the length field's
/// value varies per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "FrameFormat", into = "FrameFormat"))]
pub struct ProfileConfig {
    header_type: HeaderType,
    payload_type: PayloadType,
    seq_offset: Option<usize>,
    sys_offset: Option<usize>,
    comp_offset: Option<usize>,
    len_offset: Option<usize>,
    length_width: usize,
    pkg_offset: Option<usize>,
    msg_id_offset: usize,
    has_crc: bool,
    header_size: usize,
}

/// Serialized form of a [`ProfileConfig`]: just its two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameFormat {
    /// Header style
    pub header: HeaderType,
    /// Payload style
    pub payload: PayloadType,
}

impl From<FrameFormat> for ProfileConfig {
    fn from(format: FrameFormat) -> Self {
        Self::new(format.header, format.payload)
    }
}

impl From<ProfileConfig> for FrameFormat {
    fn from(config: ProfileConfig) -> Self {
        Self {
            header: config.header_type,
            payload: config.payload_type,
        }
    }
}

const fn take(present: bool, offset: &mut usize, width: usize) -> Option<usize> {
    if present {
        let at = *offset;
        *offset += width;
        Some(at)
    } else {
        None
    }
}

impl ProfileConfig {
    /// No framing: `msg_id | payload`
    pub const MINIMAL: Self = Self::new(HeaderType::None, PayloadType::Minimal);
    /// Single payload-type start byte: `0x70 msg_id | payload`
    pub const COMPACT: Self = Self::new(HeaderType::Tiny, PayloadType::Minimal);
    /// `0x90 0x71 len msg_id | payload | crc`
    pub const STANDARD: Self = Self::new(HeaderType::Basic, PayloadType::Default);
    /// `0x90 0x74 len16 pkg_id msg_id | payload | crc`
    pub const BULK: Self = Self::new(HeaderType::Basic, PayloadType::Extended);
    /// `0x90 0x78 seq sys comp len16 pkg_id msg_id | payload | crc`
    pub const NETWORKED: Self = Self::new(HeaderType::Basic, PayloadType::ExtendedMultiSystemStream);

    /// Resolve a header style and payload style into a configuration
    #[must_use]
    pub const fn new(header_type: HeaderType, payload_type: PayloadType) -> Self {
        let layout = payload_type.layout();
        let mut offset = header_type.start_len();

        let seq_offset = take(layout.sequence, &mut offset, 1);
        let sys_offset = take(layout.system_id, &mut offset, 1);
        let comp_offset = take(layout.component_id, &mut offset, 1);
        let len_offset = take(layout.length_width > 0, &mut offset, layout.length_width);
        let pkg_offset = take(layout.package_id, &mut offset, 1);
        let msg_id_offset = offset;

        Self {
            header_type,
            payload_type,
            seq_offset,
            sys_offset,
            comp_offset,
            len_offset,
            length_width: layout.length_width,
            pkg_offset,
            msg_id_offset,
            has_crc: layout.crc,
            header_size: msg_id_offset + 1,
        }
    }

    /// Resolve the configuration announced by a payload-type start byte
    #[must_use]
    pub const fn from_start_byte(header_type: HeaderType, byte: u8) -> Option<Self> {
        if matches!(header_type, HeaderType::None) {
            return None;
        }
        match PayloadType::from_start_byte(byte) {
            Some(payload_type) => Some(Self::new(header_type, payload_type)),
            None => None,
        }
    }

    /// Header style
    #[must_use]
    pub const fn header_type(&self) -> HeaderType {
        self.header_type
    }

    /// Payload style
    #[must_use]
    pub const fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    /// Number of start bytes (0, 1 or 2)
    #[must_use]
    pub const fn start_len(&self) -> usize {
        self.header_type.start_len()
    }

    /// The start bytes this profile emits; only the first `start_len()` are used
    #[must_use]
    pub const fn start_bytes(&self) -> [u8; 2] {
        let type_byte = self.payload_type.start_byte();
        match self.header_type {
            HeaderType::None => [0, 0],
            HeaderType::Tiny => [type_byte, 0],
            HeaderType::Basic => [BASIC_START_BYTE, type_byte],
        }
    }

    /// Whether a start byte carries the payload type, and which slot
    #[must_use]
    pub const fn payload_type_slot(&self) -> Option<usize> {
        self.header_type.payload_type_slot()
    }

    /// Whether a length field is present
    #[must_use]
    pub const fn has_length(&self) -> bool {
        self.len_offset.is_some()
    }

    /// Width of the length field (0, 1 or 2)
    #[must_use]
    pub const fn length_width(&self) -> usize {
        self.length_width
    }

    /// Whether a sequence byte is present
    #[must_use]
    pub const fn has_sequence(&self) -> bool {
        self.seq_offset.is_some()
    }

    /// Whether a system-id byte is present
    #[must_use]
    pub const fn has_system_id(&self) -> bool {
        self.sys_offset.is_some()
    }

    /// Whether a component-id byte is present
    #[must_use]
    pub const fn has_component_id(&self) -> bool {
        self.comp_offset.is_some()
    }

    /// Whether a package-id byte is present
    #[must_use]
    pub const fn has_package_id(&self) -> bool {
        self.pkg_offset.is_some()
    }

    /// Whether a checksum trailer is present
    #[must_use]
    pub const fn has_crc(&self) -> bool {
        self.has_crc
    }

    /// Width of the checksum trailer (0 or 2)
    #[must_use]
    pub const fn crc_width(&self) -> usize {
        if self.has_crc { CHECKSUM_SIZE } else { 0 }
    }

    /// Bytes before the payload
    #[must_use]
    pub const fn header_size(&self) -> usize {
        self.header_size
    }

    /// Bytes after the payload
    #[must_use]
    pub const fn footer_size(&self) -> usize {
        self.crc_width()
    }

    /// `header_size + footer_size`
    #[must_use]
    pub const fn overhead(&self) -> usize {
        self.header_size + self.footer_size()
    }

    /// Largest payload the length field can express.
    ///
    /// Length-less profiles rely on external agreement and report `usize::MAX`.
    #[must_use]
    pub const fn max_payload(&self) -> usize {
        match self.length_width {
            1 => u8::MAX as usize,
            2 => u16::MAX as usize,
            _ => usize::MAX,
        }
    }

    /// Largest encodable message ID (16-bit when a package id is present)
    #[must_use]
    pub const fn max_msg_id(&self) -> u16 {
        if self.has_package_id() {
            u16::MAX
        } else {
            u8::MAX as u16
        }
    }

    /// First byte covered by the checksum (everything after the sync byte)
    #[must_use]
    pub const fn crc_start(&self) -> usize {
        self.header_type.sync_len()
    }

    /// Total frame size for a payload of `payload_len` bytes
    #[must_use]
    pub const fn frame_len(&self, payload_len: usize) -> usize {
        self.overhead() + payload_len
    }

    pub(crate) const fn seq_offset(&self) -> Option<usize> {
        self.seq_offset
    }

    pub(crate) const fn sys_offset(&self) -> Option<usize> {
        self.sys_offset
    }

    pub(crate) const fn comp_offset(&self) -> Option<usize> {
        self.comp_offset
    }

    pub(crate) const fn len_offset(&self) -> Option<usize> {
        self.len_offset
    }

    pub(crate) const fn pkg_offset(&self) -> Option<usize> {
        self.pkg_offset
    }

    pub(crate) const fn msg_id_offset(&self) -> usize {
        self.msg_id_offset
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Display for ProfileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Profile::from_config(self) {
            Some(profile) => write!(f, "{profile}"),
            None => write!(f, "{}:{}", self.header_type, self.payload_type),
        }
    }
}

impl FromStr for ProfileConfig {
    type Err = Error;

    /// Accepts a canonical profile name (`standard`) or `header:payload`
    /// (`tiny:default`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Ok(profile) = name.parse::<Profile>() {
            return Ok(profile.config());
        }

        let (header, payload) = name
            .split_once(':')
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))?;
        match (HeaderType::from_name(header), PayloadType::from_name(payload)) {
            (Some(header), Some(payload)) => Ok(Self::new(header, payload)),
            _ => Err(Error::UnknownProfile(s.to_string())),
        }
    }
}

/// The five canonical profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Profile {
    /// No framing, `msg_id` only
    Minimal,
    /// One start byte, `msg_id`, no checksum
    Compact,
    /// Two start bytes, 8-bit length, checksum
    Standard,
    /// Two start bytes, 16-bit length, package id, checksum
    Bulk,
    /// Two start bytes, sequence and routing, 16-bit length, package id, checksum
    Networked,
}

impl Profile {
    /// Every canonical profile
    pub const ALL: [Self; 5] = [
        Self::Minimal,
        Self::Compact,
        Self::Standard,
        Self::Bulk,
        Self::Networked,
    ];

    /// Resolved configuration
    #[must_use]
    pub const fn config(self) -> ProfileConfig {
        match self {
            Self::Minimal => ProfileConfig::MINIMAL,
            Self::Compact => ProfileConfig::COMPACT,
            Self::Standard => ProfileConfig::STANDARD,
            Self::Bulk => ProfileConfig::BULK,
            Self::Networked => ProfileConfig::NETWORKED,
        }
    }

    /// Canonical profile matching a configuration, if any
    #[must_use]
    pub fn from_config(config: &ProfileConfig) -> Option<Self> {
        Self::ALL.into_iter().find(|profile| profile.config() == *config)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Bulk => "bulk",
            Self::Networked => "networked",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|profile| profile.name() == name)
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))
    }
}

impl From<Profile> for ProfileConfig {
    fn from(profile: Profile) -> Self {
        profile.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sizes() {
        let cases = [
            (ProfileConfig::MINIMAL, 1, 0),
            (ProfileConfig::COMPACT, 2, 0),
            (ProfileConfig::STANDARD, 4, 2),
            (ProfileConfig::BULK, 6, 2),
            (ProfileConfig::NETWORKED, 9, 2),
        ];

        for (config, header, footer) in cases {
            assert_eq!(config.header_size(), header, "{config}");
            assert_eq!(config.footer_size(), footer, "{config}");
            assert_eq!(config.overhead(), header + footer, "{config}");
        }
    }

    #[test]
    fn test_networked_layout() {
        let config = ProfileConfig::NETWORKED;
        assert_eq!(config.seq_offset(), Some(2));
        assert_eq!(config.sys_offset(), Some(3));
        assert_eq!(config.comp_offset(), Some(4));
        assert_eq!(config.len_offset(), Some(5));
        assert_eq!(config.pkg_offset(), Some(7));
        assert_eq!(config.msg_id_offset(), 8);
        assert_eq!(config.max_payload(), 65535);
        assert_eq!(config.max_msg_id(), u16::MAX);
    }

    #[test]
    fn test_start_bytes() {
        assert_eq!(ProfileConfig::STANDARD.start_bytes(), [0x90, 0x71]);
        assert_eq!(ProfileConfig::BULK.start_bytes(), [0x90, 0x74]);
        assert_eq!(ProfileConfig::NETWORKED.start_bytes(), [0x90, 0x78]);
        assert_eq!(ProfileConfig::COMPACT.start_bytes()[0], 0x70);
        assert_eq!(ProfileConfig::MINIMAL.start_len(), 0);
    }

    #[test]
    fn test_crc_coverage_start() {
        assert_eq!(ProfileConfig::STANDARD.crc_start(), 1);
        assert_eq!(ProfileConfig::new(HeaderType::Tiny, PayloadType::Default).crc_start(), 0);
        assert_eq!(ProfileConfig::new(HeaderType::None, PayloadType::Default).crc_start(), 0);
    }

    #[test]
    fn test_payload_type_roundtrip() {
        for payload in PayloadType::ALL {
            assert_eq!(PayloadType::from_u8(payload.as_u8()), Some(payload));
            assert_eq!(PayloadType::from_start_byte(payload.start_byte()), Some(payload));
        }
        assert_eq!(PayloadType::from_start_byte(0x6F), None);
        assert_eq!(PayloadType::from_start_byte(0x79), None);
    }

    #[test]
    fn test_from_start_byte() {
        assert_eq!(
            ProfileConfig::from_start_byte(HeaderType::Basic, 0x74),
            Some(ProfileConfig::BULK)
        );
        assert_eq!(ProfileConfig::from_start_byte(HeaderType::None, 0x71), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("standard".parse::<ProfileConfig>().unwrap(), ProfileConfig::STANDARD);
        assert_eq!(" Bulk ".parse::<ProfileConfig>().unwrap(), ProfileConfig::BULK);
        assert_eq!(
            "tiny:default".parse::<ProfileConfig>().unwrap(),
            ProfileConfig::new(HeaderType::Tiny, PayloadType::Default)
        );
        assert!(matches!(
            "basic:bogus".parse::<ProfileConfig>(),
            Err(Error::UnknownProfile(_))
        ));
        assert!("wat".parse::<Profile>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProfileConfig::NETWORKED.to_string(), "networked");
        assert_eq!(
            ProfileConfig::new(HeaderType::None, PayloadType::Seq).to_string(),
            "none:seq"
        );
        for profile in Profile::ALL {
            assert_eq!(profile.to_string().parse::<Profile>().unwrap(), profile);
        }
    }
}
