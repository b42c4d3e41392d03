//! Message and length-resolution contracts
//!
//! Generated message code plugs into the codec through two small traits:
//! [`Message`] for typed encode/decode, and [`LengthResolver`] for profiles
//! whose frames carry no length field.

/// A schema-generated message type.
///
/// The codec sees only the ID and a fixed-size byte image. It never looks at
/// individual fields.
pub trait Message: Sized {
    /// Stable numeric identifier, the same under every profile
    const MSG_ID: u16;

    /// Wire size of the serialized message
    const MAX_SIZE: usize;

    /// Serialized size of this value (defaults to `MAX_SIZE`)
    fn wire_size(&self) -> usize {
        Self::MAX_SIZE
    }

    /// Serialize into `out`, which is exactly `wire_size()` bytes long
    fn write_bytes(&self, out: &mut [u8]);

    /// Bounds-checked deserialization. Returns `None` when `bytes` is not a
    /// valid image of this message.
    fn read_bytes(bytes: &[u8]) -> Option<Self>;
}

/// Maps a message ID to its payload length.
///
/// Required by profiles without a length field; optional elsewhere, where a
/// known length is cross-checked against the frame's length field.
///
/// Closures work directly:
///
/// ```rust
/// use msgframe::LengthResolver;
///
/// let lengths = |id: u16| (id == 7).then_some(4usize);
/// assert_eq!(lengths.resolve_length(7), Some(4));
/// ```
pub trait LengthResolver {
    /// Payload length for `msg_id`, or `None` when the ID is unknown
    fn resolve_length(&self, msg_id: u16) -> Option<usize>;
}

impl<F> LengthResolver for F
where
    F: Fn(u16) -> Option<usize>,
{
    fn resolve_length(&self, msg_id: u16) -> Option<usize> {
        self(msg_id)
    }
}

/// Resolver that knows no messages.
///
/// With this resolver length-less profiles reject every frame, and
/// length-carrying profiles trust their length field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLengths;

impl LengthResolver for NoLengths {
    fn resolve_length(&self, _msg_id: u16) -> Option<usize> {
        None
    }
}

/// Static `(msg_id, payload_len)` table, as emitted by generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRegistry<'a> {
    entries: &'a [(u16, usize)],
}

impl<'a> MessageRegistry<'a> {
    /// Wrap a table of `(msg_id, payload_len)` pairs
    #[must_use]
    pub const fn new(entries: &'a [(u16, usize)]) -> Self {
        Self { entries }
    }

    /// Number of registered messages
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest registered payload
    #[must_use]
    pub fn max_payload(&self) -> usize {
        self.entries.iter().map(|&(_, len)| len).max().unwrap_or(0)
    }
}

impl LengthResolver for MessageRegistry<'_> {
    fn resolve_length(&self, msg_id: u16) -> Option<usize> {
        self.entries
            .iter()
            .find(|&&(id, _)| id == msg_id)
            .map(|&(_, len)| len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: MessageRegistry<'static> = MessageRegistry::new(&[(1, 8), (7, 4), (0x0102, 300)]);

    #[test]
    fn test_registry_lookup() {
        assert_eq!(TABLE.resolve_length(7), Some(4));
        assert_eq!(TABLE.resolve_length(0x0102), Some(300));
        assert_eq!(TABLE.resolve_length(2), None);
        assert_eq!(TABLE.len(), 3);
        assert_eq!(TABLE.max_payload(), 300);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |id: u16| if id < 10 { Some(usize::from(id) * 2) } else { None };
        assert_eq!(resolver.resolve_length(3), Some(6));
        assert_eq!(resolver.resolve_length(10), None);
    }

    #[test]
    fn test_dyn_resolver() {
        let table: &dyn LengthResolver = &TABLE;
        assert_eq!(table.resolve_length(1), Some(8));
        assert_eq!(NoLengths.resolve_length(1), None);
    }
}
