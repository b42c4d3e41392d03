//! Frame encoder over a caller-provided buffer
//!
//! Two modes share one buffer:
//!
//! - [`EncodeBuffer::encode`] copies a ready payload in and seals the frame.
//! - [`EncodeBuffer::reserve`] / [`EncodeBuffer::finish`] hand out the
//!   payload region so a message can serialize itself in place.
//!
//! Frames are appended back to back; nothing is allocated.

use tracing::{debug, trace};

use super::checksum::Checksum;
use super::header::{FrameHeader, check_encodable};
use super::message::Message;
use super::{Error, ProfileConfig, Result};

#[derive(Debug, Clone, Copy)]
struct Reservation {
    config: ProfileConfig,
    start: usize,
    payload_len: usize,
}

/// Bounded frame writer
#[derive(Debug)]
pub struct EncodeBuffer<'a> {
    buf: &'a mut [u8],
    size: usize,
    reservation: Option<Reservation>,
    sequence: u8,
}

impl<'a> EncodeBuffer<'a> {
    /// Wrap `buf`; its length is the capacity
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            size: 0,
            reservation: None,
            sequence: 0,
        }
    }

    /// Total capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes of committed frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether no frame has been committed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Free space after the committed frames
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.size
    }

    /// Committed frames, ready to hand to a transport
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    /// Whether a reservation is open
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.reservation.is_some()
    }

    /// Sequence number the next `encode` will use on sequenced profiles
    #[must_use]
    pub fn next_sequence(&self) -> u8 {
        self.sequence
    }

    /// Rewind to empty. Memory is left as is; an open reservation is dropped.
    pub fn reset(&mut self) {
        self.size = 0;
        self.reservation = None;
    }

    /// Encode one frame, copying `payload`.
    ///
    /// Sequenced profiles take the buffer's running sequence number, which
    /// advances on success.
    ///
    /// # Errors
    ///
    /// Fails without touching committed bytes when the frame does not fit,
    /// the payload or ID exceed the profile's fields, or a reservation is open.
    pub fn encode(&mut self, config: &ProfileConfig, msg_id: u16, payload: &[u8]) -> Result<usize> {
        let header = FrameHeader::default().with_sequence(self.sequence);
        let region = self.open(config, header, msg_id, payload.len(), true)?;
        region.copy_from_slice(payload);
        self.finish()
    }

    /// Encode one frame with explicit routing fields
    pub fn encode_with(
        &mut self,
        config: &ProfileConfig,
        header: FrameHeader,
        msg_id: u16,
        payload: &[u8],
    ) -> Result<usize> {
        let region = self.open(config, header, msg_id, payload.len(), false)?;
        region.copy_from_slice(payload);
        self.finish()
    }

    /// Encode a schema-generated message in place, without a staging copy
    pub fn encode_message<M: Message>(&mut self, config: &ProfileConfig, message: &M) -> Result<usize> {
        let header = FrameHeader::default().with_sequence(self.sequence);
        let region = self.open(config, header, M::MSG_ID, message.wire_size(), true)?;
        message.write_bytes(region);
        self.finish()
    }

    /// Open a frame and return its payload region.
    ///
    /// The header is written immediately; the caller fills exactly
    /// `payload_len` bytes and then calls [`finish`](Self::finish). Only one
    /// reservation may be open at a time.
    ///
    /// # Errors
    ///
    /// [`Error::ReservationInProgress`] if one is already open, or the same
    /// capacity and range errors as [`encode`](Self::encode).
    pub fn reserve(&mut self, config: &ProfileConfig, msg_id: u16, payload_len: usize) -> Result<&mut [u8]> {
        let header = FrameHeader::default().with_sequence(self.sequence);
        self.open(config, header, msg_id, payload_len, true)
    }

    /// [`reserve`](Self::reserve) with explicit routing fields
    pub fn reserve_with(
        &mut self,
        config: &ProfileConfig,
        header: FrameHeader,
        msg_id: u16,
        payload_len: usize,
    ) -> Result<&mut [u8]> {
        self.open(config, header, msg_id, payload_len, false)
    }

    fn open(
        &mut self,
        config: &ProfileConfig,
        header: FrameHeader,
        msg_id: u16,
        payload_len: usize,
        advance_sequence: bool,
    ) -> Result<&mut [u8]> {
        if self.reservation.is_some() {
            debug!(msg_id, "reserve while another reservation is open");
            return Err(Error::ReservationInProgress);
        }
        check_encodable(config, msg_id, payload_len)?;

        let frame_len = config.frame_len(payload_len);
        if frame_len > self.remaining() {
            return Err(Error::BufferTooSmall {
                needed: frame_len,
                got: self.remaining(),
            });
        }

        if advance_sequence && config.has_sequence() {
            self.sequence = self.sequence.wrapping_add(1);
        }

        let start = self.size;
        let header_end = start + config.header_size();
        header.write(config, msg_id, payload_len, &mut self.buf[start..header_end]);

        self.reservation = Some(Reservation {
            config: *config,
            start,
            payload_len,
        });
        trace!(msg_id, payload_len, frame_len, "reserved frame");

        Ok(&mut self.buf[header_end..header_end + payload_len])
    }

    /// Seal the open reservation: append the checksum and commit the frame.
    ///
    /// Returns the frame length.
    ///
    /// # Errors
    ///
    /// [`Error::NoReservation`] if nothing is open.
    pub fn finish(&mut self) -> Result<usize> {
        let Some(reservation) = self.reservation.take() else {
            debug!("finish without an open reservation");
            return Err(Error::NoReservation);
        };

        let config = reservation.config;
        let start = reservation.start;
        let payload_end = start + config.header_size() + reservation.payload_len;

        if config.has_crc() {
            let sum = Checksum::compute(&self.buf[start + config.crc_start()..payload_end]);
            self.buf[payload_end..payload_end + config.crc_width()].copy_from_slice(&sum.to_bytes());
        }

        let frame_len = config.frame_len(reservation.payload_len);
        self.size += frame_len;
        Ok(frame_len)
    }

    /// Drop the open reservation without committing it
    ///
    /// # Errors
    ///
    /// [`Error::NoReservation`] if nothing is open.
    pub fn abort(&mut self) -> Result<()> {
        self.reservation
            .take()
            .map(|_| ())
            .ok_or(Error::NoReservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::validate;

    #[test]
    fn test_encode_standard() {
        let mut storage = [0u8; 32];
        let mut buffer = EncodeBuffer::new(&mut storage);
        let written = buffer.encode(&ProfileConfig::STANDARD, 7, &[1, 2, 3, 4]).unwrap();
        assert_eq!(written, 10);
        assert_eq!(buffer.len(), 10);
        assert_eq!(&buffer.as_bytes()[..4], &[0x90, 0x71, 0x04, 0x07]);
    }

    #[test]
    fn test_encode_too_small_leaves_buffer() {
        let mut storage = [0u8; 12];
        let mut buffer = EncodeBuffer::new(&mut storage);
        buffer.encode(&ProfileConfig::STANDARD, 1, &[0; 2]).unwrap();
        let err = buffer.encode(&ProfileConfig::STANDARD, 2, &[0; 2]).unwrap_err();
        assert_eq!(err, Error::BufferTooSmall { needed: 8, got: 4 });
        assert_eq!(buffer.len(), 8);
        assert!(!buffer.in_progress());
    }

    #[test]
    fn test_encode_payload_limit() {
        let mut storage = vec![0u8; 1024];
        let mut buffer = EncodeBuffer::new(&mut storage);
        assert_eq!(
            buffer.encode(&ProfileConfig::STANDARD, 1, &[0; 256]),
            Err(Error::PayloadTooLarge { size: 256, max: 255 })
        );
        assert!(buffer.is_empty());
        assert!(buffer.encode(&ProfileConfig::BULK, 1, &[0; 256]).is_ok());
    }

    #[test]
    fn test_reserve_finish_matches_encode() {
        let mut copied = [0u8; 32];
        let mut direct = [0u8; 32];

        let mut a = EncodeBuffer::new(&mut copied);
        a.encode(&ProfileConfig::NETWORKED, 0x0110, b"abcd").unwrap();

        let mut b = EncodeBuffer::new(&mut direct);
        let region = b.reserve(&ProfileConfig::NETWORKED, 0x0110, 4).unwrap();
        assert_eq!(region.len(), 4);
        region.copy_from_slice(b"abcd");
        assert!(b.in_progress());
        assert_eq!(b.finish().unwrap(), 15);
        assert!(!b.in_progress());

        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_reservation_misuse() {
        let mut storage = [0u8; 64];
        let mut buffer = EncodeBuffer::new(&mut storage);

        assert_eq!(buffer.finish(), Err(Error::NoReservation));
        assert_eq!(buffer.abort(), Err(Error::NoReservation));

        buffer.reserve(&ProfileConfig::STANDARD, 1, 2).unwrap();
        assert_eq!(
            buffer.reserve(&ProfileConfig::STANDARD, 2, 2).unwrap_err(),
            Error::ReservationInProgress
        );
        assert_eq!(
            buffer.encode(&ProfileConfig::STANDARD, 3, &[]).unwrap_err(),
            Error::ReservationInProgress
        );
        assert_eq!(buffer.len(), 0);

        buffer.abort().unwrap();
        assert!(buffer.reserve(&ProfileConfig::STANDARD, 2, 2).is_ok());
    }

    #[test]
    fn test_sequence_advances() {
        let mut storage = [0u8; 64];
        let mut buffer = EncodeBuffer::new(&mut storage);
        let first = buffer.encode(&ProfileConfig::NETWORKED, 1, &[]).unwrap();
        buffer.encode(&ProfileConfig::NETWORKED, 1, &[]).unwrap();
        assert_eq!(buffer.next_sequence(), 2);

        let bytes = buffer.as_bytes();
        assert_eq!(validate(&ProfileConfig::NETWORKED, bytes).unwrap().header.sequence, 0);
        assert_eq!(
            validate(&ProfileConfig::NETWORKED, &bytes[first..]).unwrap().header.sequence,
            1
        );

        // Unsequenced profiles leave the counter alone
        buffer.encode(&ProfileConfig::STANDARD, 1, &[]).unwrap();
        assert_eq!(buffer.next_sequence(), 2);
    }

    #[test]
    fn test_explicit_routing() {
        let mut storage = [0u8; 64];
        let mut buffer = EncodeBuffer::new(&mut storage);
        let header = FrameHeader::new(200, 1, 2);
        buffer.encode_with(&ProfileConfig::NETWORKED, header, 0x0203, b"x").unwrap();
        let info = validate(&ProfileConfig::NETWORKED, buffer.as_bytes()).unwrap();
        assert_eq!(info.header, header);
        assert_eq!(info.msg_id, 0x0203);
    }

    #[test]
    fn test_msg_id_range() {
        let mut storage = [0u8; 64];
        let mut buffer = EncodeBuffer::new(&mut storage);
        assert_eq!(
            buffer.encode(&ProfileConfig::COMPACT, 0x100, &[]),
            Err(Error::MessageIdOutOfRange { id: 0x100, max: 0xFF })
        );
    }

    #[test]
    fn test_reset_rewinds() {
        let mut storage = [0u8; 16];
        let mut buffer = EncodeBuffer::new(&mut storage);
        buffer.encode(&ProfileConfig::COMPACT, 5, b"hi").unwrap();
        assert_eq!(buffer.as_bytes(), &[0x70, 5, b'h', b'i']);
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 16);
    }
}
