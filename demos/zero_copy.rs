//! Building frames in place
//!
//! Shows the three ways to fill an `EncodeBuffer`: copying a payload,
//! serializing a typed `Message`, and reserving the payload region to write
//! into it directly.
//!
//! Run with `cargo run --example zero_copy`.

use msgframe::{EncodeBuffer, Message, ProfileConfig, validate};

/// One IMU reading, sixteen bytes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImuSample {
    accel: [i16; 3],
    gyro: [i16; 3],
    temp: i16,
    flags: u16,
}

impl Message for ImuSample {
    const MSG_ID: u16 = 0x0210;
    const MAX_SIZE: usize = 16;

    fn write_bytes(&self, out: &mut [u8]) {
        let words = self
            .accel
            .iter()
            .chain(&self.gyro)
            .chain([&self.temp])
            .map(|v| v.to_le_bytes())
            .chain([self.flags.to_le_bytes()]);
        for (slot, word) in out.chunks_exact_mut(2).zip(words) {
            slot.copy_from_slice(&word);
        }
    }

    fn read_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::MAX_SIZE {
            return None;
        }
        let word = |i: usize| i16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        Some(Self {
            accel: [word(0), word(1), word(2)],
            gyro: [word(3), word(4), word(5)],
            temp: word(6),
            flags: u16::from_le_bytes([bytes[14], bytes[15]]),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProfileConfig::BULK;
    let mut storage = [0u8; 256];
    let mut buffer = EncodeBuffer::new(&mut storage);

    // 1. Copy an existing payload
    buffer.encode(&config, 0x0201, b"hello")?;

    // 2. Serialize a typed message straight into the buffer
    let sample = ImuSample {
        accel: [12, -3, 981],
        gyro: [0, 1, -1],
        temp: 2150,
        flags: 0x0001,
    };
    buffer.encode_message(&config, &sample)?;

    // 3. Reserve the payload region and fill it in place
    let region = buffer.reserve(&config, 0x0220, 32)?;
    for (i, byte) in region.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(3);
    }
    let written = buffer.finish()?;
    println!("reserved frame: {written} bytes");

    // A reservation can also be abandoned
    buffer.reserve(&config, 0x0221, 8)?;
    buffer.abort()?;

    println!(
        "encoded {} bytes into a {}-byte buffer",
        buffer.len(),
        buffer.capacity()
    );

    let mut rest = buffer.as_bytes();
    while !rest.is_empty() {
        let frame = validate(&config, rest)?;
        match frame.decode::<ImuSample>() {
            Some(imu) => println!("  {:#06x}: {imu:?}", frame.msg_id),
            None => println!("  {:#06x}: {} bytes", frame.msg_id, frame.msg_len),
        }
        rest = &rest[frame.frame_len..];
    }

    Ok(())
}
