//! Decoding a noisy serial stream
//!
//! Simulates a UART link: a few networked frames, some line noise and one
//! corrupted frame, delivered first one byte at a time to a `FrameParser`
//! and then in uneven chunks to an `AccumulatingReader`.
//!
//! Run with `cargo run --example uart_stream`.

use msgframe::{AccumulatingReader, EncodeBuffer, FrameHeader, FrameParser, ProfileConfig};
use tracing::{Level, info, warn};

const SYSTEM_ID: u8 = 1;
const COMPONENT_ID: u8 = 200;

fn build_stream() -> Result<Vec<u8>, msgframe::Error> {
    let config = ProfileConfig::NETWORKED;
    let mut storage = [0u8; 256];
    let mut buffer = EncodeBuffer::new(&mut storage);

    let header = FrameHeader::new(0, SYSTEM_ID, COMPONENT_ID);
    buffer.encode_with(&config, header.with_sequence(0), 0x0101, b"boot")?;
    buffer.encode_with(&config, header.with_sequence(1), 0x0102, &[0x10, 0x27, 0x00, 0x00])?;

    let mut stream = buffer.as_bytes().to_vec();

    // Line noise between frames
    stream.extend_from_slice(&[0x00, 0xFF, 0x90, 0x13]);

    // A frame whose checksum gets hit by a bit flip
    buffer.reset();
    buffer.encode_with(&config, header.with_sequence(2), 0x0103, b"lost")?;
    let mut corrupted = buffer.as_bytes().to_vec();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0x04;
    stream.extend_from_slice(&corrupted);

    buffer.reset();
    buffer.encode_with(&config, header.with_sequence(3), 0x0101, b"alive")?;
    stream.extend_from_slice(buffer.as_bytes());
    Ok(stream)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .try_init();

    let stream = build_stream()?;
    info!(bytes = stream.len(), "simulated link capture");

    // Interrupt-style: one byte at a time
    let mut parser = FrameParser::<128>::new(ProfileConfig::NETWORKED);
    for &byte in &stream {
        match parser.push(byte) {
            Some(Ok(frame)) => info!(
                msg_id = format_args!("{:#06x}", frame.msg_id),
                seq = frame.header.sequence,
                len = frame.msg_len,
                "parser frame"
            ),
            Some(Err(err)) => warn!(error = %err, "parser rejected frame"),
            None => {}
        }
    }
    info!(stats = ?parser.stats(), "parser done");

    // DMA-style: uneven chunks
    let mut reader = AccumulatingReader::<512>::new(ProfileConfig::NETWORKED);
    let mut rest = stream.as_slice();
    let mut chunk = 3;
    while !rest.is_empty() {
        let (head, tail) = rest.split_at(chunk.min(rest.len()));
        reader.add_data(head)?;
        while let Some(frame) = reader.next() {
            info!(
                msg_id = format_args!("{:#06x}", frame.msg_id),
                seq = frame.header.sequence,
                payload = ?frame.payload,
                "reader frame"
            );
        }
        rest = tail;
        chunk = chunk % 7 + 2;
    }
    info!(
        stats = ?reader.stats(),
        partial = reader.partial_size(),
        "reader done"
    );

    Ok(())
}
