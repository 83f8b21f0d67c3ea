//! Payload byte source

/// Producer of bytes for a block write or a radio transmission.
///
/// `None` means "no more data available right now". It is not a permanent
/// end-of-stream marker: a queue that drains mid-block may be refilled by a
/// producer before the next block starts. Consumers decide how to handle a
/// dry source (the SD logger pads the rest of the block with zeros; the
/// RTTY modulator ends the transmission and pauses).
pub trait PayloadSource {
    /// Take the next byte, if one is available.
    fn next_byte(&mut self) -> Option<u8>;
}
