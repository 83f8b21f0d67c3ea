//! SD command framing
//!
//! Every command is a fixed 6-byte frame: one opcode byte (`0x40 | opcode`),
//! a 32-bit big-endian argument, and a trailer byte. In SPI mode the card
//! checks the trailer CRC on exactly two commands, both sent before CRC
//! checking can be disabled, so those two carry precomputed values and the
//! rest carry zero.

/// SD command opcodes used by the logger.
pub mod cmd {
    /// GO_IDLE_STATE - software reset.
    pub const GO_IDLE_STATE: u8 = 0;
    /// SEND_OP_COND - begin initialization; poll until ready.
    pub const SEND_OP_COND: u8 = 1;
    /// SEND_IF_COND - interface/voltage check with echoed test pattern.
    pub const SEND_IF_COND: u8 = 8;
    /// SEND_STATUS - two-byte status readback.
    pub const SEND_STATUS: u8 = 13;
    /// SET_BLOCKLEN - set the block length for reads and writes.
    pub const SET_BLOCKLEN: u8 = 16;
    /// READ_SINGLE_BLOCK - read one block at the argument address.
    pub const READ_SINGLE_BLOCK: u8 = 17;
    /// WRITE_BLOCK - write one block at the argument address.
    pub const WRITE_BLOCK: u8 = 24;
}

/// Frame length in bytes: opcode + 4 argument bytes + trailer.
pub const FRAME_LEN: usize = 6;

/// Precomputed CRC trailer for GO_IDLE_STATE.
const GO_IDLE_TRAILER: u8 = 0x95;

/// Precomputed CRC trailer for SEND_IF_COND with argument 0x1AA.
const SEND_IF_COND_TRAILER: u8 = 0x87;

/// A command frame mid-transmission.
///
/// Consumed one byte per transport event; each byte is zeroed as it is
/// taken so a stale frame can never be retransmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; FRAME_LEN],
    index: u8,
}

impl Default for CommandFrame {
    /// An already-consumed frame with nothing to send.
    fn default() -> Self {
        Self {
            bytes: [0; FRAME_LEN],
            index: FRAME_LEN as u8,
        }
    }
}

impl CommandFrame {
    /// Build a frame for `opcode` with a big-endian `argument`.
    pub fn new(opcode: u8, argument: u32) -> Self {
        let arg = argument.to_be_bytes();
        Self {
            bytes: [
                0x40 | opcode,
                arg[0],
                arg[1],
                arg[2],
                arg[3],
                Self::trailer(opcode),
            ],
            index: 0,
        }
    }

    /// Trailer byte for `opcode`. Protocol-fixed, not computed.
    fn trailer(opcode: u8) -> u8 {
        match opcode {
            cmd::GO_IDLE_STATE => GO_IDLE_TRAILER,
            cmd::SEND_IF_COND => SEND_IF_COND_TRAILER,
            _ => 0x00,
        }
    }

    /// Take the next byte to transmit, clearing it from the buffer.
    ///
    /// Returns zero once the frame is complete.
    pub fn next_byte(&mut self) -> u8 {
        if self.is_complete() {
            return 0;
        }
        let i = self.index as usize;
        let byte = self.bytes[i];
        self.bytes[i] = 0;
        self.index += 1;
        byte
    }

    /// True once all six bytes have been taken.
    pub fn is_complete(&self) -> bool {
        self.index as usize == FRAME_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(frame: &mut CommandFrame) -> [u8; FRAME_LEN] {
        let mut out = [0; FRAME_LEN];
        for b in out.iter_mut() {
            *b = frame.next_byte();
        }
        out
    }

    #[test]
    fn test_reset_frame() {
        let mut frame = CommandFrame::new(cmd::GO_IDLE_STATE, 0);
        assert_eq!(drain(&mut frame), [0x40, 0x00, 0x00, 0x00, 0x00, 0x95]);
        assert!(frame.is_complete());
    }

    #[test]
    fn test_interface_check_frame() {
        let mut frame = CommandFrame::new(cmd::SEND_IF_COND, 0x0000_01AA);
        assert_eq!(drain(&mut frame), [0x48, 0x00, 0x00, 0x01, 0xAA, 0x87]);
    }

    #[test]
    fn test_zero_trailer_for_other_opcodes() {
        for opcode in [
            cmd::SEND_OP_COND,
            cmd::SEND_STATUS,
            cmd::SET_BLOCKLEN,
            cmd::READ_SINGLE_BLOCK,
            cmd::WRITE_BLOCK,
        ] {
            let mut frame = CommandFrame::new(opcode, 0);
            assert_eq!(drain(&mut frame)[5], 0x00, "opcode {}", opcode);
        }
    }

    #[test]
    fn test_big_endian_argument() {
        let mut frame = CommandFrame::new(cmd::WRITE_BLOCK, 0x0008_0080);
        assert_eq!(drain(&mut frame), [0x58, 0x00, 0x08, 0x00, 0x80, 0x00]);
    }

    #[test]
    fn test_bytes_cleared_as_sent() {
        let mut frame = CommandFrame::new(cmd::GO_IDLE_STATE, 0xDEAD_BEEF);
        let _ = drain(&mut frame);
        // A drained frame yields only zeros
        assert_eq!(frame.next_byte(), 0);
        assert!(frame.is_complete());
    }

    #[test]
    fn test_default_is_complete() {
        assert!(CommandFrame::default().is_complete());
    }
}
