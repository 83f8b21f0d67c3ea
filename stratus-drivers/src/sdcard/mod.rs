//! SD card flight logger (SPI mode)
//!
//! Interrupt-driven driver for an SD card spoken to over a synchronous
//! serial bus, one byte per transfer-complete event. The card is used raw,
//! without a filesystem: block 0 holds three redundant copies of the next
//! write address, and everything after the first quarter-region is log
//! data in 128-byte blocks.
//!
//! For the command set and response formats see the SD Card Association's
//! physical layer specification.
//!
//! # Layout
//!
//! - [`command`] — 6-byte command framing
//! - [`recovery`] — write-cursor recovery from the redundant metadata
//! - [`logger`] — the protocol state machine

pub mod command;
pub mod logger;
pub mod recovery;

pub use command::CommandFrame;
pub use logger::{ActiveLowPin, BlockKind, Mode, Phase, RequestError, SdLogger};
pub use recovery::{cursor_from_metadata, recover_cursor, validate_cursor};

/// Byte clocked out to keep the bus running while receiving.
pub const FILL: u8 = 0xFF;

/// Token preceding a block's raw payload on the wire.
pub const DATA_TOKEN: u8 = 0xFE;

/// Low nibble of the byte acknowledging accepted write data.
pub const ACCEPT_TOKEN: u8 = 0x05;

/// Mask selecting the accept-token nibble.
pub const ACCEPT_TOKEN_MASK: u8 = 0x0F;

/// R1 response: card idle after reset, or still initializing.
pub const R1_IDLE: u8 = 0x01;

/// R1 response: command accepted / card ready.
pub const R1_READY: u8 = 0x00;

/// Fixed log block length in bytes.
pub const BLOCK_LEN: usize = 128;

/// Trailing integrity bytes per block (ignored on read, fixed on write).
pub const BLOCK_TRAILER_LEN: usize = 2;

/// Redundant write-cursor copies in the metadata block.
pub const CURSOR_COPIES: usize = 3;

/// Address of the metadata block.
pub const METADATA_BLOCK_ADDR: u32 = 0;

/// Granularity at which the write cursor is checkpointed to metadata.
pub const QUARTER_REGION: u32 = 0x0004_0000;

/// In-region offset bits of a cursor value.
pub const QUARTER_REGION_MASK: u32 = QUARTER_REGION - 1;

/// Fill bytes clocked with the card deselected after power-on.
/// The card needs at least 80 clocks (10 bytes); 100 bytes adds margin.
pub const POWER_ON_FILL_BYTES: u8 = 100;

/// Bounded response wait, in byte times, before declaring a fault.
pub const RESPONSE_WAIT_MAX: u8 = 250;

/// Expected echo of the interface-check command:
/// ack, two fill bytes, voltage-range echo, check-pattern echo.
pub const IF_COND_ECHO: [u8; 5] = [0x01, 0x00, 0x00, 0x01, 0xAA];

/// Interface-check argument: voltage range 0x1, check pattern 0xAA.
pub const IF_COND_ARG: u32 = 0x0000_01AA;
