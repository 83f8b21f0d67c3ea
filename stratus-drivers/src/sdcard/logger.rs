//! SD logger protocol state machine
//!
//! The whole driver runs inside one short handler, invoked once per
//! completed byte transfer: [`SdLogger::on_byte_transferred`] consumes the
//! received byte and returns the next byte to clock out, or `None` to park
//! the chain until the firmware resumes it. Nothing here blocks or waits in
//! a loop; "waiting" is a phase the handler re-enters on the next event.
//!
//! Bring-up runs once per power-on or fault: clock the card awake, reset,
//! interface check, initialization poll, block length, then a read of the
//! metadata block to recover the resumable write cursor. After that the
//! machine alternates between [`Phase::Ready`] and one in-flight block
//! write. Every protocol violation takes the same exit: deselect, discard
//! in-progress state, restart bring-up from the top. The card is expected
//! to come back eventually; no error is surfaced to a caller.

use embedded_hal::digital::OutputPin;
use stratus_core::traits::{ChipSelect, PayloadSource};

use super::command::{cmd, CommandFrame};
use super::{
    cursor_from_metadata, ACCEPT_TOKEN, ACCEPT_TOKEN_MASK, BLOCK_LEN, BLOCK_TRAILER_LEN,
    CURSOR_COPIES, DATA_TOKEN, FILL, IF_COND_ARG, IF_COND_ECHO, METADATA_BLOCK_ADDR,
    POWER_ON_FILL_BYTES, QUARTER_REGION_MASK, R1_IDLE, R1_READY, RESPONSE_WAIT_MAX,
};

/// Token + payload + trailing integrity bytes streamed per block write.
const WRITE_STREAM_LEN: u8 = (1 + BLOCK_LEN + BLOCK_TRAILER_LEN) as u8;

/// Bytes per block read off the wire (payload + ignored integrity bytes).
const READ_STREAM_LEN: u8 = (BLOCK_LEN + BLOCK_TRAILER_LEN) as u8;

/// How an incoming byte is interpreted, independent of the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Dispatch the byte to the current phase.
    Idle,
    /// Transmitting a command frame; incoming bytes are discarded.
    SendingCommand,
    /// Skipping fill bytes until the card answers, bounded at
    /// [`RESPONSE_WAIT_MAX`] byte times.
    AwaitingResponse,
}

/// Which block a write cycle is targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockKind {
    /// Block 0: triplicated write cursor.
    Metadata,
    /// A log data block at the write cursor.
    Data,
}

/// Protocol phase. Bring-up phases run in order; the write cycle repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Clocking fill bytes with the card deselected after power-on.
    PowerOnClock,
    /// Expecting the idle response to the reset command.
    AwaitReset,
    /// Expecting the 5-byte interface-check echo.
    AwaitInterfaceCheck,
    /// Polling the initialization command until the card reports ready.
    AwaitReady,
    /// Expecting the block-length acknowledgement.
    AwaitBlockLenAck,
    /// Expecting the metadata-read acknowledgement.
    AwaitReadAck,
    /// Expecting the start-of-data token (bounded wait).
    AwaitDataToken,
    /// Streaming in the metadata block.
    ReadMetadata,
    /// Parked; bring-up complete, no write in flight.
    Ready,
    /// Write command issued; expecting the ack, then streaming the block.
    Writing(BlockKind),
    /// Expecting the accept token, then polling out the busy period.
    AwaitWriteBusy(BlockKind),
    /// Expecting the two-byte status readback.
    AwaitStatus(BlockKind),
}

/// `request_write` was called while a transfer chain is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// The machine is mid-transfer; only one block write may be in flight.
    Busy,
}

/// Adapter from an `embedded-hal` output pin to [`ChipSelect`],
/// for the usual active-low select line.
pub struct ActiveLowPin<P>(pub P);

impl<P: OutputPin> ChipSelect for ActiveLowPin<P> {
    fn select(&mut self) {
        let _ = self.0.set_low();
    }

    fn deselect(&mut self) {
        let _ = self.0.set_high();
    }
}

/// The SD logger driver.
///
/// All mutable protocol state lives here and is only ever touched from the
/// byte-transfer event context plus the two resume entry points, which must
/// not race it (single execution context on target, or an external lock on
/// a multithreaded host).
pub struct SdLogger<CS: ChipSelect> {
    cs: CS,
    mode: Mode,
    phase: Phase,
    /// Sub-step within the current phase (byte or row index).
    step: u8,
    /// Fill bytes seen while awaiting a response.
    wait_count: u8,
    command: CommandFrame,
    /// Next block address to write. Always a multiple of [`BLOCK_LEN`].
    cursor: u32,
    /// Leading metadata bytes buffered during [`Phase::ReadMetadata`].
    meta: [u8; 4 * CURSOR_COPIES],
    /// A write was requested and has not yet been issued.
    write_pending: bool,
    /// The transfer chain is running (the last reply was a byte, not a park).
    active: bool,
}

impl<CS: ChipSelect> SdLogger<CS> {
    /// Create a driver armed at the first bring-up phase, card deselected.
    pub fn new(cs: CS) -> Self {
        let mut logger = Self {
            cs,
            mode: Mode::Idle,
            phase: Phase::PowerOnClock,
            step: 0,
            wait_count: 0,
            command: CommandFrame::default(),
            cursor: 0,
            meta: [0; 4 * CURSOR_COPIES],
            write_pending: false,
            active: false,
        };
        logger.initialize();
        logger
    }

    /// Deselect the card and arm the machine at the first bring-up phase.
    pub fn initialize(&mut self) {
        self.cs.deselect();
        self.mode = Mode::Idle;
        self.phase = Phase::PowerOnClock;
        self.step = 0;
        self.wait_count = 0;
        self.command = CommandFrame::default();
        self.cursor = 0;
        self.write_pending = false;
        self.active = false;
    }

    /// Current protocol phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Address of the next data block to write. Valid once bring-up has
    /// completed at least once.
    pub fn write_cursor(&self) -> u32 {
        self.cursor
    }

    /// True when the machine is parked in [`Phase::Ready`] and a write may
    /// be requested.
    pub fn is_ready(&self) -> bool {
        !self.active && self.phase == Phase::Ready
    }

    /// Request that the next queued payload block be written.
    ///
    /// Valid while the chain is parked: in [`Phase::Ready`] this starts a
    /// block write; in [`Phase::PowerOnClock`] (power-on or after a fault)
    /// it runs bring-up first and the write follows from `Ready` within the
    /// same chain. Returns the byte to clock out to restart the chain.
    pub fn request_write(&mut self) -> Result<u8, RequestError> {
        if self.active {
            return Err(RequestError::Busy);
        }
        self.write_pending = true;
        self.active = true;
        Ok(FILL)
    }

    /// Restart a parked chain without queuing a write, e.g. to run
    /// bring-up eagerly after power-on or a fault. Returns `None` if the
    /// chain is already running.
    pub fn resume(&mut self) -> Option<u8> {
        if self.active {
            return None;
        }
        self.active = true;
        Some(FILL)
    }

    /// Drive the machine with one completed byte transfer.
    ///
    /// `received` is the byte clocked in; the return value is the byte to
    /// clock out next, or `None` to park the chain (card stays in whatever
    /// select state the phase left it; bus idle) until resumed.
    pub fn on_byte_transferred<P: PayloadSource>(
        &mut self,
        received: u8,
        payload: &mut P,
    ) -> Option<u8> {
        let reply = match self.mode {
            Mode::SendingCommand => Some(self.next_command_byte()),
            Mode::AwaitingResponse if received == FILL => {
                self.wait_count += 1;
                if self.wait_count == RESPONSE_WAIT_MAX {
                    self.fault()
                } else {
                    Some(FILL)
                }
            }
            Mode::AwaitingResponse => {
                // The card answered: hand this byte to the current phase
                self.wait_count = 0;
                self.mode = Mode::Idle;
                self.dispatch(received, payload)
            }
            Mode::Idle => self.dispatch(received, payload),
        };
        self.active = reply.is_some();
        reply
    }

    /// Emit the next command byte; arms the response wait after the last.
    fn next_command_byte(&mut self) -> u8 {
        let byte = self.command.next_byte();
        if self.command.is_complete() {
            self.mode = Mode::AwaitingResponse;
            self.wait_count = 0;
        }
        byte
    }

    /// Queue a command frame; its bytes go out on the following events.
    fn queue_command(&mut self, opcode: u8, argument: u32) {
        self.command = CommandFrame::new(opcode, argument);
        self.mode = Mode::SendingCommand;
    }

    /// Per-phase transition function.
    fn dispatch<P: PayloadSource>(&mut self, received: u8, payload: &mut P) -> Option<u8> {
        match self.phase {
            Phase::PowerOnClock => {
                self.step += 1;
                if self.step == POWER_ON_FILL_BYTES {
                    self.step = 0;
                    self.cs.select();
                    self.queue_command(cmd::GO_IDLE_STATE, 0);
                    self.phase = Phase::AwaitReset;
                }
                Some(FILL)
            }

            Phase::AwaitReset => {
                if received == R1_IDLE {
                    self.queue_command(cmd::SEND_IF_COND, IF_COND_ARG);
                    self.phase = Phase::AwaitInterfaceCheck;
                    self.step = 0;
                    Some(FILL)
                } else {
                    self.fault()
                }
            }

            Phase::AwaitInterfaceCheck => {
                if received != IF_COND_ECHO[self.step as usize] {
                    return self.fault();
                }
                self.step += 1;
                if self.step as usize == IF_COND_ECHO.len() {
                    self.step = 0;
                    self.queue_command(cmd::SEND_OP_COND, 0);
                    self.phase = Phase::AwaitReady;
                }
                Some(FILL)
            }

            Phase::AwaitReady => match received {
                // Still initializing: poll again
                R1_IDLE => {
                    self.queue_command(cmd::SEND_OP_COND, 0);
                    Some(FILL)
                }
                R1_READY => {
                    self.queue_command(cmd::SET_BLOCKLEN, BLOCK_LEN as u32);
                    self.phase = Phase::AwaitBlockLenAck;
                    Some(FILL)
                }
                _ => self.fault(),
            },

            Phase::AwaitBlockLenAck => {
                if received == R1_READY {
                    self.queue_command(cmd::READ_SINGLE_BLOCK, METADATA_BLOCK_ADDR);
                    self.phase = Phase::AwaitReadAck;
                    Some(FILL)
                } else {
                    self.fault()
                }
            }

            Phase::AwaitReadAck => {
                if received == R1_READY {
                    // No command follows; wait out the gap to the data token
                    self.mode = Mode::AwaitingResponse;
                    self.wait_count = 0;
                    self.phase = Phase::AwaitDataToken;
                    Some(FILL)
                } else {
                    self.fault()
                }
            }

            Phase::AwaitDataToken => {
                if received == DATA_TOKEN {
                    self.phase = Phase::ReadMetadata;
                    self.step = 0;
                    Some(FILL)
                } else {
                    self.fault()
                }
            }

            Phase::ReadMetadata => {
                if (self.step as usize) < self.meta.len() {
                    self.meta[self.step as usize] = received;
                }
                self.step += 1;
                if self.step < READ_STREAM_LEN {
                    return Some(FILL);
                }
                // Whole block (plus ignored integrity bytes) consumed:
                // recover the cursor and fall through to the write decision
                self.step = 0;
                self.cursor = cursor_from_metadata(&self.meta);
                self.phase = Phase::Ready;
                if self.write_pending {
                    self.begin_block_write()
                } else {
                    None
                }
            }

            Phase::Ready => {
                if self.write_pending {
                    self.begin_block_write()
                } else {
                    None
                }
            }

            Phase::Writing(kind) => self.advance_write(kind, received, payload),

            Phase::AwaitWriteBusy(kind) => {
                if self.step == 0 {
                    if received & ACCEPT_TOKEN_MASK == ACCEPT_TOKEN {
                        self.step = 1;
                    }
                    Some(FILL)
                } else if received == FILL {
                    // Card still programming the block
                    Some(FILL)
                } else {
                    self.step = 0;
                    self.queue_command(cmd::SEND_STATUS, 0);
                    self.phase = Phase::AwaitStatus(kind);
                    Some(FILL)
                }
            }

            Phase::AwaitStatus(kind) => {
                if received != R1_READY {
                    return self.fault();
                }
                if self.step == 0 {
                    self.step = 1;
                    return Some(FILL);
                }
                self.step = 0;
                match kind {
                    // Metadata checkpoint done: the data block for this
                    // region follows immediately
                    BlockKind::Metadata => self.begin_data_write(),
                    BlockKind::Data => {
                        self.cs.deselect();
                        self.phase = Phase::Ready;
                        None
                    }
                }
            }
        }
    }

    /// Decide what the requested write must target.
    ///
    /// Mid-region the data block goes straight out. At a region boundary
    /// the metadata block is checkpointed first with the new region's
    /// cursor; the data block follows once its status check passes.
    fn begin_block_write(&mut self) -> Option<u8> {
        self.write_pending = false;
        if self.cursor & QUARTER_REGION_MASK != 0 {
            self.begin_data_write()
        } else {
            self.queue_command(cmd::WRITE_BLOCK, METADATA_BLOCK_ADDR);
            self.phase = Phase::Writing(BlockKind::Metadata);
            self.step = 0;
            Some(FILL)
        }
    }

    /// Issue the data-block write at the cursor and advance it.
    fn begin_data_write(&mut self) -> Option<u8> {
        self.queue_command(cmd::WRITE_BLOCK, self.cursor);
        self.cursor += BLOCK_LEN as u32;
        self.phase = Phase::Writing(BlockKind::Data);
        self.step = 0;
        Some(FILL)
    }

    /// Write-cycle byte pump: ack check, data token, then the block body.
    fn advance_write<P: PayloadSource>(
        &mut self,
        kind: BlockKind,
        received: u8,
        payload: &mut P,
    ) -> Option<u8> {
        if self.step == 0 {
            if received != R1_READY {
                return self.fault();
            }
            self.step = 1;
            return Some(DATA_TOKEN);
        }

        let byte = match kind {
            BlockKind::Metadata => {
                if self.step <= (4 * CURSOR_COPIES) as u8 {
                    // Three big-endian copies of the cursor, then zero padding
                    self.cursor.to_be_bytes()[((self.step - 1) & 0x03) as usize]
                } else {
                    0x00
                }
            }
            BlockKind::Data => {
                if self.step <= BLOCK_LEN as u8 {
                    // A dry source pads the rest of the block with zeros
                    payload.next_byte().unwrap_or(0x00)
                } else {
                    // Trailing integrity bytes; the card ignores their value
                    0x00
                }
            }
        };

        self.step += 1;
        if self.step == WRITE_STREAM_LEN {
            self.step = 0;
            self.mode = Mode::AwaitingResponse;
            self.wait_count = 0;
            self.phase = Phase::AwaitWriteBusy(kind);
        }
        Some(byte)
    }

    /// Single recovery path for every protocol violation: deselect,
    /// discard in-progress state, restart bring-up from the top.
    fn fault(&mut self) -> Option<u8> {
        self.cs.deselect();
        self.mode = Mode::Idle;
        self.phase = Phase::PowerOnClock;
        self.step = 0;
        self.wait_count = 0;
        self.command = CommandFrame::default();
        self.write_pending = false;
        None
    }
}
