//! SD logger task
//!
//! Owns the SPI bus and the chip-select line. The driver itself is a pure
//! state machine; this task is its transport: each iteration transfers one
//! byte and feeds the completion back in, yielding between bytes so the
//! radio and camera tickers keep their cadence. Between transfer chains it
//! drains the log channel into the payload queue and requests a block write
//! once a full block is buffered.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};

use stratus_core::queue::ByteQueue;
use stratus_drivers::sdcard::{ActiveLowPin, SdLogger, BLOCK_LEN, FILL};

use crate::channels::LOG_BYTES;

/// Payload buffer: two blocks, so producers can run ahead of one write.
const QUEUE_CAPACITY: usize = 2 * BLOCK_LEN;

/// SD logger task - drives the storage state machine one byte at a time
#[embassy_executor::task]
pub async fn logger_task(mut spi: Spi<'static, SPI0, Blocking>, cs: Output<'static>) {
    info!("Logger task started");

    let mut logger = SdLogger::new(ActiveLowPin(cs));
    let mut queue: ByteQueue<QUEUE_CAPACITY> = ByteQueue::new();

    loop {
        // Decide whether to restart the transfer chain: a buffered block
        // triggers a write; an uninitialized card gets bring-up eagerly so
        // the cursor is recovered before the first block arrives.
        let mut next = if queue.len() >= BLOCK_LEN {
            match logger.request_write() {
                Ok(byte) => {
                    debug!("block write requested at 0x{:08x}", logger.write_cursor());
                    Some(byte)
                }
                Err(_) => None,
            }
        } else if !logger.is_ready() {
            logger.resume()
        } else {
            None
        };

        // Run the chain until the driver parks it
        while let Some(tx) = next {
            let received = transfer_byte(&mut spi, tx);
            next = logger.on_byte_transferred(received, &mut queue);
            yield_now().await;
        }

        if logger.is_ready() && queue.len() >= BLOCK_LEN {
            // Another block is already buffered; go straight back around
            continue;
        }

        // Parked: block on the next telemetry byte, then drain what's there
        let byte = LOG_BYTES.receive().await;
        if queue.push(byte).is_err() {
            warn!("log queue full, dropping telemetry");
        }
        while let Ok(byte) = LOG_BYTES.try_receive() {
            if queue.push(byte).is_err() {
                warn!("log queue full, dropping telemetry");
                break;
            }
        }
    }
}

/// Exchange one byte on the bus.
///
/// A transport error is handed to the driver as a fill byte; its bounded
/// response waits turn a persistently dead bus into a fault and re-init.
fn transfer_byte(spi: &mut Spi<'static, SPI0, Blocking>, tx: u8) -> u8 {
    let mut buf = [tx];
    if spi.blocking_transfer_in_place(&mut buf).is_err() {
        return FILL;
    }
    buf[0]
}
