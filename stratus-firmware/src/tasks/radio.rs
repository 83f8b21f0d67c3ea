//! RTTY downlink task
//!
//! Keys the radio's tone-select line from the modulator at a fixed bit
//! clock: 20 ms per bit, i.e. 50 baud.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use stratus_core::queue::ByteQueue;
use stratus_core::rtty::{RttyConfig, RttyModulator, Tone};

use crate::channels::RADIO_BYTES;

/// Bit period for the 50-baud downlink.
const BIT_PERIOD_MS: u64 = 20;

/// Radio task - bit-bangs the RTTY downlink
#[embassy_executor::task]
pub async fn radio_task(mut tone_pin: Output<'static>, config: RttyConfig) {
    info!("Radio task started");

    let mut modulator = RttyModulator::new(config);
    let mut queue: ByteQueue<128> = ByteQueue::new();
    let mut ticker = Ticker::every(Duration::from_millis(BIT_PERIOD_MS));

    // Idle at mark until there is something to send
    tone_pin.set_high();

    loop {
        ticker.next().await;

        // Top the bit source up between bits; dropped bytes garble a
        // sentence, so back-pressure stops the drain instead
        while let Ok(byte) = RADIO_BYTES.try_receive() {
            if queue.push(byte).is_err() {
                break;
            }
        }

        if modulator.is_idle() && !queue.is_empty() {
            modulator.start(&mut queue);
        }

        match modulator.tick(&mut queue) {
            Tone::Mark => tone_pin.set_high(),
            Tone::Space => tone_pin.set_low(),
        }
    }
}
