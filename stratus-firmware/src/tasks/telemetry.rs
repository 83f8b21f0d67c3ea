//! Telemetry producer task
//!
//! Stand-in for the positional telemetry source: emits a numbered beacon
//! sentence on a fixed period and fans it out to both the flight log and
//! the radio downlink.

use core::fmt::Write;

use defmt::*;
use embassy_time::{Duration, Ticker};
use heapless::String;

use crate::channels::{LOG_BYTES, RADIO_BYTES};

/// Seconds between beacon sentences.
const BEACON_PERIOD_S: u64 = 10;

/// Telemetry task - periodic beacon producer
#[embassy_executor::task]
pub async fn telemetry_task() {
    info!("Telemetry task started");

    let mut ticker = Ticker::every(Duration::from_secs(BEACON_PERIOD_S));
    let mut sequence: u32 = 0;

    loop {
        ticker.next().await;
        sequence = sequence.wrapping_add(1);

        let mut sentence: String<64> = String::new();
        if write!(&mut sentence, "$$STRATUS,{}\n", sequence).is_err() {
            continue;
        }

        for &byte in sentence.as_bytes() {
            LOG_BYTES.send(byte).await;
            RADIO_BYTES.send(byte).await;
        }
        trace!("beacon {} queued", sequence);
    }
}
