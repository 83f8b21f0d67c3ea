//! Stratus - High-Altitude Balloon Payload Firmware
//!
//! Main firmware binary for RP2040-based payload boards. Coordinates three
//! outputs from one telemetry stream: an SD-card flight log written in raw
//! blocks, an RTTY downlink keyed bit-by-bit, and a camera shutter fired on
//! a fixed cadence.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use {defmt_rtt as _, panic_probe as _};

use stratus_core::camera::CameraConfig;
use stratus_core::rtty::RttyConfig;

mod channels;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stratus firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // SPI0 to the SD card, chip select driven manually by the logger task.
    // The card must see at most 400 kHz until initialization completes; the
    // driver re-runs initialization after any fault, so the bus stays at
    // the initialization rate throughout.
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = 400_000;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let sd_cs = Output::new(p.PIN_17, Level::High);

    info!("SPI initialized for SD card");

    // Camera remote: focus (half-press) and full shutter lines
    let focus_pin = Output::new(p.PIN_2, Level::Low);
    let shutter_pin = Output::new(p.PIN_3, Level::Low);

    // Radio tone select: high = mark, low = space
    let tone_pin = Output::new(p.PIN_4, Level::Low);

    // Spawn tasks
    spawner.spawn(tasks::logger_task(spi, sd_cs)).unwrap();
    spawner
        .spawn(tasks::camera_task(
            focus_pin,
            shutter_pin,
            CameraConfig::default(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::radio_task(tone_pin, RttyConfig::default()))
        .unwrap();
    spawner.spawn(tasks::telemetry_task()).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
