//! Camera shutter task
//!
//! Applies the 1 Hz shutter sequencer to the focus and shutter lines of a
//! two-wire camera remote.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use stratus_core::camera::{CameraConfig, CameraSequencer};

/// Camera task - fires the shutter on a fixed cadence
#[embassy_executor::task]
pub async fn camera_task(
    mut focus_pin: Output<'static>,
    mut shutter_pin: Output<'static>,
    config: CameraConfig,
) {
    info!("Camera task started (period {}s)", config.period_s);

    let mut sequencer = CameraSequencer::new(config);
    let mut ticker = Ticker::every(Duration::from_secs(1));

    loop {
        ticker.next().await;
        let out = sequencer.tick();

        if out.focus {
            focus_pin.set_high();
        } else {
            focus_pin.set_low();
        }
        if out.shutter {
            shutter_pin.set_high();
            debug!("shutter asserted");
        } else {
            shutter_pin.set_low();
        }
    }
}
