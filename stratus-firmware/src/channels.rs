//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Both carry raw telemetry bytes; the consuming tasks buffer them into
//! their own queues at their own pace.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Channel capacity for bytes bound for the SD log (two 128-byte blocks)
const LOG_CHANNEL_SIZE: usize = 256;

/// Channel capacity for bytes bound for the radio downlink
const RADIO_CHANNEL_SIZE: usize = 128;

/// Telemetry bytes to be appended to the SD flight log
pub static LOG_BYTES: Channel<CriticalSectionRawMutex, u8, LOG_CHANNEL_SIZE> = Channel::new();

/// Telemetry bytes to be keyed out over RTTY
pub static RADIO_BYTES: Channel<CriticalSectionRawMutex, u8, RADIO_CHANNEL_SIZE> = Channel::new();
