//! Device drivers for the Stratus balloon payload
//!
//! Drivers here are pure state machines over byte streams: the firmware
//! owns the peripherals and feeds each driver one completed transfer at a
//! time, which keeps every protocol host-testable.

#![no_std]
#![deny(unsafe_code)]

pub mod sdcard;
