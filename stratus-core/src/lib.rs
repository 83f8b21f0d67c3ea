//! Board-agnostic core logic for the balloon payload firmware
//!
//! This crate contains all payload logic that does not depend on specific
//! hardware implementations:
//!
//! - Seam traits (payload byte source, chip select)
//! - Camera shutter sequencer
//! - RTTY telemetry modulator
//! - Bounded byte queue feeding the logger and the radio

#![no_std]
#![deny(unsafe_code)]

pub mod camera;
pub mod queue;
pub mod rtty;
pub mod traits;
