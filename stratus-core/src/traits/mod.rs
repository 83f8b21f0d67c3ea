//! Hardware and data-flow seam traits
//!
//! These traits decouple the state machines in this workspace from the
//! peripherals and buffers the firmware wires them to.

pub mod bus;
pub mod payload;

pub use bus::ChipSelect;
pub use payload::PayloadSource;
