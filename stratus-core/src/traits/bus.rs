//! Bus device selection

/// Chip-select control for a device on a shared synchronous serial bus.
///
/// The storage driver asserts this around command/response exchanges and
/// releases it on fault or after a completed block write. Electrical
/// polarity is the implementor's concern; `select` must make the device
/// listen and `deselect` must make it release the bus.
pub trait ChipSelect {
    /// Assert chip select (device active).
    fn select(&mut self);

    /// Release chip select (device inactive, bus free).
    fn deselect(&mut self);
}
