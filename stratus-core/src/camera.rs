//! Camera shutter sequencer
//!
//! Drives a two-wire camera remote (focus + full shutter) from a 1 Hz tick.
//! Each period the sequencer pre-asserts focus to let the camera settle,
//! adds the shutter line for the final second(s), then releases both at the
//! period boundary.

/// Camera timing configuration, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraConfig {
    /// Seconds between photos. Must exceed `focus_lead_s + shutter_hold_s`.
    pub period_s: u8,
    /// Focus settle time before the shutter is added.
    pub focus_lead_s: u8,
    /// How long focus and shutter are held together.
    pub shutter_hold_s: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            period_s: 20,
            focus_lead_s: 2,
            shutter_hold_s: 1,
        }
    }
}

impl CameraConfig {
    /// True if the hold times fit inside the period.
    pub fn is_valid(&self) -> bool {
        self.period_s > self.focus_lead_s + self.shutter_hold_s
    }
}

/// Desired state of the two camera control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraOutput {
    /// Focus (half-press) line asserted.
    pub focus: bool,
    /// Full shutter line asserted.
    pub shutter: bool,
}

impl CameraOutput {
    /// Both lines released.
    pub const fn released() -> Self {
        Self {
            focus: false,
            shutter: false,
        }
    }
}

/// Tick-driven shutter sequencer. Call [`tick`](Self::tick) once per second.
#[derive(Debug)]
pub struct CameraSequencer {
    config: CameraConfig,
    elapsed_s: u8,
}

impl CameraSequencer {
    /// Create a sequencer at the start of a period.
    pub fn new(config: CameraConfig) -> Self {
        debug_assert!(config.is_valid());
        Self {
            config,
            elapsed_s: 0,
        }
    }

    /// Advance one second and return the line states to apply.
    pub fn tick(&mut self) -> CameraOutput {
        self.elapsed_s += 1;
        if self.elapsed_s >= self.config.period_s {
            // Period boundary: release both lines and restart the count
            self.elapsed_s = 0;
            return CameraOutput::released();
        }

        let focus_at = self.config.period_s - self.config.focus_lead_s - self.config.shutter_hold_s;
        let shutter_at = self.config.period_s - self.config.shutter_hold_s;
        CameraOutput {
            focus: self.elapsed_s >= focus_at,
            shutter: self.elapsed_s >= shutter_at,
        }
    }

    /// Seconds elapsed in the current period.
    pub fn elapsed_s(&self) -> u8 {
        self.elapsed_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(CameraConfig::default().is_valid());
    }

    #[test]
    fn test_one_period_timing() {
        // Default 20s period, 2s focus lead, 1s combined hold:
        // released for seconds 1-16, focus 17-19, shutter 19, reset at 20.
        let mut seq = CameraSequencer::new(CameraConfig::default());

        for s in 1..=16 {
            let out = seq.tick();
            assert_eq!(out, CameraOutput::released(), "second {}", s);
        }
        for s in 17..=18 {
            let out = seq.tick();
            assert!(out.focus && !out.shutter, "second {}", s);
        }
        let out = seq.tick();
        assert!(out.focus && out.shutter, "second 19");

        // Period boundary releases everything
        let out = seq.tick();
        assert_eq!(out, CameraOutput::released());
        assert_eq!(seq.elapsed_s(), 0);
    }

    #[test]
    fn test_cycle_repeats() {
        let config = CameraConfig::default();
        let mut seq = CameraSequencer::new(config);

        let mut focus_seconds = 0;
        let mut shutter_seconds = 0;
        for _ in 0..(config.period_s as usize * 3) {
            let out = seq.tick();
            if out.focus {
                focus_seconds += 1;
            }
            if out.shutter {
                shutter_seconds += 1;
            }
        }

        // Three full periods: focus held (lead + hold) seconds each,
        // shutter held for the hold time each.
        assert_eq!(
            focus_seconds,
            3 * (config.focus_lead_s + config.shutter_hold_s) as usize
        );
        assert_eq!(shutter_seconds, 3 * config.shutter_hold_s as usize);
    }

    #[test]
    fn test_shutter_implies_focus() {
        let mut seq = CameraSequencer::new(CameraConfig {
            period_s: 6,
            focus_lead_s: 2,
            shutter_hold_s: 2,
        });
        for _ in 0..30 {
            let out = seq.tick();
            if out.shutter {
                assert!(out.focus);
            }
        }
    }
}
