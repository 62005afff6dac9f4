//! Backlight dimming and battery sampling

use embassy_time::{Duration, Instant};
use log::{debug, info};

/// Brightness while the user is interacting
pub const BRIGHTNESS_ACTIVE: u8 = 60;

/// Brightness after the idle timeout
pub const BRIGHTNESS_DIM: u8 = 12;

pub const DIM_AFTER: Duration = Duration::from_secs(20);

/// Battery readings are cached for this long
pub const BATTERY_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

pub trait Backlight {
    fn set_brightness(&mut self, level: u8);
}

pub trait BatteryGauge {
    /// State of charge, 0-100
    fn percent(&mut self) -> u8;
    fn is_charging(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimmingPolicy {
    pub dim_after: Duration,
    pub active_level: u8,
    pub dim_level: u8,
}

impl Default for DimmingPolicy {
    fn default() -> Self {
        Self {
            dim_after: DIM_AFTER,
            active_level: BRIGHTNESS_ACTIVE,
            dim_level: BRIGHTNESS_DIM,
        }
    }
}

impl DimmingPolicy {
    /// Brightness for the time since the last interaction
    pub fn target(&self, idle: Duration) -> u8 {
        if idle > self.dim_after {
            self.dim_level
        } else {
            self.active_level
        }
    }
}

/// Applies the dimming policy, writing to the hardware only on change.
pub struct BacklightController<B> {
    backlight: B,
    policy: DimmingPolicy,
    applied: Option<u8>,
}

impl<B: Backlight> BacklightController<B> {
    pub fn new(backlight: B, policy: DimmingPolicy) -> Self {
        Self {
            backlight,
            policy,
            applied: None,
        }
    }

    pub fn apply(&mut self, idle: Duration) {
        let target = self.policy.target(idle);
        if self.applied == Some(target) {
            return;
        }
        if target == self.policy.dim_level {
            info!("Dimming backlight to {}", target);
        } else {
            debug!("Backlight to {}", target);
        }
        self.backlight.set_brightness(target);
        self.applied = Some(target);
    }

    pub fn applied(&self) -> Option<u8> {
        self.applied
    }

    pub fn backlight(&self) -> &B {
        &self.backlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    pub percent: u8,
    pub charging: bool,
}

/// Samples a [`BatteryGauge`] at a fixed interval and caches the result.
pub struct BatteryMonitor<G> {
    gauge: G,
    reading: BatteryReading,
    next_sample: Option<Instant>,
}

impl<G: BatteryGauge> BatteryMonitor<G> {
    pub fn new(gauge: G) -> Self {
        Self {
            gauge,
            reading: BatteryReading {
                percent: 0,
                charging: false,
            },
            next_sample: None,
        }
    }

    /// Current reading, resampled when the cache has expired
    pub fn sample(&mut self, now: Instant) -> BatteryReading {
        if self.next_sample.is_none_or(|due| now >= due) {
            self.reading = BatteryReading {
                percent: self.gauge.percent().min(100),
                charging: self.gauge.is_charging(),
            };
            self.next_sample = Some(now + BATTERY_SAMPLE_INTERVAL);
        }
        self.reading
    }

    pub fn gauge_mut(&mut self) -> &mut G {
        &mut self.gauge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingBacklight {
        writes: Vec<u8>,
    }

    impl Backlight for RecordingBacklight {
        fn set_brightness(&mut self, level: u8) {
            self.writes.push(level);
        }
    }

    struct CountingGauge {
        percent: u8,
        reads: u32,
    }

    impl BatteryGauge for CountingGauge {
        fn percent(&mut self) -> u8 {
            self.reads += 1;
            self.percent
        }

        fn is_charging(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn test_policy_threshold() {
        let policy = DimmingPolicy::default();
        assert_eq!(policy.target(Duration::from_secs(0)), BRIGHTNESS_ACTIVE);
        assert_eq!(policy.target(Duration::from_secs(20)), BRIGHTNESS_ACTIVE);
        assert_eq!(policy.target(Duration::from_millis(20_001)), BRIGHTNESS_DIM);
    }

    #[test]
    fn test_backlight_written_only_on_change() {
        let mut controller =
            BacklightController::new(RecordingBacklight::default(), DimmingPolicy::default());
        controller.apply(Duration::from_secs(0));
        controller.apply(Duration::from_secs(5));
        controller.apply(Duration::from_secs(25));
        controller.apply(Duration::from_secs(26));
        controller.apply(Duration::from_secs(0));
        assert_eq!(
            controller.backlight().writes,
            [BRIGHTNESS_ACTIVE, BRIGHTNESS_DIM, BRIGHTNESS_ACTIVE]
        );
    }

    #[test]
    fn test_battery_sampled_every_interval() {
        let mut monitor = BatteryMonitor::new(CountingGauge {
            percent: 80,
            reads: 0,
        });
        assert_eq!(monitor.sample(Instant::from_secs(0)).percent, 80);
        monitor.gauge_mut().percent = 10;
        assert_eq!(monitor.sample(Instant::from_secs(29)).percent, 80);
        assert_eq!(monitor.sample(Instant::from_secs(30)).percent, 10);
        assert_eq!(monitor.gauge_mut().reads, 2);
    }
}
