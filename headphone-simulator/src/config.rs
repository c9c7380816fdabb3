//! Configuration for the event generator

use std::time::Duration;

use crate::error::GeneratorError;

/// Schedule of the simulated fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of simulated headphones, numbered from 1
    /// Default: 10
    pub device_count: u32,

    /// Upper bound (exclusive) of the random delay before a device's first event
    /// Default: 2000ms
    pub initial_jitter: Duration,

    /// Lower bound (inclusive) of the delay between two events of one device
    /// Default: 3000ms
    pub min_interval: Duration,

    /// Upper bound (exclusive) of the delay between two events of one device
    /// Default: 10000ms
    pub max_interval: Duration,

    /// Seed for reproducible schedules; each device derives its own stream from it
    /// Default: None (seeded from the OS)
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            device_count: 10,
            initial_jitter: Duration::from_millis(2000),
            min_interval: Duration::from_millis(3000),
            max_interval: Duration::from_millis(10000),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.device_count == 0 {
            return Err(GeneratorError::Configuration(
                "Device count must be at least 1".to_string(),
            ));
        }

        if self.min_interval >= self.max_interval {
            return Err(GeneratorError::Configuration(format!(
                "Minimum interval ({:?}) must be less than maximum interval ({:?})",
                self.min_interval, self.max_interval
            )));
        }

        Ok(())
    }

    pub fn with_device_count(mut self, count: u32) -> Self {
        self.device_count = count;
        self
    }

    pub fn with_initial_jitter(mut self, jitter: Duration) -> Self {
        self.initial_jitter = jitter;
        self
    }

    /// Delay between events is drawn uniformly from `[min, max)`.
    pub fn with_interval(mut self, min: Duration, max: Duration) -> Self {
        self.min_interval = min;
        self.max_interval = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.device_count, 10);
        assert_eq!(config.initial_jitter, Duration::from_millis(2000));
        assert_eq!(config.min_interval, Duration::from_millis(3000));
        assert_eq!(config.max_interval, Duration::from_millis(10000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = GeneratorConfig::default().with_device_count(0);
        assert!(config.validate().is_err());

        let config = GeneratorConfig::default()
            .with_interval(Duration::from_millis(50), Duration::from_millis(50));
        assert!(config.validate().is_err());

        let config = GeneratorConfig::default()
            .with_initial_jitter(Duration::ZERO)
            .with_seed(7);
        assert!(config.validate().is_ok());
    }
}
