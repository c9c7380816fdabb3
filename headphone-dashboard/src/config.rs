//! Configuration for the dashboard

use std::time::Duration;

use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Devices tracked, numbered from 1
    /// Default: 10
    pub device_count: u32,

    /// Period of the render tick
    /// Default: 1000ms
    pub render_interval: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            device_count: 10,
            render_interval: Duration::from_millis(1000),
        }
    }
}

impl DashboardConfig {
    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.device_count == 0 {
            return Err(DashboardError::Configuration(
                "Device count must be at least 1".to_string(),
            ));
        }

        if self.render_interval == Duration::ZERO {
            return Err(DashboardError::Configuration(
                "Render interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_device_count(mut self, count: u32) -> Self {
        self.device_count = count;
        self
    }

    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }
}
