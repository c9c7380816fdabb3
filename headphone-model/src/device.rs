//! Device identifiers and topic naming.

use serde::{Deserialize, Serialize};

/// Prefix of every device topic.
pub const TOPIC_PREFIX: &str = "headphone/";

/// Identifier of a simulated headphone.
///
/// Devices are numbered from 1. The id is also the dashboard row and the
/// suffix of the device's topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Create a new device id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Topic this device publishes on, `headphone/{id}`.
    pub fn topic(&self) -> String {
        format!("{}{}", TOPIC_PREFIX, self.0)
    }

    /// Parse a device id back out of a topic name.
    ///
    /// Returns `None` for topics outside the `headphone/` namespace or with a
    /// non-numeric suffix.
    pub fn from_topic(topic: &str) -> Option<Self> {
        topic
            .strip_prefix(TOPIC_PREFIX)
            .and_then(|suffix| suffix.parse::<u32>().ok())
            .map(Self)
    }

    /// Ids `1..=count`, the devices of a fleet of `count` headphones.
    pub fn range(count: u32) -> impl Iterator<Item = DeviceId> {
        (1..=count).map(Self)
    }
}

impl From<u32> for DeviceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
