//! Headphone control events and their JSON wire format.
//!
//! ```json
//! {"deviceId": 1, "event": "VOLUMEUP", "timestamp": 1700000000000}
//! ```

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::error::{PayloadError, Result};

/// Current time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Control actions a headphone can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeadphoneEventKind {
    /// Raise volume one step
    VolumeUp,
    /// Lower volume one step
    VolumeDown,
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Stop playback
    Stop,
}

impl HeadphoneEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [HeadphoneEventKind; 5] = [
        HeadphoneEventKind::VolumeUp,
        HeadphoneEventKind::VolumeDown,
        HeadphoneEventKind::Play,
        HeadphoneEventKind::Pause,
        HeadphoneEventKind::Stop,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadphoneEventKind::VolumeUp => "VOLUMEUP",
            HeadphoneEventKind::VolumeDown => "VOLUMEDOWN",
            HeadphoneEventKind::Play => "PLAY",
            HeadphoneEventKind::Pause => "PAUSE",
            HeadphoneEventKind::Stop => "STOP",
        }
    }
}

impl std::fmt::Display for HeadphoneEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single control event emitted by a headphone.
///
/// Immutable once built; the JSON encoding is the only unit that crosses a broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadphoneEvent {
    /// Emitting device
    pub device_id: DeviceId,
    /// What happened
    #[serde(rename = "event")]
    pub kind: HeadphoneEventKind,
    /// Milliseconds since the Unix epoch at which the event was created
    pub timestamp: i64,
}

impl HeadphoneEvent {
    /// Create an event stamped with the current time.
    pub fn new(device_id: DeviceId, kind: HeadphoneEventKind) -> Self {
        Self::at(device_id, kind, now_millis())
    }

    /// Create an event with an explicit timestamp.
    pub fn at(device_id: DeviceId, kind: HeadphoneEventKind, timestamp: i64) -> Self {
        Self {
            device_id,
            kind,
            timestamp,
        }
    }

    /// Topic the event belongs on.
    pub fn topic(&self) -> String {
        self.device_id.topic()
    }

    /// Encode as the JSON wire payload.
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self).map_err(PayloadError::Encode)
    }

    /// Decode a JSON wire payload.
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(PayloadError::Malformed)
    }
}
