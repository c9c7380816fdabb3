//! Point-in-time view of every tracked stereo

use std::fmt;

use headphone_model::{DeviceId, StereoState, MAX_VOLUME};
use serde::Serialize;

/// Copy of the dashboard state taken on a render tick or on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Epoch milliseconds at which the copy was taken
    pub taken_at: i64,
    /// One entry per tracked device, ordered by device id
    pub stereos: Vec<StereoState>,
}

impl DashboardSnapshot {
    pub fn get(&self, device: DeviceId) -> Option<&StereoState> {
        self.stereos.iter().find(|s| s.device_id == device)
    }

    pub fn len(&self) -> usize {
        self.stereos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stereos.is_empty()
    }
}

/// `█` per volume step, `░` for the rest.
pub fn volume_bar(volume: u8) -> String {
    let filled = volume.min(MAX_VOLUME) as usize;
    let empty = MAX_VOLUME as usize - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

impl fmt::Display for DashboardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STEREO DASHBOARD")?;
        writeln!(f, "{}", "═".repeat(60))?;
        writeln!(f)?;
        writeln!(f, "Device | Volume     | Status      | Last Update")?;
        writeln!(f, "{}", "─".repeat(60))?;

        for stereo in &self.stereos {
            let seconds_ago = (self.taken_at - stereo.last_update).max(0) / 1000;
            writeln!(
                f,
                "  {:>2}   | {} | {:<11} | {}s ago",
                stereo.device_id.as_u32(),
                volume_bar(stereo.volume),
                stereo.status.as_str(),
                seconds_ago
            )?;
        }

        writeln!(f, "{}", "─".repeat(60))
    }
}
