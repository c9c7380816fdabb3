//! Per-device stereo state and the reducer that folds events into it.

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::event::{HeadphoneEvent, HeadphoneEventKind};

/// Lowest volume step.
pub const MIN_VOLUME: u8 = 0;

/// Highest volume step.
pub const MAX_VOLUME: u8 = 10;

/// Volume a stereo starts at.
pub const DEFAULT_VOLUME: u8 = 5;

/// Transport state of a stereo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StereoStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl StereoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StereoStatus::Playing => "Playing",
            StereoStatus::Paused => "Paused",
            StereoStatus::Stopped => "Stopped",
        }
    }
}

impl std::fmt::Display for StereoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state of one stereo, as shown on the dashboard.
///
/// `volume` always stays within [`MIN_VOLUME`]..=[`MAX_VOLUME`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StereoState {
    pub device_id: DeviceId,
    pub volume: u8,
    pub status: StereoStatus,
    /// Timestamp of the last event applied, in epoch milliseconds
    pub last_update: i64,
}

impl StereoState {
    /// Default state for a device: volume 5, stopped.
    pub fn new(device_id: DeviceId, last_update: i64) -> Self {
        Self {
            device_id,
            volume: DEFAULT_VOLUME,
            status: StereoStatus::Stopped,
            last_update,
        }
    }

    /// Apply an event in place.
    ///
    /// Returns `false` and leaves the state untouched when the event belongs to
    /// another device. Otherwise the event's timestamp becomes `last_update`.
    pub fn apply(&mut self, event: &HeadphoneEvent) -> bool {
        if event.device_id != self.device_id {
            return false;
        }

        match event.kind {
            HeadphoneEventKind::VolumeUp => {
                self.volume = self.volume.saturating_add(1).min(MAX_VOLUME);
            }
            HeadphoneEventKind::VolumeDown => {
                self.volume = self.volume.saturating_sub(1).max(MIN_VOLUME);
            }
            HeadphoneEventKind::Play => self.status = StereoStatus::Playing,
            HeadphoneEventKind::Pause => self.status = StereoStatus::Paused,
            HeadphoneEventKind::Stop => self.status = StereoStatus::Stopped,
        }

        self.last_update = event.timestamp;
        true
    }
}

/// Pure reducer: the state that results from applying `event` to `state`.
pub fn reduce(state: StereoState, event: &HeadphoneEvent) -> StereoState {
    let mut next = state;
    next.apply(event);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn event(kind: HeadphoneEventKind, timestamp: i64) -> HeadphoneEvent {
        HeadphoneEvent::at(DeviceId::new(1), kind, timestamp)
    }

    fn kind_strategy() -> impl Strategy<Value = HeadphoneEventKind> {
        prop::sample::select(HeadphoneEventKind::ALL.to_vec())
    }

    fn volume_kind_strategy() -> impl Strategy<Value = HeadphoneEventKind> {
        prop::sample::select(vec![HeadphoneEventKind::VolumeUp, HeadphoneEventKind::VolumeDown])
    }

    fn status_strategy() -> impl Strategy<Value = StereoStatus> {
        prop::sample::select(vec![StereoStatus::Playing, StereoStatus::Paused, StereoStatus::Stopped])
    }

    #[test]
    fn test_default_state() {
        let state = StereoState::new(DeviceId::new(3), 99);
        assert_eq!(state.device_id, DeviceId::new(3));
        assert_eq!(state.volume, 5);
        assert_eq!(state.status, StereoStatus::Stopped);
        assert_eq!(state.last_update, 99);
    }

    #[test]
    fn test_volume_scenario() {
        let mut state = StereoState::new(DeviceId::new(1), 0);

        for ts in 1..=3 {
            state.apply(&event(HeadphoneEventKind::VolumeUp, ts));
        }
        assert_eq!(state.volume, 8);

        for ts in 4..=8 {
            state.apply(&event(HeadphoneEventKind::VolumeDown, ts));
        }
        assert_eq!(state.volume, 3);

        state.apply(&event(HeadphoneEventKind::Stop, 9));
        assert_eq!(state.status, StereoStatus::Stopped);
        assert_eq!(state.volume, 3);
        assert_eq!(state.last_update, 9);
    }

    #[test]
    fn test_play_then_pause() {
        let state = StereoState::new(DeviceId::new(1), 0);
        let state = reduce(state, &event(HeadphoneEventKind::Play, 1));
        let state = reduce(state, &event(HeadphoneEventKind::Pause, 2));
        assert_eq!(state.status, StereoStatus::Paused);
    }

    #[test]
    fn test_volume_saturates_at_bounds() {
        let mut state = StereoState::new(DeviceId::new(1), 0);
        state.volume = MAX_VOLUME;
        state.apply(&event(HeadphoneEventKind::VolumeUp, 1));
        assert_eq!(state.volume, MAX_VOLUME);

        state.volume = MIN_VOLUME;
        state.apply(&event(HeadphoneEventKind::VolumeDown, 2));
        assert_eq!(state.volume, MIN_VOLUME);
    }

    #[test]
    fn test_last_update_takes_event_time_even_if_older() {
        let mut state = StereoState::new(DeviceId::new(1), 1_000);
        state.apply(&event(HeadphoneEventKind::Play, 500));
        assert_eq!(state.last_update, 500);
    }

    #[test]
    fn test_foreign_device_is_ignored() {
        let mut state = StereoState::new(DeviceId::new(1), 0);
        let before = state;
        let foreign = HeadphoneEvent::at(DeviceId::new(2), HeadphoneEventKind::Play, 5);
        assert!(!state.apply(&foreign));
        assert_eq!(state, before);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = StereoState::new(DeviceId::new(2), 7);
        let value = serde_json::to_value(state).unwrap();
        assert_eq!(value["deviceId"], 2);
        assert_eq!(value["volume"], 5);
        assert_eq!(value["status"], "Stopped");
        assert_eq!(value["lastUpdate"], 7);
    }

    #[rstest]
    #[case(HeadphoneEventKind::Play, StereoStatus::Playing)]
    #[case(HeadphoneEventKind::Pause, StereoStatus::Paused)]
    #[case(HeadphoneEventKind::Stop, StereoStatus::Stopped)]
    fn test_transport_kinds_map_to_status(#[case] kind: HeadphoneEventKind, #[case] status: StereoStatus) {
        let state = reduce(StereoState::new(DeviceId::new(1), 0), &event(kind, 1));
        assert_eq!(state.status, status);
        assert_eq!(state.volume, DEFAULT_VOLUME);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_volume_stays_in_range(
            start in MIN_VOLUME..=MAX_VOLUME,
            kinds in prop::collection::vec(volume_kind_strategy(), 0..64),
        ) {
            let mut state = StereoState::new(DeviceId::new(1), 0);
            state.volume = start;
            for (ts, kind) in kinds.into_iter().enumerate() {
                state.apply(&event(kind, ts as i64));
                prop_assert!(state.volume <= MAX_VOLUME);
            }
        }

        #[test]
        fn prop_transport_overwrites_status(
            prior in status_strategy(),
            volume in MIN_VOLUME..=MAX_VOLUME,
            kind in prop::sample::select(vec![
                HeadphoneEventKind::Play,
                HeadphoneEventKind::Pause,
                HeadphoneEventKind::Stop,
            ]),
        ) {
            let mut state = StereoState::new(DeviceId::new(1), 0);
            state.status = prior;
            state.volume = volume;
            state.apply(&event(kind, 1));

            let expected = match kind {
                HeadphoneEventKind::Play => StereoStatus::Playing,
                HeadphoneEventKind::Pause => StereoStatus::Paused,
                _ => StereoStatus::Stopped,
            };
            prop_assert_eq!(state.status, expected);
            prop_assert_eq!(state.volume, volume);
        }

        #[test]
        fn prop_last_update_tracks_last_event(
            kinds in prop::collection::vec((kind_strategy(), any::<i64>()), 1..32),
        ) {
            let mut state = StereoState::new(DeviceId::new(1), 0);
            for (kind, ts) in &kinds {
                state.apply(&event(*kind, *ts));
            }
            prop_assert_eq!(state.last_update, kinds.last().unwrap().1);
        }
    }
}
