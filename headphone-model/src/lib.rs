//! # headphone-model
//!
//! Shared types for the headphone/stereo simulator.
//!
//! Headphones emit [`HeadphoneEvent`]s onto a `headphone/{id}` topic; the
//! dashboard folds them into one [`StereoState`] per device using the reducer
//! in [`StereoState::apply`]. Everything that crosses the broker is a JSON
//! string produced by [`HeadphoneEvent::to_payload`].
//!
//! ```rust
//! use headphone_model::{DeviceId, HeadphoneEvent, HeadphoneEventKind, StereoState, StereoStatus};
//!
//! let device = DeviceId::new(1);
//! let mut stereo = StereoState::new(device, 0);
//!
//! let event = HeadphoneEvent::at(device, HeadphoneEventKind::Play, 1_700_000_000_000);
//! let payload = event.to_payload().unwrap();
//! let decoded = HeadphoneEvent::from_payload(&payload).unwrap();
//!
//! assert!(stereo.apply(&decoded));
//! assert_eq!(stereo.status, StereoStatus::Playing);
//! assert_eq!(device.topic(), "headphone/1");
//! ```

mod device;
mod error;
mod event;
mod state;

pub use device::{DeviceId, TOPIC_PREFIX};
pub use error::{PayloadError, Result};
pub use event::{now_millis, HeadphoneEvent, HeadphoneEventKind};
pub use state::{reduce, StereoState, StereoStatus, DEFAULT_VOLUME, MAX_VOLUME, MIN_VOLUME};
