//! Core library for playing optical TAN flicker codes.
//!
//! A hex challenge is encoded once into a cyclic stream of five-bar display
//! states ([`encoder`]), which a [`PlaybackController`] pushes to a
//! [`Surface`] at an adjustable rate. Speed and zoom controls distinguish
//! clicks from press-and-hold repeats, and the last-used settings are kept in
//! a [`PreferenceStore`].

pub mod config;
pub mod controller;
pub mod controls;
pub mod css;
pub mod encoder;
pub mod error;
pub mod page;
pub mod storage;
pub mod surface;
pub mod timeline;

pub use config::{AppConfig, FeatureFlags, PlaybackConfig, StorageConfig};
pub use controller::{PlaybackController, PlaybackState};
pub use controls::{Adjustment, ControlInput, HoldRepeat};
pub use encoder::{encode, EncodedStream, StateCode, BAR_COUNT, PREAMBLE};
pub use error::{FlickerError, Result};
pub use page::{FlickerPage, MountReport};
pub use storage::{
    shared, JsonFileStore, MemoryStore, PreferenceStore, Preferences, SharedStore,
    StoredPreference, UnavailableStore,
};
pub use surface::{MemorySurface, Surface};
pub use timeline::{PlaybackClock, Timer};
