//! pushprefs-core - Core library for pushprefs
//!
//! Provides the injectable preference store, its backends, and the
//! notification display preferences built on top of it.

pub mod config;
pub mod error;
pub mod notifications;
pub mod store;

pub use config::{BackendKind, PrefsConfig};
pub use error::{CoreError, Result};
pub use notifications::{NotificationOptions, NotificationPreferences, NotificationSettings, TickerKey};
pub use store::{open_store, Editor, Partition, PrefValue, PreferenceStore};
