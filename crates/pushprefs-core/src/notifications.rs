//! Push notification display preferences
//!
//! Caches the title, ticker text and display flag used when an incoming push
//! notification is rendered, so they survive process restarts.
//!
//! Reads never fail: a missing, unreadable or mistyped value yields the
//! default. Plain setters are fire-and-forget and only log failures; the
//! `try_set_*` variants report them.

use crate::error::Result;
use crate::store::{Partition, PreferenceStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Partition holding the notification preferences
pub const PREFERENCE_PARTITION: &str = "com.mosync.internal.android.notifications";

pub const KEY_TITLE: &str = "title";
pub const KEY_TICKER: &str = "ticker";
pub const KEY_DISPLAY_FLAG: &str = "displayFlag";

/// Extra carrying the message when the application is launched for a notification
pub const INTENT_EXTRA_MESSAGE: &str = "com.mosync.java.android.IntentExtra";
pub const INTENT_EXTRA_NOTIFICATION_HANDLE: &str = "push.notification.handle";
pub const INTENT_EXTRA_NOTIFICATION: &str = "push.notification";

/// Show notifications only while the application is not in the foreground
pub const DISPLAY_FLAG_DEFAULT: i32 = 0;
/// Show notifications regardless of application state
pub const DISPLAY_FLAG_ANYTIME: i32 = 1;

/// Which key the ticker text is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickerKey {
    /// Ticker reads and writes the title key. Existing stores were written
    /// this way, so a ticker update also replaces the title.
    #[default]
    #[serde(rename = "shared")]
    SharedWithTitle,
    /// Ticker has its own key
    #[serde(rename = "dedicated")]
    Dedicated,
}

impl TickerKey {
    pub fn key(self) -> &'static str {
        match self {
            TickerKey::SharedWithTitle => KEY_TITLE,
            TickerKey::Dedicated => KEY_TICKER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationOptions {
    pub default_display_flag: i32,
    pub ticker_key: TickerKey,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            default_display_flag: DISPLAY_FLAG_DEFAULT,
            ticker_key: TickerKey::SharedWithTitle,
        }
    }
}

/// All three values as read at one point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
    pub title: String,
    pub ticker: String,
    pub display_flag: i32,
}

/// Notification display preferences over an injected store
pub struct NotificationPreferences<S: PreferenceStore + ?Sized = dyn PreferenceStore> {
    partition: Partition<S>,
    options: NotificationOptions,
}

impl<S: PreferenceStore + ?Sized> NotificationPreferences<S> {
    pub fn new(store: Arc<S>) -> Result<Self> {
        Self::with_options(store, NotificationOptions::default())
    }

    pub fn with_options(store: Arc<S>, options: NotificationOptions) -> Result<Self> {
        Ok(Self {
            partition: Partition::new(store, PREFERENCE_PARTITION)?,
            options,
        })
    }

    /// Stored title, or empty text if never set
    pub fn get_title(&self) -> String {
        self.read_text(KEY_TITLE)
    }

    pub fn set_title(&self, text: &str) {
        absorb(KEY_TITLE, self.try_set_title(text));
    }

    pub fn try_set_title(&self, text: &str) -> Result<()> {
        self.partition.edit().put_string(KEY_TITLE, text).commit()
    }

    /// Stored ticker text, or empty text if never set
    pub fn get_ticker(&self) -> String {
        self.read_text(self.ticker_storage_key())
    }

    pub fn set_ticker(&self, text: &str) {
        absorb(self.ticker_storage_key(), self.try_set_ticker(text));
    }

    pub fn try_set_ticker(&self, text: &str) -> Result<()> {
        self.partition
            .edit()
            .put_string(self.ticker_storage_key(), text)
            .commit()
    }

    /// Stored display flag, or the configured default if never set
    pub fn get_display_flag(&self) -> i32 {
        let default = self.options.default_display_flag;
        self.partition
            .get_int(KEY_DISPLAY_FLAG, default)
            .unwrap_or_else(|e| {
                warn!(key = KEY_DISPLAY_FLAG, error = %e, "Falling back to default display flag");
                default
            })
    }

    pub fn set_display_flag(&self, flag: i32) {
        absorb(KEY_DISPLAY_FLAG, self.try_set_display_flag(flag));
    }

    pub fn try_set_display_flag(&self, flag: i32) -> Result<()> {
        self.partition.edit().put_int(KEY_DISPLAY_FLAG, flag).commit()
    }

    pub fn snapshot(&self) -> NotificationSettings {
        NotificationSettings {
            title: self.get_title(),
            ticker: self.get_ticker(),
            display_flag: self.get_display_flag(),
        }
    }

    /// Key the ticker is actually read from and written to
    fn ticker_storage_key(&self) -> &'static str {
        self.options.ticker_key.key()
    }

    fn read_text(&self, key: &str) -> String {
        self.partition.get_string(key, "").unwrap_or_else(|e| {
            warn!(key, error = %e, "Falling back to empty preference");
            String::new()
        })
    }
}

fn absorb(key: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(key, error = %e, "Failed to store notification preference");
    }
}
