//! CLI command handlers
//!
//! Setters go through the fallible `try_set_*` variants so a failed commit
//! exits non-zero instead of being silently absorbed.

use crate::{Field, SetField};
use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table};
use pushprefs_core::notifications::{DISPLAY_FLAG_ANYTIME, DISPLAY_FLAG_DEFAULT};
use pushprefs_core::{NotificationPreferences, NotificationSettings};
use std::path::PathBuf;

pub fn print_field(prefs: &NotificationPreferences, field: Field) {
    match field {
        Field::Title => println!("{}", prefs.get_title()),
        Field::Ticker => println!("{}", prefs.get_ticker()),
        Field::DisplayFlag => println!("{}", prefs.get_display_flag()),
    }
}

pub fn store_field(prefs: &NotificationPreferences, field: SetField) -> Result<()> {
    match field {
        SetField::Title { text } => prefs.try_set_title(&text).context("Failed to store title"),
        SetField::Ticker { text } => prefs
            .try_set_ticker(&text)
            .context("Failed to store ticker text"),
        SetField::DisplayFlag { flag } => prefs
            .try_set_display_flag(flag)
            .context("Failed to store display flag"),
    }
}

pub fn print_all(prefs: &NotificationPreferences, json: bool) -> Result<()> {
    let settings = prefs.snapshot();
    if json {
        let out = serde_json::to_string_pretty(&settings).context("Failed to serialize preferences")?;
        println!("{}", out);
    } else {
        println!("{}", settings_table(&settings));
    }
    Ok(())
}

pub fn print_location(location: Option<PathBuf>) {
    match location {
        Some(path) => println!("{}", path.display()),
        None => println!("(in memory, nothing persisted)"),
    }
}

fn settings_table(settings: &NotificationSettings) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Preference", "Value"]);

    table.add_row(vec![Cell::new("title"), Cell::new(or_unset(&settings.title))]);
    table.add_row(vec![Cell::new("ticker"), Cell::new(or_unset(&settings.ticker))]);
    table.add_row(vec![
        Cell::new("display flag"),
        Cell::new(describe_flag(settings.display_flag)),
    ]);
    table
}

fn or_unset(text: &str) -> &str {
    if text.is_empty() {
        "(unset)"
    } else {
        text
    }
}

fn describe_flag(flag: i32) -> String {
    match flag {
        DISPLAY_FLAG_DEFAULT => format!("{} (only in background)", flag),
        DISPLAY_FLAG_ANYTIME => format!("{} (anytime)", flag),
        other => other.to_string(),
    }
}
