//! User settings shared by the timer and the reports.
//!
//! [`FocusContext`] is the explicit replacement for an app-wide settings
//! provider: it owns the store and the loaded [`Settings`], is built once at
//! start-up ([`FocusContext::load`] must finish before anything reads it) and
//! is passed by reference to whoever needs it. Every update is written back
//! immediately; write failures are logged and otherwise ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, TimerError};
use crate::storage::{keys, Config, KvStore, SessionLog};
use crate::timer::{SessionRecord, SessionTimer, TimerOptions, MAX_MINUTES};

/// Work duration step for the settings +/- buttons.
pub const WORK_STEP_MINUTES: u32 = 5;
/// Break duration step for the settings +/- buttons.
pub const BREAK_STEP_MINUTES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub theme: Theme,
    pub last_category: String,
}

impl Settings {
    pub fn defaults(config: &Config) -> Self {
        Self {
            work_minutes: config.timer.default_work_minutes,
            break_minutes: config.timer.default_break_minutes,
            theme: Theme::default(),
            last_category: config.default_category().to_string(),
        }
    }

    /// Read every setting, keeping the default for anything missing,
    /// unreadable or unparsable.
    pub fn load<S: KvStore + ?Sized>(store: &S, config: &Config) -> Self {
        let mut settings = Self::defaults(config);

        if let Some(m) = read_parsed::<u32, _>(store, keys::WORK_MINUTES) {
            if (1..=MAX_MINUTES).contains(&m) {
                settings.work_minutes = m;
            }
        }
        if let Some(m) = read_parsed::<u32, _>(store, keys::BREAK_MINUTES) {
            if (1..=MAX_MINUTES).contains(&m) {
                settings.break_minutes = m;
            }
        }
        if let Some(theme) = read_parsed::<Theme, _>(store, keys::APP_THEME) {
            settings.theme = theme;
        }
        if let Some(category) = read_raw(store, keys::LAST_CATEGORY) {
            settings.last_category = category;
        }
        settings
    }
}

fn read_raw<S: KvStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read setting");
            None
        }
    }
}

fn read_parsed<T: FromStr, S: KvStore + ?Sized>(store: &S, key: &str) -> Option<T> {
    let raw = read_raw(store, key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "ignoring unparsable setting");
    }
    parsed
}

/// Store, configuration and settings for one app session.
pub struct FocusContext<S> {
    store: S,
    config: Config,
    settings: Settings,
}

impl<S: KvStore> FocusContext<S> {
    /// Load settings from the store.
    pub fn load(store: S, config: Config) -> Self {
        let settings = Settings::load(&store, &config);
        tracing::debug!(?settings, "settings loaded");
        Self {
            store,
            config,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "failed to persist setting");
        }
    }

    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        if !(1..=MAX_MINUTES).contains(&minutes) {
            return Err(TimerError::InvalidDuration { minutes });
        }
        self.settings.work_minutes = minutes;
        self.persist(keys::WORK_MINUTES, &minutes.to_string());
        Ok(())
    }

    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        if !(1..=MAX_MINUTES).contains(&minutes) {
            return Err(TimerError::InvalidDuration { minutes });
        }
        self.settings.break_minutes = minutes;
        self.persist(keys::BREAK_MINUTES, &minutes.to_string());
        Ok(())
    }

    /// Step the work duration by five minutes. Never drops below five.
    pub fn adjust_work(&mut self, increase: bool) -> u32 {
        let current = self.settings.work_minutes;
        let next = step(current, WORK_STEP_MINUTES, increase);
        if next != current {
            // Bounds are already enforced by `step`.
            let _ = self.set_work_minutes(next);
        }
        self.settings.work_minutes
    }

    /// Step the break duration by one minute. Never drops below one.
    pub fn adjust_break(&mut self, increase: bool) -> u32 {
        let current = self.settings.break_minutes;
        let next = step(current, BREAK_STEP_MINUTES, increase);
        if next != current {
            let _ = self.set_break_minutes(next);
        }
        self.settings.break_minutes
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.settings.theme = self.settings.theme.toggled();
        self.persist(keys::APP_THEME, self.settings.theme.as_str());
        self.settings.theme
    }

    pub fn set_category(&mut self, category: &str) {
        self.settings.last_category = category.to_string();
        self.persist(keys::LAST_CATEGORY, category);
    }

    /// Best-effort append. Returns whether the record was written.
    pub fn save_session(&self, record: &SessionRecord) -> bool {
        match self.store.save_session(record) {
            Ok(()) => {
                tracing::info!(id = record.id, duration = record.duration, "session saved");
                true
            }
            Err(e) => {
                tracing::warn!(id = record.id, error = %e, "failed to save session");
                false
            }
        }
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.store.sessions()
    }

    pub fn try_sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        self.store.try_sessions()
    }

    /// Delete the whole history. The caller confirms with the user first.
    pub fn clear_sessions(&self) -> bool {
        match self.store.clear_sessions() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to clear sessions");
                false
            }
        }
    }

    pub fn timer_options(&self) -> TimerOptions {
        TimerOptions {
            work_minutes: self.settings.work_minutes,
            break_minutes: self.settings.break_minutes,
            category: self.settings.last_category.clone(),
            min_significant_secs: self.config.timer.min_significant_secs,
        }
    }

    /// A fresh idle timer for a newly opened timer screen.
    pub fn new_timer(&self) -> SessionTimer {
        SessionTimer::new(self.timer_options())
    }
}

/// Step `current` by `by`, staying within `by..=MAX_MINUTES`.
fn step(current: u32, by: u32, increase: bool) -> u32 {
    if increase {
        let next = current.saturating_add(by);
        if next > MAX_MINUTES {
            current
        } else {
            next
        }
    } else if current > by {
        current - by
    } else {
        current
    }
}
