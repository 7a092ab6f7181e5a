//! # Fokus Core Library
//!
//! This library provides the core logic for the Fokus focus timer. All
//! operations are available through the `fokus` CLI binary; any GUI is
//! expected to be a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven work/break state machine that counts pauses and
//!   distractions and emits a [`SessionRecord`] per finished work interval
//! - **Lifecycle**: foreground/background edge detection with RAII
//!   subscriptions
//! - **Driver**: a tokio task hosting the timer with a one-second ticker
//! - **Report**: pure aggregation of the session history (totals, 7-day
//!   series, habit heatmap, category breakdown)
//! - **Storage**: string key-value store (SQLite or in-memory) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: core timer state machine
//! - [`ReportAggregator`]: history to report figures
//! - [`FocusContext`]: settings and persistence shared by timer and reports
//! - [`KvStore`]: trait for the persisted store

pub mod driver;
pub mod error;
pub mod events;
pub mod format;
pub mod lifecycle;
pub mod report;
pub mod settings;
pub mod storage;
pub mod timer;

pub use driver::{Answer, Command, TimerDriver};
pub use error::{ConfigError, CoreError, StorageError, TimerError};
pub use events::Event;
pub use format::{format_minutes, format_time};
pub use lifecycle::{LifecycleEvent, LifecycleMonitor, PlatformState, Subscription};
pub use report::{CategoryFilter, HeatmapSelection, Report, ReportAggregator, ReportView};
pub use settings::{FocusContext, Settings, Theme};
pub use storage::{Config, KvStore, MemoryStore, SessionLog, SqliteStore};
pub use timer::{
    Mode, Prompt, ReturnChoice, SessionRecord, SessionTimer, StopChoice, TimerOptions,
    TimerStatus,
};
