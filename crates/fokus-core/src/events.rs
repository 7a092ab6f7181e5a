use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, PauseReason, Prompt, SessionRecord, TimerStatus};

/// Every state change of the timer produces an Event.
/// The CLI prints them; the driver persists the records they carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        reason: PauseReason,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The app went to the background during a running work interval.
    DistractionDetected {
        distractions: u32,
        at: DateTime<Utc>,
    },
    /// Back in the foreground after a distraction: finish or continue?
    ReturnPrompted {
        at: DateTime<Utc>,
    },
    /// Manual stop past the significance threshold: save or discard?
    StopPrompted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StopCancelled {
        status: TimerStatus,
        at: DateTime<Utc>,
    },
    /// A work interval ran out. The record is ready to persist.
    WorkCompleted {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        at: DateTime<Utc>,
    },
    /// A manually stopped interval was kept.
    SessionSaved {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    SessionDiscarded {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    DurationChanged {
        work_minutes: u32,
        at: DateTime<Utc>,
    },
    BreakDurationChanged {
        break_minutes: u32,
        at: DateTime<Utc>,
    },
    CategoryChanged {
        category: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TimerStatus,
        remaining_secs: u64,
        display: String,
        total_secs: u64,
        progress: f64,
        distractions: u32,
        pause_count: u32,
        category: String,
        work_minutes: u32,
        break_minutes: u32,
        prompt: Option<Prompt>,
        pause_reason: Option<PauseReason>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The record this event asks the caller to persist, if any.
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Event::WorkCompleted { record, .. } | Event::SessionSaved { record, .. } => {
                Some(record)
            }
            _ => None,
        }
    }
}
