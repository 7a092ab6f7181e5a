//! Session timer state machine.
//!
//! The timer does not own a clock or a thread. The caller delivers one
//! `tick()` per elapsed second, lifecycle edges and user commands; each call
//! returns the resulting [`Event`], if any.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running-Work <-> Paused-Work -> Idle (record) -> Running-Break <-> Paused-Break -> Idle
//! ```
//!
//! ## Tick cancellation
//!
//! Ticks carry a [`TickToken`]. Every transition into or out of running bumps
//! the token generation, so a tick scheduled before a pause is dropped instead
//! of decrementing a paused timer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::record::{RecordIdGen, SessionRecord};
use crate::error::TimerError;
use crate::events::Event;
use crate::format::format_time;
use crate::lifecycle::LifecycleEvent;

/// Longest interval the `MM:SS` display can show.
pub const MAX_MINUTES: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Mode and phase folded into the five observable states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    RunningWork,
    PausedWork,
    RunningBreak,
    PausedBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    Manual,
    Distraction,
    StopPrompt,
}

/// A question the user has to answer before the timer moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prompt {
    /// Work finished; offer the break.
    StartBreak,
    /// Break finished; offer the next work interval.
    StartWork,
    /// Returned from a distraction; finish or continue.
    Return,
    /// Manual stop with enough elapsed time to be worth keeping.
    SaveOrDiscard { elapsed_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnChoice {
    /// Abandon the interval without saving.
    Finish,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopChoice {
    Save,
    Discard,
    Cancel,
}

/// Proof that a tick was scheduled while the timer was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken(u64);

/// Construction parameters for [`SessionTimer`].
#[derive(Debug, Clone)]
pub struct TimerOptions {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub category: String,
    /// Manual stops below this many elapsed seconds are discarded silently.
    pub min_significant_secs: u64,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            category: super::record::FALLBACK_CATEGORY.to_string(),
            min_significant_secs: 60,
        }
    }
}

/// Countdown, work/break mode and distraction counters for one timer screen.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    mode: Mode,
    phase: Phase,
    remaining_secs: u64,
    work_minutes: u32,
    break_minutes: u32,
    category: String,
    distractions: u32,
    pause_count: u32,
    min_significant_secs: u64,
    prompt: Option<Prompt>,
    /// Paused because the app went to the background.
    distracted: bool,
    pause_reason: Option<PauseReason>,
    /// Phase to restore when a stop prompt is cancelled.
    before_stop: Option<Phase>,
    generation: u64,
    ids: RecordIdGen,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(TimerOptions::default())
    }
}

impl SessionTimer {
    /// Create an idle timer in work mode with the full work duration loaded.
    ///
    /// Durations are clamped to `1..=MAX_MINUTES`.
    pub fn new(options: TimerOptions) -> Self {
        let work_minutes = options.work_minutes.clamp(1, MAX_MINUTES);
        let break_minutes = options.break_minutes.clamp(1, MAX_MINUTES);
        Self {
            mode: Mode::Work,
            phase: Phase::Idle,
            remaining_secs: u64::from(work_minutes) * 60,
            work_minutes,
            break_minutes,
            category: options.category,
            distractions: 0,
            pause_count: 0,
            min_significant_secs: options.min_significant_secs,
            prompt: None,
            distracted: false,
            pause_reason: None,
            before_stop: None,
            generation: 0,
            ids: RecordIdGen::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> TimerStatus {
        match (self.phase, self.mode) {
            (Phase::Idle, _) => TimerStatus::Idle,
            (Phase::Running, Mode::Work) => TimerStatus::RunningWork,
            (Phase::Paused, Mode::Work) => TimerStatus::PausedWork,
            (Phase::Running, Mode::Break) => TimerStatus::RunningBreak,
            (Phase::Paused, Mode::Break) => TimerStatus::PausedBreak,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn display(&self) -> String {
        format_time(self.remaining_secs)
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn distractions(&self) -> u32 {
        self.distractions
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn prompt(&self) -> Option<Prompt> {
        self.prompt
    }

    /// Why the timer is paused. `None` unless paused.
    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.pause_reason
    }

    pub fn total_secs(&self) -> u64 {
        match self.mode {
            Mode::Work => u64::from(self.work_minutes) * 60,
            Mode::Break => u64::from(self.break_minutes) * 60,
        }
    }

    /// Seconds spent in the current interval.
    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs().saturating_sub(self.remaining_secs)
    }

    /// 1.0 at the start of an interval, 0.0 when it runs out.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / total as f64
    }

    /// Token for the tick source. `None` unless running.
    pub fn tick_token(&self) -> Option<TickToken> {
        self.is_running().then_some(TickToken(self.generation))
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.status(),
            remaining_secs: self.remaining_secs,
            display: self.display(),
            total_secs: self.total_secs(),
            progress: self.progress(),
            distractions: self.distractions,
            pause_count: self.pause_count,
            category: self.category.clone(),
            work_minutes: self.work_minutes,
            break_minutes: self.break_minutes,
            prompt: self.prompt,
            pause_reason: self.pause_reason,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start/pause button.
    ///
    /// Pausing a work interval counts toward `pause_count`. While a
    /// save/discard prompt is open the button does nothing.
    pub fn toggle(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Running => {
                if self.mode == Mode::Work {
                    self.pause_count += 1;
                }
                self.pause(PauseReason::Manual);
                tracing::debug!(pause_count = self.pause_count, "timer paused");
                Some(Event::TimerPaused {
                    reason: PauseReason::Manual,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            Phase::Idle | Phase::Paused => {
                if matches!(self.prompt, Some(Prompt::SaveOrDiscard { .. })) {
                    return None;
                }
                let resumed = self.phase == Phase::Paused;
                self.prompt = None;
                self.distracted = false;
                self.set_phase(Phase::Running);
                Some(if resumed {
                    Event::TimerResumed {
                        mode: self.mode,
                        remaining_secs: self.remaining_secs,
                        at: Utc::now(),
                    }
                } else {
                    Event::TimerStarted {
                        mode: self.mode,
                        remaining_secs: self.remaining_secs,
                        at: Utc::now(),
                    }
                })
            }
        }
    }

    /// One elapsed second. Stale tokens are ignored.
    pub fn tick(&mut self, token: TickToken) -> Option<Event> {
        if self.phase != Phase::Running || token.0 != self.generation {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.complete());
        }
        Some(Event::Ticked {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// React to an app lifecycle edge.
    ///
    /// Only a background edge during a running work interval counts as a
    /// distraction. Returning from such a distraction opens the
    /// finish/continue prompt.
    pub fn on_lifecycle(&mut self, event: LifecycleEvent) -> Option<Event> {
        match event {
            LifecycleEvent::Background => {
                if self.status() != TimerStatus::RunningWork {
                    return None;
                }
                self.distractions += 1;
                self.distracted = true;
                self.pause(PauseReason::Distraction);
                tracing::debug!(distractions = self.distractions, "distraction detected");
                Some(Event::DistractionDetected {
                    distractions: self.distractions,
                    at: Utc::now(),
                })
            }
            LifecycleEvent::Foreground => {
                if !self.distracted
                    || self.status() != TimerStatus::PausedWork
                    || self.prompt.is_some()
                {
                    return None;
                }
                self.prompt = Some(Prompt::Return);
                Some(Event::ReturnPrompted { at: Utc::now() })
            }
        }
    }

    /// Answer the return-from-distraction prompt.
    pub fn resolve_return(&mut self, choice: ReturnChoice) -> Result<Event, TimerError> {
        if self.prompt != Some(Prompt::Return) {
            return Err(TimerError::NoPendingPrompt { expected: "return" });
        }
        match choice {
            ReturnChoice::Finish => {
                let elapsed_secs = self.elapsed_secs();
                self.hard_reset();
                Ok(Event::SessionDiscarded {
                    elapsed_secs,
                    at: Utc::now(),
                })
            }
            ReturnChoice::Continue => {
                self.prompt = None;
                self.distracted = false;
                self.set_phase(Phase::Running);
                Ok(Event::TimerResumed {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Stop/reset button.
    ///
    /// A work interval with at least `min_significant_secs` elapsed opens the
    /// save/discard prompt and suspends ticking; anything shorter, and any
    /// break or idle timer, is reset without a record.
    pub fn stop(&mut self) -> Option<Event> {
        if matches!(self.prompt, Some(Prompt::SaveOrDiscard { .. })) {
            return None;
        }
        let in_work = self.mode == Mode::Work && self.phase != Phase::Idle;
        let elapsed_secs = self.elapsed_secs();
        if !in_work {
            return Some(self.hard_reset());
        }
        if elapsed_secs < self.min_significant_secs {
            tracing::debug!(elapsed_secs, "stop below threshold, discarding");
            self.hard_reset();
            return Some(Event::SessionDiscarded {
                elapsed_secs,
                at: Utc::now(),
            });
        }
        self.before_stop = Some(self.phase);
        if self.phase == Phase::Running {
            self.pause(PauseReason::StopPrompt);
        }
        self.prompt = Some(Prompt::SaveOrDiscard { elapsed_secs });
        Some(Event::StopPrompted {
            elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Answer the save/discard prompt opened by [`SessionTimer::stop`].
    pub fn resolve_stop(&mut self, choice: StopChoice) -> Result<Event, TimerError> {
        let Some(Prompt::SaveOrDiscard { elapsed_secs }) = self.prompt else {
            return Err(TimerError::NoPendingPrompt { expected: "stop" });
        };
        match choice {
            StopChoice::Save => {
                let record = self.make_record(elapsed_secs);
                self.hard_reset();
                Ok(Event::SessionSaved {
                    record,
                    at: Utc::now(),
                })
            }
            StopChoice::Discard => {
                self.hard_reset();
                Ok(Event::SessionDiscarded {
                    elapsed_secs,
                    at: Utc::now(),
                })
            }
            StopChoice::Cancel => {
                let restore = self.before_stop.take().unwrap_or(Phase::Paused);
                // A distraction prompt replaced by the stop prompt comes back.
                self.prompt = (self.distracted && restore == Phase::Paused)
                    .then_some(Prompt::Return);
                self.set_phase(restore);
                Ok(Event::StopCancelled {
                    status: self.status(),
                    at: Utc::now(),
                })
            }
        }
    }

    /// Accept the break offered after a completed work interval.
    pub fn start_break(&mut self) -> Result<Event, TimerError> {
        if self.prompt != Some(Prompt::StartBreak) {
            return Err(TimerError::NoPendingPrompt { expected: "break" });
        }
        self.prompt = None;
        self.mode = Mode::Break;
        self.remaining_secs = u64::from(self.break_minutes) * 60;
        self.set_phase(Phase::Running);
        Ok(Event::TimerStarted {
            mode: Mode::Break,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Accept the work interval offered after a completed break.
    pub fn start_work(&mut self) -> Result<Event, TimerError> {
        if self.prompt != Some(Prompt::StartWork) {
            return Err(TimerError::NoPendingPrompt { expected: "work" });
        }
        self.prompt = None;
        self.load_work();
        self.set_phase(Phase::Running);
        Ok(Event::TimerStarted {
            mode: Mode::Work,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Duration quick-select. Only allowed while idle.
    pub fn select_duration(&mut self, minutes: u32) -> Result<Event, TimerError> {
        self.ensure_idle("duration")?;
        validate_minutes(minutes)?;
        self.work_minutes = minutes;
        self.prompt = None;
        self.load_work();
        Ok(Event::DurationChanged {
            work_minutes: minutes,
            at: Utc::now(),
        })
    }

    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<Event, TimerError> {
        self.ensure_idle("break duration")?;
        validate_minutes(minutes)?;
        self.break_minutes = minutes;
        if self.mode == Mode::Break {
            self.remaining_secs = u64::from(minutes) * 60;
        }
        Ok(Event::BreakDurationChanged {
            break_minutes: minutes,
            at: Utc::now(),
        })
    }

    pub fn select_category(&mut self, category: &str) -> Result<Event, TimerError> {
        self.ensure_idle("category")?;
        self.category = category.to_string();
        Ok(Event::CategoryChanged {
            category: self.category.clone(),
            at: Utc::now(),
        })
    }

    /// Back to an idle, full-length work interval with zeroed counters.
    pub fn hard_reset(&mut self) -> Event {
        self.prompt = None;
        self.before_stop = None;
        self.load_work();
        self.set_phase(Phase::Idle);
        Event::TimerReset { at: Utc::now() }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.set_phase(Phase::Idle);
        match self.mode {
            Mode::Work => {
                let record = self.make_record(u64::from(self.work_minutes) * 60);
                self.load_work();
                self.prompt = Some(Prompt::StartBreak);
                tracing::debug!(record_id = record.id, "work interval completed");
                Event::WorkCompleted {
                    record,
                    at: Utc::now(),
                }
            }
            Mode::Break => {
                self.load_work();
                self.prompt = Some(Prompt::StartWork);
                Event::BreakCompleted { at: Utc::now() }
            }
        }
    }

    fn make_record(&mut self, duration: u64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: self.ids.next_id(now),
            duration: duration.min(u64::from(self.work_minutes) * 60),
            category: self.category.clone(),
            distractions: self.distractions,
            pause_count: self.pause_count,
            date: now,
        }
    }

    /// Fresh work interval: full duration, counters zeroed.
    fn load_work(&mut self) {
        self.mode = Mode::Work;
        self.remaining_secs = u64::from(self.work_minutes) * 60;
        self.distractions = 0;
        self.pause_count = 0;
        self.distracted = false;
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase != self.phase {
            self.generation += 1;
        }
        if phase != Phase::Paused {
            self.pause_reason = None;
        }
        self.phase = phase;
    }

    fn pause(&mut self, reason: PauseReason) {
        self.set_phase(Phase::Paused);
        self.pause_reason = Some(reason);
    }

    fn ensure_idle(&self, what: &'static str) -> Result<(), TimerError> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(TimerError::Busy { what })
        }
    }
}

fn validate_minutes(minutes: u32) -> Result<(), TimerError> {
    if minutes == 0 || minutes > MAX_MINUTES {
        return Err(TimerError::InvalidDuration { minutes });
    }
    Ok(())
}
