//! Async host for a [`SessionTimer`].
//!
//! All timer mutations happen on the single task running
//! [`TimerDriver::run`]. Three sources feed it: a one-second ticker, user
//! commands and lifecycle edges. The ticker only fires while the timer is
//! running and is re-armed (first tick one full period later) every time the
//! timer enters running. Sources are polled in priority order, so a tick that
//! completes an interval is handled before a background edge that became
//! ready in the same turn.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::TimerError;
use crate::events::Event;
use crate::lifecycle::LifecycleEvent;
use crate::settings::FocusContext;
use crate::storage::KvStore;
use crate::timer::{Prompt, ReturnChoice, SessionTimer, StopChoice, TickToken};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A reply to whichever prompt is open when the command is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

/// User commands accepted by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Stop,
    ResolveStop(StopChoice),
    ResolveReturn(ReturnChoice),
    Answer(Answer),
    StartBreak,
    StartWork,
    SelectDuration(u32),
    SelectCategory(String),
    Snapshot,
    Shutdown,
}

pub type Outcome = Result<Event, TimerError>;

/// Owns the timer and the context it persists records through.
pub struct TimerDriver<S> {
    ctx: FocusContext<S>,
    timer: SessionTimer,
}

impl<S: KvStore> TimerDriver<S> {
    pub fn new(ctx: FocusContext<S>) -> Self {
        let timer = ctx.new_timer();
        Self { ctx, timer }
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn context(&self) -> &FocusContext<S> {
        &self.ctx
    }

    pub fn into_context(self) -> FocusContext<S> {
        self.ctx
    }

    /// Apply one command. `None` when the command changed nothing.
    pub fn handle(&mut self, command: Command) -> Option<Outcome> {
        let outcome = match command {
            Command::Toggle => Ok(self.timer.toggle()?),
            Command::Stop => Ok(self.timer.stop()?),
            Command::ResolveStop(choice) => self.timer.resolve_stop(choice),
            Command::ResolveReturn(choice) => self.timer.resolve_return(choice),
            Command::Answer(answer) => self.answer(answer),
            Command::StartBreak => self.timer.start_break(),
            Command::StartWork => self.timer.start_work(),
            Command::SelectDuration(minutes) => self.timer.select_duration(minutes),
            Command::SelectCategory(category) => {
                let outcome = self.timer.select_category(&category);
                if outcome.is_ok() {
                    self.ctx.set_category(&category);
                }
                outcome
            }
            Command::Snapshot => Ok(self.timer.snapshot()),
            Command::Shutdown => return None,
        };
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "command rejected");
        }
        Some(self.persist(outcome))
    }

    /// Map a yes/no/cancel reply onto the open prompt: save/discard/cancel
    /// for a stop, continue/finish after a distraction, accept for the
    /// break or work offers.
    fn answer(&mut self, answer: Answer) -> Outcome {
        match (self.timer.prompt(), answer) {
            (Some(Prompt::SaveOrDiscard { .. }), Answer::Yes) => {
                self.timer.resolve_stop(StopChoice::Save)
            }
            (Some(Prompt::SaveOrDiscard { .. }), Answer::No) => {
                self.timer.resolve_stop(StopChoice::Discard)
            }
            (Some(Prompt::SaveOrDiscard { .. }), Answer::Cancel) => {
                self.timer.resolve_stop(StopChoice::Cancel)
            }
            (Some(Prompt::Return), Answer::Yes) => {
                self.timer.resolve_return(ReturnChoice::Continue)
            }
            (Some(Prompt::Return), Answer::No) => self.timer.resolve_return(ReturnChoice::Finish),
            (Some(Prompt::StartBreak), Answer::Yes) => self.timer.start_break(),
            (Some(Prompt::StartWork), Answer::Yes) => self.timer.start_work(),
            (prompt, _) => Err(TimerError::NoPendingPrompt {
                expected: match prompt {
                    Some(Prompt::SaveOrDiscard { .. }) => "stop",
                    Some(Prompt::Return) => "return",
                    Some(Prompt::StartBreak) => "break",
                    Some(Prompt::StartWork) => "work",
                    None => "pending",
                },
            }),
        }
    }

    pub fn tick(&mut self, token: TickToken) -> Option<Event> {
        let event = self.timer.tick(token)?;
        self.persist(Ok(event)).ok()
    }

    pub fn lifecycle(&mut self, edge: LifecycleEvent) -> Option<Event> {
        let event = self.timer.on_lifecycle(edge)?;
        self.persist(Ok(event)).ok()
    }

    /// Saves are best-effort: a failed write is logged by the context and the
    /// event still goes out.
    fn persist(&self, outcome: Outcome) -> Outcome {
        if let Ok(event) = &outcome {
            if let Some(record) = event.record() {
                self.ctx.save_session(record);
            }
        }
        outcome
    }

    /// Run until `Shutdown`, the command channel closes, or the event
    /// receiver goes away. Returns the context for further use.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut lifecycle: mpsc::UnboundedReceiver<LifecycleEvent>,
        events: mpsc::Sender<Outcome>,
    ) -> FocusContext<S> {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut armed: Option<TickToken> = None;
        let mut lifecycle_open = true;

        loop {
            let token = self.timer.tick_token();
            if token != armed {
                if token.is_some() {
                    ticker.reset();
                }
                armed = token;
            }

            let outcome = tokio::select! {
                biased;

                _ = ticker.tick(), if armed.is_some() => {
                    armed.and_then(|t| self.tick(t)).map(Ok)
                }
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                edge = lifecycle.recv(), if lifecycle_open => match edge {
                    Some(edge) => self.lifecycle(edge).map(Ok),
                    None => {
                        lifecycle_open = false;
                        None
                    }
                },
            };

            if let Some(outcome) = outcome {
                if events.send(outcome).await.is_err() {
                    break;
                }
            }
        }

        tracing::debug!("timer driver stopped");
        self.ctx
    }
}
