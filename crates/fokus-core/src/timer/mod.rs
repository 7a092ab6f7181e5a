mod engine;
mod record;

pub use engine::{
    Mode, PauseReason, Phase, Prompt, ReturnChoice, SessionTimer, StopChoice, TickToken,
    TimerOptions, TimerStatus, MAX_MINUTES,
};
pub use record::{RecordIdGen, SessionRecord, FALLBACK_CATEGORY};
