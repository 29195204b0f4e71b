mod engine;
mod ticker;

pub use engine::{
    format_clock, ExitConfirmation, FocusDuration, FocusTimer, TimerState, FOCUS_DURATIONS,
    FOCUS_QUOTES,
};
pub use ticker::{TickScheduler, DEFAULT_TICK_PERIOD};
