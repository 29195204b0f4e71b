use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;
use crate::timer::TimerState;

/// Every focus timer state change produces an Event.
/// The CLI prints them; the session controller forwards completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    FocusStarted {
        duration_minutes: u32,
        at: DateTime<Utc>,
    },
    FocusPaused {
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    FocusResumed {
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the record has been finalized.
    FocusCompleted {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    /// User confirmed leaving the session early. No record is produced.
    FocusExited {
        duration_minutes: u32,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        duration_minutes: u32,
        time_left_secs: u32,
        is_active: bool,
        is_paused: bool,
        quote: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The completed record, if this is a completion.
    pub fn completed_record(&self) -> Option<&SessionRecord> {
        match self {
            Event::FocusCompleted { record, .. } => Some(record),
            _ => None,
        }
    }
}
