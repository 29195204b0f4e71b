//! Focus timer state machine.
//!
//! The timer counts whole seconds and has no internal thread. Something
//! else (usually [`TickScheduler`](super::TickScheduler)) calls `tick()`
//! once per second while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed -> Idle      (countdown reached zero)
//! Running | Paused -> Idle          (confirmed manual exit)
//! ```
//!
//! `Completed` is never observed through `state()`: the completing tick
//! finalizes the record and returns the timer to `Idle` in one step.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::SessionRecord;

/// Session lengths offered to the user, in minutes.
pub const FOCUS_DURATIONS: [u32; 3] = [25, 45, 60];

pub const FOCUS_QUOTES: [&str; 5] = [
    "Wherever you are, be all there.",
    "Deep measures of time for deep measures of thought.",
    "Focus is the art of knowing what to ignore.",
    "Silence is a source of great strength.",
    "Almost everything will work again if you unplug it for a few minutes.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FocusDuration {
    Short,
    Medium,
    Long,
}

impl FocusDuration {
    pub const ALL: [FocusDuration; 3] = [FocusDuration::Short, FocusDuration::Medium, FocusDuration::Long];

    pub fn minutes(self) -> u32 {
        match self {
            FocusDuration::Short => FOCUS_DURATIONS[0],
            FocusDuration::Medium => FOCUS_DURATIONS[1],
            FocusDuration::Long => FOCUS_DURATIONS[2],
        }
    }

    pub fn seconds(self) -> u32 {
        self.minutes() * 60
    }
}

impl Default for FocusDuration {
    fn default() -> Self {
        FocusDuration::Short
    }
}

impl TryFrom<u32> for FocusDuration {
    type Error = ValidationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        FocusDuration::ALL
            .into_iter()
            .find(|d| d.minutes() == minutes)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "duration".into(),
                message: format!("{minutes} is not one of 25, 45, 60"),
            })
    }
}

impl From<FocusDuration> for u32 {
    fn from(d: FocusDuration) -> u32 {
        d.minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Proof that the user was asked to confirm leaving the session.
///
/// Only valid for the session it was issued in.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an exit is only applied through `confirm_exit`"]
pub struct ExitConfirmation {
    generation: u64,
}

/// A single focus session countdown.
#[derive(Debug, Clone)]
pub struct FocusTimer<R: Rng = StdRng> {
    duration: FocusDuration,
    state: TimerState,
    time_left_secs: u32,
    quote: &'static str,
    /// Bumped on every start so stale exit confirmations are rejected.
    generation: u64,
    rng: R,
}

impl FocusTimer<StdRng> {
    pub fn new(duration: FocusDuration) -> Self {
        Self::with_rng(duration, StdRng::from_entropy())
    }
}

impl Default for FocusTimer<StdRng> {
    fn default() -> Self {
        Self::new(FocusDuration::default())
    }
}

impl<R: Rng> FocusTimer<R> {
    /// Create an idle timer that picks quotes from `rng`.
    pub fn with_rng(duration: FocusDuration, rng: R) -> Self {
        let mut timer = Self {
            duration,
            state: TimerState::Idle,
            time_left_secs: 0,
            quote: FOCUS_QUOTES[0],
            generation: 0,
            rng,
        };
        timer.enter_idle();
        timer
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> FocusDuration {
        self.duration
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    pub fn quote(&self) -> &'static str {
        self.quote
    }

    /// Running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running | TimerState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    /// 0.0 .. 1.0 elapsed fraction of the current countdown.
    pub fn progress(&self) -> f64 {
        let total = self.duration.seconds();
        if total == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.time_left_secs) / f64::from(total)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            duration_minutes: self.duration.minutes(),
            time_left_secs: self.time_left_secs,
            is_active: self.is_active(),
            is_paused: self.is_paused(),
            quote: self.quote.to_string(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the session length. Only honoured while idle.
    pub fn set_duration(&mut self, duration: FocusDuration) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.duration = duration;
        self.enter_idle();
        true
    }

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.generation += 1;
                tracing::debug!(duration = self.duration.minutes(), "focus session started");
                Some(Event::FocusStarted {
                    duration_minutes: self.duration.minutes(),
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Some(Event::FocusPaused {
                    time_left_secs: self.time_left_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Some(Event::FocusResumed {
                    time_left_secs: self.time_left_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            _ => None,
        }
    }

    /// Advance one second. Returns `Some(Event::FocusCompleted)` on the tick
    /// that reaches zero; every other tick returns `None`.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running || self.time_left_secs == 0 {
            return None;
        }

        self.time_left_secs -= 1;
        if self.time_left_secs > 0 {
            return None;
        }

        self.state = TimerState::Completed;
        let record = SessionRecord::completed(self.duration.minutes());
        tracing::info!(duration = record.duration_minutes, "focus session completed");
        self.enter_idle();
        Some(Event::FocusCompleted {
            record,
            at: Utc::now(),
        })
    }

    /// First half of a manual exit: ask before throwing the countdown away.
    pub fn request_exit(&self) -> Option<ExitConfirmation> {
        self.is_active().then_some(ExitConfirmation {
            generation: self.generation,
        })
    }

    /// Second half of a manual exit. Discards the countdown without a record.
    pub fn confirm_exit(&mut self, confirmation: ExitConfirmation) -> Option<Event> {
        if !self.is_active() || confirmation.generation != self.generation {
            return None;
        }
        let abandoned_secs = self.time_left_secs;
        tracing::debug!(abandoned_secs, "focus session exited");
        self.enter_idle();
        Some(Event::FocusExited {
            duration_minutes: self.duration.minutes(),
            time_left_secs: abandoned_secs,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_idle(&mut self) {
        self.state = TimerState::Idle;
        self.time_left_secs = self.duration.seconds();
        self.quote = FOCUS_QUOTES[self.rng.gen_range(0..FOCUS_QUOTES.len())];
    }
}

/// `MM:SS`, minutes not wrapped at 60.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
