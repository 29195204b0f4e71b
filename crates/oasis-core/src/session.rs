//! Drives one [`FocusTimer`] from a [`TickScheduler`].
//!
//! The controller keeps the scheduler armed exactly while the timer is
//! running and hands each completed session to a [`SessionSink`].

use rand::Rng;
use rand::rngs::StdRng;

use crate::events::Event;
use crate::report::SessionSink;
use crate::timer::{ExitConfirmation, FocusDuration, FocusTimer, TickScheduler, TimerState};

pub struct FocusSessionController<S: SessionSink, R: Rng = StdRng> {
    timer: FocusTimer<R>,
    ticker: TickScheduler,
    sink: S,
}

impl<S: SessionSink, R: Rng> FocusSessionController<S, R> {
    pub fn new(timer: FocusTimer<R>, ticker: TickScheduler, sink: S) -> Self {
        Self {
            timer,
            ticker,
            sink,
        }
    }

    pub fn timer(&self) -> &FocusTimer<R> {
        &self.timer
    }

    pub fn ticker(&self) -> &TickScheduler {
        &self.ticker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn set_duration(&mut self, duration: FocusDuration) -> bool {
        self.timer.set_duration(duration)
    }

    pub fn start(&mut self) -> Option<Event> {
        let event = self.timer.start();
        self.sync_ticker();
        event
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.timer.pause();
        self.sync_ticker();
        event
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.timer.resume();
        self.sync_ticker();
        event
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        let event = self.timer.toggle_pause();
        self.sync_ticker();
        event
    }

    pub fn request_exit(&self) -> Option<ExitConfirmation> {
        self.timer.request_exit()
    }

    pub fn confirm_exit(&mut self, confirmation: ExitConfirmation) -> Option<Event> {
        let event = self.timer.confirm_exit(confirmation);
        self.sync_ticker();
        event
    }

    /// Apply one tick. On completion the ticker is disarmed before the
    /// record goes to the sink.
    pub fn on_tick(&mut self) -> Option<Event> {
        let event = self.timer.tick();
        self.sync_ticker();
        if let Some(record) = event.as_ref().and_then(Event::completed_record) {
            self.sink.session_completed(record.clone());
        }
        event
    }

    /// Wait for the scheduler and apply the tick. Pending forever while the
    /// timer is not running.
    pub async fn next_tick(&mut self) -> Option<Event> {
        self.ticker.next_tick().await;
        self.on_tick()
    }

    /// Tick until the session completes. Returns `None` right away if the
    /// timer is not active, and keeps waiting while it is paused.
    pub async fn run_to_completion(&mut self) -> Option<Event> {
        while self.timer.is_active() {
            if let Some(event @ Event::FocusCompleted { .. }) = self.next_tick().await {
                return Some(event);
            }
        }
        None
    }

    fn sync_ticker(&mut self) {
        if self.timer.state() == TimerState::Running {
            self.ticker.arm();
        } else {
            self.ticker.disarm();
        }
    }
}
