//! `oasis focus run`: a live countdown in the terminal.
//!
//! Keys (followed by enter): `p` pause/resume, `q` leave the session
//! (asks for confirmation). Ctrl-C leaves immediately.

use std::cell::RefCell;
use std::time::Duration;

use clap::Subcommand;
use oasis_core::report::{Delivery, SessionSink};
use oasis_core::timer::{format_clock, ExitConfirmation, FOCUS_DURATIONS};
use oasis_core::{
    Config, Database, Event, FocusDuration, FocusSessionController, FocusTimer, SessionRecord,
    TickScheduler,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{reporter, CmdResult, Reporter};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Run a focus session in the foreground
    Run {
        /// Session length in minutes: 25, 45 or 60 (default from config)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// List the session lengths on offer
    Durations,
}

/// Keeps a local history row and queues the upload.
struct HistorySink {
    db: Database,
    reporter: Reporter,
    uploads: RefCell<Vec<JoinHandle<Delivery>>>,
}

impl SessionSink for HistorySink {
    fn session_completed(&self, record: SessionRecord) {
        if let Err(e) = self.db.record_session(&record) {
            tracing::warn!(error = %e, "failed to record session locally");
        }
        self.uploads
            .borrow_mut()
            .push(self.reporter.report_session(record));
    }
}

pub async fn run(action: FocusAction, config: &Config) -> CmdResult {
    match action {
        FocusAction::Durations => {
            println!("{}", serde_json::to_string(&FOCUS_DURATIONS)?);
            Ok(())
        }
        FocusAction::Run { duration } => {
            let minutes = duration.unwrap_or(config.focus.default_duration);
            let duration = FocusDuration::try_from(minutes)?;
            run_session(duration, config).await
        }
    }
}

async fn run_session(duration: FocusDuration, config: &Config) -> CmdResult {
    let sink = HistorySink {
        db: Database::open()?,
        reporter: reporter(config)?,
        uploads: RefCell::new(Vec::new()),
    };
    let ticker = TickScheduler::new(Duration::from_millis(config.focus.tick_ms.max(1)));
    let mut controller = FocusSessionController::new(FocusTimer::new(duration), ticker, sink);

    eprintln!("\"{}\"", controller.timer().quote());
    print_event(controller.start())?;

    let mut lines = stdin_lines();
    let mut stdin_open = true;
    let mut pending_exit: Option<ExitConfirmation> = None;

    while controller.timer().is_active() {
        tokio::select! {
            event = controller.next_tick() => {
                match event {
                    Some(event) => print_event(Some(event))?,
                    None => eprint!("\r{} ", format_clock(controller.timer().time_left_secs())),
                }
            }
            line = lines.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                match (line.trim(), pending_exit.take()) {
                    ("y" | "Y", Some(confirmation)) => print_event(controller.confirm_exit(confirmation))?,
                    (_, Some(_)) => eprintln!("staying focused"),
                    ("p", None) => print_event(controller.toggle_pause())?,
                    ("q", None) => {
                        pending_exit = controller.request_exit();
                        eprintln!("Leave this session? Progress will be lost. [y/N]");
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if let Some(confirmation) = controller.request_exit() {
                    print_event(controller.confirm_exit(confirmation))?;
                }
            }
        }
    }

    eprintln!();
    let uploads = controller.sink().uploads.take();
    for upload in uploads {
        upload.await?;
    }
    Ok(())
}

/// Lines from stdin, read on a plain thread so a pending read never holds
/// up runtime shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_event(event: Option<Event>) -> CmdResult {
    if let Some(event) = event {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
