//! # Oasis Core Library
//!
//! Business logic for Oasis, a calm companion for healthier screen habits.
//! The `oasis` CLI is a thin front end over this crate.
//!
//! ## Architecture
//!
//! - **Preferences Store**: the single persisted record of onboarding answers
//!   and the daily goal, with write-through persistence and change listeners
//! - **Focus Timer**: a second-granularity countdown state machine driven by a
//!   tokio tick scheduler
//! - **Storage**: SQLite key-value and session history, TOML configuration
//! - **Collaborators**: magic-link auth and a PostgREST-style remote store,
//!   both behind traits
//!
//! ## Key Components
//!
//! - [`PreferencesStore`]: preferences state container
//! - [`FocusSessionController`]: timer plus tick scheduler plus reporter
//! - [`Database`]: local persistence
//! - [`Config`]: application configuration management

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod logging;
pub mod onboarding;
pub mod preferences;
pub mod remote;
pub mod report;
pub mod session;
pub mod storage;
pub mod timer;

pub use auth::{AuthProvider, MagicLinkAuth, SessionIdentity};
pub use dashboard::DailyProgress;
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, RemoteError, StoreError, ValidationError};
pub use events::Event;
pub use onboarding::{OnboardingFlow, OnboardingStep};
pub use preferences::{GoalType, PreferencesPatch, PreferencesStore, RiskTime, UserPreferences};
pub use remote::{RemoteStore, RestRemote};
pub use report::{SessionReporter, SessionSink};
pub use session::FocusSessionController;
pub use storage::{Config, Database, SessionRecord};
pub use timer::{FocusDuration, FocusTimer, TickScheduler, TimerState};
