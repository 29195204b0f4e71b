//! User preferences: the onboarding answers and goal configuration.
//!
//! [`PreferencesStore`] owns the single [`UserPreferences`] record, applies
//! partial updates, writes through to a [`PreferencesBackend`] on every
//! mutation and notifies subscribers.

mod store;
mod types;

pub use store::{
    MemoryBackend, PreferencesBackend, PreferencesStore, SubscriptionId, SCHEMA_VERSION,
    STORAGE_KEY,
};
pub use types::{
    is_valid_goal_minutes, validate_goal_minutes, GoalType, PreferencesPatch, RiskTime,
    UserPreferences, DEFAULT_GOAL_MINUTES, GOAL_MINUTES_MAX, GOAL_MINUTES_MIN, GOAL_MINUTES_STEP,
};
