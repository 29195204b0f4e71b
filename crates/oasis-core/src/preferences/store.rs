use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{PreferencesPatch, UserPreferences};
use crate::error::{DatabaseError, StoreError};

/// Fixed key the record is persisted under.
pub const STORAGE_KEY: &str = "mindful-screen-storage";

/// Version written into the persisted envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Durable key-value storage for the preferences record.
pub trait PreferencesBackend {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove(&mut self, key: &str) -> Result<(), DatabaseError>;
}

/// In-process backend. Useful for tests and for embedding without a disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut backend = Self::default();
        backend.entries.insert(key.to_string(), value.to_string());
        backend
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of successful `save` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PreferencesBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DatabaseError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a UserPreferences,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    state: UserPreferences,
}

/// Handle returned by [`PreferencesStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&UserPreferences)>;

/// Owner of the preferences record.
///
/// Single writer: every mutation takes `&mut self`. Each one updates the
/// record in memory, writes it through to the backend and then notifies
/// every subscriber with the new state.
pub struct PreferencesStore<B: PreferencesBackend> {
    backend: B,
    state: UserPreferences,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl<B: PreferencesBackend> PreferencesStore<B> {
    /// Restore the record from `backend`, or create and persist defaults
    /// when nothing has been stored yet.
    ///
    /// # Errors
    /// Returns an error if the backend fails, the stored record cannot be
    /// parsed, or it was written by a newer schema version.
    pub fn open(mut backend: B) -> Result<Self, StoreError> {
        let state = match backend.load(STORAGE_KEY)? {
            Some(raw) => decode(&raw)?,
            None => {
                let state = UserPreferences::default();
                backend.save(STORAGE_KEY, &encode(&state)?)?;
                tracing::debug!(key = STORAGE_KEY, "created default preferences");
                state
            }
        };

        Ok(Self {
            backend,
            state,
            listeners: Vec::new(),
            next_id: 0,
        })
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Merge `patch` and mark onboarding as done.
    pub fn complete_onboarding(&mut self, patch: PreferencesPatch) -> Result<(), StoreError> {
        self.state.apply(&patch);
        self.state.has_onboarded = true;
        self.commit("complete_onboarding")
    }

    /// Merge `patch`. `has_onboarded` is left alone even if the patch sets it.
    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> Result<(), StoreError> {
        let has_onboarded = self.state.has_onboarded;
        self.state.apply(&patch);
        self.state.has_onboarded = has_onboarded;
        self.commit("update_preferences")
    }

    /// Clear the onboarding answers.
    ///
    /// `name` and `daily_screen_free_goal` survive a reset.
    pub fn reset_progress(&mut self) -> Result<(), StoreError> {
        self.state.has_onboarded = false;
        self.state.primary_goal = None;
        self.state.problem_apps.clear();
        self.state.risk_times.clear();
        self.commit("reset_progress")
    }

    /// Register a listener called after every mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&UserPreferences) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Remove the persisted record. The in-memory state is left as is.
    pub fn wipe(&mut self) -> Result<(), StoreError> {
        self.backend.remove(STORAGE_KEY)?;
        Ok(())
    }

    // Listeners run even when the write fails: in-memory state already moved.
    fn commit(&mut self, action: &'static str) -> Result<(), StoreError> {
        let written = encode(&self.state)
            .and_then(|raw| self.backend.save(STORAGE_KEY, &raw).map_err(StoreError::from));

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }

        match written {
            Ok(()) => {
                tracing::debug!(action, "preferences persisted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "failed to persist preferences");
                Err(e)
            }
        }
    }
}

fn encode(state: &UserPreferences) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        state,
    })?)
}

/// Accepts the versioned envelope or a bare record from before versioning.
fn decode(raw: &str) -> Result<UserPreferences, StoreError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let is_envelope = value.get("state").is_some() && value.get("version").is_some();
    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    if envelope.version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: envelope.version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(envelope.state)
}
