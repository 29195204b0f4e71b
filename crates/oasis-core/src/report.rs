//! Fire-and-forget delivery of completed sessions and profile updates.
//!
//! Each call spawns a detached task and returns immediately. The task looks
//! up the signed-in identity at delivery time; with nobody signed in the
//! payload is dropped. Failures are logged and never retried.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::auth::AuthProvider;
use crate::preferences::UserPreferences;
use crate::remote::{ProfileRow, RemoteStore};
use crate::storage::SessionRecord;

/// What happened to a delivery. Only tests look at this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NoIdentity,
    Failed,
}

/// Receives completed focus sessions from the session controller.
pub trait SessionSink {
    fn session_completed(&self, record: SessionRecord);
}

pub struct SessionReporter<A, R> {
    auth: Arc<A>,
    remote: Arc<R>,
}

impl<A, R> Clone for SessionReporter<A, R> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<A, R> SessionReporter<A, R>
where
    A: AuthProvider + 'static,
    R: RemoteStore + 'static,
{
    pub fn new(auth: Arc<A>, remote: Arc<R>) -> Self {
        Self { auth, remote }
    }

    /// Spawn the upload of `record`. Must be called within a tokio runtime.
    pub fn report_session(&self, record: SessionRecord) -> JoinHandle<Delivery> {
        let auth = Arc::clone(&self.auth);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let Some(identity) = auth.current_session() else {
                tracing::debug!(duration = record.duration_minutes, "not signed in, session not uploaded");
                return Delivery::NoIdentity;
            };
            match remote.insert_focus_session(&identity, &record).await {
                Ok(()) => {
                    tracing::debug!(duration = record.duration_minutes, "session uploaded");
                    Delivery::Sent
                }
                Err(e) => {
                    tracing::warn!(error = %e, "error saving session");
                    Delivery::Failed
                }
            }
        })
    }

    /// Spawn a profile upsert built from `prefs`.
    pub fn sync_profile(&self, prefs: UserPreferences) -> JoinHandle<Delivery> {
        let auth = Arc::clone(&self.auth);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let Some(identity) = auth.current_session() else {
                return Delivery::NoIdentity;
            };
            let row = ProfileRow::from_preferences(&identity, &prefs);
            match remote.upsert_profile(&identity, &row).await {
                Ok(()) => Delivery::Sent,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to sync profile");
                    Delivery::Failed
                }
            }
        })
    }
}

impl<A, R> SessionSink for SessionReporter<A, R>
where
    A: AuthProvider + 'static,
    R: RemoteStore + 'static,
{
    fn session_completed(&self, record: SessionRecord) {
        // The timer never waits on the upload.
        drop(self.report_session(record));
    }
}
