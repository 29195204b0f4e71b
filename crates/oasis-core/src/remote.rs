//! Remote persistence for profiles and completed focus sessions.
//!
//! Talks to a PostgREST-style endpoint (`/rest/v1/<table>`). Every call is
//! made on behalf of a signed-in [`SessionIdentity`].

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::auth::SessionIdentity;
use crate::error::RemoteError;
use crate::preferences::UserPreferences;
use crate::storage::{RemoteConfig, SessionRecord};

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub primary_goal: Option<String>,
    #[serde(default)]
    pub risk_times: Vec<String>,
    #[serde(default)]
    pub daily_goal_minutes: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
    pub fn from_preferences(identity: &SessionIdentity, prefs: &UserPreferences) -> Self {
        Self {
            id: identity.user_id.clone(),
            full_name: Some(prefs.name.clone()),
            primary_goal: prefs.primary_goal.map(|g| g.as_str().to_string()),
            risk_times: prefs.risk_times.iter().map(|r| r.as_str().to_string()).collect(),
            daily_goal_minutes: Some(prefs.daily_screen_free_goal),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Row of the `focus_sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FocusSessionRow {
    user_id: String,
    duration_minutes: u32,
    completed: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Remote database collaborator.
pub trait RemoteStore: Send + Sync {
    fn upsert_profile(
        &self,
        identity: &SessionIdentity,
        profile: &ProfileRow,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn insert_focus_session(
        &self,
        identity: &SessionIdentity,
        record: &SessionRecord,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn fetch_profile(
        &self,
        identity: &SessionIdentity,
    ) -> impl Future<Output = Result<Option<ProfileRow>, RemoteError>> + Send;

    /// Completed sessions created at or after `since`.
    fn sessions_since(
        &self,
        identity: &SessionIdentity,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<SessionRecord>, RemoteError>> + Send;
}

/// HTTP implementation against `/rest/v1`.
#[derive(Clone)]
pub struct RestRemote {
    config: RemoteConfig,
    http: Client,
}

impl RestRemote {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> Result<String, RemoteError> {
        if !self.config.is_configured() {
            return Err(RemoteError::NotConfigured);
        }
        Ok(format!(
            "{}/rest/v1/{table}",
            self.config.base_url.trim_end_matches('/')
        ))
    }

    fn authorized(&self, builder: RequestBuilder, identity: &SessionIdentity) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&identity.access_token)
    }
}

async fn check(resp: Response) -> Result<Response, RemoteError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::Status { status, body })
    }
}

impl RemoteStore for RestRemote {
    async fn upsert_profile(
        &self,
        identity: &SessionIdentity,
        profile: &ProfileRow,
    ) -> Result<(), RemoteError> {
        let url = self.table_url("profiles")?;
        let req = self
            .authorized(self.http.post(url), identity)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile);
        check(req.send().await?).await?;
        Ok(())
    }

    async fn insert_focus_session(
        &self,
        identity: &SessionIdentity,
        record: &SessionRecord,
    ) -> Result<(), RemoteError> {
        let url = self.table_url("focus_sessions")?;
        let row = FocusSessionRow {
            user_id: identity.user_id.clone(),
            duration_minutes: record.duration_minutes,
            completed: record.completed,
            created_at: None,
        };
        let req = self
            .authorized(self.http.post(url), identity)
            .header("Prefer", "return=minimal")
            .json(&row);
        check(req.send().await?).await?;
        Ok(())
    }

    async fn fetch_profile(
        &self,
        identity: &SessionIdentity,
    ) -> Result<Option<ProfileRow>, RemoteError> {
        let url = self.table_url("profiles")?;
        let id_filter = format!("eq.{}", identity.user_id);
        let req = self
            .authorized(self.http.get(url), identity)
            .query(&[("select", "*"), ("id", id_filter.as_str())]);
        let rows: Vec<ProfileRow> = check(req.send().await?).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn sessions_since(
        &self,
        identity: &SessionIdentity,
        since: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, RemoteError> {
        let url = self.table_url("focus_sessions")?;
        let user_filter = format!("eq.{}", identity.user_id);
        let since_filter = format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true));
        let req = self.authorized(self.http.get(url), identity).query(&[
            ("select", "user_id,duration_minutes,completed,created_at"),
            ("user_id", user_filter.as_str()),
            ("created_at", since_filter.as_str()),
        ]);
        let rows: Vec<FocusSessionRow> = check(req.send().await?).await?.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| SessionRecord {
                duration_minutes: row.duration_minutes,
                completed: row.completed,
                completed_at: row.created_at.unwrap_or(since),
            })
            .collect())
    }
}
