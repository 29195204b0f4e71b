//! Magic-link authentication.
//!
//! The app only needs three things from auth: who is signed in right now,
//! a way to email a login link, and a hook that fires when the signed-in
//! user changes. [`AuthProvider`] is that surface; [`MagicLinkAuth`] talks
//! to a hosted auth endpoint over HTTP.

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::AuthError;
use crate::storage::{Database, RemoteConfig};

/// kv key the signed-in session is kept under.
pub const SESSION_KEY: &str = "auth_session";

/// The authenticated user, as far as this client is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionIdentity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type SessionListener = Box<dyn Fn(Option<&SessionIdentity>) + Send + Sync>;

/// Auth collaborator used by the reporter and the CLI.
pub trait AuthProvider: Send + Sync {
    /// The current, unexpired session, if any.
    fn current_session(&self) -> Option<SessionIdentity>;

    /// Email a one-time login link.
    fn sign_in_with_link(&self, email: &str) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Called with the new session (or `None`) whenever it changes.
    fn on_session_change(&self, listener: SessionListener) -> ListenerId;
}

/// Shape check before a round trip: one `@`, something on each side,
/// a dot in the domain.
pub fn validate_email(email: &str) -> Result<&str, AuthError> {
    let email = email.trim();
    let invalid = || AuthError::InvalidEmail(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email)
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Longest token lifetime accepted from a callback: one year.
pub const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

/// Tokens carried in the magic-link redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// Pull the access token out of a redirect URL. Hosted auth puts it in the
/// fragment (`#access_token=..&expires_in=..`); the query string is checked
/// as a fallback. An `error_description` is surfaced as-is.
pub fn parse_callback(callback_url: &str) -> Result<CallbackTokens, AuthError> {
    let url = Url::parse(callback_url).map_err(|e| AuthError::InvalidCallback(e.to_string()))?;

    let fragment_pairs = url
        .fragment()
        .map(|f| url::form_urlencoded::parse(f.as_bytes()).into_owned().collect::<Vec<_>>())
        .unwrap_or_default();
    let query_pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let lookup = |name: &str| {
        fragment_pairs
            .iter()
            .chain(query_pairs.iter())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    if let Some(description) = lookup("error_description") {
        return Err(AuthError::InvalidCallback(description));
    }

    let access_token = lookup("access_token")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing access_token".into()))?;
    let expires_in = match lookup("expires_in") {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(secs) if (1..=MAX_EXPIRES_IN_SECS).contains(&secs) => Some(secs),
            _ => return Err(AuthError::InvalidCallback(format!("bad expires_in: {raw}"))),
        },
    };

    Ok(CallbackTokens {
        access_token,
        expires_in,
    })
}

/// HTTP magic-link auth with the session kept in the local database.
pub struct MagicLinkAuth {
    config: RemoteConfig,
    http: Client,
    sessions: Option<Mutex<Database>>,
    current: RwLock<Option<SessionIdentity>>,
    listeners: Mutex<Vec<(ListenerId, Arc<SessionListener>)>>,
    next_listener: Mutex<u64>,
}

impl MagicLinkAuth {
    /// Session lives in memory only.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            sessions: None,
            current: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(0),
        }
    }

    /// Restore the saved session from `db` and persist future changes to it.
    pub fn with_database(config: RemoteConfig, db: Database) -> Self {
        let restored = match db.kv_get(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<SessionIdentity>(&raw)
                .map_err(|e| tracing::warn!(error = %e, "discarding unreadable saved session"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved session");
                None
            }
        };

        let mut auth = Self::new(config);
        auth.current = RwLock::new(restored);
        auth.sessions = Some(Mutex::new(db));
        auth
    }

    fn base_url(&self) -> Result<&str, AuthError> {
        if !self.config.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        Ok(self.config.base_url.trim_end_matches('/'))
    }

    /// Finish the login: resolve the user behind the redirect's token,
    /// store the session and notify listeners.
    pub async fn complete_callback(&self, callback_url: &str) -> Result<SessionIdentity, AuthError> {
        let tokens = parse_callback(callback_url)?;
        let base = self.base_url()?;

        let resp = self
            .http
            .get(format!("{base}/auth/v1/user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, message });
        }

        let user: UserResponse = resp.json().await?;
        let expires_at = match tokens.expires_in {
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .ok_or_else(|| AuthError::InvalidCallback(format!("bad expires_in: {secs}")))?,
            ),
            None => None,
        };
        let identity = SessionIdentity {
            user_id: user.id,
            email: user.email,
            access_token: tokens.access_token,
            expires_at,
        };

        self.set_session(Some(identity.clone()))?;
        tracing::info!(user_id = %identity.user_id, "signed in");
        Ok(identity)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None)
    }

    fn set_session(&self, session: Option<SessionIdentity>) -> Result<(), AuthError> {
        if let Some(db) = &self.sessions {
            let db = db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match &session {
                Some(s) => {
                    let raw = serde_json::to_string(s)
                        .map_err(|e| AuthError::InvalidCallback(e.to_string()))?;
                    db.kv_set(SESSION_KEY, &raw)?;
                }
                None => db.kv_delete(SESSION_KEY)?,
            }
        }

        *self.current.write().unwrap_or_else(|p| p.into_inner()) = session.clone();

        // Snapshot so listeners can register/unregister from inside a callback.
        let listeners: Vec<Arc<SessionListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(session.as_ref());
        }
        Ok(())
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

impl AuthProvider for MagicLinkAuth {
    fn current_session(&self) -> Option<SessionIdentity> {
        let current = self.current.read().unwrap_or_else(|p| p.into_inner());
        current
            .as_ref()
            .filter(|s| !s.is_expired_at(Utc::now()))
            .cloned()
    }

    async fn sign_in_with_link(&self, email: &str) -> Result<(), AuthError> {
        let email = validate_email(email)?;
        let base = self.base_url()?;

        let body = json!({
            "email": email,
            "create_user": true,
            "options": { "email_redirect_to": self.config.redirect_url },
        });

        let resp = self
            .http
            .post(format!("{base}/auth/v1/otp"))
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            tracing::info!("login link sent");
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("msg")
                        .or_else(|| v.get("error_description"))
                        .or_else(|| v.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "Something went wrong".to_string());
            Err(AuthError::Rejected { status, message })
        }
    }

    fn on_session_change(&self, listener: SessionListener) -> ListenerId {
        let mut next = self.next_listener.lock().unwrap_or_else(|p| p.into_inner());
        let id = ListenerId(*next);
        *next += 1;
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((id, Arc::new(listener)));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(base_url: &str) -> RemoteConfig {
        RemoteConfig {
            base_url: base_url.to_string(),
            anon_key: "anon".into(),
            ..Default::default()
        }
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ada@example.com").is_ok());
        assert_eq!(validate_email("  ada@example.com ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "a@b@c.com", "a b@c.com"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn parses_fragment_tokens() {
        let tokens = parse_callback(
            "http://localhost:3000/auth/callback#access_token=abc&expires_in=3600&token_type=bearer",
        )
        .unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[test]
    fn callback_error_is_surfaced() {
        let err = parse_callback(
            "http://localhost:3000/auth/callback#error=access_denied&error_description=Email+link+is+invalid+or+has+expired",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid login callback: Email link is invalid or has expired"
        );
    }

    #[test]
    fn callback_lifetime_must_be_sane() {
        let base = "http://localhost:3000/auth/callback#access_token=abc&expires_in=";
        for bad in ["9223372036854775807", "-9223372036854775808", "0", "-60", "soon", "31536001"] {
            let err = parse_callback(&format!("{base}{bad}")).unwrap_err();
            assert!(matches!(err, AuthError::InvalidCallback(_)), "{bad}: {err}");
        }
        assert_eq!(
            parse_callback(&format!("{base}31536000")).unwrap().expires_in,
            Some(MAX_EXPIRES_IN_SECS)
        );
        assert_eq!(
            parse_callback("http://localhost:3000/auth/callback#access_token=abc")
                .unwrap()
                .expires_in,
            None
        );
    }

    #[test]
    fn callback_without_token_is_rejected() {
        assert!(parse_callback("http://localhost:3000/auth/callback").is_err());
        assert!(parse_callback("not a url").is_err());
    }

    #[test]
    fn expired_session_reads_as_signed_out() {
        let auth = MagicLinkAuth::new(config(""));
        *auth.current.write().unwrap() = Some(SessionIdentity {
            user_id: "u1".into(),
            email: None,
            access_token: "t".into(),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        });
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn unconfigured_endpoint_is_reported() {
        let auth = MagicLinkAuth::new(config(""));
        let err = auth.sign_in_with_link("ada@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::NotConfigured));
    }

    #[tokio::test]
    async fn invalid_email_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/auth/v1/otp").expect(0).create_async().await;

        let auth = MagicLinkAuth::new(config(&server.url()));
        let err = auth.sign_in_with_link("not-an-email").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sign_in_posts_email_and_redirect() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/otp")
            .match_header("apikey", "anon")
            .match_body(mockito::Matcher::PartialJson(json!({
                "email": "ada@example.com",
                "options": { "email_redirect_to": "http://localhost:3000/auth/callback" }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let auth = MagicLinkAuth::new(config(&server.url()));
        auth.sign_in_with_link("ada@example.com").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_sign_in_carries_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/otp")
            .with_status(429)
            .with_body(r#"{"msg":"For security purposes, you can only request this once every 60 seconds"}"#)
            .create_async()
            .await;

        let auth = MagicLinkAuth::new(config(&server.url()));
        let err = auth.sign_in_with_link("ada@example.com").await.unwrap_err();
        match err {
            AuthError::Rejected { status, message } => {
                assert_eq!(status, 429);
                assert!(message.starts_with("For security purposes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_lifetime_is_rejected_without_signing_in() {
        let mut server = mockito::Server::new_async().await;
        let user = server
            .mock("GET", "/auth/v1/user")
            .with_status(200)
            .with_body(r#"{"id":"user-42"}"#)
            .expect(0)
            .create_async()
            .await;

        let auth = MagicLinkAuth::new(config(&server.url()));
        let err = auth
            .complete_callback("http://localhost/cb#access_token=t&expires_in=9223372036854775807")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCallback(_)), "{err}");
        assert!(auth.current_session().is_none());
        user.assert_async().await;
    }

    #[tokio::test]
    async fn callback_signs_in_persists_and_notifies() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/v1/user")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body(r#"{"id":"user-42","email":"ada@example.com"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("oasis.db");
        let auth = MagicLinkAuth::with_database(config(&server.url()), Database::open_at(&db_path).unwrap());

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        auth.on_session_change(Box::new(move |s| {
            if s.is_some() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let identity = auth
            .complete_callback("http://localhost:3000/auth/callback#access_token=tok-1&expires_in=3600")
            .await
            .unwrap();
        assert_eq!(identity.user_id, "user-42");
        assert_eq!(auth.current_session().unwrap().user_id, "user-42");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A fresh instance restores the session from disk.
        let reopened = MagicLinkAuth::with_database(config(&server.url()), Database::open_at(&db_path).unwrap());
        assert_eq!(reopened.current_session(), Some(identity));

        reopened.sign_out().unwrap();
        assert!(reopened.current_session().is_none());
        let again = MagicLinkAuth::with_database(config(&server.url()), Database::open_at(&db_path).unwrap());
        assert!(again.current_session().is_none());
    }

    #[test]
    fn listeners_can_be_removed() {
        let auth = MagicLinkAuth::new(config(""));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = auth.on_session_change(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        auth.sign_out().unwrap();
        assert!(auth.remove_listener(id));
        auth.sign_out().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
