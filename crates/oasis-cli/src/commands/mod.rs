pub mod auth;
pub mod config;
pub mod dashboard;
pub mod focus;
pub mod history;
pub mod onboard;
pub mod prefs;

use std::sync::Arc;

use oasis_core::{Config, Database, MagicLinkAuth, PreferencesStore, RestRemote, SessionReporter};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub type Reporter = SessionReporter<MagicLinkAuth, RestRemote>;

pub fn open_store() -> Result<PreferencesStore<Database>, Box<dyn std::error::Error>> {
    Ok(PreferencesStore::open_default()?)
}

/// Auth collaborator with its session restored from the local database.
pub fn open_auth(config: &Config) -> Result<MagicLinkAuth, Box<dyn std::error::Error>> {
    Ok(MagicLinkAuth::with_database(config.remote.clone(), Database::open()?))
}

pub fn reporter(config: &Config) -> Result<Reporter, Box<dyn std::error::Error>> {
    Ok(SessionReporter::new(
        Arc::new(open_auth(config)?),
        Arc::new(RestRemote::new(config.remote.clone())),
    ))
}

/// Push the current preferences to the remote profile when signed in.
/// Failures are logged by the reporter and never fail the command.
pub async fn sync_profile<B: oasis_core::preferences::PreferencesBackend>(
    config: &Config,
    store: &PreferencesStore<B>,
) -> CmdResult {
    if !config.remote.is_configured() {
        return Ok(());
    }
    reporter(config)?
        .sync_profile(store.preferences().clone())
        .await?;
    Ok(())
}
