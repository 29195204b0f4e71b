//! Today's screen-free progress.
//!
//! Signed-in users see their remote profile and sessions. Otherwise, or when
//! the remote is unreachable, the local record and history are used.

use oasis_core::dashboard::{
    display_name, pick_prompt, start_of_local_day, sum_minutes, DailyProgress,
};
use oasis_core::{AuthProvider, Config, Database, RemoteStore, RestRemote, SessionIdentity};

use super::{open_auth, open_store, CmdResult};

struct Today {
    name: String,
    daily_goal: u32,
    minutes: u32,
    source: &'static str,
}

pub async fn run(config: &Config) -> CmdResult {
    let store = open_store()?;
    let prefs = store.preferences();
    let since = start_of_local_day(chrono::Utc::now());

    let local = Today {
        name: prefs.name.clone(),
        daily_goal: prefs.daily_screen_free_goal,
        minutes: Database::open()?.minutes_since(since)?,
        source: "local",
    };

    let today = match open_auth(config)?.current_session() {
        Some(identity) => {
            let fallback = (local.name.clone(), local.daily_goal);
            match remote_today(config, &identity, since, fallback).await {
                Ok(today) => today,
                Err(e) => {
                    tracing::warn!(error = %e, "remote unavailable, showing local progress");
                    local
                }
            }
        }
        None => local,
    };

    let progress = DailyProgress::new(today.minutes, today.daily_goal);
    let summary = serde_json::json!({
        "name": display_name(&today.name),
        "screen_free_minutes": progress.screen_free_minutes,
        "daily_goal": progress.daily_goal,
        "progress_pct": progress.progress_pct(),
        "remaining_minutes": progress.remaining_minutes(),
        "goal_met": progress.goal_met(),
        "prompt": pick_prompt(&mut rand::thread_rng()),
        "source": today.source,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn remote_today(
    config: &Config,
    identity: &SessionIdentity,
    since: chrono::DateTime<chrono::Utc>,
    (local_name, local_goal): (String, u32),
) -> Result<Today, oasis_core::RemoteError> {
    let remote = RestRemote::new(config.remote.clone());
    let profile = remote.fetch_profile(identity).await?;
    let sessions = remote.sessions_since(identity, since).await?;

    let (name, daily_goal) = match profile {
        Some(p) => (
            p.full_name.filter(|n| !n.trim().is_empty()).unwrap_or(local_name),
            p.daily_goal_minutes.filter(|m| *m > 0).unwrap_or(local_goal),
        ),
        None => (local_name, local_goal),
    };

    Ok(Today {
        name,
        daily_goal,
        minutes: sum_minutes(&sessions),
        source: "remote",
    })
}
