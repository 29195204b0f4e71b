use chrono::{Duration, Utc};
use oasis_core::dashboard::sum_minutes;
use oasis_core::Database;

use super::CmdResult;

pub fn run(days: u32) -> CmdResult {
    let db = Database::open()?;
    let since = Utc::now() - Duration::days(i64::from(days));
    let sessions = db.sessions_since(since)?;

    let summary = serde_json::json!({
        "days": days,
        "total_minutes": sum_minutes(&sessions),
        "sessions": sessions,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
