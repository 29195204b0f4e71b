//! Daily summary shown on the dashboard.

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone, Utc};
use rand::Rng;
use serde::Serialize;

use crate::storage::SessionRecord;

pub const MINDFUL_PROMPTS: [&str; 5] = [
    "Take three deep breaths right now.",
    "Look away from the screen for 20 seconds.",
    "Unclench your jaw and drop your shoulders.",
    "Notice 3 things you can hear around you.",
    "Drink a glass of water.",
];

/// Name used when the user never gave one.
pub const FALLBACK_NAME: &str = "Friend";

/// Screen-free minutes against the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyProgress {
    pub screen_free_minutes: u32,
    pub daily_goal: u32,
}

impl DailyProgress {
    pub fn new(screen_free_minutes: u32, daily_goal: u32) -> Self {
        Self {
            screen_free_minutes,
            daily_goal,
        }
    }

    /// Percent of the goal reached, capped at 100. A zero goal reads as 0.
    pub fn progress_pct(&self) -> f64 {
        if self.daily_goal == 0 {
            return 0.0;
        }
        (f64::from(self.screen_free_minutes) / f64::from(self.daily_goal) * 100.0).min(100.0)
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.daily_goal.saturating_sub(self.screen_free_minutes)
    }

    pub fn goal_met(&self) -> bool {
        self.screen_free_minutes >= self.daily_goal
    }
}

/// Total minutes of the completed sessions in `sessions`.
pub fn sum_minutes(sessions: &[SessionRecord]) -> u32 {
    sessions
        .iter()
        .filter(|s| s.completed)
        .map(|s| s.duration_minutes)
        .sum()
}

pub fn display_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        FALLBACK_NAME
    } else {
        trimmed
    }
}

pub fn pick_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MINDFUL_PROMPTS[rng.gen_range(0..MINDFUL_PROMPTS.len())]
}

/// Local midnight of the day containing `now`, as UTC.
///
/// Falls back to `now` minus 24 hours when local midnight does not exist
/// (a DST gap at 00:00).
pub fn start_of_local_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&Local).date_naive();
    let midnight = local_date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => now - chrono::Duration::hours(24),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn progress_caps_at_hundred() {
        let p = DailyProgress::new(90, 60);
        assert_eq!(p.progress_pct(), 100.0);
        assert_eq!(p.remaining_minutes(), 0);
        assert!(p.goal_met());
    }

    #[test]
    fn partial_progress() {
        let p = DailyProgress::new(45, 60);
        assert_eq!(p.progress_pct(), 75.0);
        assert_eq!(p.remaining_minutes(), 15);
        assert!(!p.goal_met());
    }

    #[test]
    fn zero_goal_is_zero_percent() {
        assert_eq!(DailyProgress::new(30, 0).progress_pct(), 0.0);
    }

    #[test]
    fn sum_ignores_incomplete() {
        let mut abandoned = SessionRecord::completed(60);
        abandoned.completed = false;
        let sessions = [SessionRecord::completed(25), SessionRecord::completed(45), abandoned];
        assert_eq!(sum_minutes(&sessions), 70);
        assert_eq!(sum_minutes(&[]), 0);
    }

    #[test]
    fn blank_name_falls_back() {
        assert_eq!(display_name(""), "Friend");
        assert_eq!(display_name("  "), "Friend");
        assert_eq!(display_name(" Noor "), "Noor");
    }

    #[test]
    fn prompt_comes_from_list() {
        let mut rng = Pcg64::seed_from_u64(3);
        for _ in 0..20 {
            assert!(MINDFUL_PROMPTS.contains(&pick_prompt(&mut rng)));
        }
    }

    #[test]
    fn start_of_day_is_not_after_now() {
        let now = Utc::now();
        let start = start_of_local_day(now);
        assert!(start <= now);
        assert!(now - start <= chrono::Duration::hours(25));
    }
}
