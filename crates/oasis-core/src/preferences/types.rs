use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const GOAL_MINUTES_MIN: u32 = 15;
pub const GOAL_MINUTES_MAX: u32 = 240;
pub const GOAL_MINUTES_STEP: u32 = 15;
pub const DEFAULT_GOAL_MINUTES: u32 = 60;

/// What the user primarily wants out of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    Focus,
    Sleep,
    Anxiety,
    Productivity,
    Presence,
}

impl GoalType {
    pub const ALL: [GoalType; 5] = [
        GoalType::Focus,
        GoalType::Sleep,
        GoalType::Anxiety,
        GoalType::Productivity,
        GoalType::Presence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Focus => "focus",
            GoalType::Sleep => "sleep",
            GoalType::Anxiety => "anxiety",
            GoalType::Productivity => "productivity",
            GoalType::Presence => "presence",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalType::Focus => "Deep Focus",
            GoalType::Sleep => "Better Sleep",
            GoalType::Anxiety => "Reduce Anxiety",
            GoalType::Productivity => "Productivity",
            GoalType::Presence => "Be Present",
        }
    }
}

/// Times of day when the user tends to reach for their phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskTime {
    Morning,
    Work,
    Evening,
    LateNight,
}

impl RiskTime {
    pub const ALL: [RiskTime; 4] = [
        RiskTime::Morning,
        RiskTime::Work,
        RiskTime::Evening,
        RiskTime::LateNight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTime::Morning => "morning",
            RiskTime::Work => "work",
            RiskTime::Evening => "evening",
            RiskTime::LateNight => "late-night",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTime::Morning => "Morning Doomscroll",
            RiskTime::Work => "Work Distractions",
            RiskTime::Evening => "Evening Chill",
            RiskTime::LateNight => "Bedtime Revenge",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "primaryGoal".into(),
                message: format!("'{s}' is not one of focus, sleep, anxiety, productivity, presence"),
            })
    }
}

impl FromStr for RiskTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskTime::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "riskTimes".into(),
                message: format!("'{s}' is not one of morning, work, evening, late-night"),
            })
    }
}

/// The user's onboarding answers and goal configuration.
///
/// One record per install. Serialized flat in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub has_onboarded: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub primary_goal: Option<GoalType>,
    /// Selection order is kept for display.
    #[serde(default)]
    pub problem_apps: Vec<String>,
    #[serde(default)]
    pub risk_times: Vec<RiskTime>,
    /// Minutes per day.
    #[serde(default = "default_goal_minutes")]
    pub daily_screen_free_goal: u32,
}

fn default_goal_minutes() -> u32 {
    DEFAULT_GOAL_MINUTES
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            has_onboarded: false,
            name: String::new(),
            primary_goal: None,
            problem_apps: Vec::new(),
            risk_times: Vec::new(),
            daily_screen_free_goal: DEFAULT_GOAL_MINUTES,
        }
    }
}

impl UserPreferences {
    /// Field-wise overwrite. Fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(v) = patch.has_onboarded {
            self.has_onboarded = v;
        }
        if let Some(ref v) = patch.name {
            self.name = v.clone();
        }
        if let Some(v) = patch.primary_goal {
            self.primary_goal = v;
        }
        if let Some(ref v) = patch.problem_apps {
            self.problem_apps = dedup_keep_order(v.iter().cloned());
        }
        if let Some(ref v) = patch.risk_times {
            self.risk_times = dedup_keep_order(v.iter().copied());
        }
        if let Some(v) = patch.daily_screen_free_goal {
            self.daily_screen_free_goal = v;
        }
    }
}

/// A partial update. `None` means "leave as is".
///
/// `primary_goal` is doubly optional so a patch can clear the goal
/// (`Some(None)`) as well as leave it alone (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_onboarded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub primary_goal: Option<Option<GoalType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_apps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_times: Option<Vec<RiskTime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_screen_free_goal: Option<u32>,
}

impl PreferencesPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn primary_goal(mut self, goal: Option<GoalType>) -> Self {
        self.primary_goal = Some(goal);
        self
    }

    pub fn problem_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.problem_apps = Some(apps.into_iter().map(Into::into).collect());
        self
    }

    pub fn risk_times(mut self, times: impl IntoIterator<Item = RiskTime>) -> Self {
        self.risk_times = Some(times.into_iter().collect());
        self
    }

    pub fn daily_screen_free_goal(mut self, minutes: u32) -> Self {
        self.daily_screen_free_goal = Some(minutes);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Whether `minutes` lies on the 15-minute grid between 15 and 240.
pub fn is_valid_goal_minutes(minutes: u32) -> bool {
    (GOAL_MINUTES_MIN..=GOAL_MINUTES_MAX).contains(&minutes) && minutes % GOAL_MINUTES_STEP == 0
}

/// Checked conversion used by input surfaces; the store itself accepts anything.
pub fn validate_goal_minutes(minutes: u32) -> Result<u32, ValidationError> {
    if is_valid_goal_minutes(minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::OutOfRange {
            field: "dailyScreenFreeGoal".into(),
            value: i64::from(minutes),
            min: i64::from(GOAL_MINUTES_MIN),
            max: i64::from(GOAL_MINUTES_MAX),
        })
    }
}

fn dedup_keep_order<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let prefs = UserPreferences::default();
        assert!(!prefs.has_onboarded);
        assert!(prefs.name.is_empty());
        assert_eq!(prefs.primary_goal, None);
        assert!(prefs.problem_apps.is_empty());
        assert!(prefs.risk_times.is_empty());
        assert_eq!(prefs.daily_screen_free_goal, 60);
    }

    #[test]
    fn serializes_as_flat_camel_case_record() {
        let prefs = UserPreferences {
            has_onboarded: true,
            name: "Ada".into(),
            primary_goal: Some(GoalType::Sleep),
            problem_apps: vec!["TikTok".into()],
            risk_times: vec![RiskTime::LateNight],
            daily_screen_free_goal: 90,
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hasOnboarded": true,
                "name": "Ada",
                "primaryGoal": "sleep",
                "problemApps": ["TikTok"],
                "riskTimes": ["late-night"],
                "dailyScreenFreeGoal": 90
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let prefs: UserPreferences = serde_json::from_str(r#"{"name":"Sam"}"#).unwrap();
        assert_eq!(prefs.name, "Sam");
        assert_eq!(prefs.daily_screen_free_goal, 60);
        assert!(!prefs.has_onboarded);
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut prefs = UserPreferences::default();
        prefs.apply(&PreferencesPatch::default().name("Kai").daily_screen_free_goal(120));
        assert_eq!(prefs.name, "Kai");
        assert_eq!(prefs.daily_screen_free_goal, 120);
        assert_eq!(prefs.primary_goal, None);

        prefs.apply(&PreferencesPatch::default().primary_goal(Some(GoalType::Focus)));
        assert_eq!(prefs.name, "Kai");
        assert_eq!(prefs.primary_goal, Some(GoalType::Focus));
    }

    #[test]
    fn patch_can_clear_goal() {
        let mut prefs = UserPreferences {
            primary_goal: Some(GoalType::Presence),
            ..Default::default()
        };
        prefs.apply(&PreferencesPatch::default().primary_goal(None));
        assert_eq!(prefs.primary_goal, None);
    }

    #[test]
    fn patch_json_distinguishes_null_from_absent() {
        let clear: PreferencesPatch = serde_json::from_str(r#"{"primaryGoal":null}"#).unwrap();
        assert_eq!(clear.primary_goal, Some(None));

        let untouched: PreferencesPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(untouched.primary_goal, None);
    }

    #[test]
    fn duplicate_selections_collapse_in_order() {
        let mut prefs = UserPreferences::default();
        prefs.apply(
            &PreferencesPatch::default()
                .problem_apps(["Reddit", "News", "Reddit"])
                .risk_times([RiskTime::Work, RiskTime::Morning, RiskTime::Work]),
        );
        assert_eq!(prefs.problem_apps, vec!["Reddit", "News"]);
        assert_eq!(prefs.risk_times, vec![RiskTime::Work, RiskTime::Morning]);
    }

    #[test]
    fn parses_enum_values() {
        assert_eq!("late-night".parse::<RiskTime>().unwrap(), RiskTime::LateNight);
        assert_eq!("anxiety".parse::<GoalType>().unwrap(), GoalType::Anxiety);
        assert!("lunch".parse::<RiskTime>().is_err());
    }

    #[test]
    fn goal_minutes_grid() {
        assert!(is_valid_goal_minutes(15));
        assert!(is_valid_goal_minutes(240));
        assert!(!is_valid_goal_minutes(0));
        assert!(!is_valid_goal_minutes(50));
        assert!(!is_valid_goal_minutes(255));
        assert!(validate_goal_minutes(45).is_ok());
    }
}
