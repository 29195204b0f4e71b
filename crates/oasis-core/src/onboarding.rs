//! Four-step onboarding wizard.
//!
//! Collects the answers held in [`UserPreferences`](crate::preferences::UserPreferences)
//! one screen at a time:
//!
//! 1. name
//! 2. primary goal
//! 3. problem apps and risk times
//! 4. daily screen-free goal
//!
//! The wizard only gathers answers. [`OnboardingFlow::finish`] turns them into
//! a [`PreferencesPatch`] for
//! [`PreferencesStore::complete_onboarding`](crate::preferences::PreferencesStore::complete_onboarding).

use serde::{Deserialize, Serialize};

use crate::preferences::{
    GoalType, PreferencesPatch, RiskTime, DEFAULT_GOAL_MINUTES, GOAL_MINUTES_MAX,
    GOAL_MINUTES_MIN, GOAL_MINUTES_STEP,
};

/// Apps offered on the problem-apps screen.
pub const PROBLEM_APPS: [&str; 8] = [
    "Instagram",
    "TikTok",
    "Twitter/X",
    "YouTube",
    "Facebook",
    "Reddit",
    "News",
    "Email",
];

pub const TOTAL_STEPS: u8 = 4;

/// A screen of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Name,
    Goal,
    Habits,
    DailyGoal,
}

impl OnboardingStep {
    /// 1-based position.
    pub fn number(self) -> u8 {
        match self {
            OnboardingStep::Name => 1,
            OnboardingStep::Goal => 2,
            OnboardingStep::Habits => 3,
            OnboardingStep::DailyGoal => 4,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            OnboardingStep::Name => Some(OnboardingStep::Goal),
            OnboardingStep::Goal => Some(OnboardingStep::Habits),
            OnboardingStep::Habits => Some(OnboardingStep::DailyGoal),
            OnboardingStep::DailyGoal => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            OnboardingStep::Name => None,
            OnboardingStep::Goal => Some(OnboardingStep::Name),
            OnboardingStep::Habits => Some(OnboardingStep::Goal),
            OnboardingStep::DailyGoal => Some(OnboardingStep::Habits),
        }
    }
}

/// In-progress answers plus the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingFlow {
    step: OnboardingStep,
    name: String,
    goal: Option<GoalType>,
    apps: Vec<String>,
    risks: Vec<RiskTime>,
    daily_goal: u32,
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::Name,
            name: String::new(),
            goal: None,
            apps: Vec::new(),
            risks: Vec::new(),
            daily_goal: DEFAULT_GOAL_MINUTES,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    /// `(current, total)`, both 1-based.
    pub fn progress(&self) -> (u8, u8) {
        (self.step.number(), TOTAL_STEPS)
    }

    pub fn is_last_step(&self) -> bool {
        self.step == OnboardingStep::DailyGoal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goal(&self) -> Option<GoalType> {
        self.goal
    }

    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    pub fn risks(&self) -> &[RiskTime] {
        &self.risks
    }

    pub fn daily_goal(&self) -> u32 {
        self.daily_goal
    }

    // ── Answers ──────────────────────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn select_goal(&mut self, goal: GoalType) {
        self.goal = Some(goal);
    }

    /// Select `app`, or deselect it if already selected. Returns whether
    /// the app is selected afterwards.
    pub fn toggle_app(&mut self, app: &str) -> bool {
        toggle(&mut self.apps, app.to_string())
    }

    pub fn toggle_risk(&mut self, risk: RiskTime) -> bool {
        toggle(&mut self.risks, risk)
    }

    pub fn increase_goal(&mut self) -> u32 {
        self.daily_goal = (self.daily_goal + GOAL_MINUTES_STEP).min(GOAL_MINUTES_MAX);
        self.daily_goal
    }

    pub fn decrease_goal(&mut self) -> u32 {
        self.daily_goal = self
            .daily_goal
            .saturating_sub(GOAL_MINUTES_STEP)
            .max(GOAL_MINUTES_MIN);
        self.daily_goal
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Whether the current screen has enough answers to move on.
    pub fn is_step_valid(&self) -> bool {
        match self.step {
            OnboardingStep::Name => !self.name.trim().is_empty(),
            OnboardingStep::Goal => self.goal.is_some(),
            OnboardingStep::Habits => !self.apps.is_empty(),
            OnboardingStep::DailyGoal => true,
        }
    }

    /// Move forward one screen. Refused on an invalid screen and on the last
    /// screen, where [`finish`](Self::finish) applies instead.
    pub fn next(&mut self) -> bool {
        if !self.is_step_valid() {
            return false;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Collected answers as a patch. `None` until the last screen is reached.
    pub fn finish(&self) -> Option<PreferencesPatch> {
        if !self.is_last_step() || !self.is_step_valid() {
            return None;
        }
        Some(
            PreferencesPatch::default()
                .name(self.name.trim())
                .primary_goal(self.goal)
                .problem_apps(self.apps.iter().cloned())
                .risk_times(self.risks.iter().copied())
                .daily_screen_free_goal(self.daily_goal),
        )
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if let Some(pos) = items.iter().position(|i| *i == item) {
        items.remove(pos);
        false
    } else {
        items.push(item);
        true
    }
}
