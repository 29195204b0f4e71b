use clap::Subcommand;
use oasis_core::preferences::validate_goal_minutes;
use oasis_core::{Config, GoalType, PreferencesPatch, RiskTime};

use super::{open_store, sync_profile, CmdResult};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print preferences as JSON
    Show,
    /// Update individual fields
    Set {
        #[arg(long)]
        name: Option<String>,
        /// focus, sleep, anxiety, productivity or presence
        #[arg(long, conflicts_with = "clear_goal")]
        goal: Option<GoalType>,
        /// Remove the primary goal
        #[arg(long)]
        clear_goal: bool,
        /// Comma-separated app names
        #[arg(long, value_delimiter = ',')]
        apps: Option<Vec<String>>,
        /// Comma-separated: morning, work, evening, late-night
        #[arg(long, value_delimiter = ',')]
        risks: Option<Vec<RiskTime>>,
        /// Daily screen-free goal in minutes (15-240, step 15)
        #[arg(long)]
        goal_minutes: Option<u32>,
    },
    /// Clear onboarding answers so onboarding runs again
    Reset,
}

pub async fn run(action: PrefsAction, config: &Config) -> CmdResult {
    let mut store = open_store()?;

    match action {
        PrefsAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.preferences())?);
        }
        PrefsAction::Set {
            name,
            goal,
            clear_goal,
            apps,
            risks,
            goal_minutes,
        } => {
            let mut patch = PreferencesPatch::default();
            if let Some(name) = name {
                patch = patch.name(name);
            }
            if goal.is_some() || clear_goal {
                patch = patch.primary_goal(goal);
            }
            if let Some(apps) = apps {
                patch = patch.problem_apps(apps.into_iter().filter(|a| !a.trim().is_empty()));
            }
            if let Some(risks) = risks {
                patch = patch.risk_times(risks);
            }
            if let Some(minutes) = goal_minutes {
                patch = patch.daily_screen_free_goal(validate_goal_minutes(minutes)?);
            }
            if patch.is_empty() {
                return Err("nothing to update".into());
            }

            store.update_preferences(patch)?;
            sync_profile(config, &store).await?;
            println!("{}", serde_json::to_string_pretty(store.preferences())?);
        }
        PrefsAction::Reset => {
            store.reset_progress()?;
            println!("onboarding progress reset");
        }
    }
    Ok(())
}
