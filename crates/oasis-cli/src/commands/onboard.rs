//! Interactive onboarding on stdin/stdout.

use std::io::{self, BufRead, Write};

use oasis_core::onboarding::{OnboardingFlow, OnboardingStep, PROBLEM_APPS};
use oasis_core::{Config, GoalType, RiskTime};

use super::{open_store, sync_profile, CmdResult};

pub async fn run(config: &Config) -> CmdResult {
    let mut store = open_store()?;
    if store.preferences().has_onboarded {
        println!("already onboarded; run `oasis prefs reset` to start over");
        return Ok(());
    }

    let flow = ask_all(&mut io::stdin().lock())?;
    let patch = flow.finish().ok_or("onboarding incomplete")?;
    store.complete_onboarding(patch)?;
    sync_profile(config, &store).await?;
    println!("\nAll set, {}.", store.preferences().name);
    Ok(())
}

fn ask_all(input: &mut impl BufRead) -> io::Result<OnboardingFlow> {
    let mut flow = OnboardingFlow::new();
    loop {
        let (step, total) = flow.progress();
        println!("\n[{step}/{total}]");
        match flow.step() {
            OnboardingStep::Name => {
                let name = ask(input, "What should we call you?")?;
                flow.set_name(name);
            }
            OnboardingStep::Goal => {
                for (i, goal) in GoalType::ALL.iter().enumerate() {
                    println!("  {}. {}", i + 1, goal.label());
                }
                let answer = ask(input, "What is your main goal?")?;
                if let Some(goal) = pick(&answer, &GoalType::ALL) {
                    flow.select_goal(goal);
                }
            }
            OnboardingStep::Habits => {
                for (i, app) in PROBLEM_APPS.iter().enumerate() {
                    println!("  {}. {app}", i + 1);
                }
                let answer = ask(input, "Which apps drain your energy? (comma-separated)")?;
                for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    match pick(part, &PROBLEM_APPS) {
                        Some(app) => {
                            flow.toggle_app(app);
                        }
                        None => {
                            flow.toggle_app(part);
                        }
                    }
                }

                for (i, risk) in RiskTime::ALL.iter().enumerate() {
                    println!("  {}. {}", i + 1, risk.label());
                }
                let answer = ask(input, "When are you most at risk? (comma-separated, optional)")?;
                for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    if let Some(risk) = pick(part, &RiskTime::ALL) {
                        flow.toggle_risk(risk);
                    }
                }
            }
            OnboardingStep::DailyGoal => {
                loop {
                    let answer = ask(
                        input,
                        &format!(
                            "Daily focus goal: {} min. '+' / '-' to adjust, enter to accept",
                            flow.daily_goal()
                        ),
                    )?;
                    match answer.as_str() {
                        "+" => {
                            flow.increase_goal();
                        }
                        "-" => {
                            flow.decrease_goal();
                        }
                        "" => break,
                        _ => println!("use '+', '-' or enter"),
                    }
                }
                break;
            }
        }

        if !flow.next() {
            println!("that step needs an answer");
        }
    }
    Ok(flow)
}

fn ask(input: &mut impl BufRead, prompt: &str) -> io::Result<String> {
    print!("{prompt} ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "onboarding cancelled"));
    }
    Ok(line.trim().to_string())
}

/// Match `answer` against a 1-based index or the item's text.
fn pick<T: Copy + ToString>(answer: &str, items: &[T]) -> Option<T> {
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| items.get(i)).copied();
    }
    items
        .iter()
        .find(|item| item.to_string().eq_ignore_ascii_case(answer))
        .copied()
}
