//! Named bot scenarios selectable from the command line.

use anyhow::ensure;

use crate::logic::{BotPlan, PlayStyle, RunSummary};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub plan: BotPlan,
}

impl Scenario {
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, plan: BotPlan) -> Self {
        Self {
            name,
            description,
            plan,
        }
    }
}

fn every_level_completes(s: &RunSummary) -> anyhow::Result<()> {
    ensure!(s.load_failures == 0, "{} level loads failed", s.load_failures);
    ensure!(
        s.levels_completed == s.levels_started,
        "completed {} of {} levels",
        s.levels_completed,
        s.levels_started
    );
    Ok(())
}

fn smoke() -> Scenario {
    Scenario::new(
        "smoke",
        "Spell every word on three levels",
        BotPlan::new(PlayStyle::Tiles)
            .with_levels(3)
            .with_expectation(every_level_completes)
            .with_expectation(|s: &RunSummary| {
                ensure!(s.unlocked("first_word"), "first word achievement missing");
                ensure!(
                    s.awards_matching("Level Completed") == u64::from(s.levels_completed),
                    "level completion paid {} times for {} levels",
                    s.awards_matching("Level Completed"),
                    s.levels_completed
                );
                Ok(())
            }),
    )
}

fn perfect() -> Scenario {
    Scenario::new(
        "perfect",
        "Instant clears earn perfect and speed bonuses",
        BotPlan::new(PlayStyle::Tiles)
            .with_levels(2)
            .with_pace(0)
            .with_expectation(every_level_completes)
            .with_expectation(|s: &RunSummary| {
                ensure!(s.perfect_levels == s.levels_completed, "missed a perfect level");
                ensure!(
                    s.awards_matching("Speed Bonus") == u64::from(s.levels_completed),
                    "speed bonus paid {} times",
                    s.awards_matching("Speed Bonus")
                );
                ensure!(s.unlocked("speed_demon"), "speed demon not unlocked");
                ensure!(s.unlocked("perfect_level"), "perfect level not unlocked");
                Ok(())
            }),
    )
}

fn hints() -> Scenario {
    Scenario::new(
        "hints",
        "Request one hint more than the budget each level",
        BotPlan::new(PlayStyle::Hinted)
            .with_levels(3)
            .with_expectation(every_level_completes)
            .with_expectation(|s: &RunSummary| {
                ensure!(
                    s.hints_denied == s.levels_started,
                    "expected one denial per level, got {}",
                    s.hints_denied
                );
                Ok(())
            }),
    )
}

fn streak() -> Scenario {
    Scenario::new(
        "streak",
        "Clear one level a day for a week",
        BotPlan::new(PlayStyle::Tiles)
            .with_levels(7)
            .with_days_between(1)
            .with_expectation(every_level_completes)
            .with_expectation(|s: &RunSummary| {
                ensure!(s.best_streak >= 7, "best streak only {}", s.best_streak);
                ensure!(s.unlocked("daily_warrior"), "daily warrior not unlocked");
                Ok(())
            }),
    )
}

fn economy() -> Scenario {
    Scenario::new(
        "economy",
        "Sloppy play with spending and broken streaks",
        BotPlan::new(PlayStyle::Sloppy)
            .with_levels(4)
            .with_days_between(2)
            .with_spending(120)
            .with_expectation(every_level_completes)
            .with_expectation(|s: &RunSummary| {
                ensure!(s.duplicates >= 1, "duplicate submission was not rejected");
                ensure!(
                    s.rejections >= 2 * s.levels_started,
                    "only {} rejections",
                    s.rejections
                );
                ensure!(s.best_streak == 1, "streak survived gaps: {}", s.best_streak);
                ensure!(
                    s.balance == s.total_earned - s.spent,
                    "balance {} != earned {} - spent {}",
                    s.balance,
                    s.total_earned,
                    s.spent
                );
                Ok(())
            }),
    )
}

/// Every scenario in catalog order.
#[must_use]
pub fn all_scenarios() -> Vec<Scenario> {
    vec![smoke(), perfect(), hints(), streak(), economy()]
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<Scenario> {
    all_scenarios()
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    all_scenarios()
        .into_iter()
        .map(|s| (s.name, s.description))
        .collect()
}
