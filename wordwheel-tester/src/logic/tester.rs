use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::bot::{BotPlan, RunSummary, WordBot};
use crate::scenarios::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    bot: WordBot,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(bot: WordBot, verbose: bool) -> Self {
        Self { bot, verbose }
    }

    pub async fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (style: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.style.label(),
                    seed
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations).await);
        }

        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_iterations(&scenario.plan, seed, iterations).await;

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    async fn run_iterations(
        &self,
        plan: &BotPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let run = self.bot.run_plan(plan, iteration_seed).await;
            let verdict = match &run {
                Ok(summary) => evaluate_expectations(plan, summary).map(|err| {
                    format!(
                        "Iteration {} (style {}, seed {}, levels {}/{}): {} | balance {} earned {} streak {}",
                        i + 1,
                        plan.style.label(),
                        iteration_seed,
                        summary.levels_completed,
                        summary.levels_started,
                        err,
                        summary.balance,
                        summary.total_earned,
                        summary.best_streak
                    )
                }),
                Err(err) => Some(format!(
                    "Iteration {} (style {}, seed {}): {err:#}",
                    i + 1,
                    plan.style.label(),
                    iteration_seed
                )),
            };

            if let Some(failure) = verdict {
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        failure.clone().red()
                    );
                }
                failures.push(failure);
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose
                    && let Ok(summary) = &run
                {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) words:{} stale:{} cleared:{} balance:{}",
                        i + 1,
                        iterations,
                        summary.words_found,
                        summary.stale_tokens,
                        summary.selections_cleared,
                        summary.balance
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

/// First failed check for `summary`; invariant breaks always fail a run.
fn evaluate_expectations(plan: &BotPlan, summary: &RunSummary) -> Option<String> {
    if let Some(first) = summary.invariant_breaks.first() {
        return Some(format!(
            "{} invariant break(s), first: {first}",
            summary.invariant_breaks.len()
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bot::PlayStyle;
    use chrono::NaiveDate;

    fn tester() -> LogicTester {
        LogicTester::new(
            WordBot::with_defaults(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            false,
        )
    }

    #[tokio::test]
    async fn passing_scenario_reports_every_iteration() {
        let scenario = Scenario::new(
            "two-levels",
            "two clean levels",
            BotPlan::new(PlayStyle::Tiles).with_levels(2),
        );
        let results = tester().run_scenario(&scenario, &[5, 6], 2).await;
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
    }

    #[tokio::test]
    async fn failed_expectation_is_reported_with_context() {
        let scenario = Scenario::new(
            "impossible",
            "expects more levels than played",
            BotPlan::new(PlayStyle::Tiles)
                .with_levels(1)
                .with_expectation(|s: &RunSummary| {
                    anyhow::ensure!(s.levels_completed > 5, "only {} levels", s.levels_completed);
                    Ok(())
                }),
        );
        let results = tester().run_scenario(&scenario, &[1], 1).await;
        assert!(!results[0].passed);
        assert_eq!(results[0].successful_iterations, 0);
        assert!(results[0].failures[0].contains("only 1 levels"));
        assert!(results[0].failures[0].contains("style tiles"));
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(12));
    }
}
