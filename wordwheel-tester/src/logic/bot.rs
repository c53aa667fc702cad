//! Deterministic bot that plays the word wheel through the public session API.
//!
//! The bot spells every solvable word tile by tile, fires the debounce tokens
//! the session hands back, and checks the economy after each level.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use wordwheel_game::{
    GameConfig, GameEvent, ManualClock, PendingAction, PlaySession, PlayerSave, Rejection,
    WordList,
};

/// How the bot approaches each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayStyle {
    /// Spell every word on the tiles and nothing else.
    Tiles,
    /// Burn the whole hint budget (and one more) before spelling.
    Hinted,
    /// Mix in bad guesses, duplicates and abandoned selections.
    Sloppy,
}

impl PlayStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tiles => "tiles",
            Self::Hinted => "hinted",
            Self::Sloppy => "sloppy",
        }
    }
}

/// Assertion hook run after a bot run completes.
type BotExpectationFn = Arc<dyn Fn(&RunSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct BotExpectation(BotExpectationFn);

impl std::fmt::Debug for BotExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotExpectation").finish()
    }
}

impl BotExpectation {
    pub fn evaluate(&self, summary: &RunSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for BotExpectation
where
    F: Fn(&RunSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct BotPlan {
    pub style: PlayStyle,
    pub levels: u32,
    /// Simulated seconds spent finding each word.
    pub secs_per_word: i64,
    /// Calendar days skipped between levels.
    pub days_between_levels: i64,
    /// Tokens the bot tries to spend after each level.
    pub spend_per_level: u64,
    pub expectations: Vec<BotExpectation>,
}

impl BotPlan {
    #[must_use]
    pub const fn new(style: PlayStyle) -> Self {
        Self {
            style,
            levels: 3,
            secs_per_word: 5,
            days_between_levels: 0,
            spend_per_level: 0,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub const fn with_pace(mut self, secs_per_word: i64) -> Self {
        self.secs_per_word = secs_per_word;
        self
    }

    #[must_use]
    pub const fn with_days_between(mut self, days: i64) -> Self {
        self.days_between_levels = days;
        self
    }

    #[must_use]
    pub const fn with_spending(mut self, amount: u64) -> Self {
        self.spend_per_level = amount;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<BotExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Everything observed during one bot run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub levels_started: u32,
    pub levels_completed: u32,
    pub load_failures: u32,
    pub words_found: u32,
    pub rejections: u32,
    pub duplicates: u32,
    pub selections_cleared: u32,
    pub stale_tokens: u32,
    pub hints_revealed: u32,
    pub hints_denied: u32,
    pub perfect_levels: u32,
    pub spent: u64,
    pub declined_spends: u32,
    pub balance: u64,
    pub total_earned: u64,
    pub best_streak: u32,
    pub final_level: u32,
    pub awards_by_reason: BTreeMap<String, u64>,
    pub achievements: Vec<String>,
    pub invariant_breaks: Vec<String>,
}

impl RunSummary {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Number of awards whose reason starts with `prefix`.
    #[must_use]
    pub fn awards_matching(&self, prefix: &str) -> u64 {
        self.awards_by_reason
            .iter()
            .filter(|(reason, _)| reason.starts_with(prefix))
            .map(|(_, count)| *count)
            .sum()
    }

    #[must_use]
    pub fn unlocked(&self, achievement: &str) -> bool {
        self.achievements.iter().any(|id| id == achievement)
    }

    fn tally(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::WordAccepted { .. } => self.words_found += 1,
                GameEvent::WordRejected { reason, .. } => {
                    self.rejections += 1;
                    if reason == Rejection::Duplicate {
                        self.duplicates += 1;
                    }
                }
                GameEvent::SelectionCleared => self.selections_cleared += 1,
                GameEvent::HintRevealed(_) => self.hints_revealed += 1,
                GameEvent::HintDenied { .. } => self.hints_denied += 1,
                GameEvent::LevelComplete(done) => {
                    self.levels_completed += 1;
                    if done.is_perfect() {
                        self.perfect_levels += 1;
                    }
                }
                GameEvent::TokensAwarded(tx) => {
                    *self.awards_by_reason.entry(tx.reason).or_default() += 1;
                }
                GameEvent::AchievementUnlocked(note) => {
                    self.achievements.push(note.id.to_string());
                }
                GameEvent::LoadingFailed { .. } => self.load_failures += 1,
                GameEvent::TokensSpent(tx) => self.spent += tx.amount,
                GameEvent::SpendDeclined { .. } => self.declined_spends += 1,
                GameEvent::LevelStarted { .. } => {}
            }
        }
    }

    fn flag(&mut self, message: String) {
        log::warn!("invariant broken (seed {}): {message}", self.seed);
        self.invariant_breaks.push(message);
    }
}

/// Headless driver for [`PlaySession`].
#[derive(Clone)]
pub struct WordBot {
    config: GameConfig,
    lexicon: Rc<WordList>,
    start_day: NaiveDate,
}

impl WordBot {
    #[must_use]
    pub fn new(config: GameConfig, lexicon: Rc<WordList>, start_day: NaiveDate) -> Self {
        Self {
            config,
            lexicon,
            start_day,
        }
    }

    /// Bot over the embedded config and starter lexicon.
    #[must_use]
    pub fn with_defaults(start_day: NaiveDate) -> Self {
        Self::new(GameConfig::default(), Rc::new(WordList::starter()), start_day)
    }

    /// Play `plan` from a fresh profile seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Fails when the bot cannot spell a word the session reported as
    /// solvable. Broken economy or session invariants are recorded in the
    /// summary instead.
    pub async fn run_plan(&self, plan: &BotPlan, seed: u64) -> Result<RunSummary> {
        let clock = Rc::new(ManualClock::at_day(self.start_day));
        let mut play = PlaySession::new(
            self.config.clone(),
            self.lexicon.clone(),
            clock.clone(),
            seed,
        );
        let mut summary = RunSummary::new(seed);
        let budget = u32::from(self.config.session.hint_budget);
        let mut level = play.progress().level;

        for step in 0..plan.levels {
            if step > 0 {
                clock.advance_days(plan.days_between_levels);
            }
            let failures_before = summary.load_failures;
            summary.tally(play.load_async(level).await);
            if summary.load_failures > failures_before {
                level = level.saturating_add(1);
                continue;
            }
            summary.levels_started += 1;
            log::debug!(
                "seed {seed} level {level}: {} letters, {} words",
                play.session().letters().len(),
                play.session().solvable().len()
            );

            let completed_before = summary.levels_completed;
            let revealed_before = summary.hints_revealed;
            match plan.style {
                PlayStyle::Tiles => {}
                PlayStyle::Hinted => {
                    for _ in 0..=budget {
                        summary.tally(play.request_hint());
                    }
                }
                PlayStyle::Sloppy => {
                    summary.tally(play.submit_word("QZXJ"));
                    summary.tally(play.submit_word("AB"));
                }
            }

            play_words(&mut play, &clock, plan, &mut summary)?;

            if !play.session().is_complete() {
                summary.flag(format!("level {level} incomplete after every word"));
            }
            let completions = summary.levels_completed - completed_before;
            if completions != 1 {
                summary.flag(format!("level {level} completed {completions} times"));
            }
            if summary.hints_revealed - revealed_before > budget {
                summary.flag(format!("level {level} revealed more than {budget} hints"));
            }

            if plan.spend_per_level > 0 {
                summary.tally(play.spend(plan.spend_per_level, "Hint Pack"));
            }
            check_ledger(&play, &mut summary);
            level = level.saturating_add(1);
        }

        check_resume(&play, &self.config, self.lexicon.clone(), clock, seed, &mut summary)?;

        let ledger = play.ledger();
        summary.balance = ledger.balance();
        summary.total_earned = ledger.total_earned();
        summary.best_streak = play.stats().best_daily_streak;
        summary.final_level = play.progress().level;
        Ok(summary)
    }
}

fn play_words(
    play: &mut PlaySession,
    clock: &ManualClock,
    plan: &BotPlan,
    summary: &mut RunSummary,
) -> Result<()> {
    let words: Vec<String> = play
        .session()
        .solvable()
        .iter()
        .map(|w| w.text.clone())
        .collect();

    for (i, word) in words.iter().enumerate() {
        if play.session().is_complete() {
            break;
        }
        if play.session().is_discovered(word) {
            continue;
        }
        clock.advance_secs(plan.secs_per_word);
        spell(play, word, summary)?;

        if plan.style == PlayStyle::Sloppy && i == 0 {
            summary.tally(play.submit_word(word));
            if words.len() > 1 {
                abandon_selection(play, summary);
            }
        }
    }
    Ok(())
}

/// Select `word` tile by tile and fire the final debounce token.
fn spell(play: &mut PlaySession, word: &str, summary: &mut RunSummary) -> Result<()> {
    let mut superseded = Vec::new();
    let mut latest = None;
    for c in word.chars() {
        let id = play
            .session()
            .find_tile(c)
            .with_context(|| format!("no free tile for {c:?} while spelling {word}"))?;
        if let Some(scheduled) = play.select(id)
            && let Some(previous) = latest.replace(scheduled)
        {
            superseded.push(previous.token);
        }
    }

    for token in superseded {
        if play.resolve(token).is_empty() {
            summary.stale_tokens += 1;
        } else {
            summary.flag(format!("superseded token {} fired", token.value()));
        }
    }

    let Some(scheduled) = latest else {
        bail!("spelling {word} never scheduled a resolution");
    };
    if scheduled.action != PendingAction::Submit {
        bail!("spelling {word} scheduled {:?}", scheduled.action);
    }
    summary.tally(play.resolve(scheduled.token));
    Ok(())
}

/// Select every tile in board order and let the pending resolution fire.
fn abandon_selection(play: &mut PlaySession, summary: &mut RunSummary) {
    let ids: Vec<_> = play.session().letters().iter().map(|l| l.id).collect();
    let mut latest = None;
    for id in ids {
        if let Some(scheduled) = play.select(id) {
            latest = Some(scheduled);
        }
    }
    if let Some(scheduled) = latest {
        summary.tally(play.resolve(scheduled.token));
    }
    play.clear_selection();
}

fn check_ledger(play: &PlaySession, summary: &mut RunSummary) {
    let ledger = play.ledger();
    if ledger.balance() != ledger.replay_balance() {
        summary.flag(format!(
            "balance {} differs from replayed history {}",
            ledger.balance(),
            ledger.replay_balance()
        ));
    }
    if ledger.balance() != ledger.total_earned().saturating_sub(ledger.total_spent()) {
        summary.flag("balance is not earned minus spent".to_string());
    }
}

/// Round-trip the save document and make sure nothing drifts.
fn check_resume(
    play: &PlaySession,
    config: &GameConfig,
    lexicon: Rc<WordList>,
    clock: Rc<ManualClock>,
    seed: u64,
    summary: &mut RunSummary,
) -> Result<()> {
    let json = play.save().to_json().context("serializing save")?;
    let save = PlayerSave::from_json(&json).context("parsing save")?;
    let resumed = PlaySession::from_save(save, config.clone(), lexicon, clock, seed);
    if resumed.ledger().transactions() != play.ledger().transactions() {
        summary.flag("resumed ledger history differs".to_string());
    }
    if resumed.achievements() != play.achievements() {
        summary.flag("resumed achievements differ".to_string());
    }
    if resumed.progress() != play.progress() {
        summary.flag("resumed progress differs".to_string());
    }
    Ok(())
}
