//! Play controller binding a puzzle session to the economy.
//!
//! `PlaySession` owns the puzzle session, the reward ledger, achievement state
//! and lifetime stats. Every player action returns the [`GameEvent`]s it
//! produced so the presentation layer never has to diff state.

use std::fmt;
use std::rc::Rc;

use crate::achievements::{AchievementBook, AchievementEvaluator};
use crate::board::{LevelBoard, LevelLoadError, build_board};
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::events::GameEvent;
use crate::ledger::RewardLedger;
use crate::letters::LetterId;
use crate::lexicon::{Lexicon, normalize_word};
use crate::profile::{GameProgress, PlayerSave, PlayerStats};
use crate::rewards::SessionAwards;
use crate::seed::{RngBundle, load_seed};
use crate::session::{
    PuzzleSession, Resolved, ScheduledResolution, SessionPhase, SubmitOutcome, TimerToken,
};
use crate::settlement::Settlement;

pub struct PlaySession {
    cfg: GameConfig,
    clock: Rc<dyn Clock>,
    lexicon: Rc<dyn Lexicon>,
    seed: u64,
    loads: u32,
    rng: RngBundle,
    session: PuzzleSession,
    awards: SessionAwards,
    ledger: RewardLedger,
    evaluator: AchievementEvaluator,
    achievements: AchievementBook,
    stats: PlayerStats,
    progress: GameProgress,
}

impl fmt::Debug for PlaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaySession")
            .field("seed", &self.seed)
            .field("session", &self.session)
            .field("ledger", &self.ledger)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl PlaySession {
    /// Fresh player with an empty ledger, starting at level 1.
    #[must_use]
    pub fn new(
        cfg: GameConfig,
        lexicon: Rc<dyn Lexicon>,
        clock: Rc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self::from_save(PlayerSave::default(), cfg, lexicon, clock, seed)
    }

    /// Resume from a save document.
    #[must_use]
    pub fn from_save(
        save: PlayerSave,
        cfg: GameConfig,
        lexicon: Rc<dyn Lexicon>,
        clock: Rc<dyn Clock>,
        seed: u64,
    ) -> Self {
        let PlayerSave {
            progress,
            stats,
            ledger,
            achievements,
        } = save;
        let ledger = RewardLedger::from_snapshot(ledger, clock.clone())
            .with_streak_bonus(cfg.rewards.daily_streak);
        Self {
            evaluator: AchievementEvaluator::new(&cfg.rewards, &cfg.session),
            session: PuzzleSession::new(cfg.clone(), clock.clone()),
            rng: RngBundle::for_level(seed, progress.level),
            cfg,
            clock,
            lexicon,
            seed,
            loads: 0,
            awards: SessionAwards::new(),
            ledger,
            achievements,
            stats,
            progress,
        }
    }

    #[must_use]
    pub fn with_settlement(mut self, settlement: Rc<dyn Settlement>) -> Self {
        self.ledger.set_settlement(settlement);
        self
    }

    /// Snapshot everything the persistence collaborator stores.
    #[must_use]
    pub fn save(&self) -> PlayerSave {
        PlayerSave {
            progress: self.progress.clone(),
            stats: self.stats.clone(),
            ledger: self.ledger.snapshot(),
            achievements: self.achievements.clone(),
        }
    }

    /// Load the level recorded in progress.
    ///
    /// `start`, `restart` and `advance` build the board synchronously and are
    /// not bounded by `load.timeout_ms`; hosts that need the timeout call
    /// [`PlaySession::load_async`] instead.
    pub fn start(&mut self) -> Vec<GameEvent> {
        self.load(self.progress.level)
    }

    /// Replay the current level on a fresh board.
    pub fn restart(&mut self) -> Vec<GameEvent> {
        self.load(self.session.level())
    }

    /// Move on to the next level.
    pub fn advance(&mut self) -> Vec<GameEvent> {
        self.load(self.session.level().saturating_add(1))
    }

    fn load(&mut self, level: u32) -> Vec<GameEvent> {
        self.session.reset();
        let mut rng = self.level_rng(level);
        let result = build_board(level, &*self.lexicon, &self.cfg, rng.letters());
        self.rng = rng;
        self.finish_load(level, result)
    }

    /// Async load bounded by the configured timeout.
    #[cfg(feature = "async")]
    pub async fn load_async(&mut self, level: u32) -> Vec<GameEvent> {
        self.session.reset();
        let mut rng = self.level_rng(level);
        let result =
            crate::loader::load_level(level, &*self.lexicon, &self.cfg, rng.letters())
                .await;
        self.rng = rng;
        self.finish_load(level, result)
    }

    fn level_rng(&mut self, level: u32) -> RngBundle {
        // Each load of the same level draws a different board.
        let seed = load_seed(self.seed, self.loads);
        self.loads = self.loads.wrapping_add(1);
        RngBundle::for_level(seed, level)
    }

    fn finish_load(&mut self, level: u32, result: Result<LevelBoard, LevelLoadError>) -> Vec<GameEvent> {
        match result {
            Ok(board) => {
                let event = GameEvent::LevelStarted {
                    level: board.level,
                    letters: board.letters.clone(),
                    total_words: board.solvable.word_count(),
                };
                self.progress.level = board.level;
                self.stats.record_level_reached(board.level);
                self.awards = SessionAwards::new();
                self.session.load_board(board);
                vec![event]
            }
            Err(err) => {
                log::warn!("level {level} failed to load: {err}");
                vec![GameEvent::LoadingFailed {
                    level,
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                }]
            }
        }
    }

    pub fn select(&mut self, id: LetterId) -> Option<ScheduledResolution> {
        self.session.select_letter(id)
    }

    pub fn deselect(&mut self, id: LetterId) -> Option<ScheduledResolution> {
        self.session.deselect_letter(id)
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    pub fn submit(&mut self) -> Vec<GameEvent> {
        let word = self.session.current_word();
        let outcome = self.session.submit();
        self.apply_outcome(word, outcome)
    }

    pub fn submit_word(&mut self, text: &str) -> Vec<GameEvent> {
        let outcome = self.session.submit_word(text);
        self.apply_outcome(normalize_word(text).unwrap_or_default(), outcome)
    }

    /// Fire a scheduled resolution; stale tokens produce no events.
    pub fn resolve(&mut self, token: TimerToken) -> Vec<GameEvent> {
        let word = self.session.current_word();
        match self.session.resolve(token) {
            Some(Resolved::Submitted(outcome)) => self.apply_outcome(word, outcome),
            Some(Resolved::Cleared) => vec![GameEvent::SelectionCleared],
            None => Vec::new(),
        }
    }

    pub fn request_hint(&mut self) -> Vec<GameEvent> {
        match self.session.request_hint(self.rng.hints()) {
            Ok(hint) => vec![GameEvent::HintRevealed(hint)],
            Err(err) => vec![GameEvent::HintDenied {
                message: err.to_string(),
            }],
        }
    }

    /// Spend tokens on behalf of the player.
    ///
    /// A refused spend leaves the ledger unchanged and reports why.
    pub fn spend(&mut self, amount: u64, reason: &str) -> Vec<GameEvent> {
        match self.ledger.spend(amount, reason) {
            Ok(tx) => vec![GameEvent::TokensSpent(tx)],
            Err(err) => vec![GameEvent::SpendDeclined {
                amount,
                balance: self.ledger.balance(),
                message: err.to_string(),
            }],
        }
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.progress.toggle_sound()
    }

    fn apply_outcome(&mut self, word: String, outcome: SubmitOutcome) -> Vec<GameEvent> {
        match outcome {
            SubmitOutcome::Ignored => Vec::new(),
            SubmitOutcome::Rejected { reason, .. } => {
                vec![GameEvent::WordRejected { word, reason }]
            }
            SubmitOutcome::Accepted { word, completion } => {
                let mut events = vec![GameEvent::WordAccepted {
                    found: crate::numbers::saturating_u32(self.session.discovered().len()),
                    total: self.session.solvable().word_count(),
                    score: word.score,
                    word: word.text,
                }];
                self.stats.record_word();
                events.extend(
                    self.awards
                        .pay_first_word(&mut self.ledger, &self.cfg.rewards)
                        .map(GameEvent::TokensAwarded),
                );

                if let Some(done) = &completion {
                    self.stats.record_completion(done);
                    self.progress.total_score = self.progress.total_score.saturating_add(done.score);
                    events.push(GameEvent::LevelComplete(done.clone()));
                    let paid = self.awards.pay_completion(
                        &mut self.ledger,
                        &self.cfg.rewards,
                        &self.cfg.session,
                        done,
                        self.clock.today(),
                    );
                    events.extend(paid.into_iter().map(GameEvent::TokensAwarded));
                    self.stats.record_streak(self.ledger.streak().count);
                }

                let unlocks = self.evaluator.evaluate_and_settle(
                    &mut self.achievements,
                    &self.stats,
                    completion.as_ref(),
                    &mut self.ledger,
                    self.clock.now(),
                );
                events.extend(unlocks.into_iter().map(GameEvent::AchievementUnlocked));
                events
            }
        }
    }

    #[must_use]
    pub const fn session(&self) -> &PuzzleSession {
        &self.session
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub const fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    #[must_use]
    pub const fn progress(&self) -> &GameProgress {
        &self.progress
    }

    #[must_use]
    pub const fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    #[must_use]
    pub const fn evaluator(&self) -> &AchievementEvaluator {
        &self.evaluator
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Diagnostic count of RNG draws for the current level.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.total_draws()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::AchievementId;
    use crate::clock::ManualClock;
    use crate::lexicon::WordList;
    use chrono::NaiveDate;

    fn play(seed: u64) -> (PlaySession, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()));
        let session = PlaySession::new(
            GameConfig::default(),
            Rc::new(WordList::starter()),
            clock.clone(),
            seed,
        );
        (session, clock)
    }

    fn solve_all(play: &mut PlaySession) -> Vec<GameEvent> {
        let words: Vec<String> = play
            .session()
            .solvable()
            .iter()
            .map(|w| w.text.clone())
            .collect();
        words.iter().flat_map(|w| play.submit_word(w)).collect()
    }

    #[test]
    fn first_word_pays_bonus_and_unlocks_achievement() {
        let (mut play, _) = play(11);
        let started = play.start();
        assert!(matches!(started[0], GameEvent::LevelStarted { level: 1, .. }));
        let first = play.session().solvable().as_slice()[0].text.clone();
        let events = play.submit_word(&first);
        let kinds: Vec<&str> = events.iter().map(GameEvent::kind).collect();
        assert_eq!(kinds[0], "word_accepted");
        assert!(kinds.contains(&"tokens_awarded"));
        assert!(play.achievements().is_unlocked(AchievementId::FirstWord));
        assert_eq!(play.stats().words_found, 1);
    }

    #[test]
    fn full_clear_pays_bundle_and_records_progress() {
        let (mut play, clock) = play(12);
        play.start();
        clock.advance_secs(30);
        let events = solve_all(&mut play);
        assert_eq!(play.phase(), SessionPhase::Complete);
        let completions = events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelComplete(_)))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(play.stats().games_played, 1);
        assert_eq!(play.ledger().streak().count, 1);
        assert!(play.achievements().is_unlocked(AchievementId::PerfectLevel));
        assert!(play.achievements().is_unlocked(AchievementId::SpeedDemon));
        assert_eq!(play.ledger().balance(), play.ledger().replay_balance());
        assert!(play.progress().total_score > 0);

        assert!(play.submit().is_empty());
        let next = play.advance();
        assert!(matches!(next[0], GameEvent::LevelStarted { level: 2, .. }));
        assert_eq!(play.progress().level, 2);
    }

    #[test]
    fn hints_deny_after_budget() {
        let (mut play, _) = play(13);
        play.start();
        for _ in 0..3 {
            assert!(matches!(play.request_hint()[0], GameEvent::HintRevealed(_)));
        }
        assert_eq!(
            play.request_hint(),
            vec![GameEvent::HintDenied {
                message: "hint budget exhausted".into()
            }]
        );
    }

    #[test]
    fn save_and_resume_preserve_economy() {
        let (mut play, clock) = play(14);
        play.start();
        solve_all(&mut play);
        play.toggle_sound();
        let save = play.save();
        let json = save.to_json().unwrap();

        let restored = PlayerSave::from_json(&json).unwrap();
        let resumed = PlaySession::from_save(
            restored,
            GameConfig::default(),
            Rc::new(WordList::starter()),
            clock,
            14,
        );
        assert_eq!(resumed.ledger().balance(), play.ledger().balance());
        assert!(!resumed.progress().sound_enabled);
        assert_eq!(resumed.stats(), play.stats());
    }

    #[test]
    fn spending_reports_tokens_spent_or_declined() {
        let (mut play, _) = play(15);
        play.start();
        assert_eq!(
            play.spend(10, "Hint Pack"),
            vec![GameEvent::SpendDeclined {
                amount: 10,
                balance: 0,
                message: "insufficient balance: requested 10, available 0".into(),
            }]
        );
        assert!(play.ledger().transactions().is_empty());

        let first = play.session().solvable().as_slice()[0].text.clone();
        play.submit_word(&first);
        let balance = play.ledger().balance();
        let events = play.spend(10, "Hint Pack");
        let [GameEvent::TokensSpent(tx)] = events.as_slice() else {
            panic!("expected a single spend event, got {events:?}");
        };
        assert_eq!(tx.amount, 10);
        assert_eq!(tx.reason, "Hint Pack");
        assert_eq!(play.ledger().balance(), balance - 10);
        assert_eq!(events[0].kind(), "tokens_spent");
    }

    #[test]
    fn rejected_typed_word_reports_the_judged_text() {
        let (mut play, _) = play(16);
        play.start();
        let events = play.submit_word("  qzx ");
        assert!(matches!(
            events.as_slice(),
            [GameEvent::WordRejected { word, .. }] if word == "QZX"
        ));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn bounded_async_load_starts_the_requested_level() {
        let (mut play, _) = play(17);
        let events = play.load_async(3).await;
        assert!(matches!(events[0], GameEvent::LevelStarted { level: 3, .. }));
        assert_eq!(play.phase(), SessionPhase::InProgress);
        assert_eq!(play.progress().level, 3);
    }

    #[test]
    fn empty_lexicon_reports_loading_failure() {
        let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()));
        let mut play = PlaySession::new(GameConfig::default(), Rc::new(WordList::empty()), clock, 1);
        let events = play.start();
        assert!(matches!(
            events[0],
            GameEvent::LoadingFailed {
                retryable: false,
                ..
            }
        ));
        assert_eq!(play.phase(), SessionPhase::Idle);
    }
}
