//! Puzzle session state machine.
//!
//! A session walks `Idle -> InProgress -> Complete` for one board. Selection
//! changes that spell a word of minimum length schedule a delayed resolution
//! (auto-submit when the word would be accepted, auto-clear otherwise). The
//! pending resolution is identified by a [`TimerToken`]; any later mutation
//! replaces or cancels it, so a host timer firing with an old token is ignored.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

use crate::board::{LevelBoard, LevelLoadError, build_board};
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::constants::{HINT_MASK_CHAR, HINT_REVEAL_CHARS};
use crate::letters::{Letter, LetterId, tiles_for_board};
use crate::lexicon::{Lexicon, normalize_word};
use crate::numbers::saturating_u32;
use crate::solver::{CandidateWord, SolvableWordSet};

/// Lifecycle of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InProgress,
    Complete,
}

/// Why a submitted word was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooShort,
    InvalidWord,
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TooShort => "too short",
            Self::InvalidWord => "invalid word",
            Self::Duplicate => "duplicate",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HintError {
    #[error("hint budget exhausted")]
    BudgetExhausted,
    #[error("every word has already been found")]
    NothingLeft,
    #[error("no level is in progress")]
    NotStarted,
}

/// Handle for a pending delayed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerToken(u64);

impl TimerToken {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Submit,
    Clear,
}

/// A resolution the host should fire after `delay` by calling
/// [`PuzzleSession::resolve`] with `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledResolution {
    pub token: TimerToken,
    pub action: PendingAction,
    pub delay: Duration,
}

/// Emitted exactly once when the last solvable word is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub level: u32,
    pub elapsed: Duration,
    pub discovered_count: u32,
    pub total_count: u32,
    pub hints_used: u8,
    pub score: u64,
}

impl CompletionEvent {
    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.total_count > 0 && self.discovered_count == self.total_count
    }
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted {
        word: CandidateWord,
        completion: Option<CompletionEvent>,
    },
    /// `clear` carries the auto-clear scheduled for a rejected selection.
    Rejected {
        reason: Rejection,
        clear: Option<ScheduledResolution>,
    },
    /// The session was not accepting submissions; nothing changed.
    Ignored,
}

/// What a fired timer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Submitted(SubmitOutcome),
    Cleared,
}

/// A revealed hint: leading characters plus the word length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub prefix: String,
    pub length: usize,
    pub masked: String,
    pub hints_remaining: u8,
}

impl Hint {
    fn reveal(word: &str, hints_remaining: u8) -> Self {
        let prefix: String = word.chars().take(HINT_REVEAL_CHARS).collect();
        let length = word.chars().count();
        let mut masked = prefix.clone();
        masked.extend(std::iter::repeat_n(
            HINT_MASK_CHAR,
            length.saturating_sub(HINT_REVEAL_CHARS),
        ));
        Self {
            prefix,
            length,
            masked,
            hints_remaining,
        }
    }
}

/// State of the level currently being played.
pub struct PuzzleSession {
    cfg: GameConfig,
    clock: Rc<dyn Clock>,
    phase: SessionPhase,
    level: u32,
    board_seq: u32,
    letters: Vec<Letter>,
    solvable: SolvableWordSet,
    selection: SmallVec<[LetterId; 8]>,
    discovered: Vec<CandidateWord>,
    discovered_index: HashSet<String>,
    hints_used: u8,
    level_score: u64,
    started_at: Option<DateTime<Utc>>,
    pending: Option<ScheduledResolution>,
    next_token: u64,
    completion: Option<CompletionEvent>,
}

impl fmt::Debug for PuzzleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleSession")
            .field("phase", &self.phase)
            .field("level", &self.level)
            .field("letters", &self.letter_chars())
            .field("current_word", &self.current_word())
            .field("discovered", &self.discovered.len())
            .field("total", &self.solvable.len())
            .field("hints_used", &self.hints_used)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl PuzzleSession {
    /// Create an idle session; call [`load_board`](Self::load_board) or
    /// [`restart`](Self::restart) to start playing.
    #[must_use]
    pub fn new(cfg: GameConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            cfg,
            clock,
            phase: SessionPhase::Idle,
            level: 1,
            board_seq: 0,
            letters: Vec::new(),
            solvable: SolvableWordSet::default(),
            selection: SmallVec::new(),
            discovered: Vec::new(),
            discovered_index: HashSet::new(),
            hints_used: 0,
            level_score: 0,
            started_at: None,
            pending: None,
            next_token: 0,
            completion: None,
        }
    }

    /// Drop all per-level state and return to `Idle`.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.phase = SessionPhase::Idle;
        self.letters.clear();
        self.solvable = SolvableWordSet::default();
        self.selection.clear();
        self.discovered.clear();
        self.discovered_index.clear();
        self.hints_used = 0;
        self.level_score = 0;
        self.started_at = None;
        self.completion = None;
    }

    /// Start playing a prepared board.
    pub fn load_board(&mut self, board: LevelBoard) {
        self.reset();
        self.board_seq = self.board_seq.wrapping_add(1);
        self.level = board.level;
        self.letters = tiles_for_board(self.board_seq, &board.letters);
        self.solvable = board.solvable;
        self.started_at = Some(self.clock.now());
        self.phase = SessionPhase::InProgress;
        log::debug!(
            "level {} started with {:?} ({} words)",
            self.level,
            self.letter_chars(),
            self.solvable.len()
        );
    }

    /// Reset and regenerate a board for `level`.
    ///
    /// # Errors
    ///
    /// Propagates [`LevelLoadError`] from the level pipeline; the session is
    /// left `Idle` in that case.
    pub fn restart<L, R>(&mut self, level: u32, lexicon: &L, rng: &mut R) -> Result<(), LevelLoadError>
    where
        L: Lexicon + ?Sized,
        R: Rng + ?Sized,
    {
        self.reset();
        self.level = level.max(1);
        let board = build_board(self.level, lexicon, &self.cfg, rng)?;
        self.load_board(board);
        Ok(())
    }

    /// Move on to the next level.
    ///
    /// # Errors
    ///
    /// Propagates [`LevelLoadError`] from the level pipeline.
    pub fn advance<L, R>(&mut self, lexicon: &L, rng: &mut R) -> Result<(), LevelLoadError>
    where
        L: Lexicon + ?Sized,
        R: Rng + ?Sized,
    {
        let next = self.level.saturating_add(1);
        self.restart(next, lexicon, rng)
    }

    /// Append a tile to the selection.
    ///
    /// Ignored when the tile is unknown, already selected, or the session is not
    /// in progress. Returns the resolution scheduled for the new word, if any.
    pub fn select_letter(&mut self, id: LetterId) -> Option<ScheduledResolution> {
        if self.phase != SessionPhase::InProgress
            || self.selection.contains(&id)
            || !self.letters.iter().any(|l| l.id == id)
        {
            return None;
        }
        self.selection.push(id);
        self.reschedule()
    }

    /// Remove `id` and every tile selected after it.
    pub fn deselect_letter(&mut self, id: LetterId) -> Option<ScheduledResolution> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        let pos = self.selection.iter().position(|&sel| sel == id)?;
        self.selection.truncate(pos);
        self.reschedule()
    }

    pub fn clear_selection(&mut self) {
        self.cancel_pending();
        self.selection.clear();
    }

    /// Submit the current selection.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.phase != SessionPhase::InProgress {
            return SubmitOutcome::Ignored;
        }
        self.cancel_pending();
        let word = self.current_word();
        match self.evaluate(&word) {
            Ok(candidate) => {
                let candidate = candidate.clone();
                self.accept(candidate)
            }
            Err(reason) => {
                let clear = if self.selection.is_empty() {
                    None
                } else {
                    Some(self.schedule(PendingAction::Clear))
                };
                log::debug!("rejected {word:?}: {reason}");
                SubmitOutcome::Rejected { reason, clear }
            }
        }
    }

    /// Submit a typed word without touching tiles.
    ///
    /// After completion this still reports duplicates but never changes state.
    pub fn submit_word(&mut self, text: &str) -> SubmitOutcome {
        let word = normalize_word(text).unwrap_or_default();
        match self.phase {
            SessionPhase::Idle => SubmitOutcome::Ignored,
            SessionPhase::Complete => match self.evaluate(&word) {
                Err(reason @ Rejection::Duplicate) => SubmitOutcome::Rejected {
                    reason,
                    clear: None,
                },
                _ => SubmitOutcome::Ignored,
            },
            SessionPhase::InProgress => match self.evaluate(&word) {
                Ok(candidate) => {
                    let candidate = candidate.clone();
                    self.cancel_pending();
                    self.accept(candidate)
                }
                Err(reason) => SubmitOutcome::Rejected {
                    reason,
                    clear: None,
                },
            },
        }
    }

    /// Fire a scheduled resolution. Stale or cancelled tokens return `None`.
    pub fn resolve(&mut self, token: TimerToken) -> Option<Resolved> {
        let pending = self.pending.filter(|p| p.token == token)?;
        self.pending = None;
        match pending.action {
            PendingAction::Submit => {
                let outcome = self.submit();
                Some(Resolved::Submitted(outcome))
            }
            PendingAction::Clear => {
                self.selection.clear();
                Some(Resolved::Cleared)
            }
        }
    }

    /// Reveal the start of a random undiscovered word.
    ///
    /// # Errors
    ///
    /// [`HintError::BudgetExhausted`] once the level's budget is spent,
    /// [`HintError::NothingLeft`] when every word is found and
    /// [`HintError::NotStarted`] while idle.
    pub fn request_hint<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Hint, HintError> {
        if self.phase == SessionPhase::Idle {
            return Err(HintError::NotStarted);
        }
        if self.hints_used >= self.cfg.session.hint_budget {
            return Err(HintError::BudgetExhausted);
        }
        let remaining: Vec<&CandidateWord> = self
            .solvable
            .iter()
            .filter(|w| !self.discovered_index.contains(&w.text))
            .collect();
        let pick = remaining.choose(rng).ok_or(HintError::NothingLeft)?;
        let text = pick.text.clone();
        self.hints_used += 1;
        log::debug!("hint {} of {} on level {}", self.hints_used, self.cfg.session.hint_budget, self.level);
        Ok(Hint::reveal(&text, self.hints_remaining()))
    }

    fn evaluate(&self, word: &str) -> Result<&CandidateWord, Rejection> {
        if word.chars().count() < self.cfg.session.min_word_len {
            return Err(Rejection::TooShort);
        }
        let candidate = self.solvable.get(word).ok_or(Rejection::InvalidWord)?;
        if self.discovered_index.contains(word) {
            return Err(Rejection::Duplicate);
        }
        Ok(candidate)
    }

    fn accept(&mut self, word: CandidateWord) -> SubmitOutcome {
        self.selection.clear();
        self.level_score = self.level_score.saturating_add(u64::from(word.score));
        self.discovered_index.insert(word.text.clone());
        self.discovered.push(word.clone());
        log::debug!(
            "accepted {} ({} of {})",
            word.text,
            self.discovered.len(),
            self.solvable.len()
        );

        let completion = if self.discovered.len() == self.solvable.len() {
            Some(self.complete())
        } else {
            None
        };
        SubmitOutcome::Accepted { word, completion }
    }

    fn complete(&mut self) -> CompletionEvent {
        self.cancel_pending();
        self.phase = SessionPhase::Complete;
        let event = CompletionEvent {
            level: self.level,
            elapsed: self.elapsed(),
            discovered_count: saturating_u32(self.discovered.len()),
            total_count: self.solvable.word_count(),
            hints_used: self.hints_used,
            score: self.level_score,
        };
        log::info!(
            "level {} complete in {:?} with score {}",
            event.level,
            event.elapsed,
            event.score
        );
        self.completion = Some(event.clone());
        event
    }

    fn reschedule(&mut self) -> Option<ScheduledResolution> {
        self.cancel_pending();
        let word = self.current_word();
        if word.chars().count() < self.cfg.session.min_word_len {
            return None;
        }
        let action = if self.evaluate(&word).is_ok() {
            PendingAction::Submit
        } else {
            PendingAction::Clear
        };
        Some(self.schedule(action))
    }

    fn schedule(&mut self, action: PendingAction) -> ScheduledResolution {
        self.next_token = self.next_token.wrapping_add(1);
        let scheduled = ScheduledResolution {
            token: TimerToken(self.next_token),
            action,
            delay: self.cfg.session.debounce(),
        };
        self.pending = Some(scheduled);
        scheduled
    }

    fn cancel_pending(&mut self) {
        self.pending = None;
    }

    fn letter_chars(&self) -> Vec<char> {
        self.letters.iter().map(|l| l.character).collect()
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, SessionPhase::Complete)
    }

    #[must_use]
    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    #[must_use]
    pub fn selection(&self) -> &[LetterId] {
        &self.selection
    }

    /// Characters of the selected tiles, in selection order.
    #[must_use]
    pub fn current_word(&self) -> String {
        self.selection
            .iter()
            .filter_map(|id| self.letters.iter().find(|l| l.id == *id))
            .map(|l| l.character)
            .collect()
    }

    #[must_use]
    pub const fn solvable(&self) -> &SolvableWordSet {
        &self.solvable
    }

    /// Found words in discovery order.
    #[must_use]
    pub fn discovered(&self) -> &[CandidateWord] {
        &self.discovered
    }

    #[must_use]
    pub fn is_discovered(&self, word: &str) -> bool {
        self.discovered_index.contains(word)
    }

    #[must_use]
    pub const fn hints_used(&self) -> u8 {
        self.hints_used
    }

    #[must_use]
    pub const fn hints_remaining(&self) -> u8 {
        self.cfg.session.hint_budget.saturating_sub(self.hints_used)
    }

    #[must_use]
    pub const fn level_score(&self) -> u64 {
        self.level_score
    }

    #[must_use]
    pub const fn pending(&self) -> Option<ScheduledResolution> {
        self.pending
    }

    #[must_use]
    pub const fn completion(&self) -> Option<&CompletionEvent> {
        self.completion.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.cfg
    }

    /// Time since the level started, frozen at completion.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        if let Some(done) = &self.completion {
            return done.elapsed;
        }
        self.started_at
            .and_then(|start| (self.clock.now() - start).to_std().ok())
            .unwrap_or_default()
    }

    /// Tile id for the first unselected tile showing `c`.
    #[must_use]
    pub fn find_tile(&self, c: char) -> Option<LetterId> {
        self.letters
            .iter()
            .find(|l| l.character == c && !self.selection.contains(&l.id))
            .map(|l| l.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSource;
    use crate::clock::ManualClock;
    use crate::lexicon::WordList;
    use crate::solver::compute_solvable;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn cats_session() -> (PuzzleSession, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        let mut session = PuzzleSession::new(GameConfig::default(), clock.clone());
        let lexicon = WordList::from_words(["CAT", "CATS", "AT"]);
        let letters = vec!['C', 'A', 'T', 'S'];
        let solvable = compute_solvable(&letters, 1, &lexicon);
        session.load_board(LevelBoard {
            level: 1,
            letters,
            solvable,
            source: BoardSource::Fixed,
        });
        (session, clock)
    }

    fn spell(session: &mut PuzzleSession, word: &str) -> Option<ScheduledResolution> {
        let mut last = None;
        for c in word.chars() {
            let id = session.find_tile(c).unwrap();
            last = session.select_letter(id);
        }
        last
    }

    #[test]
    fn rejects_in_documented_order() {
        let (mut session, _) = cats_session();
        spell(&mut session, "AT");
        assert!(matches!(
            session.submit(),
            SubmitOutcome::Rejected {
                reason: Rejection::TooShort,
                clear: Some(_)
            }
        ));
        session.clear_selection();
        spell(&mut session, "SAT");
        assert!(matches!(
            session.submit(),
            SubmitOutcome::Rejected {
                reason: Rejection::InvalidWord,
                ..
            }
        ));
        assert_eq!(Rejection::InvalidWord.to_string(), "invalid word");
    }

    #[test]
    fn selection_ignores_repeats_and_truncates_on_deselect() {
        let (mut session, _) = cats_session();
        let c = session.find_tile('C').unwrap();
        let a = session.find_tile('A').unwrap();
        let t = session.find_tile('T').unwrap();
        session.select_letter(c);
        session.select_letter(c);
        session.select_letter(a);
        session.select_letter(t);
        assert_eq!(session.current_word(), "CAT");
        session.deselect_letter(a);
        assert_eq!(session.selection(), [c]);
        assert!(session.pending().is_none());
    }

    #[test]
    fn stale_tokens_never_fire() {
        let (mut session, _) = cats_session();
        let first = spell(&mut session, "CAT").unwrap();
        assert_eq!(first.action, PendingAction::Submit);
        assert_eq!(first.delay, Duration::from_millis(500));

        let s = session.find_tile('S').unwrap();
        let second = session.select_letter(s).unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(session.resolve(first.token), None);
        assert_eq!(session.current_word(), "CATS");

        match session.resolve(second.token) {
            Some(Resolved::Submitted(SubmitOutcome::Accepted { word, .. })) => {
                assert_eq!(word.text, "CATS");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.resolve(second.token), None);
    }

    #[test]
    fn failed_words_schedule_a_clear() {
        let (mut session, _) = cats_session();
        let scheduled = spell(&mut session, "SAT").unwrap();
        assert_eq!(scheduled.action, PendingAction::Clear);
        assert_eq!(session.resolve(scheduled.token), Some(Resolved::Cleared));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn completes_exactly_once_and_reports_duplicates_after() {
        let (mut session, clock) = cats_session();
        assert_eq!(session.solvable().len(), 2);
        assert!(matches!(
            session.submit_word("cat"),
            SubmitOutcome::Accepted {
                completion: None,
                ..
            }
        ));
        clock.advance_secs(42);
        let SubmitOutcome::Accepted {
            completion: Some(done),
            ..
        } = session.submit_word("CATS")
        else {
            panic!("expected completion");
        };
        assert_eq!(done.elapsed, Duration::from_secs(42));
        assert_eq!((done.discovered_count, done.total_count), (2, 2));
        assert!(session.is_complete());

        assert_eq!(
            session.submit_word("CAT"),
            SubmitOutcome::Rejected {
                reason: Rejection::Duplicate,
                clear: None
            }
        );
        assert_eq!(session.submit(), SubmitOutcome::Ignored);
        assert_eq!(session.discovered().len(), 2);
        assert_eq!(session.completion(), Some(&done));
    }

    #[test]
    fn hints_mask_and_respect_budget() {
        let (mut session, _) = cats_session();
        let mut rng = SmallRng::seed_from_u64(3);
        for remaining in (0..3).rev() {
            let hint = session.request_hint(&mut rng).unwrap();
            assert_eq!(hint.prefix, "CA");
            assert_eq!(hint.masked.len(), hint.length);
            assert!(hint.masked.ends_with('*'));
            assert_eq!(hint.hints_remaining, remaining);
        }
        assert_eq!(session.request_hint(&mut rng), Err(HintError::BudgetExhausted));
        assert_eq!(HintError::BudgetExhausted.to_string(), "hint budget exhausted");
    }

    #[test]
    fn restart_resets_and_issues_fresh_ids() {
        let (mut session, _) = cats_session();
        let old = session.find_tile('C').unwrap();
        session.submit_word("CAT");
        session.request_hint(&mut SmallRng::seed_from_u64(1)).unwrap();

        let lexicon = WordList::starter();
        session
            .restart(2, &lexicon, &mut SmallRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(session.level(), 2);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.hints_used(), 0);
        assert!(session.discovered().is_empty());
        assert_eq!(session.select_letter(old), None);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn idle_session_refuses_everything() {
        let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        let mut session = PuzzleSession::new(GameConfig::default(), clock);
        assert_eq!(session.submit(), SubmitOutcome::Ignored);
        assert_eq!(
            session.request_hint(&mut SmallRng::seed_from_u64(0)),
            Err(HintError::NotStarted)
        );
    }
}
