//! Wordwheel Game Engine
//!
//! Platform-agnostic core for the Wordwheel letter puzzle: letter generation,
//! solvable word indexing, the puzzle session state machine, and the reward
//! economy (token ledger, daily streaks, achievements). This crate has no UI or
//! platform-specific dependencies; lexicon loading and persistence are supplied
//! by the host through [`LexiconLoader`] and [`ProfileStorage`].

pub mod achievements;
pub mod board;
pub mod clock;
pub mod config;
pub mod constants;
pub mod events;
pub mod ledger;
pub mod letters;
pub mod lexicon;
#[cfg(feature = "async")]
pub mod loader;
pub mod numbers;
pub mod play;
pub mod profile;
pub mod rewards;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod settlement;
pub mod solver;

use std::rc::Rc;

// Re-export commonly used types
pub use achievements::{
    AchievementBook, AchievementDef, AchievementEvaluator, AchievementId, AchievementProgress,
    Rarity, SettlementClass, UnlockNotification, catalog,
};
pub use board::{BoardSource, LevelBoard, LevelLoadError, build_board, fallback_board};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig, GeneratorTuning, LoadTuning, RewardTable, SessionTuning};
pub use events::{GameEvent, UiSurfaceHint};
pub use ledger::{LedgerError, LedgerSnapshot, RewardLedger, StreakState, Transaction, TransactionKind};
pub use letters::{Letter, LetterId, draw_letters, letter_count_for_level};
pub use lexicon::{Lexicon, LexiconError, WordList, normalize_word};
#[cfg(feature = "async")]
pub use loader::{build_board_async, guard_load, load_level};
pub use play::PlaySession;
pub use profile::{GameProgress, PlayerSave, PlayerStats};
pub use rewards::SessionAwards;
pub use scoring::word_score;
pub use seed::{RngBundle, level_seed, load_seed};
pub use session::{
    CompletionEvent, Hint, HintError, PendingAction, PuzzleSession, Rejection, Resolved,
    ScheduledResolution, SessionPhase, SubmitOutcome, TimerToken,
};
pub use settlement::{NoopSettlement, RecordingSettlement, Settlement, SettlementCall};
#[cfg(feature = "async")]
pub use solver::compute_solvable_async;
pub use solver::{CandidateWord, LetterCounts, SolvableWordSet, compute_solvable, compute_solvable_with};

/// Trait for abstracting lexicon loading.
/// Platform-specific implementations should provide this
pub trait LexiconLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the word list used for every level.
    ///
    /// # Errors
    ///
    /// Returns an error if the lexicon cannot be loaded or parsed.
    fn load_lexicon(&self) -> Result<WordList, Self::Error>;
}

/// Loader serving the starter lexicon embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarterLexicon;

impl LexiconLoader for StarterLexicon {
    type Error = std::convert::Infallible;

    fn load_lexicon(&self) -> Result<WordList, Self::Error> {
        Ok(WordList::starter())
    }
}

/// Trait for abstracting profile save/load operations.
/// Platform-specific implementations should provide this
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a player profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    fn save_profile(&self, slot: &str, save: &PlayerSave) -> Result<(), Self::Error>;

    /// Load a player profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded.
    fn load_profile(&self, slot: &str) -> Result<Option<PlayerSave>, Self::Error>;

    /// Delete a saved profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be deleted.
    fn delete_profile(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main game engine for creating and restoring play sessions
pub struct GameEngine<L, S>
where
    L: LexiconLoader,
    S: ProfileStorage,
{
    lexicon_loader: L,
    storage: S,
    config: GameConfig,
    clock: Rc<dyn Clock>,
}

impl<L, S> GameEngine<L, S>
where
    L: LexiconLoader,
    S: ProfileStorage,
{
    /// Create a new engine using default configuration and the system clock
    pub fn new(lexicon_loader: L, storage: S) -> Self {
        Self {
            lexicon_loader,
            storage,
            config: GameConfig::default(),
            clock: Rc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Create a fresh player session with the given seed
    ///
    /// # Errors
    ///
    /// Returns an error if the lexicon cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<PlaySession, L::Error> {
        let lexicon = self.lexicon_loader.load_lexicon()?;
        Ok(PlaySession::new(
            self.config.clone(),
            Rc::new(lexicon),
            self.clock.clone(),
            seed,
        ))
    }

    /// Save a session's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    pub fn save_session(&self, slot: &str, session: &PlaySession) -> Result<(), S::Error> {
        self.storage.save_profile(slot, &session.save())
    }

    /// Restore a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the profile or the lexicon cannot be loaded.
    pub fn load_session(&self, slot: &str, seed: u64) -> Result<Option<PlaySession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(save) = self.storage.load_profile(slot).map_err(Into::into)? {
            // Rehydrate with a fresh lexicon
            let lexicon = self.lexicon_loader.load_lexicon().map_err(Into::into)?;
            Ok(Some(PlaySession::from_save(
                save,
                self.config.clone(),
                Rc::new(lexicon),
                self.clock.clone(),
                seed,
            )))
        } else {
            Ok(None)
        }
    }

    /// Delete a saved profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be deleted.
    pub fn delete_session(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_profile(slot)
    }
}
