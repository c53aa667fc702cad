//! Data-driven tuning for sessions, rewards, generation and loading.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEBOUNCE_MS, GENERATOR_BASE_LETTERS, GENERATOR_MAX_ATTEMPTS, GENERATOR_MAX_LETTERS,
    GENERATOR_MIN_VOWELS, HINT_BUDGET, LEVEL_LOAD_TIMEOUT_MS, MAX_WORD_LEN, MIN_WORD_LEN,
    REWARD_ACHIEVEMENT_UNLOCK, REWARD_DAILY_STREAK, REWARD_FIRST_WORD, REWARD_LEVEL_COMPLETE,
    REWARD_PERFECT_LEVEL, REWARD_SPEED_BONUS, SOLVER_BATCH_SIZE, SPEED_THRESHOLD_SECS,
};

const DEFAULT_CONFIG_DATA: &str = include_str!("../assets/data/config.json");

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("word length minimum {min} exceeds maximum {max}")]
    WordLengthRange { min: usize, max: usize },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must be at most {max} (got {value})")]
    MaxViolation {
        field: &'static str,
        max: u64,
        value: u64,
    },
    #[error("letter count base {base} exceeds maximum {max}")]
    LetterCountRange { base: usize, max: usize },
}

/// Token amounts paid for each reward category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    #[serde(default = "RewardTable::default_level_complete")]
    pub level_complete: u64,
    #[serde(default = "RewardTable::default_perfect_level")]
    pub perfect_level: u64,
    #[serde(default = "RewardTable::default_first_word")]
    pub first_word: u64,
    #[serde(default = "RewardTable::default_speed_bonus")]
    pub speed_bonus: u64,
    #[serde(default = "RewardTable::default_daily_streak")]
    pub daily_streak: u64,
    #[serde(default = "RewardTable::default_achievement_unlock")]
    pub achievement_unlock: u64,
}

impl RewardTable {
    const fn default_level_complete() -> u64 {
        REWARD_LEVEL_COMPLETE
    }

    const fn default_perfect_level() -> u64 {
        REWARD_PERFECT_LEVEL
    }

    const fn default_first_word() -> u64 {
        REWARD_FIRST_WORD
    }

    const fn default_speed_bonus() -> u64 {
        REWARD_SPEED_BONUS
    }

    const fn default_daily_streak() -> u64 {
        REWARD_DAILY_STREAK
    }

    const fn default_achievement_unlock() -> u64 {
        REWARD_ACHIEVEMENT_UNLOCK
    }
}

impl RewardTable {
    /// Every category must pay something; the ledger refuses zero awards.
    ///
    /// # Errors
    ///
    /// Returns the first category configured to pay nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let amounts = [
            ("rewards.level_complete", self.level_complete),
            ("rewards.perfect_level", self.perfect_level),
            ("rewards.first_word", self.first_word),
            ("rewards.speed_bonus", self.speed_bonus),
            ("rewards.daily_streak", self.daily_streak),
            ("rewards.achievement_unlock", self.achievement_unlock),
        ];
        match amounts.into_iter().find(|(_, amount)| *amount == 0) {
            Some((field, _)) => Err(ConfigError::MinViolation {
                field,
                min: 1,
                value: 0,
            }),
            None => Ok(()),
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            level_complete: Self::default_level_complete(),
            perfect_level: Self::default_perfect_level(),
            first_word: Self::default_first_word(),
            speed_bonus: Self::default_speed_bonus(),
            daily_streak: Self::default_daily_streak(),
            achievement_unlock: Self::default_achievement_unlock(),
        }
    }
}

/// Puzzle session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTuning {
    #[serde(default = "SessionTuning::default_hint_budget")]
    pub hint_budget: u8,
    #[serde(default = "SessionTuning::default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "SessionTuning::default_min_word_len")]
    pub min_word_len: usize,
    #[serde(default = "SessionTuning::default_max_word_len")]
    pub max_word_len: usize,
    #[serde(default = "SessionTuning::default_speed_threshold_secs")]
    pub speed_threshold_secs: u64,
}

impl SessionTuning {
    const fn default_hint_budget() -> u8 {
        HINT_BUDGET
    }

    const fn default_debounce_ms() -> u64 {
        DEBOUNCE_MS
    }

    const fn default_min_word_len() -> usize {
        MIN_WORD_LEN
    }

    const fn default_max_word_len() -> usize {
        MAX_WORD_LEN
    }

    const fn default_speed_threshold_secs() -> u64 {
        SPEED_THRESHOLD_SECS
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            hint_budget: Self::default_hint_budget(),
            debounce_ms: Self::default_debounce_ms(),
            min_word_len: Self::default_min_word_len(),
            max_word_len: Self::default_max_word_len(),
            speed_threshold_secs: Self::default_speed_threshold_secs(),
        }
    }
}

/// Letter set generator tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorTuning {
    #[serde(default = "GeneratorTuning::default_base_letters")]
    pub base_letters: usize,
    #[serde(default = "GeneratorTuning::default_max_letters")]
    pub max_letters: usize,
    #[serde(default = "GeneratorTuning::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "GeneratorTuning::default_min_vowels")]
    pub min_vowels: usize,
}

impl GeneratorTuning {
    const fn default_base_letters() -> usize {
        GENERATOR_BASE_LETTERS
    }

    const fn default_max_letters() -> usize {
        GENERATOR_MAX_LETTERS
    }

    const fn default_max_attempts() -> u32 {
        GENERATOR_MAX_ATTEMPTS
    }

    const fn default_min_vowels() -> usize {
        GENERATOR_MIN_VOWELS
    }
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            base_letters: Self::default_base_letters(),
            max_letters: Self::default_max_letters(),
            max_attempts: Self::default_max_attempts(),
            min_vowels: Self::default_min_vowels(),
        }
    }
}

/// Level pipeline tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTuning {
    #[serde(default = "LoadTuning::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "LoadTuning::default_solver_batch")]
    pub solver_batch: usize,
}

impl LoadTuning {
    const fn default_timeout_ms() -> u64 {
        LEVEL_LOAD_TIMEOUT_MS
    }

    const fn default_solver_batch() -> usize {
        SOLVER_BATCH_SIZE
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LoadTuning {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
            solver_batch: Self::default_solver_batch(),
        }
    }
}

/// Complete game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub rewards: RewardTable,
    #[serde(default)]
    pub session: SessionTuning,
    #[serde(default)]
    pub generator: GeneratorTuning,
    #[serde(default)]
    pub load: LoadTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_CONFIG_DATA).unwrap_or_else(|err| {
            log::warn!("embedded game config failed to parse, using compiled defaults: {err}");
            Self::compiled_defaults()
        })
    }
}

impl GameConfig {
    /// Defaults built purely from compiled constants.
    #[must_use]
    pub fn compiled_defaults() -> Self {
        Self {
            rewards: RewardTable::default(),
            session: SessionTuning::default(),
            generator: GeneratorTuning::default(),
            load: LoadTuning::default(),
        }
    }

    /// Parse a configuration document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;
        if session.min_word_len < MIN_WORD_LEN {
            return Err(ConfigError::MinViolation {
                field: "session.min_word_len",
                min: u64::try_from(MIN_WORD_LEN).unwrap_or(u64::MAX),
                value: u64::try_from(session.min_word_len).unwrap_or(u64::MAX),
            });
        }
        if session.min_word_len > session.max_word_len {
            return Err(ConfigError::WordLengthRange {
                min: session.min_word_len,
                max: session.max_word_len,
            });
        }
        self.rewards.validate()?;
        if self.load.solver_batch == 0 {
            return Err(ConfigError::MinViolation {
                field: "load.solver_batch",
                min: 1,
                value: 0,
            });
        }
        if self.load.timeout_ms == 0 {
            return Err(ConfigError::MinViolation {
                field: "load.timeout_ms",
                min: 1,
                value: 0,
            });
        }
        if self.generator.max_attempts == 0 {
            return Err(ConfigError::MinViolation {
                field: "generator.max_attempts",
                min: 1,
                value: 0,
            });
        }
        if self.generator.base_letters == 0 || self.generator.base_letters > self.generator.max_letters
        {
            return Err(ConfigError::LetterCountRange {
                base: self.generator.base_letters,
                max: self.generator.max_letters,
            });
        }
        // Tile ids index the board with a u8.
        if self.generator.max_letters > usize::from(u8::MAX) {
            return Err(ConfigError::MaxViolation {
                field: "generator.max_letters",
                max: u64::from(u8::MAX),
                value: u64::try_from(self.generator.max_letters).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}
