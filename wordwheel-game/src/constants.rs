//! Centralized balance and tuning constants for Wordwheel game logic.
//!
//! Values that designers tune per release live in `GameConfig` and its embedded
//! JSON asset. The constants here are the compiled fallbacks for that asset plus
//! structural limits that are not meant to be data-driven.

// Word lengths -------------------------------------------------------------
pub const MIN_WORD_LEN: usize = 3;
pub const MAX_WORD_LEN: usize = 8;
pub(crate) const BASE_MAX_WORD_LEN: usize = 5;

// Hints --------------------------------------------------------------------
pub const HINT_BUDGET: u8 = 3;
pub(crate) const HINT_REVEAL_CHARS: usize = 2;
pub(crate) const HINT_MASK_CHAR: char = '*';

// Auto-resolution ----------------------------------------------------------
pub const DEBOUNCE_MS: u64 = 500;

// Level loading ------------------------------------------------------------
pub const LEVEL_LOAD_TIMEOUT_MS: u64 = 10_000;
pub const SOLVER_BATCH_SIZE: usize = 50;

// Letter generation --------------------------------------------------------
pub(crate) const GENERATOR_BASE_LETTERS: usize = 5;
pub(crate) const GENERATOR_MAX_LETTERS: usize = 8;
pub(crate) const GENERATOR_LEVELS_PER_LETTER: u32 = 5;
pub(crate) const GENERATOR_MAX_ATTEMPTS: u32 = 20;
pub(crate) const GENERATOR_MIN_VOWELS: usize = 2;
pub(crate) const GENERATOR_RARE_WEIGHT_CEILING: u32 = 20;
pub(crate) const GENERATOR_RARE_BOOST_CAP: u32 = 12;
pub(crate) const FALLBACK_LETTERS: [char; 8] = ['S', 'T', 'A', 'R', 'E', 'L', 'I', 'N'];
pub(crate) const VOWELS: [char; 5] = ['A', 'E', 'I', 'O', 'U'];

/// Relative English letter frequencies used to bias random letter sets.
pub(crate) const LETTER_WEIGHTS: [(char, u32); 26] = [
    ('A', 82),
    ('B', 15),
    ('C', 28),
    ('D', 43),
    ('E', 127),
    ('F', 22),
    ('G', 20),
    ('H', 61),
    ('I', 70),
    ('J', 2),
    ('K', 8),
    ('L', 40),
    ('M', 24),
    ('N', 67),
    ('O', 75),
    ('P', 19),
    ('Q', 1),
    ('R', 60),
    ('S', 63),
    ('T', 91),
    ('U', 28),
    ('V', 10),
    ('W', 24),
    ('X', 2),
    ('Y', 20),
    ('Z', 1),
];

// Scoring ------------------------------------------------------------------
pub(crate) const LENGTH_POINTS: [u32; 9] = [0, 0, 0, 10, 20, 35, 55, 80, 110];
pub(crate) const LEVEL_SCALE_DENOMINATOR: u32 = 10;
pub(crate) const LEVEL_SCALE_CAP: u32 = 40;

// Rewards ------------------------------------------------------------------
pub const REWARD_LEVEL_COMPLETE: u64 = 100;
pub const REWARD_PERFECT_LEVEL: u64 = 200;
pub const REWARD_FIRST_WORD: u64 = 50;
pub const REWARD_SPEED_BONUS: u64 = 25;
pub const REWARD_DAILY_STREAK: u64 = 150;
pub const REWARD_ACHIEVEMENT_UNLOCK: u64 = 300;
pub const SPEED_THRESHOLD_SECS: u64 = 60;

// Achievement thresholds ---------------------------------------------------
pub(crate) const WORD_MASTER_WORDS: u64 = 1_000;
pub(crate) const DAILY_WARRIOR_DAYS: u32 = 7;
pub(crate) const LETTER_LEGEND_LEVEL: u32 = 50;

// Ledger reasons -----------------------------------------------------------
pub(crate) const REASON_LEVEL_COMPLETE: &str = "Level Completed";
pub(crate) const REASON_PERFECT_LEVEL: &str = "Perfect Level - 100% Words Found";
pub(crate) const REASON_SPEED_BONUS: &str = "Speed Bonus - Under 1 Minute";
pub(crate) const REASON_FIRST_WORD: &str = "First Word Found";
pub(crate) const REASON_DAILY_STREAK_PREFIX: &str = "Daily Streak Day ";
pub(crate) const REASON_ACHIEVEMENT_PREFIX: &str = "Achievement Unlocked: ";
pub(crate) const TRANSACTION_ID_PREFIX: &str = "tx";
