//! Level pipeline: generate letters, index solvable words, fall back if needed.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GameConfig;
use crate::constants::FALLBACK_LETTERS;
use crate::letters::{draw_letters, letter_count_for_level};
use crate::lexicon::Lexicon;
use crate::solver::{SolvableWordSet, compute_solvable_with, length_range};

/// Failures while preparing a level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LevelLoadError {
    /// The pipeline exceeded its time budget; the caller may retry.
    #[error("loading timed out after {limit:?}")]
    TimedOut { limit: Duration },
    /// The lexicon has no word that fits this level at all.
    #[error("no playable words exist for level {level}")]
    NoPlayableWords { level: u32 },
}

impl LevelLoadError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// How a board's letters were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardSource {
    /// Random draw accepted on the given attempt (1-based).
    Random { attempt: u32 },
    /// Random draws exhausted; the fixed fallback letters were used.
    Fixed,
    /// Fixed letters were unsolvable too; letters were taken from a lexicon word.
    Anchored,
}

/// Letters plus their solvable words for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBoard {
    pub level: u32,
    pub letters: Vec<char>,
    pub solvable: SolvableWordSet,
    pub source: BoardSource,
}

/// Build a playable board.
///
/// Random draws are retried up to `generator.max_attempts` times; after that the
/// fixed fallback letters are used, and as a last resort the letters of a
/// lexicon word of allowed length.
///
/// # Errors
///
/// Returns [`LevelLoadError::NoPlayableWords`] when the lexicon holds no word in
/// the level's length range.
pub fn build_board<L, R>(
    level: u32,
    lexicon: &L,
    cfg: &GameConfig,
    rng: &mut R,
) -> Result<LevelBoard, LevelLoadError>
where
    L: Lexicon + ?Sized,
    R: Rng + ?Sized,
{
    let level = level.max(1);
    for attempt in 1..=cfg.generator.max_attempts {
        let letters = draw_letters(level, &cfg.generator, rng);
        let solvable = compute_solvable_with(&letters, level, lexicon, &cfg.session);
        if !solvable.is_empty() {
            log::debug!(
                "level {level}: attempt {attempt} accepted {letters:?} with {} words",
                solvable.len()
            );
            return Ok(LevelBoard {
                level,
                letters,
                solvable,
                source: BoardSource::Random { attempt },
            });
        }
        log::debug!("level {level}: attempt {attempt} drew unsolvable {letters:?}");
    }
    fallback_board(level, lexicon, cfg)
}

/// Guaranteed-solvable configuration used when random draws keep failing.
///
/// # Errors
///
/// Returns [`LevelLoadError::NoPlayableWords`] when no lexicon word fits.
pub fn fallback_board<L: Lexicon + ?Sized>(
    level: u32,
    lexicon: &L,
    cfg: &GameConfig,
) -> Result<LevelBoard, LevelLoadError> {
    let count = letter_count_for_level(level, &cfg.generator).max(cfg.session.min_word_len);
    let fixed: Vec<char> = FALLBACK_LETTERS.iter().copied().take(count).collect();
    let solvable = compute_solvable_with(&fixed, level, lexicon, &cfg.session);
    if !solvable.is_empty() {
        log::warn!("level {level}: random letter sets exhausted, using fixed fallback");
        return Ok(LevelBoard {
            level,
            letters: fixed,
            solvable,
            source: BoardSource::Fixed,
        });
    }

    for len in length_range(level, &cfg.session) {
        let Some(anchor) = lexicon.words_of_length(len).first() else {
            continue;
        };
        let mut letters: Vec<char> = anchor.chars().collect();
        for &pad in FALLBACK_LETTERS.iter() {
            if letters.len() >= count {
                break;
            }
            letters.push(pad);
        }
        let solvable = compute_solvable_with(&letters, level, lexicon, &cfg.session);
        log::warn!("level {level}: fixed fallback unsolvable, anchoring on {anchor}");
        return Ok(LevelBoard {
            level,
            letters,
            solvable,
            source: BoardSource::Anchored,
        });
    }

    Err(LevelLoadError::NoPlayableWords { level })
}
