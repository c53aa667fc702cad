//! Letter tiles and the random letter-set generator.
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GeneratorTuning;
use crate::constants::{
    GENERATOR_LEVELS_PER_LETTER, GENERATOR_RARE_BOOST_CAP, GENERATOR_RARE_WEIGHT_CEILING,
    LETTER_WEIGHTS, VOWELS,
};

/// Opaque tile identifier, unique within one puzzle session.
///
/// The board component changes every time the session loads a level, so ids
/// held over from an earlier board never match a current tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LetterId {
    board: u32,
    index: u8,
}

impl LetterId {
    #[must_use]
    pub const fn new(board: u32, index: u8) -> Self {
        Self { board, index }
    }
}

impl fmt::Display for LetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}.{}", self.board, self.index)
    }
}

/// A single tile on the letter wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    pub id: LetterId,
    pub character: char,
    pub position: usize,
}

/// Assign ids to generated characters for a given board number.
#[must_use]
pub fn tiles_for_board(board: u32, chars: &[char]) -> Vec<Letter> {
    chars
        .iter()
        .enumerate()
        .map(|(position, &character)| Letter {
            id: LetterId::new(board, u8::try_from(position).unwrap_or(u8::MAX)),
            character,
            position,
        })
        .collect()
}

/// Number of tiles dealt on a level: one more every few levels, capped.
#[must_use]
pub fn letter_count_for_level(level: u32, tuning: &GeneratorTuning) -> usize {
    let extra = level.saturating_sub(1) / GENERATOR_LEVELS_PER_LETTER;
    tuning
        .base_letters
        .saturating_add(usize::try_from(extra).unwrap_or(usize::MAX))
        .min(tuning.max_letters)
}

/// Weight added to uncommon letters as levels rise.
#[must_use]
pub fn rare_letter_boost(level: u32) -> u32 {
    (level.saturating_sub(1) / 4).min(GENERATOR_RARE_BOOST_CAP)
}

fn level_weights(level: u32) -> Vec<u32> {
    let boost = rare_letter_boost(level);
    LETTER_WEIGHTS
        .iter()
        .map(|&(_, w)| {
            if w < GENERATOR_RARE_WEIGHT_CEILING {
                w + boost
            } else {
                w
            }
        })
        .collect()
}

fn vowel_weights() -> Vec<u32> {
    VOWELS
        .iter()
        .map(|v| {
            LETTER_WEIGHTS
                .iter()
                .find(|(c, _)| c == v)
                .map_or(1, |&(_, w)| w)
        })
        .collect()
}

/// Draw a random letter multiset for `level`.
///
/// At least `min_vowels` tiles are vowels; the rest follow English letter
/// frequencies with a mild boost for rare letters on later levels. The result
/// is shuffled so vowels do not cluster at the front.
pub fn draw_letters<R: Rng + ?Sized>(level: u32, tuning: &GeneratorTuning, rng: &mut R) -> Vec<char> {
    let count = letter_count_for_level(level, tuning);
    let vowel_count = tuning.min_vowels.min(count);
    let mut letters = Vec::with_capacity(count);

    if let Ok(vowel_dist) = WeightedIndex::new(vowel_weights()) {
        letters.extend((0..vowel_count).map(|_| VOWELS[vowel_dist.sample(rng)]));
    }
    if let Ok(letter_dist) = WeightedIndex::new(level_weights(level)) {
        while letters.len() < count {
            letters.push(LETTER_WEIGHTS[letter_dist.sample(rng)].0);
        }
    }
    letters.shuffle(rng);
    letters
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn count_grows_with_level_and_caps() {
        let tuning = GeneratorTuning::default();
        assert_eq!(letter_count_for_level(1, &tuning), 5);
        assert_eq!(letter_count_for_level(5, &tuning), 5);
        assert_eq!(letter_count_for_level(6, &tuning), 6);
        assert_eq!(letter_count_for_level(500, &tuning), 8);
    }

    #[test]
    fn draws_respect_vowel_floor_and_size() {
        let tuning = GeneratorTuning::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for level in 1..40 {
            let letters = draw_letters(level, &tuning, &mut rng);
            assert_eq!(letters.len(), letter_count_for_level(level, &tuning));
            let vowels = letters.iter().filter(|c| VOWELS.contains(c)).count();
            assert!(vowels >= tuning.min_vowels, "level {level}: {letters:?}");
            assert!(letters.iter().all(char::is_ascii_uppercase));
        }
    }

    #[test]
    fn draws_are_seed_stable() {
        let tuning = GeneratorTuning::default();
        let a = draw_letters(3, &tuning, &mut ChaCha20Rng::seed_from_u64(77));
        let b = draw_letters(3, &tuning, &mut ChaCha20Rng::seed_from_u64(77));
        assert_eq!(a, b);
    }

    #[test]
    fn rare_letters_gain_weight_later() {
        assert_eq!(rare_letter_boost(1), 0);
        let early = level_weights(1);
        let late = level_weights(60);
        let q = LETTER_WEIGHTS.iter().position(|(c, _)| *c == 'Q').unwrap();
        let e = LETTER_WEIGHTS.iter().position(|(c, _)| *c == 'E').unwrap();
        assert!(late[q] > early[q]);
        assert_eq!(late[e], early[e]);
    }

    #[test]
    fn tiles_get_board_scoped_ids() {
        let tiles = tiles_for_board(3, &['C', 'A', 'T']);
        assert_eq!(tiles[2].id, LetterId::new(3, 2));
        assert_eq!(tiles[2].position, 2);
        assert_ne!(tiles_for_board(4, &['C'])[0].id, tiles[0].id);
        assert_eq!(tiles[0].id.to_string(), "L3.0");
    }
}
