//! Solvability index: which lexicon words a letter multiset can spell.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::config::SessionTuning;
use crate::constants::BASE_MAX_WORD_LEN;
use crate::lexicon::Lexicon;
use crate::numbers::saturating_u32;
use crate::scoring::word_score;

/// A target word and the points it is worth on its level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateWord {
    pub text: String,
    pub score: u32,
}

impl CandidateWord {
    #[must_use]
    pub fn new(text: impl Into<String>, level: u32) -> Self {
        let text = text.into();
        let score = word_score(text.chars().count(), level);
        Self { text, score }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Character multiplicities of a letter multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterCounts(HashMap<char, usize>);

impl LetterCounts {
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut counts = HashMap::new();
        for c in chars {
            *counts.entry(c).or_insert(0) += 1;
        }
        Self(counts)
    }

    #[must_use]
    pub fn available(&self, c: char) -> usize {
        self.0.get(&c).copied().unwrap_or(0)
    }

    /// Whether every character of `word` is available often enough.
    #[must_use]
    pub fn can_form(&self, word: &str) -> bool {
        let needed = Self::from_chars(word.chars());
        needed.0.iter().all(|(c, n)| self.available(*c) >= *n)
    }
}

/// Allowed word lengths for a level: `[min, min(max, 5 + level)]`.
#[must_use]
pub fn length_range(level: u32, tuning: &SessionTuning) -> RangeInclusive<usize> {
    let level_cap = BASE_MAX_WORD_LEN.saturating_add(usize::try_from(level).unwrap_or(usize::MAX));
    tuning.min_word_len..=tuning.max_word_len.min(level_cap)
}

/// Every formable, lexicon-present word for one board.
///
/// Ordered ascending by length, alphabetically within a length. Immutable once
/// computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvableWordSet {
    words: Vec<CandidateWord>,
    index: HashMap<String, usize>,
}

impl SolvableWordSet {
    fn from_sorted(words: Vec<CandidateWord>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.text.clone(), i))
            .collect();
        Self { words, index }
    }

    /// Construct directly from words (deduplicated and ordered).
    pub fn from_words<I: IntoIterator<Item = CandidateWord>>(words: I) -> Self {
        let mut words: Vec<CandidateWord> = words.into_iter().collect();
        words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.text.cmp(&b.text)));
        words.dedup_by(|a, b| a.text == b.text);
        Self::from_sorted(words)
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<&CandidateWord> {
        self.index.get(word).map(|&i| &self.words[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateWord> {
        self.words.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CandidateWord] {
        &self.words
    }

    /// Sum of every word's score.
    #[must_use]
    pub fn total_score(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.score)).sum()
    }

    #[must_use]
    pub fn word_count(&self) -> u32 {
        saturating_u32(self.words.len())
    }
}

/// Compute the solvable set with default session tuning.
pub fn compute_solvable<L: Lexicon + ?Sized>(
    letters: &[char],
    level: u32,
    lexicon: &L,
) -> SolvableWordSet {
    compute_solvable_with(letters, level, lexicon, &SessionTuning::default())
}

/// Compute the solvable set for explicit length tuning.
pub fn compute_solvable_with<L: Lexicon + ?Sized>(
    letters: &[char],
    level: u32,
    lexicon: &L,
    tuning: &SessionTuning,
) -> SolvableWordSet {
    let counts = LetterCounts::from_chars(letters.iter().copied());
    let mut words = Vec::new();
    for len in length_range(level, tuning) {
        words.extend(
            lexicon
                .words_of_length(len)
                .iter()
                .filter(|word| counts.can_form(word))
                .map(|word| CandidateWord::new(word.clone(), level)),
        );
    }
    SolvableWordSet::from_words(words)
}

/// Cooperative variant that yields to the executor after every `batch` words.
///
/// Produces exactly the same set as [`compute_solvable_with`].
#[cfg(feature = "async")]
pub async fn compute_solvable_async<L: Lexicon + ?Sized>(
    letters: &[char],
    level: u32,
    lexicon: &L,
    tuning: &SessionTuning,
    batch: usize,
) -> SolvableWordSet {
    let counts = LetterCounts::from_chars(letters.iter().copied());
    let batch = batch.max(1);
    let mut words = Vec::new();
    for len in length_range(level, tuning) {
        for chunk in lexicon.words_of_length(len).chunks(batch) {
            words.extend(
                chunk
                    .iter()
                    .filter(|word| counts.can_form(word))
                    .map(|word| CandidateWord::new(word.clone(), level)),
            );
            tokio::task::yield_now().await;
        }
    }
    SolvableWordSet::from_words(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::WordList;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn cats_board_excludes_short_and_unformable_words() {
        let lexicon = WordList::from_words(["CAT", "CATS", "AT", "TACT", "SCAT", "DOG"]);
        let set = compute_solvable(&chars("CATS"), 1, &lexicon);
        let texts: Vec<&str> = set.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["CAT", "CATS", "SCAT"]);
        assert!(!set.contains("AT"));
        assert!(!set.contains("TACT"), "needs two Ts");
    }

    #[test]
    fn length_cap_tracks_level() {
        let tuning = SessionTuning::default();
        assert_eq!(length_range(1, &tuning), 3..=6);
        assert_eq!(length_range(2, &tuning), 3..=7);
        assert_eq!(length_range(30, &tuning), 3..=8);

        let lexicon = WordList::from_words(["LISTEN", "SILENT", "TINSEL", "ENLISTS"]);
        let letters = chars("ENLISTSX");
        assert_eq!(compute_solvable(&letters, 1, &lexicon).len(), 3);
        assert_eq!(compute_solvable(&letters, 2, &lexicon).len(), 4);
    }

    #[test]
    fn every_member_is_formable_and_present() {
        let lexicon = WordList::starter();
        for letters in ["STARELIN", "EARTHS", "PLANETOS", "QZXJ"] {
            let letters = chars(letters);
            let counts = LetterCounts::from_chars(letters.iter().copied());
            let set = compute_solvable(&letters, 5, &lexicon);
            for word in set.iter() {
                assert!(counts.can_form(&word.text));
                assert!(lexicon.has_word(&word.text));
            }
            let expected = lexicon
                .iter()
                .filter(|w| (3..=8).contains(&w.chars().count()) && counts.can_form(w))
                .count();
            assert_eq!(set.len(), expected);
        }
    }

    #[test]
    fn ordering_is_by_length_then_text() {
        let set = SolvableWordSet::from_words([
            CandidateWord::new("STAR", 1),
            CandidateWord::new("TAR", 1),
            CandidateWord::new("ART", 1),
            CandidateWord::new("ART", 1),
        ]);
        let texts: Vec<&str> = set.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["ART", "TAR", "STAR"]);
        assert_eq!(set.get("STAR").map(|w| w.score), Some(20));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn async_scan_matches_sync_scan() {
        let lexicon = WordList::starter();
        let letters = chars("STARELIN");
        let tuning = SessionTuning::default();
        let sync = compute_solvable_with(&letters, 3, &lexicon, &tuning);
        let cooperative = compute_solvable_async(&letters, 3, &lexicon, &tuning, 7).await;
        assert_eq!(sync, cooperative);
    }
}
