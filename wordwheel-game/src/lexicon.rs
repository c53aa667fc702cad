//! Word validity oracle.
//!
//! The core only ever asks two questions of a dictionary: whether a word
//! exists, and which words have a given length. [`WordList`] is the in-memory
//! implementation used by the engine and tests; hosts may supply their own.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

const STARTER_LEXICON_DATA: &str = include_str!("../assets/data/lexicon.json");

/// Read-only dictionary lookup.
pub trait Lexicon {
    /// Whether the normalized (uppercase) word exists.
    fn has_word(&self, word: &str) -> bool;

    /// Every word with exactly `len` characters, in a stable order.
    fn words_of_length(&self, len: usize) -> &[String];
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("lexicon JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize)]
struct LexiconDocument {
    words: Vec<String>,
}

/// In-memory lexicon bucketed by word length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    by_len: BTreeMap<usize, Vec<String>>,
    index: HashSet<String>,
}

impl WordList {
    /// Create an empty word list (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from arbitrary words. Entries are trimmed and uppercased; entries
    /// with non-alphabetic characters and duplicates are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for raw in words {
            let Some(word) = normalize_word(raw.as_ref()) else {
                continue;
            };
            if list.index.insert(word.clone()) {
                list.by_len
                    .entry(word.chars().count())
                    .or_default()
                    .push(word);
            }
        }
        for bucket in list.by_len.values_mut() {
            bucket.sort_unstable();
        }
        list
    }

    /// Load from a JSON document of the form `{"words": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, LexiconError> {
        let doc: LexiconDocument = serde_json::from_str(json)?;
        Ok(Self::from_words(doc.words))
    }

    /// Load from newline-separated text; blank lines and `#` comments are skipped.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// The starter lexicon shipped with the crate.
    #[must_use]
    pub fn starter() -> Self {
        Self::from_json(STARTER_LEXICON_DATA).unwrap_or_else(|err| {
            log::warn!("embedded starter lexicon failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterate all words, shortest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.by_len.values().flatten().map(String::as_str)
    }
}

impl Lexicon for WordList {
    fn has_word(&self, word: &str) -> bool {
        self.index.contains(word)
    }

    fn words_of_length(&self, len: usize) -> &[String] {
        self.by_len.get(&len).map_or(&[], Vec::as_slice)
    }
}

/// Uppercase a candidate word, rejecting empty or non-alphabetic input.
#[must_use]
pub fn normalize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(trimmed.chars().flat_map(char::to_uppercase).collect())
}
