//! Structured events emitted by the play controller.
//!
//! Events describe what happened mechanically; each carries a hint for how a
//! presentation layer should surface it.

use serde::{Deserialize, Serialize};

use crate::achievements::UnlockNotification;
use crate::ledger::Transaction;
use crate::session::{CompletionEvent, Hint, Rejection};

/// Hint for how the UI should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    LevelStarted {
        level: u32,
        letters: Vec<char>,
        total_words: u32,
    },
    WordAccepted {
        word: String,
        score: u32,
        found: u32,
        total: u32,
    },
    WordRejected {
        word: String,
        reason: Rejection,
    },
    SelectionCleared,
    HintRevealed(Hint),
    HintDenied {
        message: String,
    },
    LevelComplete(CompletionEvent),
    TokensAwarded(Transaction),
    TokensSpent(Transaction),
    SpendDeclined {
        amount: u64,
        balance: u64,
        message: String,
    },
    AchievementUnlocked(UnlockNotification),
    LoadingFailed {
        level: u32,
        message: String,
        retryable: bool,
    },
}

impl GameEvent {
    #[must_use]
    pub const fn ui_surface_hint(&self) -> UiSurfaceHint {
        match self {
            Self::LevelStarted { .. }
            | Self::WordAccepted { .. }
            | Self::SelectionCleared
            | Self::TokensSpent(_) => UiSurfaceHint::Log,
            Self::WordRejected { .. }
            | Self::HintRevealed(_)
            | Self::HintDenied { .. }
            | Self::SpendDeclined { .. }
            | Self::TokensAwarded(_) => UiSurfaceHint::Toast,
            Self::LevelComplete(_) | Self::AchievementUnlocked(_) | Self::LoadingFailed { .. } => {
                UiSurfaceHint::Modal
            }
        }
    }

    /// Short machine-readable name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LevelStarted { .. } => "level_started",
            Self::WordAccepted { .. } => "word_accepted",
            Self::WordRejected { .. } => "word_rejected",
            Self::SelectionCleared => "selection_cleared",
            Self::HintRevealed(_) => "hint_revealed",
            Self::HintDenied { .. } => "hint_denied",
            Self::LevelComplete(_) => "level_complete",
            Self::TokensAwarded(_) => "tokens_awarded",
            Self::TokensSpent(_) => "tokens_spent",
            Self::SpendDeclined { .. } => "spend_declined",
            Self::AchievementUnlocked(_) => "achievement_unlocked",
            Self::LoadingFailed { .. } => "loading_failed",
        }
    }
}
