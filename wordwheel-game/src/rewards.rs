//! Token awards tied to a single puzzle session.
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::{RewardTable, SessionTuning};
use crate::constants::{
    REASON_FIRST_WORD, REASON_LEVEL_COMPLETE, REASON_PERFECT_LEVEL, REASON_SPEED_BONUS,
};
use crate::ledger::{RewardLedger, Transaction};
use crate::session::CompletionEvent;

/// Tracks which once-per-session awards have been paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionAwards {
    first_word_paid: bool,
    completion_paid: bool,
}

impl SessionAwards {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first_word_paid: false,
            completion_paid: false,
        }
    }

    /// Pay the first-word bonus if this session has not paid it yet.
    pub fn pay_first_word(
        &mut self,
        ledger: &mut RewardLedger,
        rewards: &RewardTable,
    ) -> Option<Transaction> {
        if self.first_word_paid {
            return None;
        }
        self.first_word_paid = true;
        ledger.award(rewards.first_word, REASON_FIRST_WORD).ok()
    }

    /// Pay the completion bundle once: level complete, perfect, speed, then the
    /// daily streak for `today`.
    pub fn pay_completion(
        &mut self,
        ledger: &mut RewardLedger,
        rewards: &RewardTable,
        tuning: &SessionTuning,
        event: &CompletionEvent,
        today: NaiveDate,
    ) -> Vec<Transaction> {
        if self.completion_paid {
            return Vec::new();
        }
        self.completion_paid = true;

        let mut paid = Vec::new();
        paid.extend(ledger.award(rewards.level_complete, REASON_LEVEL_COMPLETE).ok());
        if event.is_perfect() {
            paid.extend(ledger.award(rewards.perfect_level, REASON_PERFECT_LEVEL).ok());
        }
        if event.elapsed < Duration::from_secs(tuning.speed_threshold_secs) {
            paid.extend(ledger.award(rewards.speed_bonus, REASON_SPEED_BONUS).ok());
        }
        paid.extend(ledger.evaluate_daily_streak(today));
        paid
    }

    #[must_use]
    pub const fn first_word_paid(&self) -> bool {
        self.first_word_paid
    }

    #[must_use]
    pub const fn completion_paid(&self) -> bool {
        self.completion_paid
    }
}
