//! Append-only token ledger with daily streak tracking.
//!
//! The transaction log is the source of truth; `balance` is a cache that must
//! always equal earned minus spent over the log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::clock::Clock;
use crate::constants::{REASON_DAILY_STREAK_PREFIX, REWARD_DAILY_STREAK, TRANSACTION_ID_PREFIX};
use crate::settlement::{NoopSettlement, Settlement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance: requested {requested}, available {balance}")]
    InsufficientBalance { requested: u64, balance: u64 },
    #[error("amount must be positive")]
    ZeroAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Earned,
    Spent,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Earned => "earned",
            Self::Spent => "spent",
        })
    }
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: u64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    /// Reference issued by the settlement mirror, when it answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
}

impl Transaction {
    /// Contribution to the balance: positive when earned, negative when spent.
    #[must_use]
    pub fn signed_amount(&self) -> i128 {
        match self.kind {
            TransactionKind::Earned => i128::from(self.amount),
            TransactionKind::Spent => -i128::from(self.amount),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub count: u32,
    #[serde(default)]
    pub last_awarded: Option<NaiveDate>,
}

/// Serializable ledger state for the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub next_seq: u64,
}

/// Explicitly owned reward ledger.
pub struct RewardLedger {
    clock: Rc<dyn Clock>,
    settlement: Rc<dyn Settlement>,
    streak_bonus: u64,
    balance: u64,
    transactions: Vec<Transaction>,
    streak: StreakState,
    next_seq: u64,
}

impl fmt::Debug for RewardLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardLedger")
            .field("balance", &self.balance)
            .field("transactions", &self.transactions.len())
            .field("streak", &self.streak)
            .finish_non_exhaustive()
    }
}

impl RewardLedger {
    #[must_use]
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            settlement: Rc::new(NoopSettlement),
            streak_bonus: REWARD_DAILY_STREAK,
            balance: 0,
            transactions: Vec::new(),
            streak: StreakState::default(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn with_settlement(mut self, settlement: Rc<dyn Settlement>) -> Self {
        self.settlement = settlement;
        self
    }

    #[must_use]
    pub const fn with_streak_bonus(mut self, bonus: u64) -> Self {
        self.streak_bonus = bonus;
        self
    }

    pub fn set_settlement(&mut self, settlement: Rc<dyn Settlement>) {
        self.settlement = settlement;
    }

    /// Restore from a snapshot. A cached balance that disagrees with the log is
    /// replaced by the replayed value.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot, clock: Rc<dyn Clock>) -> Self {
        let LedgerSnapshot {
            balance,
            transactions,
            streak,
            next_seq,
        } = snapshot;
        let replayed = replay(&transactions);
        if replayed != balance {
            log::warn!("ledger snapshot balance {balance} disagrees with log ({replayed}); repairing");
        }
        let next_seq = next_seq.max(u64::try_from(transactions.len()).unwrap_or(u64::MAX));
        Self {
            balance: replayed,
            transactions,
            streak,
            next_seq,
            ..Self::new(clock)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balance: self.balance,
            transactions: self.transactions.clone(),
            streak: self.streak,
            next_seq: self.next_seq,
        }
    }

    /// Credit `amount` tokens.
    ///
    /// # Errors
    ///
    /// Only [`LedgerError::ZeroAmount`]; positive awards always succeed.
    pub fn award(&mut self, amount: u64, reason: &str) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.balance = self.balance.saturating_add(amount);
        let tx = self.append(TransactionKind::Earned, amount, reason);
        log::info!("+{amount} tokens ({reason}), balance {}", self.balance);
        Ok(tx)
    }

    /// Debit `amount` tokens.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] when `amount` exceeds the balance,
    /// [`LedgerError::ZeroAmount`] for zero. The ledger is unchanged on error.
    pub fn spend(&mut self, amount: u64, reason: &str) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        let tx = self.append(TransactionKind::Spent, amount, reason);
        log::info!("-{amount} tokens ({reason}), balance {}", self.balance);
        Ok(tx)
    }

    /// Award the streak bonus at most once per calendar day.
    ///
    /// Consecutive days extend the streak; any other gap restarts it at 1. A
    /// `today` earlier than the last award is ignored.
    pub fn evaluate_daily_streak(&mut self, today: NaiveDate) -> Option<Transaction> {
        let next = match self.streak.last_awarded {
            Some(last) if today == last => return None,
            Some(last) if today < last => {
                log::warn!("streak evaluation for {today} precedes last award {last}; ignoring");
                return None;
            }
            Some(last) if last.succ_opt() == Some(today) => self.streak.count.saturating_add(1),
            _ => 1,
        };
        self.streak = StreakState {
            count: next,
            last_awarded: Some(today),
        };
        let reason = format!("{REASON_DAILY_STREAK_PREFIX}{next}");
        match self.award(self.streak_bonus, &reason) {
            Ok(tx) => Some(tx),
            Err(err) => {
                log::warn!("streak day {next} recorded without a payout: {err}");
                None
            }
        }
    }

    /// Ask the settlement mirror for a collectible.
    pub fn request_collectible(&self, achievement_id: &str) -> Option<String> {
        let reference = self.settlement.mint_collectible(achievement_id);
        if reference.is_none() {
            log::warn!("collectible for {achievement_id} was not issued");
        }
        reference
    }

    fn append(&mut self, kind: TransactionKind, amount: u64, reason: &str) -> Transaction {
        self.next_seq = self.next_seq.saturating_add(1);
        let external_ref = self.settlement.settle(kind, amount, reason);
        if external_ref.is_none() {
            log::debug!("settlement returned no reference for {kind} {amount} ({reason})");
        }
        let tx = Transaction {
            id: format!("{TRANSACTION_ID_PREFIX}-{}", self.next_seq),
            kind,
            amount,
            reason: reason.to_string(),
            timestamp: self.clock.now(),
            external_ref,
        };
        self.transactions.push(tx.clone());
        tx
    }

    #[must_use]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    #[must_use]
    pub const fn can_afford(&self, amount: u64) -> bool {
        amount <= self.balance
    }

    #[must_use]
    pub const fn streak(&self) -> StreakState {
        self.streak
    }

    /// Every transaction, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Newest-first history, optionally limited.
    pub fn history(&self, limit: Option<usize>) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
    }

    /// Newest-first transactions matching `kind` whose reason contains `search`
    /// (case-insensitive).
    #[must_use]
    pub fn filter(&self, kind: Option<TransactionKind>, search: &str) -> Vec<&Transaction> {
        let needle = search.to_lowercase();
        self.history(None)
            .filter(|tx| kind.is_none_or(|k| tx.kind == k))
            .filter(|tx| needle.is_empty() || tx.reason.to_lowercase().contains(&needle))
            .collect()
    }

    #[must_use]
    pub fn total_earned(&self) -> u64 {
        self.sum_of(TransactionKind::Earned)
    }

    #[must_use]
    pub fn total_spent(&self) -> u64 {
        self.sum_of(TransactionKind::Spent)
    }

    /// Tokens earned on a calendar day.
    #[must_use]
    pub fn earned_on(&self, day: NaiveDate) -> u64 {
        self.transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Earned && tx.timestamp.date_naive() == day)
            .map(|tx| tx.amount)
            .sum()
    }

    /// Balance recomputed from the log alone.
    #[must_use]
    pub fn replay_balance(&self) -> u64 {
        replay(&self.transactions)
    }

    fn sum_of(&self, kind: TransactionKind) -> u64 {
        self.transactions
            .iter()
            .filter(|tx| tx.kind == kind)
            .map(|tx| tx.amount)
            .sum()
    }
}

fn replay(transactions: &[Transaction]) -> u64 {
    let total: i128 = transactions.iter().map(Transaction::signed_amount).sum();
    u64::try_from(total.max(0)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settlement::RecordingSettlement;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn ledger() -> (RewardLedger, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::at_day(day(1)));
        (RewardLedger::new(clock.clone()), clock)
    }

    #[test]
    fn spend_beyond_balance_fails_without_side_effects() {
        let (mut ledger, _) = ledger();
        let err = ledger.spend(50, "hint").unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                requested: 50,
                balance: 0
            }
        );
        assert_eq!(err.to_string(), "insufficient balance: requested 50, available 0");
        assert_eq!(ledger.balance(), 0);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn award_and_spend_keep_balance_in_sync_with_log() {
        let (mut ledger, _) = ledger();
        ledger.award(100, "Level Completed").unwrap();
        ledger.award(25, "Speed Bonus - Under 1 Minute").unwrap();
        let spent = ledger.spend(40, "hint").unwrap();
        assert_eq!(spent.kind, TransactionKind::Spent);
        assert_eq!(ledger.balance(), 85);
        assert_eq!(ledger.replay_balance(), 85);
        assert_eq!(ledger.total_earned(), 125);
        assert_eq!(ledger.total_spent(), 40);
        assert_eq!(ledger.award(0, "nothing"), Err(LedgerError::ZeroAmount));
    }

    #[test]
    fn streak_follows_calendar_days() {
        let (mut ledger, _) = ledger();
        let first = ledger.evaluate_daily_streak(day(1)).unwrap();
        assert_eq!(first.reason, "Daily Streak Day 1");
        assert_eq!(ledger.evaluate_daily_streak(day(1)), None);
        assert_eq!(ledger.streak().count, 1);

        ledger.evaluate_daily_streak(day(2)).unwrap();
        assert_eq!(ledger.streak().count, 2);

        let reset = ledger.evaluate_daily_streak(day(7)).unwrap();
        assert_eq!(ledger.streak().count, 1);
        assert_eq!(reset.amount, REWARD_DAILY_STREAK);
        assert_eq!(ledger.balance(), 3 * REWARD_DAILY_STREAK);

        assert_eq!(ledger.evaluate_daily_streak(day(3)), None);
        assert_eq!(ledger.streak().last_awarded, Some(day(7)));
    }

    #[test]
    fn history_queries_are_newest_first() {
        let (mut ledger, clock) = ledger();
        ledger.award(10, "First Word Found").unwrap();
        clock.advance_days(1);
        ledger.award(20, "Level Completed").unwrap();
        ledger.spend(5, "Hint purchase").unwrap();

        let ids: Vec<&str> = ledger.history(Some(2)).map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["tx-3", "tx-2"]);
        assert_eq!(ledger.filter(Some(TransactionKind::Earned), "").len(), 2);
        assert_eq!(ledger.filter(None, "LEVEL").len(), 1);
        assert_eq!(ledger.earned_on(day(1)), 10);
        assert_eq!(ledger.earned_on(day(2)), 20);
    }

    #[test]
    fn snapshot_restore_repairs_cached_balance() {
        let (mut ledger, clock) = ledger();
        ledger.award(70, "Level Completed").unwrap();
        ledger.evaluate_daily_streak(day(1));
        let mut snapshot = ledger.snapshot();
        snapshot.balance = 9_999;

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let mut ledger = RewardLedger::from_snapshot(restored, clock);
        assert_eq!(ledger.balance(), 70 + REWARD_DAILY_STREAK);
        assert_eq!(ledger.streak().count, 1);
        let next = ledger.award(1, "x").unwrap();
        assert_eq!(next.id, "tx-3");
    }

    #[test]
    fn settlement_failure_never_blocks_local_entry() {
        let (ledger, _) = ledger();
        let mirror = Rc::new(RecordingSettlement::new());
        let mut ledger = ledger.with_settlement(mirror.clone());
        let online = ledger.award(10, "a").unwrap();
        assert_eq!(online.external_ref.as_deref(), Some("ext-0001"));
        mirror.set_online(false);
        let offline = ledger.award(10, "b").unwrap();
        assert_eq!(offline.external_ref, None);
        assert_eq!(ledger.balance(), 20);
        assert_eq!(mirror.calls().len(), 2);
    }
}
