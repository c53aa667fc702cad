//! External settlement mirror for ledger entries and collectibles.
//!
//! Calls are fire-and-forget: a `None` reference is logged by the caller and
//! never rolls back the local transaction.
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

use crate::ledger::TransactionKind;

pub trait Settlement {
    /// Mirror a local transaction; returns an external reference when one was issued.
    fn settle(&self, kind: TransactionKind, amount: u64, reason: &str) -> Option<String>;

    /// Request a collectible for a collectible-class achievement.
    fn mint_collectible(&self, _achievement_id: &str) -> Option<String> {
        None
    }
}

/// Settlement that mirrors nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSettlement;

impl Settlement for NoopSettlement {
    fn settle(&self, _kind: TransactionKind, _amount: u64, _reason: &str) -> Option<String> {
        None
    }
}

/// One call received by a [`RecordingSettlement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SettlementCall {
    Settle {
        kind: TransactionKind,
        amount: u64,
        reason: String,
    },
    Mint {
        achievement_id: String,
    },
}

/// In-memory settlement that records calls and issues sequential references.
///
/// Toggle [`set_online`](Self::set_online) to simulate an unreachable mirror.
#[derive(Debug)]
pub struct RecordingSettlement {
    calls: RefCell<Vec<SettlementCall>>,
    online: Cell<bool>,
    issued: Cell<u64>,
}

impl Default for RecordingSettlement {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            online: Cell::new(true),
            issued: Cell::new(0),
        }
    }
}

impl RecordingSettlement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SettlementCall> {
        self.calls.borrow().clone()
    }

    fn issue(&self, prefix: &str) -> Option<String> {
        if !self.online.get() {
            return None;
        }
        let next = self.issued.get() + 1;
        self.issued.set(next);
        Some(format!("{prefix}-{next:04}"))
    }
}

impl Settlement for RecordingSettlement {
    fn settle(&self, kind: TransactionKind, amount: u64, reason: &str) -> Option<String> {
        self.calls.borrow_mut().push(SettlementCall::Settle {
            kind,
            amount,
            reason: reason.to_string(),
        });
        self.issue("ext")
    }

    fn mint_collectible(&self, achievement_id: &str) -> Option<String> {
        self.calls.borrow_mut().push(SettlementCall::Mint {
            achievement_id: achievement_id.to_string(),
        });
        self.issue("nft")
    }
}
