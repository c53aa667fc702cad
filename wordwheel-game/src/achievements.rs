//! Achievement catalog, unlock evaluation and classification-driven settlement.
//!
//! Evaluation runs in two steps. First every locked entry's progress is
//! measured against lifetime stats and the optional completion event, and
//! satisfied entries flip to unlocked. Then each new unlock is settled: the
//! token reward goes through the ledger and collectible-class entries also
//! request a collectible from the settlement mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::{RewardTable, SessionTuning};
use crate::constants::{
    DAILY_WARRIOR_DAYS, LETTER_LEGEND_LEVEL, REASON_ACHIEVEMENT_PREFIX, WORD_MASTER_WORDS,
};
use crate::ledger::RewardLedger;
use crate::profile::PlayerStats;
use crate::session::CompletionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstWord,
    SpeedDemon,
    WordMaster,
    PerfectLevel,
    DailyWarrior,
    LetterLegend,
}

impl AchievementId {
    pub const ALL: [Self; 6] = [
        Self::FirstWord,
        Self::SpeedDemon,
        Self::WordMaster,
        Self::PerfectLevel,
        Self::DailyWarrior,
        Self::LetterLegend,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstWord => "first_word",
            Self::SpeedDemon => "speed_demon",
            Self::WordMaster => "word_master",
            Self::PerfectLevel => "perfect_level",
            Self::DailyWarrior => "daily_warrior",
            Self::LetterLegend => "letter_legend",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// How an unlock is settled downstream. Has no effect on unlock logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementClass {
    Fungible,
    Collectible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub class: SettlementClass,
    pub reward: u64,
    pub max_progress: u64,
}

/// Built-in achievement catalog priced from the reward table.
#[must_use]
pub fn catalog(rewards: &RewardTable) -> Vec<AchievementDef> {
    let unlock = rewards.achievement_unlock;
    vec![
        AchievementDef {
            id: AchievementId::FirstWord,
            name: "First Word",
            description: "Find your first word",
            rarity: Rarity::Common,
            class: SettlementClass::Fungible,
            reward: rewards.first_word,
            max_progress: 1,
        },
        AchievementDef {
            id: AchievementId::SpeedDemon,
            name: "Speed Demon",
            description: "Complete a level in under a minute",
            rarity: Rarity::Rare,
            class: SettlementClass::Fungible,
            reward: unlock,
            max_progress: 1,
        },
        AchievementDef {
            id: AchievementId::WordMaster,
            name: "Word Master",
            description: "Find 1000 words",
            rarity: Rarity::Epic,
            class: SettlementClass::Collectible,
            reward: unlock,
            max_progress: WORD_MASTER_WORDS,
        },
        AchievementDef {
            id: AchievementId::PerfectLevel,
            name: "Perfect Level",
            description: "Find every word on a level",
            rarity: Rarity::Rare,
            class: SettlementClass::Fungible,
            reward: unlock,
            max_progress: 1,
        },
        AchievementDef {
            id: AchievementId::DailyWarrior,
            name: "Daily Warrior",
            description: "Play 7 days in a row",
            rarity: Rarity::Rare,
            class: SettlementClass::Fungible,
            reward: unlock,
            max_progress: u64::from(DAILY_WARRIOR_DAYS),
        },
        AchievementDef {
            id: AchievementId::LetterLegend,
            name: "Letter Legend",
            description: "Reach level 50",
            rarity: Rarity::Legendary,
            class: SettlementClass::Collectible,
            reward: unlock,
            max_progress: u64::from(LETTER_LEGEND_LEVEL),
        },
    ]
}

/// Persisted state of one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub id: AchievementId,
    pub progress: u64,
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Player's achievement state, one entry per catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementBook {
    entries: Vec<AchievementProgress>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self {
            entries: AchievementId::ALL
                .iter()
                .map(|&id| AchievementProgress {
                    id,
                    progress: 0,
                    unlocked: false,
                    unlocked_at: None,
                })
                .collect(),
        }
    }
}

impl AchievementBook {
    #[must_use]
    pub fn get(&self, id: AchievementId) -> Option<&AchievementProgress> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.get(id).is_some_and(|e| e.unlocked)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementProgress> {
        self.entries.iter()
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.unlocked).count()
    }

    fn entry_mut(&mut self, id: AchievementId) -> &mut AchievementProgress {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            return &mut self.entries[pos];
        }
        // Older saves may predate an achievement.
        self.entries.push(AchievementProgress {
            id,
            progress: 0,
            unlocked: false,
            unlocked_at: None,
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Raise progress (never lowers it) clamped to `max`; returns `true` when
    /// this call flipped the entry to unlocked.
    fn advance(&mut self, id: AchievementId, measured: u64, max: u64, now: DateTime<Utc>) -> bool {
        let entry = self.entry_mut(id);
        entry.progress = entry.progress.max(measured.min(max));
        if entry.unlocked || entry.progress < max {
            return false;
        }
        entry.unlocked = true;
        entry.unlocked_at = Some(now);
        true
    }
}

/// Notification for a freshly unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockNotification {
    pub id: AchievementId,
    pub name: String,
    pub rarity: Rarity,
    pub class: SettlementClass,
    pub reward: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collectible_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AchievementEvaluator {
    defs: Vec<AchievementDef>,
    speed_threshold: Duration,
}

impl AchievementEvaluator {
    #[must_use]
    pub fn new(rewards: &RewardTable, session: &SessionTuning) -> Self {
        Self {
            defs: catalog(rewards),
            speed_threshold: Duration::from_secs(session.speed_threshold_secs),
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &[AchievementDef] {
        &self.defs
    }

    #[must_use]
    pub fn definition(&self, id: AchievementId) -> Option<&AchievementDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    fn measure(&self, id: AchievementId, stats: &PlayerStats, completion: Option<&CompletionEvent>) -> u64 {
        match id {
            AchievementId::FirstWord => stats.words_found.min(1),
            AchievementId::SpeedDemon => {
                u64::from(completion.is_some_and(|c| c.elapsed < self.speed_threshold))
            }
            AchievementId::WordMaster => stats.words_found,
            AchievementId::PerfectLevel => u64::from(
                completion.is_some_and(CompletionEvent::is_perfect) || stats.perfect_levels > 0,
            ),
            AchievementId::DailyWarrior => u64::from(stats.best_daily_streak),
            AchievementId::LetterLegend => u64::from(stats.highest_level),
        }
    }

    /// Update progress and return the definitions unlocked by this call.
    pub fn evaluate(
        &self,
        book: &mut AchievementBook,
        stats: &PlayerStats,
        completion: Option<&CompletionEvent>,
        now: DateTime<Utc>,
    ) -> Vec<&AchievementDef> {
        self.defs
            .iter()
            .filter(|def| {
                let measured = self.measure(def.id, stats, completion);
                book.advance(def.id, measured, def.max_progress, now)
            })
            .collect()
    }

    /// Pay out a fresh unlock according to its settlement class.
    pub fn settle(&self, def: &AchievementDef, ledger: &mut RewardLedger) -> UnlockNotification {
        let reason = format!("{REASON_ACHIEVEMENT_PREFIX}{}", def.name);
        let transaction_id = ledger.award(def.reward, &reason).ok().map(|tx| tx.id);
        let collectible_ref = match def.class {
            SettlementClass::Collectible => ledger.request_collectible(def.id.as_str()),
            SettlementClass::Fungible => None,
        };
        log::info!("achievement unlocked: {} (+{})", def.name, def.reward);
        UnlockNotification {
            id: def.id,
            name: def.name.to_string(),
            rarity: def.rarity,
            class: def.class,
            reward: def.reward,
            transaction_id,
            collectible_ref,
        }
    }

    /// Evaluate and settle in one pass.
    pub fn evaluate_and_settle(
        &self,
        book: &mut AchievementBook,
        stats: &PlayerStats,
        completion: Option<&CompletionEvent>,
        ledger: &mut RewardLedger,
        now: DateTime<Utc>,
    ) -> Vec<UnlockNotification> {
        self.evaluate(book, stats, completion, now)
            .into_iter()
            .map(|def| self.settle(def, ledger))
            .collect()
    }
}
