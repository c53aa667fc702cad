//! Lifetime statistics, progress and the save document.
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementBook;
use crate::ledger::LedgerSnapshot;
use crate::session::CompletionEvent;

/// Lifetime statistics consumed by the achievement evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub words_found: u64,
    /// Completed levels.
    pub games_played: u64,
    pub perfect_levels: u64,
    pub best_daily_streak: u32,
    pub highest_level: u32,
    pub total_score: u64,
    pub average_score: u64,
}

impl PlayerStats {
    pub fn record_word(&mut self) {
        self.words_found = self.words_found.saturating_add(1);
    }

    pub fn record_completion(&mut self, event: &CompletionEvent) {
        self.games_played = self.games_played.saturating_add(1);
        if event.is_perfect() {
            self.perfect_levels = self.perfect_levels.saturating_add(1);
        }
        self.highest_level = self.highest_level.max(event.level);
        self.total_score = self.total_score.saturating_add(event.score);
        self.average_score = self.total_score / self.games_played;
    }

    pub fn record_streak(&mut self, count: u32) {
        self.best_daily_streak = self.best_daily_streak.max(count);
    }

    pub fn record_level_reached(&mut self, level: u32) {
        self.highest_level = self.highest_level.max(level);
    }
}

/// Progress the player resumes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProgress {
    pub level: u32,
    pub total_score: u64,
    #[serde(default = "GameProgress::default_sound_enabled")]
    pub sound_enabled: bool,
}

impl GameProgress {
    const fn default_sound_enabled() -> bool {
        true
    }

    /// Flip the sound preference and return the new value.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            level: 1,
            total_score: 0,
            sound_enabled: Self::default_sound_enabled(),
        }
    }
}

/// Everything persisted for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSave {
    #[serde(default)]
    pub progress: GameProgress,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub ledger: LedgerSnapshot,
    #[serde(default)]
    pub achievements: AchievementBook,
}

impl PlayerSave {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// # Errors
    ///
    /// Returns an error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn completion(level: u32, found: u32, total: u32, score: u64) -> CompletionEvent {
        CompletionEvent {
            level,
            elapsed: Duration::from_secs(30),
            discovered_count: found,
            total_count: total,
            hints_used: 0,
            score,
        }
    }

    #[test]
    fn completions_update_aggregates() {
        let mut stats = PlayerStats::default();
        stats.record_completion(&completion(3, 4, 4, 120));
        stats.record_completion(&completion(2, 2, 2, 60));
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.perfect_levels, 2);
        assert_eq!(stats.highest_level, 3);
        assert_eq!(stats.average_score, 90);
    }

    #[test]
    fn legacy_saves_default_missing_sections() {
        let save = PlayerSave::from_json(r#"{ "progress": { "level": 4, "total_score": 80 } }"#)
            .unwrap();
        assert_eq!(save.progress.level, 4);
        assert!(save.progress.sound_enabled);
        assert_eq!(save.ledger.balance, 0);

        let mut progress = GameProgress::default();
        assert!(!progress.toggle_sound());
    }
}
