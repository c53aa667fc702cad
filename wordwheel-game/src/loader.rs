//! Timeout-guarded, cooperative level loading.
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::board::{BoardSource, LevelBoard, LevelLoadError, fallback_board};
use crate::config::GameConfig;
use crate::letters::draw_letters;
use crate::lexicon::Lexicon;
use crate::solver::compute_solvable_async;

/// Bound `fut` by `limit`, mapping expiry to [`LevelLoadError::TimedOut`].
///
/// # Errors
///
/// Returns the future's own error, or `TimedOut` when the limit elapses first.
pub async fn guard_load<T, F>(limit: Duration, fut: F) -> Result<T, LevelLoadError>
where
    F: Future<Output = Result<T, LevelLoadError>>,
{
    if let Ok(result) = tokio::time::timeout(limit, fut).await {
        result
    } else {
        log::warn!("level load exceeded {limit:?}");
        Err(LevelLoadError::TimedOut { limit })
    }
}

/// Async counterpart of [`crate::board::build_board`] that yields between
/// solver batches.
///
/// # Errors
///
/// Returns [`LevelLoadError::NoPlayableWords`] when no lexicon word fits.
pub async fn build_board_async<L, R>(
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
        let solvable =
            compute_solvable_async(&letters, level, lexicon, &cfg.session, cfg.load.solver_batch)
                .await;
        if !solvable.is_empty() {
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

/// Run the level pipeline under the configured load timeout.
///
/// # Errors
///
/// Returns [`LevelLoadError::TimedOut`] when loading exceeds `cfg.load.timeout_ms`
/// and [`LevelLoadError::NoPlayableWords`] when the lexicon cannot support the level.
pub async fn load_level<L, R>(
    level: u32,
    lexicon: &L,
    cfg: &GameConfig,
    rng: &mut R,
) -> Result<LevelBoard, LevelLoadError>
where
    L: Lexicon + ?Sized,
    R: Rng + ?Sized,
{
    guard_load(cfg.load.timeout(), build_board_async(level, lexicon, cfg, rng)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::build_board;
    use crate::lexicon::WordList;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[tokio::test]
    async fn async_pipeline_matches_sync_pipeline() {
        let lexicon = WordList::starter();
        let cfg = GameConfig::default();
        let sync = build_board(6, &lexicon, &cfg, &mut ChaCha20Rng::seed_from_u64(21)).unwrap();
        let loaded = load_level(6, &lexicon, &cfg, &mut ChaCha20Rng::seed_from_u64(21))
            .await
            .unwrap();
        assert_eq!(sync, loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_pipeline_times_out_as_retryable() {
        let limit = Duration::from_millis(10_000);
        let err = guard_load(limit, std::future::pending::<Result<(), LevelLoadError>>())
            .await
            .unwrap_err();
        assert_eq!(err, LevelLoadError::TimedOut { limit });
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "loading timed out after 10s");
    }

    #[tokio::test]
    async fn pipeline_errors_pass_through_the_guard() {
        let cfg = GameConfig::default();
        let err = load_level(1, &WordList::empty(), &cfg, &mut ChaCha20Rng::seed_from_u64(0))
            .await
            .unwrap_err();
        assert_eq!(err, LevelLoadError::NoPlayableWords { level: 1 });
    }
}
