use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use wordwheel_game::level_seed;

/// Seed metadata resolved from a CLI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Calendar day the seed was derived from, for `daily:` tokens.
    pub day: Option<NaiveDate>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, day: None }
    }

    /// Seed shared by every player on `day`.
    #[must_use]
    pub fn from_day(day: NaiveDate) -> Self {
        let ordinal = u64::try_from(day.num_days_from_ce()).unwrap_or_default();
        Self {
            seed: level_seed(ordinal, 0),
            day: Some(day),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self.day {
            Some(day) => format!("daily:{day} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers (negative values use their magnitude), hex
/// literals such as `0xBEEF`, and `daily:YYYY-MM-DD` tokens. Duplicates are
/// dropped and an empty list falls back to 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let info = parse_token(token)?;
        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(1337));
    }
    Ok(resolved)
}

fn parse_token(token: &str) -> Result<SeedInfo> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(SeedInfo::from_numeric(value.unsigned_abs()));
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(SeedInfo::from_numeric(value));
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        let value = u64::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex seed: {token}"))?;
        return Ok(SeedInfo::from_numeric(value));
    }
    if let Some(day) = token.strip_prefix("daily:") {
        let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .with_context(|| format!("invalid daily seed date: {token}"))?;
        return Ok(SeedInfo::from_day(day));
    }
    bail!("Unrecognized seed token: {token}");
}
