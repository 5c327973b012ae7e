//! Coarse risk tiers derived from category text.
//!
//! This is a heuristic for display, not a financial risk model. The rule table is
//! evaluated top to bottom and the first matching substring decides the tier, so
//! the same category text always yields the same tier.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RiskTier::Low => "Low",
                RiskTier::Moderate => "Moderate",
                RiskTier::High => "High",
                RiskTier::VeryHigh => "Very High",
            }
        )
    }
}

const RULES: &[(&[&str], RiskTier)] = &[
    (&["small cap"], RiskTier::VeryHigh),
    (&["mid cap"], RiskTier::High),
    (&["large cap"], RiskTier::Low),
    (&["liquid", "debt"], RiskTier::Low),
];

/// Classifies a scheme category, case-insensitively. Unmatched text is `Moderate`.
pub fn classify(category: &str) -> RiskTier {
    let category = category.to_lowercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| category.contains(needle)))
        .map_or(RiskTier::Moderate, |(_, tier)| *tier)
}

impl RiskTier {
    /// Maps a 1-5 risk level as published by scheme screeners.
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => RiskTier::Low,
            2 => RiskTier::Moderate,
            3 => RiskTier::High,
            4 | 5 => RiskTier::VeryHigh,
            _ => RiskTier::Moderate,
        }
    }
}
