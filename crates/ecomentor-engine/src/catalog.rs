use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type ChallengeId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// XP multiplier applied to a challenge's eco impact on completion.
    pub fn xp_multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }

    /// Whether a challenge of this difficulty can be offered as the optional pick.
    pub fn is_optional_tier(self) -> bool {
        matches!(self, Self::Easy | Self::Medium)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("easy") {
            Ok(Self::Easy)
        } else if s.eq_ignore_ascii_case("medium") {
            Ok(Self::Medium)
        } else if s.eq_ignore_ascii_case("hard") {
            Ok(Self::Hard)
        } else {
            Err(ValidationError::UnknownDifficulty(s.to_string()))
        }
    }
}

/// Catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub category: String,
    #[serde(rename = "ecoImpact")]
    pub eco_impact: f64,
    pub difficulty: Difficulty,
}

impl Challenge {
    pub fn find(catalog: &[Challenge], id: ChallengeId) -> Option<&Challenge> {
        catalog.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_leniently() {
        assert_eq!(" hard ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("Extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn catalog_json_uses_eco_impact_column_name() {
        let json = r#"{"id":3,"title":"Bike to work","category":"Mobility","ecoImpact":8,"difficulty":"Hard"}"#;
        let c: Challenge = serde_json::from_str(json).unwrap();
        assert_eq!(c.eco_impact, 8.0);
        assert_eq!(c.difficulty, Difficulty::Hard);
    }
}
