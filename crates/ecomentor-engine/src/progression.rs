use std::fmt;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::catalog::Challenge;
use crate::profile::UserProfile;

/// kg of CO₂ credited per eco-impact point.
pub const CO2_FACTOR: f64 = 0.1;

/// Per-level XP ceiling once the quadratic curve reaches it.
const LEVEL_XP_CAP: u64 = 500;
const XP_CURVE_FACTOR: u64 = 10;

/// Progress tier, recomputed from counters and CO₂ on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Badge {
    EcoNovice,
    EcoSupporter,
    GreenHero,
    EcoMaster,
}

impl Badge {
    /// First matching tier wins: EcoMaster needs both 15 completions and
    /// 50 kg saved, the lower tiers only look at the completion count.
    pub fn for_progress(completed: u32, co2_saved: f64) -> Self {
        if completed >= 15 && co2_saved >= 50.0 {
            Self::EcoMaster
        } else if completed >= 10 {
            Self::GreenHero
        } else if completed >= 5 {
            Self::EcoSupporter
        } else {
            Self::EcoNovice
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EcoNovice => "EcoNovice",
            Self::EcoSupporter => "EcoSupporter",
            Self::GreenHero => "Green Hero",
            Self::EcoMaster => "EcoMaster",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Badge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Last level whose quadratic threshold is still below the cap.
fn last_curved_level() -> u64 {
    let mut last = 1u64;
    while XP_CURVE_FACTOR * (last + 1) * (last + 1) < LEVEL_XP_CAP {
        last += 1;
    }
    last
}

/// Total XP needed to leave `level`.
///
/// Follows `10·level²` while that stays under the cap (levels 1..=7); every
/// level after that costs a flat `LEVEL_XP_CAP` more.
pub fn level_threshold(level: u32) -> u64 {
    let level = u64::from(level.max(1));
    let quadratic = XP_CURVE_FACTOR * level * level;
    if quadratic < LEVEL_XP_CAP {
        return quadratic;
    }

    let last = last_curved_level();
    XP_CURVE_FACTOR * last * last + LEVEL_XP_CAP * (level - last)
}

/// Level reached with `xp` total XP: the lowest level whose threshold is
/// still above it. Saturates at `u32::MAX`.
pub fn level_for_xp(xp: u64) -> u32 {
    let last = last_curved_level();
    let cap_start = XP_CURVE_FACTOR * last * last;
    if xp < cap_start {
        let mut level = 1u32;
        while xp >= level_threshold(level) {
            level += 1;
        }
        return level;
    }

    let level = last + 1 + (xp - cap_start) / LEVEL_XP_CAP;
    u32::try_from(level).unwrap_or(u32::MAX)
}

pub fn xp_gain(challenge: &Challenge) -> u64 {
    let raw = challenge.eco_impact * challenge.difficulty.xp_multiplier();
    if raw.is_finite() && raw > 0.0 { raw as u64 } else { 0 }
}

pub(crate) fn round_co2(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Result of one progression update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub xp: u64,
    pub level: u32,
    pub badge: Badge,
    pub co2_saved: f64,
    pub levels_gained: u32,
}

/// Apply a completion's XP and CO₂ to the user.
///
/// Counters must already include the completion; the badge is derived from
/// them after the CO₂ update. A single large gain may climb several levels.
pub fn apply_completion(
    user: &mut UserProfile,
    xp_gain: u64,
    eco_impact: f64,
    co2_factor: f64,
) -> Progress {
    let added = (eco_impact * co2_factor).max(0.0);
    user.co2_saved = round_co2(user.co2_saved + added);
    user.xp = user.xp.saturating_add(xp_gain);

    let start_level = user.level.max(1);
    let level = start_level.max(level_for_xp(user.xp));
    user.level = level;

    let levels_gained = level - start_level;
    if levels_gained > 0 {
        info!("{} reached level {} (+{})", user.name, level, levels_gained);
    }

    Progress {
        xp: user.xp,
        level: user.level,
        badge: user.badge(),
        co2_saved: user.co2_saved,
        levels_gained,
    }
}
