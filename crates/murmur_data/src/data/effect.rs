use super::ParseKindError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host-side identity of a spawned effect object. Zero is never a live id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalId(pub u64);

impl ExternalId {
    pub const NONE: ExternalId = ExternalId(0);

    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Visual effect types the pool hands out.
///
/// Trail variants are chosen from an entity's speed relative to the swarm's
/// max speed; `Burst` is a one-off effect requested directly by the host.
pub enum EffectKind {
    /// Below 60% of max speed.
    TrailSlow,
    /// 60% to 70% of max speed.
    TrailCruise,
    /// 70% to 90% of max speed.
    TrailFast,
    /// 90% of max speed and above.
    TrailMax,
    Burst,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::TrailSlow,
        EffectKind::TrailCruise,
        EffectKind::TrailFast,
        EffectKind::TrailMax,
        EffectKind::Burst,
    ];

    /// Picks the trail effect for `speed / max_speed`.
    pub fn for_speed_ratio(ratio: f32) -> EffectKind {
        if ratio < 0.6 {
            EffectKind::TrailSlow
        } else if ratio < 0.7 {
            EffectKind::TrailCruise
        } else if ratio < 0.9 {
            EffectKind::TrailFast
        } else {
            EffectKind::TrailMax
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::TrailSlow => "TrailSlow",
            EffectKind::TrailCruise => "TrailCruise",
            EffectKind::TrailFast => "TrailFast",
            EffectKind::TrailMax => "TrailMax",
            EffectKind::Burst => "Burst",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKindError::new("effect", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_ratio_bands() {
        assert_eq!(EffectKind::for_speed_ratio(0.0), EffectKind::TrailSlow);
        assert_eq!(EffectKind::for_speed_ratio(0.65), EffectKind::TrailCruise);
        assert_eq!(EffectKind::for_speed_ratio(0.8), EffectKind::TrailFast);
        assert_eq!(EffectKind::for_speed_ratio(1.0), EffectKind::TrailMax);
    }

    #[test]
    fn test_parse_is_total_over_names() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>(), Ok(kind));
        }
        let err = "Fireworks".parse::<EffectKind>().unwrap_err();
        assert_eq!(err.kind, "effect");
        assert_eq!(err.name, "Fireworks");
    }

    #[test]
    fn test_external_id_zero_unassigned() {
        assert!(!ExternalId::NONE.is_assigned());
        assert!(ExternalId(7).is_assigned());
    }
}
