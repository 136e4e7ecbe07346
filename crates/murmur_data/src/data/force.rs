use super::ParseKindError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The force strategies a swarm can compose.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ForceKind {
    Separation,
    Alignment,
    Cohesion,
    Attractor,
}

impl ForceKind {
    pub const ALL: [ForceKind; 4] = [
        ForceKind::Separation,
        ForceKind::Alignment,
        ForceKind::Cohesion,
        ForceKind::Attractor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ForceKind::Separation => "Separation",
            ForceKind::Alignment => "Alignment",
            ForceKind::Cohesion => "Cohesion",
            ForceKind::Attractor => "Attractor",
        }
    }
}

impl fmt::Display for ForceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForceKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForceKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKindError::new("force", s))
    }
}
