//! Warehouse layers

use serde::{Deserialize, Serialize};

/// Medallion layer an extent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Raw extracts exactly as delivered
    Bronze,
    /// Conformed, deduplicated entities
    Silver,
    /// Dimensional views (surrogate keys, facts)
    Gold,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    pub fn parse_layer(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bronze" | "raw" => Some(Self::Bronze),
            "silver" | "conformed" => Some(Self::Silver),
            "gold" | "views" => Some(Self::Gold),
            _ => None,
        }
    }

    /// The layer fed by this one
    pub fn next_layer(&self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => None,
        }
    }

    /// Whether an extent of this layer may be derived into `target`.
    /// Derivation only moves forward, one layer at a time.
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.next_layer() == Some(target)
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
