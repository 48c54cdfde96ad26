use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The fixed set of bot categories.
///
/// Serializes as the English name. The legacy French labels are accepted on
/// input so older clients and stored collections keep decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(alias = "Modération", alias = "moderation")]
    Moderation,
    #[serde(alias = "Musique", alias = "music")]
    Music,
    #[serde(alias = "Utilitaire", alias = "utility")]
    Utility,
    #[serde(alias = "Divertissement", alias = "entertainment")]
    Entertainment,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Self::Moderation,
        Self::Utility,
        Self::Music,
        Self::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderation => "Moderation",
            Self::Music => "Music",
            Self::Utility => "Utility",
            Self::Entertainment => "Entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moderation" | "modération" => Ok(Self::Moderation),
            "music" | "musique" => Ok(Self::Music),
            "utility" | "utilitaire" => Ok(Self::Utility),
            "entertainment" | "divertissement" => Ok(Self::Entertainment),
            _ => Err(TypeError::UnknownCategory(s.to_string())),
        }
    }
}
