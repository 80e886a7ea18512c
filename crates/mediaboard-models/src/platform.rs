use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized watch platform label shown on the board
///
/// Raw provider names from the metadata API are mapped onto this small fixed set;
/// anything not on the allow-list collapses to `Online`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[serde(rename = "Netflix")]
    Netflix,
    #[serde(rename = "Disney+")]
    DisneyPlus,
    #[serde(rename = "Prime Video")]
    PrimeVideo,
    #[serde(rename = "Apple TV+")]
    AppleTvPlus,
    #[serde(rename = "BBC iPlayer")]
    BbcIplayer,
    #[serde(rename = "ITVX")]
    Itvx,
    #[default]
    #[serde(rename = "Online")]
    Online,
}

/// Allow-list of provider names (lowercase) and the label each one maps to
const PROVIDER_ALIASES: &[(&str, Platform)] = &[
    ("netflix", Platform::Netflix),
    ("disney plus", Platform::DisneyPlus),
    ("disney+", Platform::DisneyPlus),
    ("amazon prime video", Platform::PrimeVideo),
    ("apple tv", Platform::AppleTvPlus),
    ("apple tv plus", Platform::AppleTvPlus),
    ("apple tv+", Platform::AppleTvPlus),
    ("bbc iplayer", Platform::BbcIplayer),
    ("bbc player", Platform::BbcIplayer),
    ("bbc", Platform::BbcIplayer),
    ("itv hub", Platform::Itvx),
    ("itvx", Platform::Itvx),
];

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Netflix => "Netflix",
            Platform::DisneyPlus => "Disney+",
            Platform::PrimeVideo => "Prime Video",
            Platform::AppleTvPlus => "Apple TV+",
            Platform::BbcIplayer => "BBC iPlayer",
            Platform::Itvx => "ITVX",
            Platform::Online => "Online",
        }
    }

    /// Match a raw provider name against the allow-list (case-insensitive)
    pub fn from_provider_name(name: &str) -> Option<Platform> {
        let needle = name.trim().to_lowercase();
        PROVIDER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, platform)| *platform)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
