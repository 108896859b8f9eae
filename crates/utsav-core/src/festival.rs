use serde::{Deserialize, Serialize};

use crate::resolve::{DaysUntil, days_until_serde};

pub const ALL_INDIA: &str = "all_india";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Region(String);

impl Region {
    pub fn new(raw: &str) -> Self {
        Self(slug(raw))
    }

    pub fn all_india() -> Self {
        Self(ALL_INDIA.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_all_india(&self) -> bool {
        self.0 == ALL_INDIA
    }
}

impl From<String> for Region {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn slug(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    None,
    Urgent,
    Critical,
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::None => "none",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Festival {
    pub key: String,

    pub name: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub is_regional: bool,

    #[serde(default = "default_duration")]
    pub duration: u32,

    #[serde(default)]
    pub category: String,

    #[serde(default = "default_shopping_period")]
    pub shopping_period: u32,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub trending_keywords: Vec<String>,
}

impl Festival {
    pub fn is_national(&self) -> bool {
        self.regions.iter().any(Region::is_all_india)
    }

    pub fn has_region(&self, region: &Region) -> bool {
        self.regions.contains(region)
    }
}

pub fn default_duration() -> u32 {
    1
}

pub fn default_shopping_period() -> u32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFestival {
    #[serde(flatten)]
    pub festival: Festival,

    #[serde(with = "days_until_serde")]
    pub days_until: DaysUntil,

    pub urgency_level: UrgencyLevel,
}
