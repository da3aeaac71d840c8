use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content category tag. Declaration order is the category-definition
/// order used by the categorizer and for reporting the blocking reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Adult,
    Gambling,
    Violence,
    Drugs,
    Weapons,
    Social,
    Entertainment,
    Gaming,
    News,
    Shopping,
    Education,
    Spam,
    Phishing,
    Malware,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Adult,
        Category::Gambling,
        Category::Violence,
        Category::Drugs,
        Category::Weapons,
        Category::Social,
        Category::Entertainment,
        Category::Gaming,
        Category::News,
        Category::Shopping,
        Category::Education,
        Category::Spam,
        Category::Phishing,
        Category::Malware,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Adult => "adult",
            Category::Gambling => "gambling",
            Category::Violence => "violence",
            Category::Drugs => "drugs",
            Category::Weapons => "weapons",
            Category::Social => "social",
            Category::Entertainment => "entertainment",
            Category::Gaming => "gaming",
            Category::News => "news",
            Category::Shopping => "shopping",
            Category::Education => "education",
            Category::Spam => "spam",
            Category::Phishing => "phishing",
            Category::Malware => "malware",
        }
    }

    /// Categories blocked by the default restriction template.
    pub fn is_harmful(self) -> bool {
        self.risk() == RiskLevel::High
    }

    pub fn risk(self) -> RiskLevel {
        match self {
            Category::Adult
            | Category::Gambling
            | Category::Violence
            | Category::Drugs
            | Category::Weapons
            | Category::Spam
            | Category::Phishing
            | Category::Malware => RiskLevel::High,
            Category::Social | Category::Gaming => RiskLevel::Medium,
            Category::Entertainment | Category::News | Category::Shopping | Category::Education => {
                RiskLevel::Low
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| AppError::UnknownCategory { tag: s.to_string() })
    }
}

/// Informational rollup of a category set. Never a blocking signal by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn of(categories: &[Category]) -> Self {
        categories
            .iter()
            .map(|c| c.risk())
            .max()
            .unwrap_or(RiskLevel::Low)
    }
}
