//! Job size categorization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Upper bound (exclusive) of the SMALL bucket.
pub const SMALL_LIMIT: i64 = 100;
/// Upper bound (exclusive) of the MEDIUM bucket.
pub const MEDIUM_LIMIT: i64 = 500;
/// Upper bound (exclusive) of the LARGE bucket.
pub const LARGE_LIMIT: i64 = 1000;

/// Size bucket of an enrichment job, by number of contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl SizeCategory {
    /// Total over every `i64`; negative counts fall into SMALL.
    pub fn from_total_contacts(total_contacts: i64) -> Self {
        if total_contacts < SMALL_LIMIT {
            Self::Small
        } else if total_contacts < MEDIUM_LIMIT {
            Self::Medium
        } else if total_contacts < LARGE_LIMIT {
            Self::Large
        } else {
            Self::VeryLarge
        }
    }

    /// Label stored in the gold table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
            Self::VeryLarge => "VERY_LARGE",
        }
    }

    pub fn all() -> [SizeCategory; 4] {
        [Self::Small, Self::Medium, Self::Large, Self::VeryLarge]
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown size category: {}", s)))
    }
}
