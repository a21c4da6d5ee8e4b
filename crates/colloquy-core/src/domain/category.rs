//! The closed set of evaluation dimensions.

use serde::{Deserialize, Serialize};

use crate::domain::error::ColloquyError;

/// A fixed evaluation dimension with its own rubric and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Fluency,
    Prosody,
    Pragmatics,
    Consideration,
    TimeBalance,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Fluency,
        Category::Prosody,
        Category::Pragmatics,
        Category::Consideration,
        Category::TimeBalance,
    ];

    /// Wire tag, e.g. `TIME_BALANCE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fluency => "FLUENCY",
            Category::Prosody => "PROSODY",
            Category::Pragmatics => "PRAGMATICS",
            Category::Consideration => "CONSIDERATION",
            Category::TimeBalance => "TIME_BALANCE",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ColloquyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ColloquyError::UnknownCategory(s.to_string()))
    }
}
