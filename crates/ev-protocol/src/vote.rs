use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single user's vote on one editorial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
    #[default]
    None,
}

impl Vote {
    /// Contribution of this vote to an editorial's score.
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
            Vote::None => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
            Vote::None => "none",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "+" => Ok(Vote::Up),
            "down" | "-" => Ok(Vote::Down),
            "none" | "0" => Ok(Vote::None),
            other => Err(format!("invalid vote '{other}' (expected up|down|none)")),
        }
    }
}
