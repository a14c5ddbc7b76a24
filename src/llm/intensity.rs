//! Tailoring intensity levels

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far the rewritten wording may drift from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Subtle,
    Balanced,
    Extensive,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Subtle, Intensity::Balanced, Intensity::Extensive];

    /// Share of the posting's vocabulary the rewrite should pull in.
    pub fn weight(self) -> f32 {
        match self {
            Intensity::Subtle => 0.2,
            Intensity::Balanced => 0.5,
            Intensity::Extensive => 0.9,
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Intensity::Subtle => {
                "Make light-touch edits only. Keep the original sentences and phrasing wherever possible, \
                 swapping in the posting's terminology only where an existing point already covers it."
            }
            Intensity::Balanced => {
                "Rephrase points so that the experience most relevant to the posting stands out, and work in \
                 the posting's key terms where the original content supports them."
            }
            Intensity::Extensive => {
                "Rewrite the wording freely to match the posting's language and priorities, expand relevant \
                 points with the detail already present in the résumé, and reorder items within a section by relevance."
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Intensity::Subtle => "Minimal changes (preserve most of the original)",
            Intensity::Balanced => "Balanced changes",
            Intensity::Extensive => "Extensive changes (closely match the job posting)",
        }
    }

    /// Accepts a menu number (`1`-`3`) or a level name.
    pub fn from_selection(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "s" | "subtle" => Some(Intensity::Subtle),
            "2" | "b" | "balanced" => Some(Intensity::Balanced),
            "3" | "e" | "extensive" => Some(Intensity::Extensive),
            _ => None,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Subtle => write!(f, "subtle"),
            Intensity::Balanced => write!(f, "balanced"),
            Intensity::Extensive => write!(f, "extensive"),
        }
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intensity::from_selection(s).ok_or_else(|| {
            format!("Invalid intensity: {}. Supported: subtle, balanced, extensive", s)
        })
    }
}
