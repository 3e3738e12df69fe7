//! Genre label set
//!
//! The order of [`Genre::ALL`] is positional: index `i` of the classifier's
//! output vector is the probability of `Genre::ALL[i]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of genres the classifier distinguishes
pub const GENRE_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Blues,
    Classical,
    Country,
    Disco,
    HipHop,
    Jazz,
    Metal,
    Pop,
    Reggae,
    Rock,
}

impl Genre {
    /// All genres in model output order
    pub const ALL: [Genre; GENRE_COUNT] = [
        Genre::Blues,
        Genre::Classical,
        Genre::Country,
        Genre::Disco,
        Genre::HipHop,
        Genre::Jazz,
        Genre::Metal,
        Genre::Pop,
        Genre::Reggae,
        Genre::Rock,
    ];

    /// Label identifier as used by the training data
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blues => "blues",
            Self::Classical => "classical",
            Self::Country => "country",
            Self::Disco => "disco",
            Self::HipHop => "hiphop",
            Self::Jazz => "jazz",
            Self::Metal => "metal",
            Self::Pop => "pop",
            Self::Reggae => "reggae",
            Self::Rock => "rock",
        }
    }

    /// Icon shown next to the label
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Blues => "🎺",
            Self::Classical => "🎻",
            Self::Country => "🤠",
            Self::Disco => "🕺",
            Self::HipHop => "🎤",
            Self::Jazz => "🎷",
            Self::Metal => "🤘",
            Self::Pop => "🎵",
            Self::Reggae => "🌴",
            Self::Rock => "🎸",
        }
    }

    /// Position in the model output vector
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.label() == wanted)
            .ok_or_else(|| format!("Unknown genre: {}", s))
    }
}
