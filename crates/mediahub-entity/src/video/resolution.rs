//! Standard rendition ladder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One rung of the rendition ladder, identified by its pixel height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    /// 240 lines.
    #[serde(rename = "240")]
    P240,
    /// 360 lines.
    #[serde(rename = "360")]
    P360,
    /// 480 lines.
    #[serde(rename = "480")]
    P480,
    /// 720 lines.
    #[serde(rename = "720")]
    P720,
    /// 1080 lines.
    #[serde(rename = "1080")]
    P1080,
}

impl Resolution {
    /// Every rung, tallest first. Transcode tasks are enqueued in this order.
    pub const LADDER: [Resolution; 5] = [
        Self::P1080,
        Self::P720,
        Self::P480,
        Self::P360,
        Self::P240,
    ];

    /// Pixel height of the rung.
    pub fn height(&self) -> u32 {
        match self {
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    /// Label stored in a video's resolution set.
    pub fn label(&self) -> &'static str {
        match self {
            Self::P240 => "240",
            Self::P360 => "360",
            Self::P480 => "480",
            Self::P720 => "720",
            Self::P1080 => "1080",
        }
    }

    /// Rungs strictly shorter than `source_height`, tallest first.
    ///
    /// The source's own rung is served from the raw file and is never
    /// transcoded.
    pub fn rungs_below(source_height: u32) -> impl Iterator<Item = Resolution> {
        Self::LADDER
            .into_iter()
            .filter(move |r| r.height() < source_height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['p', 'P']);
        Self::LADDER
            .into_iter()
            .find(|r| r.label() == digits)
            .ok_or_else(|| format!("Unknown resolution: {s}"))
    }
}
