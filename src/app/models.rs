//! Data models for station discovery
//!
//! Candidates come straight off a directory page; validated stations are what
//! survives resolution and ends up in the output file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::bitrate;

/// A station as advertised on a directory page, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCandidate {
    /// Stream URL exactly as advertised
    pub stream_url: String,
    /// Normalized display name
    pub display_name: String,
    /// Capitalized genre, or "Unknown"
    pub genre: String,
}

/// A station whose stream URL was confirmed to deliver audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedStation {
    /// Final stream URL after redirects and wrapper pages
    pub stream_url: String,
    /// Normalized display name
    pub display_name: String,
    /// Capitalized genre
    pub genre: String,
    /// Detected bitrate, if any
    pub bitrate: Option<Bitrate>,
}

impl ValidatedStation {
    /// Build a validated station from its candidate and resolution results
    pub fn from_candidate(
        candidate: StationCandidate,
        resolved_url: String,
        bitrate: Option<Bitrate>,
    ) -> Self {
        Self {
            stream_url: resolved_url,
            display_name: candidate.display_name,
            genre: candidate.genre,
            bitrate,
        }
    }

    /// Bitrate in kbps, falling back to `default_kbps`
    pub fn bitrate_or(&self, default_kbps: u32) -> u32 {
        self.bitrate.map(Bitrate::kbps).unwrap_or(default_kbps)
    }
}

/// A standard stream bitrate; always a member of the bitrate ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Bitrate(u32);

impl Bitrate {
    /// Returns the bitrate if `kbps` is exactly a ladder value
    pub fn from_ladder(kbps: u32) -> Option<Self> {
        bitrate::LADDER.contains(&kbps).then_some(Self(kbps))
    }

    /// Snap an arbitrary measurement to the nearest ladder value
    ///
    /// Ties go to the lower value, i.e. the first one met scanning the
    /// ladder in ascending order.
    pub fn snap(measured_kbps: u64) -> Self {
        let mut best = bitrate::LADDER[0];
        let mut best_distance = u64::MAX;
        for &step in bitrate::LADDER.iter() {
            let distance = measured_kbps.abs_diff(u64::from(step));
            if distance < best_distance {
                best = step;
                best_distance = distance;
            }
        }
        Self(best)
    }

    /// Bitrate in kilobits per second
    pub fn kbps(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_ladder(value).ok_or_else(|| format!("{} is not a standard bitrate", value))
    }
}

impl From<Bitrate> for u32 {
    fn from(value: Bitrate) -> Self {
        value.0
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
