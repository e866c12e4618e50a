//! Delimiter description: which marker text opens a segment and where it sits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where the marker appears on a marker line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// `<marker> name.ext`
    #[default]
    Prefix,
    /// `<marker> name.ext <marker>`
    Surround,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Prefix => f.write_str("prefix"),
            Placement::Surround => f.write_str("surround"),
        }
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefix" => Ok(Placement::Prefix),
            "surround" => Ok(Placement::Surround),
            _ => Err(format!(
                "Invalid placement: '{}'. Use 'prefix' or 'surround'.",
                s
            )),
        }
    }
}

/// Rejection reasons for a marker string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelimiterError {
    #[error("marker must contain at least one non-whitespace character")]
    EmptyMarker,

    #[error("marker cannot be turned into a line matcher: {0}")]
    Unmatchable(String),
}

/// A validated marker plus its placement.
///
/// The marker is stored trimmed, because marker lines are matched after
/// trimming. It is always matched literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDelimiterSpec")]
pub struct DelimiterSpec {
    marker: String,
    placement: Placement,
}

#[derive(Deserialize)]
struct RawDelimiterSpec {
    marker: String,
    #[serde(default)]
    placement: Placement,
}

impl TryFrom<RawDelimiterSpec> for DelimiterSpec {
    type Error = DelimiterError;

    fn try_from(raw: RawDelimiterSpec) -> Result<Self, Self::Error> {
        DelimiterSpec::new(raw.marker, raw.placement)
    }
}

impl DelimiterSpec {
    pub fn new(marker: impl AsRef<str>, placement: Placement) -> Result<Self, DelimiterError> {
        let marker = marker.as_ref().trim();
        if marker.is_empty() {
            return Err(DelimiterError::EmptyMarker);
        }
        Ok(Self {
            marker: marker.to_string(),
            placement,
        })
    }

    pub fn prefix(marker: impl AsRef<str>) -> Result<Self, DelimiterError> {
        Self::new(marker, Placement::Prefix)
    }

    pub fn surround(marker: impl AsRef<str>) -> Result<Self, DelimiterError> {
        Self::new(marker, Placement::Surround)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Render a marker line for `filename` in this convention.
    pub fn marker_line(&self, filename: &str) -> String {
        match self.placement {
            Placement::Prefix => format!("{} {}", self.marker, filename),
            Placement::Surround => format!("{} {} {}", self.marker, filename, self.marker),
        }
    }

    /// Sample marker line shown next to the delimiter picker.
    pub fn example_line(&self) -> String {
        self.marker_line("filename.filetype")
    }
}

impl Default for DelimiterSpec {
    fn default() -> Self {
        Self {
            marker: "//".to_string(),
            placement: Placement::Prefix,
        }
    }
}
