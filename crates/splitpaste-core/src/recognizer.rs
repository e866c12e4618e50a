//! Marker-line recognition.

use regex::Regex;
use splitpaste_types::{DelimiterError, DelimiterSpec, Placement};

/// Matches whole marker lines for a [`DelimiterSpec`] and captures the filename.
#[derive(Debug, Clone)]
pub struct MarkerRecognizer {
    spec: DelimiterSpec,
    pattern: Regex,
}

impl MarkerRecognizer {
    pub fn new(spec: &DelimiterSpec) -> Result<Self, DelimiterError> {
        let marker = regex::escape(spec.marker());
        // The filename needs a dot with something on both sides of it.
        let source = match spec.placement() {
            Placement::Prefix => format!(r"^{marker}\s*(\S.*\..+)$"),
            Placement::Surround => format!(r"^{marker}\s*(\S.*?\..+?)\s*{marker}$"),
        };
        let pattern =
            Regex::new(&source).map_err(|e| DelimiterError::Unmatchable(e.to_string()))?;
        Ok(Self {
            spec: spec.clone(),
            pattern,
        })
    }

    pub fn spec(&self) -> &DelimiterSpec {
        &self.spec
    }

    /// Filename named by `line` if it is a marker line.
    ///
    /// The line is trimmed before matching and the whole trimmed line must match.
    pub fn filename<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.pattern.captures(line.trim())?;
        let name = caps.get(1)?.as_str().trim();
        (!name.is_empty()).then_some(name)
    }
}
