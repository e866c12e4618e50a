//! Split results.

use serde::{Deserialize, Serialize};

/// A named file body extracted from a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub filename: String,
    pub body: String,
}

impl Segment {
    pub fn new(filename: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            body: body.into(),
        }
    }

    /// Whether the body holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Ordered filename -> body mapping produced by one split.
///
/// Filenames are unique. Order is the order in which each name was first
/// seen; inserting an existing name replaces its body in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedBlock {
    segments: Vec<Segment>,
}

impl ParsedBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a segment, replacing the body of an existing one with the same name.
    pub fn insert(&mut self, segment: Segment) {
        match self
            .segments
            .iter_mut()
            .find(|s| s.filename == segment.filename)
        {
            Some(existing) => existing.body = segment.body,
            None => self.segments.push(segment),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.filename == filename)
    }

    pub fn body(&self, filename: &str) -> Option<&str> {
        self.get(filename).map(|s| s.body.as_str())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.filename.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromIterator<Segment> for ParsedBlock {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut block = ParsedBlock::new();
        for segment in iter {
            block.insert(segment);
        }
        block
    }
}

impl<'a> IntoIterator for &'a ParsedBlock {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
