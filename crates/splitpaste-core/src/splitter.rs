//! Splits a pasted buffer into named file bodies.

use crate::{MarkerRecognizer, Result};
use splitpaste_types::{DelimiterSpec, ParsedBlock, Segment};
use std::collections::HashMap;
use tracing::trace;

/// Splits text on marker lines recognized by a [`MarkerRecognizer`].
#[derive(Debug, Clone)]
pub struct ContentSplitter {
    recognizer: MarkerRecognizer,
}

impl ContentSplitter {
    pub fn new(spec: &DelimiterSpec) -> Result<Self> {
        Ok(Self {
            recognizer: MarkerRecognizer::new(spec)?,
        })
    }

    pub fn spec(&self) -> &DelimiterSpec {
        self.recognizer.spec()
    }

    /// Split `text` into an ordered filename -> body mapping.
    ///
    /// Lines before the first marker are dropped. A marker naming a file seen
    /// earlier in the same text restarts that file's body, so the last
    /// occurrence wins. Bodies are trimmed.
    pub fn split(&self, text: &str) -> ParsedBlock {
        let mut segments: Vec<Segment> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut current: Option<usize> = None;

        for line in text.split('\n') {
            if let Some(name) = self.recognizer.filename(line) {
                let slot = match index.get(name) {
                    Some(&slot) => {
                        segments[slot].body.clear();
                        slot
                    }
                    None => {
                        segments.push(Segment::new(name, String::new()));
                        index.insert(name.to_string(), segments.len() - 1);
                        segments.len() - 1
                    }
                };
                trace!(target: "splitpaste::splitter", "Opened segment {}", name);
                current = Some(slot);
            } else if let Some(slot) = current {
                let body = &mut segments[slot].body;
                body.push_str(line);
                body.push('\n');
            }
        }

        for segment in &mut segments {
            let trimmed = segment.body.trim();
            if trimmed.len() != segment.body.len() {
                segment.body = trimmed.to_string();
            }
        }

        segments.into_iter().collect()
    }
}

/// Split `text` with a one-off splitter for `spec`.
pub fn split(text: &str, spec: &DelimiterSpec) -> Result<ParsedBlock> {
    Ok(ContentSplitter::new(spec)?.split(text))
}
