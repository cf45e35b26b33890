//! Static denylist moderation.

use domains::ContentPolicy;

/// Placeholder words used when no denylist is configured.
pub const DEFAULT_DENYLIST: &[&str] = &["badword1", "badword2", "badword3"];

/// Case-insensitive substring match against a fixed word list.
#[derive(Debug, Clone)]
pub struct DenylistPolicy {
    words: Vec<String>,
}

impl DenylistPolicy {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            // an empty entry would match every submission
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn contains_prohibited(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.words.iter().any(|w| haystack.contains(w.as_str()))
    }
}

impl Default for DenylistPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST)
    }
}

impl ContentPolicy for DenylistPolicy {
    fn is_allowed(&self, text: &str) -> bool {
        !self.contains_prohibited(text)
    }
}
