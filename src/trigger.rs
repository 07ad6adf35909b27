//! Trigger phrase matching
//!
//! Routes an utterance to the vision path when it contains the configured
//! phrase. Matching is a case-insensitive substring check; the phrase itself
//! is configuration, not derived logic.

/// Matches utterances against the configured trigger phrase
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    phrase: String,
}

impl TriggerMatcher {
    /// Create a matcher for the given phrase
    ///
    /// The phrase is normalized to lowercase and trimmed once, up front.
    #[must_use]
    pub fn new(phrase: &str) -> Self {
        let normalized = phrase.to_lowercase().trim().to_string();
        tracing::debug!(phrase = %normalized, "trigger matcher initialized");
        Self { phrase: normalized }
    }

    /// Check whether the utterance contains the trigger phrase
    #[must_use]
    pub fn matches(&self, utterance: &str) -> bool {
        let matched = utterance.to_lowercase().contains(&self.phrase);
        if matched {
            tracing::info!(phrase = %self.phrase, utterance, "trigger phrase matched");
        }
        matched
    }

    /// The normalized phrase this matcher looks for
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}
