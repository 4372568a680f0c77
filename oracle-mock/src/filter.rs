//! A trivial keyword-based `ConversationalFilter` for deterministic tests.

use async_trait::async_trait;
use oracle_core::ConversationalFilter;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "thanks", "thank you", "good morning"];

/// Flags text as conversational when it (case-insensitively) is or starts
/// with one of a small fixed set of greeting/pleasantry phrases. Real
/// chitchat detection is a router-level concern left to the integrator; this
/// exists only so the router's conversational short-circuit has something
/// deterministic to test against.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordConversationalFilter;

#[async_trait]
impl ConversationalFilter for KeywordConversationalFilter {
    async fn is_conversational(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        GREETINGS.iter().any(|g| lower == *g || lower.starts_with(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn greets_are_conversational() {
        let filter = KeywordConversationalFilter;
        assert!(filter.is_conversational("hello there").await);
        assert!(filter.is_conversational("  Thanks!").await);
    }

    #[tokio::test]
    async fn questions_are_not_conversational() {
        let filter = KeywordConversationalFilter;
        assert!(!filter.is_conversational("what is the price of BTC?").await);
    }
}
