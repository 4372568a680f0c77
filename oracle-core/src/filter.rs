//! The conversational pre-filter external collaborator.
//!
//! The core merely consults this; its own NLU (if any) is out of scope.

use async_trait::async_trait;

/// Decides whether a query is purely conversational (no data intent), in
/// which case the router short-circuits without fanout or audit submission.
#[async_trait]
pub trait ConversationalFilter: Send + Sync {
    /// Return `true` if `text` is chitchat rather than a data request.
    async fn is_conversational(&self, text: &str) -> bool;
}

/// Default filter: nothing is ever considered conversational. Suitable when
/// no real pre-filter is wired in — every query proceeds to classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConversational;

#[async_trait]
impl ConversationalFilter for NeverConversational {
    async fn is_conversational(&self, _text: &str) -> bool {
        false
    }
}
