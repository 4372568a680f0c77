//! `LedgerClient` adapter over Hedera Consensus Service, gated behind the
//! `hedera` feature so the default build never links or depends on it.

use async_trait::async_trait;
use hedera::{Client, PrivateKey, TopicId, TopicMessageSubmitTransaction};
use oracle_core::ledger::{LedgerClient, LedgerError};
use std::str::FromStr;

/// Submits audit payloads to a fixed HCS topic using an operator account.
///
/// Mirrors the provider contract's "thin adapter" shape: credentials and
/// topic selection live here, everything else (batching, chunking, retry)
/// stays in the audit logger, which only ever sees the `LedgerClient` trait.
pub struct HederaLedgerClient {
    client: Client,
    topic: TopicId,
}

impl HederaLedgerClient {
    /// Build a client against Hedera mainnet using the given operator
    /// account id, private key, and default topic id.
    pub fn new(
        operator_id: &str,
        operator_key: &str,
        default_topic: &str,
    ) -> Result<Self, LedgerError> {
        let client = Client::for_mainnet();
        let account_id = hedera::AccountId::from_str(operator_id)
            .map_err(|e| LedgerError::new(format!("invalid operator id: {e}")))?;
        let private_key = PrivateKey::from_str(operator_key)
            .map_err(|e| LedgerError::new(format!("invalid operator key: {e}")))?;
        client.set_operator(account_id, private_key);

        let topic = TopicId::from_str(default_topic)
            .map_err(|e| LedgerError::new(format!("invalid topic id: {e}")))?;

        Ok(Self { client, topic })
    }
}

#[async_trait]
impl LedgerClient for HederaLedgerClient {
    async fn submit(&self, topic: &str, payload: Vec<u8>) -> Result<String, LedgerError> {
        let topic_id = if topic.is_empty() {
            self.topic
        } else {
            TopicId::from_str(topic).map_err(|e| LedgerError::new(format!("invalid topic id: {e}")))?
        };

        let response = TopicMessageSubmitTransaction::new()
            .topic_id(topic_id)
            .message(payload)
            .execute(&self.client)
            .await
            .map_err(|e| LedgerError::new(format!("hcs submission failed: {e}")))?;

        Ok(response.transaction_id.to_string())
    }
}
