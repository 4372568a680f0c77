//! The router (C9): wires the registry, classifier, fanout engine,
//! consensus engine and audit logger into a single entry point.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use oracle_core::{ConversationalFilter, NeverConversational, Provider};
use oracle_middleware::CacheMiddleware;
use oracle_types::{
    ConsensusResult, OracleConfig, OracleError, ProviderTable, QueryOptions, QueryType,
};
#[cfg(feature = "tracing")]
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::AuditLogger;
use crate::classifier;
use crate::consensus;
use crate::fanout;
use crate::registry::{ProviderRecord, Registry};

/// Orchestrator that fans a query out across registered providers, reconciles
/// their answers, and appends the outcome to an audit ledger.
pub struct Oracle {
    registry: Registry,
    table: ProviderTable,
    filter: Arc<dyn ConversationalFilter>,
    audit: Arc<AuditLogger>,
    audit_task: Option<oracle_core::TaskHandle>,
    cfg: OracleConfig,
}

impl Oracle {
    /// Start building an `Oracle` with default configuration.
    #[must_use]
    pub fn builder() -> OracleBuilder {
        OracleBuilder::new()
    }

    /// Resolve a query to a reconciled answer.
    ///
    /// 1. Consults the conversational pre-filter; chitchat short-circuits to
    ///    [`ConsensusResult::conversational`] without fanout or audit.
    /// 2. Otherwise assigns a fresh query id, classifies the text, derives
    ///    the eligible provider set (an explicit `options.sources` override
    ///    replaces the classifier's table lookup, intersected with the
    ///    registered set), fans out, reconciles, and fires the audit
    ///    submission on its own task before returning.
    ///
    /// # Errors
    /// - [`OracleError::InvalidArg`] if an explicit `sources` override names no registered provider.
    /// - [`OracleError::InsufficientProviders`] if the eligible set is smaller than `minResponses`.
    /// - [`OracleError::InsufficientResponses`] if fanout collects fewer than `minResponses` successes.
    pub async fn query(&self, text: &str, options: QueryOptions) -> Result<ConsensusResult, OracleError> {
        if self.filter.is_conversational(text).await {
            return Ok(ConsensusResult::conversational());
        }

        let query_id = Uuid::new_v4().to_string();
        let query_type = classifier::classify(text);
        let eligible = self.eligible_providers(query_type, options.sources.as_deref())?;

        if eligible.len() < self.cfg.min_responses {
            return Err(OracleError::InsufficientProviders {
                eligible: eligible.len(),
                required: self.cfg.min_responses,
            });
        }

        let timeout = options.timeout.unwrap_or(self.cfg.max_response_time);
        let responses = fanout::fanout(&eligible, text, &options, timeout).await;

        let method = options.consensus_method.unwrap_or(self.cfg.default_method);
        let weight_of = |name: &str| {
            self.registry
                .get(name)
                .map_or(0.5, |record| record.provider().meta().weight)
        };
        let result = consensus::reconcile(&responses, method, self.cfg.min_responses, self.cfg.outlier_threshold, weight_of)?;

        #[cfg(feature = "tracing")]
        info!(%query_id, ?query_type, sources = ?result.sources, "query resolved");

        let audit = Arc::clone(&self.audit);
        let audit_query = text.to_string();
        let audit_result = result.clone();
        tokio::spawn(async move {
            audit.submit(query_id, audit_query, audit_result).await;
        });

        Ok(result)
    }

    fn eligible_providers(
        &self,
        query_type: QueryType,
        sources: Option<&[String]>,
    ) -> Result<Vec<Arc<ProviderRecord>>, OracleError> {
        if let Some(sources) = sources {
            let mut records = Vec::with_capacity(sources.len());
            for name in sources {
                match self.registry.get(name) {
                    Some(record) => records.push(record),
                    None => {
                        return Err(OracleError::InvalidArg(format!(
                            "explicit source '{name}' is not a registered provider"
                        )));
                    }
                }
            }
            return Ok(records);
        }

        if query_type == QueryType::Custom {
            return Ok(self.registry.all());
        }

        let names = self.table.eligible_for(query_type);
        if names.is_empty() {
            return Ok(self.registry.all());
        }

        Ok(names.iter().filter_map(|name| self.registry.get(name)).collect())
    }

    /// Register `provider` under its own name, wrapping it with per-provider
    /// caching using the configured capacity/TTL.
    ///
    /// # Errors
    /// Never fails today; returns `Result` to leave room for future
    /// capability-conflict validation without an API break.
    pub fn register_provider(&self, provider: Arc<dyn Provider>) -> Result<(), OracleError> {
        self.registry.register(provider);
        Ok(())
    }

    /// Remove and return the record registered under `name`, if any.
    pub fn unregister_provider(&self, name: &str) -> Option<Arc<ProviderRecord>> {
        self.registry.unregister(name)
    }

    /// Look up the record registered under `name`.
    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<Arc<ProviderRecord>> {
        self.registry.get(name)
    }

    /// Every registered record, in unspecified order.
    #[must_use]
    pub fn get_providers(&self) -> Vec<Arc<ProviderRecord>> {
        self.registry.all()
    }

    /// Probe every registered provider's health.
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        self.registry.health_check_all().await
    }

    /// Flush the pending audit batch and stop the background flush task.
    /// Idempotent beyond the first call only in the sense that a second
    /// call is a no-op flush against an already-empty batch; the
    /// background task itself is only stopped once.
    pub async fn close(&self) {
        self.audit.flush().await;
    }
}

/// Builder for constructing an [`Oracle`] with custom providers and configuration.
pub struct OracleBuilder {
    providers: Vec<Arc<dyn Provider>>,
    table: Option<ProviderTable>,
    filter: Arc<dyn ConversationalFilter>,
    ledger: Option<Arc<dyn oracle_core::LedgerClient>>,
    audit_topic: String,
    cfg: OracleConfig,
}

impl Default for OracleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleBuilder {
    /// Create a new builder with sensible defaults.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no providers; you must register at least one via
    ///   `with_provider`.
    /// - Defaults to [`ProviderTable::with_default_providers`], `Median`
    ///   consensus, a 10s per-provider timeout, and no conversational
    ///   pre-filter (every query reaches the classifier).
    /// - A ledger client is required at `build()` time; there is no
    ///   default because submitting to the wrong topic silently corrupts
    ///   an audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            table: None,
            filter: Arc::new(NeverConversational),
            ledger: None,
            audit_topic: "oracle-audit".to_string(),
            cfg: OracleConfig::default(),
        }
    }

    /// Register a provider. Wrapped in [`CacheMiddleware`] using the
    /// builder's currently configured `cache_capacity`/`cache_ttl`, so call
    /// `config`/the cache setters before registering providers if you need
    /// non-default cache parameters.
    #[must_use]
    pub fn with_provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        let wrapped = CacheMiddleware::new(Arc::new(provider), self.cfg.cache_capacity, self.cfg.cache_ttl);
        self.providers.push(Arc::new(wrapped));
        self
    }

    /// Register an already-constructed provider handle (e.g. one already
    /// wrapped in middleware of your own) without the automatic cache wrap.
    #[must_use]
    pub fn with_provider_arc(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Override the query-type → eligible-provider-names table. Defaults to
    /// [`ProviderTable::with_default_providers`].
    #[must_use]
    pub fn provider_table(mut self, table: ProviderTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Set the conversational pre-filter consulted before classification.
    #[must_use]
    pub fn conversational_filter(mut self, filter: Arc<dyn ConversationalFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Set the ledger client the audit logger submits to. Required at `build()`.
    #[must_use]
    pub fn ledger(mut self, ledger: Arc<dyn oracle_core::LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the ledger topic audit records are submitted to. Defaults to `"oracle-audit"`.
    #[must_use]
    pub fn audit_topic(mut self, topic: impl Into<String>) -> Self {
        self.audit_topic = topic.into();
        self
    }

    /// Replace the full configuration struct in one call.
    #[must_use]
    pub fn config(mut self, cfg: OracleConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the `Oracle`, spawning the audit logger's background flush task.
    ///
    /// # Errors
    /// - [`OracleError::InvalidArg`] if no providers have been registered via
    ///   `with_provider`/`with_provider_arc`.
    /// - [`OracleError::InvalidArg`] if no ledger client was configured via `ledger`.
    pub fn build(self) -> Result<Oracle, OracleError> {
        if self.providers.is_empty() {
            return Err(OracleError::InvalidArg(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        let ledger = self.ledger.ok_or_else(|| {
            OracleError::InvalidArg("no ledger client configured; call .ledger(...) before build()".to_string())
        })?;

        let cfg = self.cfg.clamped();
        let registry = Registry::new();
        for provider in self.providers {
            registry.register(provider);
        }

        let known: HashSet<&'static str> = registry.names().into_iter().collect();
        let table = self.table.unwrap_or_else(ProviderTable::with_default_providers);
        for query_type in [
            QueryType::PriceFeed,
            QueryType::ExchangeRate,
            QueryType::Weather,
            QueryType::SpaceData,
            QueryType::Knowledge,
            QueryType::NewsOrSearch,
        ] {
            for name in table.eligible_for(query_type) {
                if !known.contains(name.as_str()) {
                    #[cfg(feature = "tracing")]
                    warn!(provider = %name, ?query_type, "provider table references an unregistered provider");
                }
            }
        }

        let audit = AuditLogger::new(ledger, self.audit_topic, &cfg);
        let audit_task = audit.spawn();

        Ok(Oracle {
            registry,
            table,
            filter: self.filter,
            audit,
            audit_task: Some(audit_task),
            cfg,
        })
    }
}

impl Drop for Oracle {
    fn drop(&mut self) {
        // `TaskHandle::stop` is async and consumes `self`; `Drop` can do
        // neither, so a dropped `Oracle` falls back to `TaskHandle`'s own
        // best-effort stop-then-abort, same as an un-stopped background
        // task anywhere else in this workspace. Callers that want a
        // guaranteed final flush must call `close().await` explicitly.
        if let Some(handle) = self.audit_task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_mock::{InMemoryLedgerClient, KeywordConversationalFilter, MockNumericProvider};
    use rust_decimal::Decimal;

    fn ledger() -> Arc<dyn oracle_core::LedgerClient> {
        Arc::new(InMemoryLedgerClient::new())
    }

    #[test]
    fn build_rejects_an_empty_provider_set() {
        let err = Oracle::builder().ledger(ledger()).build().unwrap_err();
        assert!(matches!(err, OracleError::InvalidArg(_)));
    }

    #[test]
    fn build_rejects_a_missing_ledger() {
        let err = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .build()
            .unwrap_err();
        assert!(matches!(err, OracleError::InvalidArg(_)));
    }

    #[tokio::test]
    async fn query_reconciles_across_explicit_sources() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(100), 0.9))
            .with_provider(MockNumericProvider::new("b", Decimal::from(102), 0.9))
            .ledger(ledger())
            .build()
            .unwrap();

        let options = QueryOptions {
            sources: Some(vec!["a".to_string(), "b".to_string()]),
            ..QueryOptions::default()
        };
        let result = oracle.query("price of BTC", options).await.unwrap();
        assert_eq!(result.sources.len(), 2);
    }

    #[tokio::test]
    async fn unknown_explicit_source_is_rejected() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(100), 0.9))
            .ledger(ledger())
            .build()
            .unwrap();

        let options = QueryOptions {
            sources: Some(vec!["nonexistent".to_string()]),
            ..QueryOptions::default()
        };
        let err = oracle.query("price of BTC", options).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidArg(_)));
    }

    #[tokio::test]
    async fn conversational_input_short_circuits_before_fanout() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(100), 0.9))
            .conversational_filter(Arc::new(KeywordConversationalFilter::default()))
            .ledger(ledger())
            .build()
            .unwrap();

        let result = oracle.query("hello there, how are you?", QueryOptions::default()).await.unwrap();
        assert_eq!(result.sources, vec!["conversational".to_string()]);
        assert_eq!(result.confidence, 0.95);
    }

    #[tokio::test]
    async fn custom_query_type_fans_out_to_every_registered_provider() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .with_provider(MockNumericProvider::new("b", Decimal::from(1), 0.9))
            .ledger(ledger())
            .build()
            .unwrap();

        let result = oracle.query("asdkjfh qwoeiru", QueryOptions::default()).await.unwrap();
        assert_eq!(result.sources.len(), 2);
    }

    #[tokio::test]
    async fn too_few_eligible_providers_is_reported_before_fanout() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .config(OracleConfig {
                min_responses: 2,
                ..OracleConfig::default()
            })
            .ledger(ledger())
            .build()
            .unwrap();

        let err = oracle.query("asdkjfh qwoeiru", QueryOptions::default()).await.unwrap_err();
        assert!(matches!(err, OracleError::InsufficientProviders { eligible: 1, required: 2 }));
    }

    #[tokio::test]
    async fn register_and_unregister_providers_at_runtime() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .ledger(ledger())
            .build()
            .unwrap();

        oracle
            .register_provider(Arc::new(MockNumericProvider::new("b", Decimal::from(2), 0.9)))
            .unwrap();
        assert_eq!(oracle.get_providers().len(), 2);
        assert!(oracle.unregister_provider("b").is_some());
        assert!(oracle.get_provider("b").is_none());
    }

    #[tokio::test]
    async fn health_check_all_reports_every_registered_provider() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .ledger(ledger())
            .build()
            .unwrap();

        let health = oracle.health_check_all().await;
        assert_eq!(health.len(), 1);
        assert!(health["a"]);
    }

    #[tokio::test]
    async fn close_flushes_the_pending_audit_batch() {
        let oracle = Oracle::builder()
            .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
            .with_provider(MockNumericProvider::new("b", Decimal::from(1), 0.9))
            .config(OracleConfig {
                audit_batch_size: 10,
                ..OracleConfig::default()
            })
            .ledger(ledger())
            .build()
            .unwrap();

        let options = QueryOptions {
            sources: Some(vec!["a".to_string(), "b".to_string()]),
            ..QueryOptions::default()
        };
        oracle.query("price of BTC", options).await.unwrap();
        // The audit submission runs on its own spawned task; give it a turn.
        tokio::task::yield_now().await;
        oracle.close().await;
        assert_eq!(oracle.audit.pending_len(), 0);
    }
}
