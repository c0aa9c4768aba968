//! Shared application state injected into every Axum handler, and the wiring
//! that chooses a storage backend from [`Config`].

use std::sync::Arc;

use anyhow::{bail, Context};
use solace_core::backend::{MemoryBackend, PgBackend, RestBackend};
use solace_core::ports::{
    MessageLog, ProceduralApi, RawStatementApi, StructuredDataApi, UserDirectory,
};
use solace_core::strategy::standard_chain;
use solace_core::{ConversationReader, ReadReceipts, Resolver, SelfAddressPolicy};
use tracing::info;

use crate::config::Config;

/// The port implementations the server runs against.
#[derive(Clone)]
pub struct Backends {
    pub structured: Arc<dyn StructuredDataApi>,
    pub procedural: Arc<dyn ProceduralApi>,
    pub raw: Arc<dyn RawStatementApi>,
    pub log: Arc<dyn MessageLog>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Backends {
    /// Every port served by one backend.
    pub fn single<B>(backend: Arc<B>) -> Self
    where
        B: StructuredDataApi
            + ProceduralApi
            + RawStatementApi
            + MessageLog
            + UserDirectory
            + 'static,
    {
        Self {
            structured: backend.clone(),
            procedural: backend.clone(),
            raw: backend.clone(),
            log: backend.clone(),
            directory: backend,
        }
    }

    /// Picks adapters from configuration:
    ///
    /// - `SOLACE_DATABASE_URL` set: Postgres serves every port.
    /// - `SOLACE_REST_URL` also set: the structured and procedural strategies
    ///   go through the REST API instead; raw statements and reads stay on
    ///   Postgres.
    /// - nothing set: in-memory store.
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let Some(database_url) = cfg.database_url.as_deref() else {
            if cfg.rest_url.is_some() {
                bail!("SOLACE_REST_URL requires SOLACE_DATABASE_URL for reads and raw statements");
            }
            info!("no database configured; using in-memory backend");
            return Ok(Self::single(Arc::new(MemoryBackend::new())));
        };

        let pg = Arc::new(
            PgBackend::connect(database_url, cfg.db_max_connections)
                .await
                .context("connecting to Postgres")?,
        );
        info!(max_connections = cfg.db_max_connections, "database ready");
        let mut backends = Self::single(pg);

        if let Some(rest_url) = cfg.rest_url.as_deref() {
            let key = cfg
                .rest_key
                .as_deref()
                .context("SOLACE_REST_URL is set but SOLACE_REST_KEY is missing")?;
            let rest = Arc::new(RestBackend::new(rest_url, key).context("building REST client")?);
            backends.structured = rest.clone();
            backends.procedural = rest;
            info!(%rest_url, "REST API serves structured and procedural writes");
        }
        Ok(backends)
    }
}

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Resilient writer over the standard strategy chain.
    pub resolver: Arc<Resolver>,
    /// Enriched conversation listing.
    pub conversations: Arc<ConversationReader>,
    pub receipts: Arc<ReadReceipts>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let policy = if config.allow_self_messages {
            SelfAddressPolicy::Allow
        } else {
            SelfAddressPolicy::Reject
        };
        let resolver = Resolver::new(standard_chain(
            backends.structured,
            backends.procedural,
            backends.raw,
        ))
        .with_policy(policy);
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            conversations: Arc::new(ConversationReader::new(
                backends.log.clone(),
                backends.directory,
            )),
            receipts: Arc::new(ReadReceipts::new(backends.log)),
        }
    }
}
