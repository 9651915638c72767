//! Cosmos DB target document store operations.

mod auth;

use crate::config::TargetConfig;
use crate::error::{MigrateError, Result};
use crate::source::Document;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const API_VERSION: &str = "2018-12-31";

/// Raw result of one sink write, before classification.
#[derive(Debug, Clone)]
pub struct SinkResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, kept for fatal-error detail.
    pub body: String,
    /// Request units consumed, when the store reports them.
    pub request_charge: Option<f64>,
}

/// Trait for target document store operations.
///
/// Adapters only execute and report; retry policy lives in the driver.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Upsert one document keyed by its id.
    ///
    /// Must be safe to call more than once with the same document: a retry
    /// may re-attempt an upsert whose prior attempt partially succeeded.
    /// Returns the raw response; only transport failures are errors.
    async fn upsert(&self, doc: &Document) -> Result<SinkResponse>;

    /// Verify the container is reachable, returning the observed latency.
    async fn health_check(&self) -> Result<Duration>;
}

/// Cosmos DB sink over the REST data plane.
pub struct CosmosSink {
    client: reqwest::Client,
    key: Vec<u8>,
    docs_url: String,
    collection_url: String,
    collection_link: String,
}

impl CosmosSink {
    /// Build a sink for the configured container.
    ///
    /// A single HTTP client is shared for the process lifetime; the driver
    /// keeps one request in flight so no pool tuning is needed beyond an
    /// unbounded idle timeout.
    pub fn new(config: &TargetConfig) -> Result<Self> {
        let key = STANDARD
            .decode(&config.key)
            .map_err(|e| MigrateError::Config(format!("target.key is not valid base64: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(None)
            .build()?;

        let endpoint = config.endpoint.trim_end_matches('/');
        let collection_link = format!("dbs/{}/colls/{}", config.database, config.container);
        let collection_url = format!("{}/{}", endpoint, collection_link);
        let docs_url = format!("{}/docs", collection_url);

        info!(
            "Cosmos sink ready: {} ({}/{})",
            endpoint, config.database, config.container
        );

        Ok(Self {
            client,
            key,
            docs_url,
            collection_url,
            collection_link,
        })
    }
}

#[async_trait]
impl DocumentSink for CosmosSink {
    async fn upsert(&self, doc: &Document) -> Result<SinkResponse> {
        let date = auth::request_date();
        let token = auth::master_key_token("post", "docs", &self.collection_link, &date, &self.key)?;

        let response = self
            .client
            .post(&self.docs_url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-documentdb-is-upsert", "True")
            .header("x-ms-documentdb-partitionkey", partition_key_header(&doc.id)?)
            .json(&doc.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let request_charge = response
            .headers()
            .get("x-ms-request-charge")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response.text().await.unwrap_or_default();

        debug!(id = %doc.id, status, ?request_charge, "upsert attempted");

        Ok(SinkResponse {
            status,
            body,
            request_charge,
        })
    }

    async fn health_check(&self) -> Result<Duration> {
        let start = Instant::now();
        let date = auth::request_date();
        let token = auth::master_key_token("get", "colls", &self.collection_link, &date, &self.key)?;

        let response = self
            .client
            .get(&self.collection_url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(MigrateError::SinkRejected {
                status,
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(start.elapsed())
    }
}

/// Partition-key header value: a JSON array holding the document's key.
/// Assumes the container is partitioned on the migrated key path.
fn partition_key_header(id: &str) -> Result<String> {
    Ok(serde_json::to_string(&[id])?)
}
