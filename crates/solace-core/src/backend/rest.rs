//! PostgREST-compatible HTTP adapter for the structured and procedural ports.
//!
//! Table inserts go to `POST {base}/{table}` and procedure calls to
//! `POST {base}/rpc/{name}`, both with `Prefer: return=representation` so the
//! stored rows come back in the response body.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::BackendError;
use crate::ports::{ensure_sql_identifier, ProceduralApi, Row, SqlValue, StructuredDataApi};

#[derive(Clone, Debug)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// `base_url` is the REST root, e.g. `https://project.example/rest/v1`.
    /// `api_key` is sent both as `apikey` and as a bearer token.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| BackendError::Unavailable(format!("invalid API key header: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| BackendError::Unavailable(format!("invalid API key header: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("prefer", HeaderValue::from_static("return=representation"));

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn table_url(&self, table: &str) -> Result<String, BackendError> {
        ensure_sql_identifier(table)?;
        Ok(format!("{}/{table}", self.base_url))
    }

    pub fn rpc_url(&self, name: &str) -> Result<String, BackendError> {
        ensure_sql_identifier(name)?;
        Ok(format!("{}/rpc/{name}", self.base_url))
    }

    async fn post(&self, url: String, body: Value) -> Result<Vec<Row>, BackendError> {
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(%url, status = status.as_u16(), "REST call succeeded");
        rows_from_body(response.json::<Value>().await?)
    }
}

/// PostgREST answers with an array of rows, or a single object for scalar
/// or single-row functions.
fn rows_from_body(body: Value) -> Result<Vec<Row>, BackendError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(BackendError::Unavailable(format!(
                    "expected row object, got {other}"
                ))),
            })
            .collect(),
        Value::Object(row) => Ok(vec![row]),
        Value::Null => Ok(Vec::new()),
        other => Err(BackendError::Unavailable(format!(
            "unexpected response body {other}"
        ))),
    }
}

#[async_trait]
impl StructuredDataApi for RestBackend {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        let url = self.table_url(table)?;
        self.post(url, Value::Object(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                BackendError::Unavailable(format!("insert into {table} returned no row"))
            })
    }
}

#[async_trait]
impl ProceduralApi for RestBackend {
    async fn call_procedure(
        &self,
        name: &str,
        args: &[(&str, SqlValue)],
    ) -> Result<Vec<Row>, BackendError> {
        let url = self.rpc_url(name)?;
        let body: Row = args
            .iter()
            .map(|(arg, value)| ((*arg).to_owned(), value.to_json()))
            .collect();
        self.post(url, Value::Object(body)).await
    }
}
