use crate::error::{AppError, AppResult};
use reqwest::{header::ACCEPT, Client as HttpClient};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// One result row: variable name → lexical value
pub type Binding = HashMap<String, String>;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Trait for semantic query backends
///
/// Implementations return the tabular bindings of a SELECT query. Zero rows is a
/// valid answer; transport and decoding problems are `TransientQueryFailure`s.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphClient: Send + Sync {
    async fn select(&self, query: &str) -> AppResult<Vec<Binding>>;

    /// Backend name for logging and diagnostics
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Decodes a SPARQL JSON results document into rows
pub fn parse_bindings(body: &str) -> AppResult<Vec<Binding>> {
    let parsed: SparqlResults = serde_json::from_str(body).map_err(|e| {
        AppError::TransientQueryFailure(format!("Failed to parse graph response: {}", e))
    })?;

    Ok(parsed
        .results
        .bindings
        .into_iter()
        .map(|row| row.into_iter().map(|(var, term)| (var, term.value)).collect())
        .collect())
}

/// SPARQL-over-HTTP client for the knowledge graph service
///
/// Queries go to a SPARQL 1.1 protocol endpoint as form-encoded POST bodies and
/// come back in the W3C SPARQL JSON results format:
///
/// ```json
/// { "head": { "vars": ["name"] },
///   "results": { "bindings": [ { "name": { "type": "literal", "value": "Retinol" } } ] } }
/// ```
///
/// Only the `value` of each term is kept; every row becomes a variable → value map.
#[derive(Clone)]
pub struct SparqlHttpClient {
    http_client: HttpClient,
    endpoint: String,
}

impl SparqlHttpClient {
    pub fn new(endpoint: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait::async_trait]
impl GraphClient for SparqlHttpClient {
    async fn select(&self, query: &str) -> AppResult<Vec<Binding>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TransientQueryFailure(format!(
                "Graph service returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        tracing::trace!(response = %body, "Raw graph response");

        let rows = parse_bindings(&body)?;

        tracing::debug!(
            rows = rows.len(),
            endpoint = %self.endpoint,
            "Graph query completed"
        );

        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "sparql-http"
    }
}
