//! Postgrest Backend - Implementation of `Backend` over the REST API.
//!
//! Every request carries the anon key and the current bearer token. The
//! schema is chosen with `Accept-Profile` (reads) or `Content-Profile`
//! (writes). Responses are translated into a `RawResponse` without judging
//! them; classification is left to the normalizer.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;

use super::connection::Connection;
use crate::domain::foundation::BackendError;
use crate::domain::query::{Cardinality, Method, QueryRequest, RawResponse};
use crate::ports::Backend;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// REST adapter for table queries.
#[derive(Clone)]
pub struct PostgrestBackend {
    connection: Connection,
}

impl PostgrestBackend {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    fn table_url(&self, table: &str) -> String {
        self.connection.url(&format!("/rest/v1/{}", table))
    }

    fn build(&self, request: &QueryRequest) -> reqwest::RequestBuilder {
        let client = self.connection.client();
        let url = self.table_url(request.table);
        let builder = match request.method {
            Method::Select => client.get(url),
            Method::Insert => client.post(url),
            Method::Update => client.patch(url),
            Method::Delete => client.delete(url),
        };

        let mut builder = self
            .connection
            .authorize(builder)
            .query(&request.query_pairs());

        if request.method.is_write() {
            builder = builder
                .header("Content-Profile", self.connection.schema())
                .header("Prefer", "return=representation");
        } else {
            builder = builder.header("Accept-Profile", self.connection.schema());
        }
        if request.cardinality == Cardinality::One {
            builder = builder.header(ACCEPT, SINGLE_OBJECT);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

/// Reads a response body into the envelope shape the normalizer expects.
pub(crate) fn classify(status: StatusCode, body: &str) -> RawResponse {
    let code = status.as_u16();
    if status.is_success() {
        if body.trim().is_empty() {
            return RawResponse::empty(code);
        }
        return match serde_json::from_str::<Value>(body) {
            Ok(data) => RawResponse::data(code, data),
            Err(_) => RawResponse::data(code, Value::String(body.to_string())),
        };
    }

    let mut error = serde_json::from_str::<BackendError>(body)
        .ok()
        .filter(|e| !e.message.is_empty())
        .unwrap_or_else(|| {
            BackendError::new(
                code,
                status.canonical_reason().unwrap_or("request failed").to_string(),
            )
        });
    error.status = code;
    RawResponse::error(error)
}

#[async_trait]
impl Backend for PostgrestBackend {
    async fn execute(&self, request: QueryRequest) -> RawResponse {
        let response = match self.build(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(table = request.table, error = %e, "request did not reach the backend");
                return RawResponse::error(BackendError::transport(e.to_string()));
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => classify(status, &body),
            Err(e) => RawResponse::error(BackendError::transport(format!(
                "failed to read response body: {}",
                e
            ))),
        }
    }
}
