//! Backend-agnostic description of one REST call.

use serde::Serialize;
use serde_json::Value;

use super::filter::{Filter, Order};
use crate::domain::foundation::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Select,
    Insert,
    Update,
    Delete,
}

impl Method {
    pub fn is_write(&self) -> bool {
        !matches!(self, Method::Select)
    }
}

/// Whether the caller expects one object or an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// A fully composed query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: &'static str,
    pub method: Method,
    /// Rendered `select` parameter (also the returned projection of writes).
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub body: Option<Value>,
    pub cardinality: Cardinality,
}

impl QueryRequest {
    pub fn new(table: &'static str, method: Method) -> Self {
        Self {
            table,
            method,
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            body: None,
            cardinality: Cardinality::Many,
        }
    }

    /// Query string pairs in Postgrest order: select, filters, order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 2);
        pairs.push(("select".to_string(), self.select.clone()));
        pairs.extend(self.filters.iter().map(Filter::to_query_pair));
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::render).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        pairs
    }

    /// Value of the first top-level pair with this key.
    pub fn param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Every value of top-level pairs with this key, in order.
    pub fn params(&self, key: &str) -> Vec<String> {
        self.query_pairs()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }
}

/// What came back from the backend, before classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawResponse {
    pub data: Option<Value>,
    pub error: Option<BackendError>,
    pub status: u16,
}

impl RawResponse {
    pub fn data(status: u16, data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
            status,
        }
    }

    pub fn error(error: BackendError) -> Self {
        Self {
            status: error.status,
            data: None,
            error: Some(error),
        }
    }

    /// Neither data nor error.
    pub fn empty(status: u16) -> Self {
        Self {
            data: None,
            error: None,
            status,
        }
    }
}
