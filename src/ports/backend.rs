//! Backend port for table queries.
//!
//! One call per composed request. The adapter never classifies the answer:
//! it hands back whatever data and error envelope it received and the
//! application normalizes it.
//!
//! # Example
//!
//! ```ignore
//! let raw = backend.execute(request).await;
//! let value = normalize(raw)?;
//! ```

use async_trait::async_trait;

use crate::domain::query::{QueryRequest, RawResponse};

/// Executes composed queries against the remote tables.
///
/// # Contract
///
/// Implementations must:
/// - be total: transport failures come back as a `RawResponse` carrying a
///   transport `BackendError`, never as a panic
/// - send writes with the request's `select` as the returned projection
/// - not retry
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: QueryRequest) -> RawResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn execute(&self, request: QueryRequest) -> RawResponse {
            RawResponse::data(200, json!({ "table": request.table }))
        }
    }

    #[test]
    fn backend_is_object_safe() {
        fn _accepts_dyn(_backend: &dyn Backend) {}
    }

    #[tokio::test]
    async fn backend_answers_through_trait_object() {
        use crate::domain::query::Method;

        let backend: Box<dyn Backend> = Box::new(EchoBackend);
        let raw = backend
            .execute(QueryRequest::new("Chats", Method::Select))
            .await;
        assert_eq!(raw.data, Some(json!({ "table": "Chats" })));
    }
}
