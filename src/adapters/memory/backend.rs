//! Scripted in-memory backend.
//!
//! Responses are queued per table and handed out in order; every executed
//! request is recorded for assertions. A table with an empty queue answers
//! with neither data nor error, which the normalizer reports as a protocol
//! error.
//!
//! # Panics
//!
//! Methods panic if internal locks are poisoned. Test and local use only.
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(InMemoryBackend::new());
//! backend.respond_with("Product_Information", json!([{ "id": 5 }]));
//!
//! let client = DataClient::new(backend.clone());
//! // ... run a query ...
//! assert_eq!(backend.requests_for("Product_Information").len(), 1);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::domain::foundation::BackendError;
use crate::domain::query::{QueryRequest, RawResponse};
use crate::ports::Backend;

struct Scripted {
    response: RawResponse,
    gate: Option<oneshot::Receiver<()>>,
}

/// In-memory backend answering from per-table response queues.
#[derive(Default)]
pub struct InMemoryBackend {
    queues: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, table: &str, scripted: Scripted) {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .entry(table.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Queues a raw response for the next request on `table`.
    pub fn respond(&self, table: &str, response: RawResponse) {
        self.push(
            table,
            Scripted {
                response,
                gate: None,
            },
        );
    }

    /// Queues a successful response carrying `data`.
    pub fn respond_with(&self, table: &str, data: Value) {
        self.respond(table, RawResponse::data(200, data));
    }

    /// Queues an error envelope.
    pub fn fail(&self, table: &str, error: BackendError) {
        self.respond(table, RawResponse::error(error));
    }

    /// Queues a response that is only delivered once the returned sender fires
    /// (or is dropped).
    pub fn respond_when_released(&self, table: &str, data: Value) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.push(
            table,
            Scripted {
                response: RawResponse::data(200, data),
                gate: Some(gate),
            },
        );
        release
    }

    // === Test Helpers ===

    /// Every executed request, in order.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().expect("request lock poisoned").clone()
    }

    pub fn requests_for(&self, table: &str) -> Vec<QueryRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.table == table)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request lock poisoned").len()
    }

    /// Responses still queued for `table`.
    pub fn pending(&self, table: &str) -> usize {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .get(table)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn execute(&self, request: QueryRequest) -> RawResponse {
        let table = request.table;
        self.requests
            .lock()
            .expect("request lock poisoned")
            .push(request);

        let scripted = self
            .queues
            .lock()
            .expect("queue lock poisoned")
            .get_mut(table)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted { response, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                response
            }
            None => RawResponse::empty(204),
        }
    }
}
