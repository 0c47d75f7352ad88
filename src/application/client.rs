//! DataClient - typed query composition over the `Backend` port.
//!
//! ```ignore
//! let titles: Vec<ProductTitle> = client
//!     .from::<Product>()
//!     .select::<ProductTitle>()
//!     .eq(ProductColumn::UserId, seller)
//!     .order(ProductColumn::CreatedAt, false)
//!     .many()
//!     .await?;
//! ```
//!
//! Every terminal call sends exactly one request and passes the raw response
//! through the normalizer before decoding it into the projection.

use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::foundation::{DataError, DataResult};
use crate::domain::query::{
    decode, normalize, Cardinality, Filter, FilterValue, Method, Order, Projection, QueryRequest,
};
use crate::domain::schema::Row;
use crate::ports::Backend;

/// Shared handle on the backend, passed to every accessor.
#[derive(Clone)]
pub struct DataClient {
    backend: Arc<dyn Backend>,
}

impl DataClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Starts a query against the table of `R`.
    pub fn from<R: Row>(&self) -> TableQuery<R> {
        TableQuery {
            client: self.clone(),
            _row: PhantomData,
        }
    }

    async fn run(&self, request: QueryRequest) -> DataResult<Value> {
        let table = request.table;
        let method = request.method;
        tracing::debug!(table, ?method, query = ?request.query_pairs(), "backend request");

        let result = normalize(self.backend.execute(request).await);
        if let Err(error) = &result {
            tracing::warn!(table, ?method, %error, "backend request failed");
        }
        result
    }
}

/// A query on one table before its method is chosen.
pub struct TableQuery<R: Row> {
    client: DataClient,
    _row: PhantomData<fn() -> R>,
}

impl<R> TableQuery<R>
where
    R: Row + Projection<R>,
{
    fn query<P: Projection<R>>(self, method: Method, body: Option<Value>) -> Query<R, P> {
        let mut request = QueryRequest::new(R::TABLE, method);
        request.select = P::select();
        request.body = body;
        Query {
            client: self.client,
            request,
            _shape: PhantomData,
        }
    }

    pub fn select<P: Projection<R>>(self) -> Query<R, P> {
        self.query(Method::Select, None)
    }

    /// Inserts one row or an array of rows; returns the inserted rows.
    pub fn insert<B: Serialize>(self, body: &B) -> DataResult<Query<R, R>> {
        let body = to_body(body)?;
        Ok(self.query(Method::Insert, Some(body)))
    }

    /// Updates the matched rows with the present fields of `patch`.
    pub fn update(self, patch: &R::Patch) -> DataResult<Query<R, R>> {
        let body = to_body(patch)?;
        Ok(self.query(Method::Update, Some(body)))
    }

    pub fn delete(self) -> Query<R, R> {
        self.query(Method::Delete, None)
    }
}

fn to_body<B: Serialize>(body: &B) -> DataResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| DataError::protocol(format!("unserializable request body: {}", e), Value::Null))
}

/// A composed query returning projection `P` of `R`.
pub struct Query<R: Row, P> {
    client: DataClient,
    request: QueryRequest,
    _shape: PhantomData<fn() -> (R, P)>,
}

impl<R: Row, P: Projection<R>> Query<R, P> {
    pub fn eq(self, column: R::Column, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: R::Column, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::gte(column, value))
    }

    pub fn lte(self, column: R::Column, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::lte(column, value))
    }

    pub fn is_in<I, V>(self, column: R::Column, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        self.filter(Filter::is_in(column, values))
    }

    pub fn ilike(self, column: R::Column, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ilike(column, pattern))
    }

    /// Any one of `filters` must hold.
    pub fn or(self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filter(Filter::or(filters))
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.request.filters.push(filter);
        self
    }

    pub fn order(mut self, column: R::Column, ascending: bool) -> Self {
        let order = if ascending {
            Order::asc(column)
        } else {
            Order::desc(column)
        };
        self.request.order.push(order);
        self
    }

    /// Changes the projection returned by the query (or by a write).
    pub fn returning<Q: Projection<R>>(mut self) -> Query<R, Q> {
        self.request.select = Q::select();
        Query {
            client: self.client,
            request: self.request,
            _shape: PhantomData,
        }
    }

    /// The request as it would be sent.
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    /// Expects exactly one row.
    pub async fn one(mut self) -> DataResult<P> {
        self.request.cardinality = Cardinality::One;
        let value = self.client.run(self.request).await?;
        decode(value)
    }

    /// Zero or more rows; an empty answer is an empty `Vec`.
    pub async fn many(mut self) -> DataResult<Vec<P>> {
        self.request.cardinality = Cardinality::Many;
        let value = self.client.run(self.request).await?;
        decode(value)
    }
}
