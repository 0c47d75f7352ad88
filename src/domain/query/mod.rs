//! Query module - projections, predicates, request model and the response normalizer.

mod filter;
mod normalize;
mod projection;
mod request;

pub use filter::{escape_like, Filter, FilterValue, Operator, Order};
pub use normalize::{decode, normalize, UNDETERMINED};
pub use projection::{Aggregate, Projection, SelectItem, SelectList};
pub use request::{Cardinality, Method, QueryRequest, RawResponse};
