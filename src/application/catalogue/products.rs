//! Product lookups.

use super::ProductFilter;
use crate::application::client::DataClient;
use crate::domain::foundation::{DataResult, ProductId, UserId};
use crate::domain::query::{escape_like, Filter};
use crate::domain::schema::{Product, ProductColumn};

/// Read access to product listings.
#[derive(Clone)]
pub struct Products {
    client: DataClient,
}

impl Products {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, ids: impl IntoIterator<Item = ProductId>) -> DataResult<Vec<Product>> {
        self.client
            .from::<Product>()
            .select::<Product>()
            .is_in(ProductColumn::Id, ids)
            .many()
            .await
    }

    /// Everything `seller` has listed, newest first.
    pub async fn by_seller(&self, seller: UserId) -> DataResult<Vec<Product>> {
        self.client
            .from::<Product>()
            .select::<Product>()
            .eq(ProductColumn::UserId, seller)
            .order(ProductColumn::CreatedAt, false)
            .many()
            .await
    }

    /// Products whose title or description contains `text`, ignoring case.
    pub async fn search(&self, text: &str) -> DataResult<Vec<Product>> {
        let pattern = format!("%{}%", escape_like(text.trim()));
        self.client
            .from::<Product>()
            .select::<Product>()
            .or([
                Filter::ilike(ProductColumn::Title, pattern.clone()),
                Filter::ilike(ProductColumn::Description, pattern),
            ])
            .many()
            .await
    }

    /// Starts a validating product search.
    pub fn filter(&self) -> ProductFilter {
        ProductFilter::new(self.client.clone())
    }
}
