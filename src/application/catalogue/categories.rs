//! Category tags and their product assignments.

use super::ProductKey;
use crate::application::client::DataClient;
use crate::domain::foundation::{CategoryId, DataResult, ProductId};
use crate::domain::schema::{
    CategorizedProduct, CategorizedProductColumn, Category, CategoryColumn,
};

/// Read access to category tags.
#[derive(Clone)]
pub struct Categories {
    client: DataClient,
}

impl Categories {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// All tags, alphabetically.
    pub async fn tags(&self) -> DataResult<Vec<Category>> {
        self.client
            .from::<Category>()
            .select::<Category>()
            .order(CategoryColumn::Name, true)
            .many()
            .await
    }

    pub async fn tag(&self, id: CategoryId) -> DataResult<Category> {
        self.client
            .from::<Category>()
            .select::<Category>()
            .eq(CategoryColumn::Id, id)
            .one()
            .await
    }

    /// Ids of the products carrying `category`.
    pub async fn products_tagged(&self, category: CategoryId) -> DataResult<Vec<ProductKey>> {
        self.client
            .from::<CategorizedProduct>()
            .select::<ProductKey>()
            .eq(CategorizedProductColumn::CategoryId, category)
            .many()
            .await
    }

    /// Tag assignments of `product`.
    pub async fn tags_of(&self, product: ProductId) -> DataResult<Vec<CategorizedProduct>> {
        self.client
            .from::<CategorizedProduct>()
            .select::<CategorizedProduct>()
            .eq(CategorizedProductColumn::ProductId, product)
            .many()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn products_tagged_reads_aliased_product_ids() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_with(
            "Category_Assigned_Products",
            json!([{ "id": 4 }, { "id": 9 }]),
        );
        let categories = Categories::new(DataClient::new(backend.clone()));

        let keys = categories.products_tagged(CategoryId::new(2)).await.unwrap();

        assert_eq!(keys, vec![ProductKey { id: ProductId::new(4) }, ProductKey { id: ProductId::new(9) }]);
        let sent = &backend.requests()[0];
        assert_eq!(sent.param("select").as_deref(), Some("id:product_id"));
        assert_eq!(sent.param("category_id").as_deref(), Some("eq.2"));
    }

    #[tokio::test]
    async fn tags_are_ordered_by_name() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_with("Category_Tags", json!([]));
        let categories = Categories::new(DataClient::new(backend.clone()));

        categories.tags().await.unwrap();
        assert_eq!(backend.requests()[0].param("order").as_deref(), Some("name.asc"));
    }
}
