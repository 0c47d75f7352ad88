//! Listing - seller-side product and category management.

mod builders;

pub use builders::{ProductAttributes, ProductDraft};

use serde::Serialize;

use crate::application::catalogue::ProductKey;
use crate::application::client::DataClient;
use crate::domain::foundation::{CategoryId, DataResult, ProductId, UserId, ValidationError};
use crate::domain::schema::{
    CategorizedProduct, Category, CategoryColumn, CategoryPatch, Product, ProductColumn,
    ProductPatch,
};

#[derive(Serialize)]
struct Assignment {
    category_id: CategoryId,
    product_id: ProductId,
}

/// Write access to product listings and category tags.
#[derive(Clone)]
pub struct Listings {
    client: DataClient,
}

impl Listings {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// Starts registering a product sold by `seller`.
    pub fn register(&self, seller: UserId) -> ProductDraft {
        ProductDraft::new(self.client.clone(), seller)
    }

    /// Starts changing the attributes of `product`.
    pub fn attributes(&self, product: ProductId) -> ProductAttributes {
        ProductAttributes::new(self.client.clone(), product)
    }

    /// Shows or hides products in the catalogue.
    pub async fn set_listed(
        &self,
        listed: bool,
        products: impl IntoIterator<Item = ProductId>,
    ) -> DataResult<Vec<ProductKey>> {
        let patch = ProductPatch {
            is_listed: Some(listed),
            ..Default::default()
        };
        self.client
            .from::<Product>()
            .update(&patch)?
            .is_in(ProductColumn::Id, products)
            .returning::<ProductKey>()
            .many()
            .await
    }

    pub async fn remove(
        &self,
        products: impl IntoIterator<Item = ProductId>,
    ) -> DataResult<Vec<ProductKey>> {
        self.client
            .from::<Product>()
            .delete()
            .is_in(ProductColumn::Id, products)
            .returning::<ProductKey>()
            .many()
            .await
    }

    pub async fn set_stock(&self, product: ProductId, stock: i64) -> DataResult<Product> {
        if stock < 0 {
            return Err(ValidationError::negative("stock", stock as f64).into());
        }
        let patch = ProductPatch {
            stock_count: Some(stock),
            ..Default::default()
        };
        self.client
            .from::<Product>()
            .update(&patch)?
            .eq(ProductColumn::Id, product)
            .one()
            .await
    }

    // === Category admin ===

    pub async fn create_category(&self, name: &str, description: &str) -> DataResult<Category> {
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        let patch = CategoryPatch {
            name: Some(name.trim().to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        };
        self.client
            .from::<Category>()
            .insert(&patch)?
            .one()
            .await
    }

    pub async fn remove_category(&self, category: CategoryId) -> DataResult<Category> {
        self.client
            .from::<Category>()
            .delete()
            .eq(CategoryColumn::Id, category)
            .one()
            .await
    }

    /// Changes the name and, if given, the description of a tag.
    pub async fn rename_category(
        &self,
        category: CategoryId,
        name: &str,
        description: Option<&str>,
    ) -> DataResult<Category> {
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        let patch = CategoryPatch {
            name: Some(name.trim().to_string()),
            description: description.map(str::to_string),
            ..Default::default()
        };
        self.client
            .from::<Category>()
            .update(&patch)?
            .eq(CategoryColumn::Id, category)
            .one()
            .await
    }

    /// Tags `product` with every category in `categories`.
    pub async fn assign(
        &self,
        product: ProductId,
        categories: impl IntoIterator<Item = CategoryId>,
    ) -> DataResult<Vec<CategorizedProduct>> {
        let rows: Vec<Assignment> = categories
            .into_iter()
            .map(|category_id| Assignment {
                category_id,
                product_id: product,
            })
            .collect();
        if rows.is_empty() {
            return Err(ValidationError::empty_field("categories").into());
        }
        self.client
            .from::<CategorizedProduct>()
            .insert(&rows)?
            .many()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use crate::domain::query::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn listings() -> (Arc<InMemoryBackend>, Listings) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), Listings::new(DataClient::new(backend)))
    }

    #[tokio::test]
    async fn draft_inserts_all_fields_and_returns_id() {
        let (backend, listings) = listings();
        backend.respond_with("Product_Information", json!({ "id": 12 }));
        let seller = UserId::random();

        let mut draft = listings.register(seller);
        draft
            .title("Calculus textbook")
            .unwrap()
            .description("Eighth edition, light notes")
            .unwrap()
            .image("listings/calc/front.jpg")
            .unwrap()
            .price(40.0)
            .unwrap()
            .stock(1)
            .unwrap();
        let key = draft.build().await.unwrap();

        assert_eq!(key.id, ProductId::new(12));
        let sent = &backend.requests()[0];
        assert_eq!(sent.method, Method::Insert);
        assert_eq!(sent.select, "id");
        let body = sent.body.clone().unwrap();
        assert_eq!(body["user_id"], json!(seller));
        assert_eq!(body["stock_count"], json!(1));
        assert_eq!(body["image"], json!(["listings/calc/front.jpg"]));
    }

    #[tokio::test]
    async fn incomplete_draft_fails_before_any_request() {
        let (backend, listings) = listings();
        let mut draft = listings.register(UserId::random());
        draft.title("Lamp").unwrap();

        let result = draft.build().await;

        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn negative_price_and_stock_are_rejected() {
        let (_, listings) = listings();
        let mut draft = listings.register(UserId::random());
        draft.price(15.0).unwrap();
        assert!(draft.price(-1.0).is_err());
        assert!(draft.stock(-1).is_err());
    }

    #[tokio::test]
    async fn empty_attribute_change_is_rejected() {
        let (backend, listings) = listings();
        let result = listings.attributes(ProductId::new(1)).modify().await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn attributes_update_only_changed_fields() {
        let (backend, listings) = listings();
        backend.respond_with("Product_Information", json!({ "id": 1 }));

        let mut change = listings.attributes(ProductId::new(1));
        change.title("Desk lamp").unwrap();
        change.modify().await.unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.body, Some(json!({ "title": "Desk lamp" })));
        assert_eq!(sent.param("id").as_deref(), Some("eq.1"));
    }

    #[tokio::test]
    async fn set_listed_updates_flag_for_all_ids() {
        let (backend, listings) = listings();
        backend.respond_with("Product_Information", json!([]));

        listings
            .set_listed(true, [ProductId::new(0), ProductId::new(1), ProductId::new(2)])
            .await
            .unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.body, Some(json!({ "isListed": true })));
        assert_eq!(sent.param("id").as_deref(), Some("in.(0,1,2)"));
    }

    #[tokio::test]
    async fn assign_inserts_one_row_per_category() {
        let (backend, listings) = listings();
        backend.respond_with("Category_Assigned_Products", json!([]));

        listings
            .assign(ProductId::new(3), [CategoryId::new(1), CategoryId::new(2)])
            .await
            .unwrap();

        assert_eq!(
            backend.requests()[0].body,
            Some(json!([
                { "category_id": 1, "product_id": 3 },
                { "category_id": 2, "product_id": 3 },
            ]))
        );
    }
}
