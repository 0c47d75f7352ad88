//! Ordering - the shopping cart of a user and the products stored in it.

use serde::Serialize;

use crate::application::client::DataClient;
use crate::domain::foundation::{CartId, DataResult, ProductId, UserId, ValidationError};
use crate::domain::schema::{
    CartHeader, CartHeaderColumn, CartHeaderPatch, CartItem, CartItemColumn,
};

crate::pick! {
    /// Id of a registered cart.
    pub struct CartKey from CartHeader {
        id: CartId = CartHeaderColumn::Id,
    }
}

crate::pick! {
    /// Product id of a cart line.
    pub struct CartLine from CartItem {
        product_id: ProductId = CartItemColumn::ProductId,
    }
}

#[derive(Serialize)]
struct StoredItem {
    shopping_cart_id: CartId,
    product_id: ProductId,
}

/// Carts and their lines.
#[derive(Clone)]
pub struct Carts {
    client: DataClient,
}

impl Carts {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// The cart owned by `user`.
    pub async fn get(&self, user: UserId) -> DataResult<CartHeader> {
        self.client
            .from::<CartHeader>()
            .select::<CartHeader>()
            .eq(CartHeaderColumn::UserId, user)
            .one()
            .await
    }

    pub async fn items(&self, cart: CartId) -> DataResult<Vec<CartItem>> {
        self.client
            .from::<CartItem>()
            .select::<CartItem>()
            .eq(CartItemColumn::ShoppingCartId, cart)
            .many()
            .await
    }

    /// Creates the cart of `user`.
    pub async fn register(&self, user: UserId) -> DataResult<CartKey> {
        let patch = CartHeaderPatch {
            user_id: Some(user),
            ..Default::default()
        };
        self.client
            .from::<CartHeader>()
            .insert(&patch)?
            .returning::<CartKey>()
            .one()
            .await
    }

    /// Adds one line per product.
    pub async fn store(
        &self,
        cart: CartId,
        products: impl IntoIterator<Item = ProductId>,
    ) -> DataResult<Vec<CartItem>> {
        let rows: Vec<StoredItem> = products
            .into_iter()
            .map(|product_id| StoredItem {
                shopping_cart_id: cart,
                product_id,
            })
            .collect();
        if rows.is_empty() {
            return Err(ValidationError::empty_field("products").into());
        }
        self.client
            .from::<CartItem>()
            .insert(&rows)?
            .many()
            .await
    }

    /// Removes the lines holding `products` from `cart`.
    pub async fn remove(
        &self,
        cart: CartId,
        products: impl IntoIterator<Item = ProductId>,
    ) -> DataResult<Vec<CartLine>> {
        self.client
            .from::<CartItem>()
            .delete()
            .eq(CartItemColumn::ShoppingCartId, cart)
            .is_in(CartItemColumn::ProductId, products)
            .returning::<CartLine>()
            .many()
            .await
    }

    /// Empties `cart`, returning the products it held.
    pub async fn clear(&self, cart: CartId) -> DataResult<Vec<CartLine>> {
        self.client
            .from::<CartItem>()
            .delete()
            .eq(CartItemColumn::ShoppingCartId, cart)
            .returning::<CartLine>()
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

    fn carts() -> (Arc<InMemoryBackend>, Carts) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), Carts::new(DataClient::new(backend)))
    }

    #[tokio::test]
    async fn register_returns_the_new_cart_id() {
        let (backend, carts) = carts();
        backend.respond_with("Shopping_Cart", json!({ "id": 31 }));
        let user = UserId::random();

        let key = carts.register(user).await.unwrap();

        assert_eq!(key.id, CartId::new(31));
        let sent = &backend.requests()[0];
        assert_eq!(sent.method, Method::Insert);
        assert_eq!(sent.select, "id");
        assert_eq!(sent.body, Some(json!({ "user_id": user })));
    }

    #[tokio::test]
    async fn store_inserts_one_line_per_product() {
        let (backend, carts) = carts();
        backend.respond_with("Shopping_Cart_Products", json!([]));

        carts
            .store(CartId::new(2), [ProductId::new(7), ProductId::new(8)])
            .await
            .unwrap();

        assert_eq!(
            backend.requests()[0].body,
            Some(json!([
                { "shopping_cart_id": 2, "product_id": 7 },
                { "shopping_cart_id": 2, "product_id": 8 },
            ]))
        );
    }

    #[tokio::test]
    async fn remove_matches_lines_by_product() {
        let (backend, carts) = carts();
        backend.respond_with("Shopping_Cart_Products", json!([{ "product_id": 7 }]));

        let removed = carts.remove(CartId::new(2), [ProductId::new(7)]).await.unwrap();

        assert_eq!(removed[0].product_id, ProductId::new(7));
        let sent = &backend.requests()[0];
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.param("shopping_cart_id").as_deref(), Some("eq.2"));
        assert_eq!(sent.param("product_id").as_deref(), Some("in.(7)"));
    }

    #[tokio::test]
    async fn clear_returns_removed_products() {
        let (backend, carts) = carts();
        backend.respond_with(
            "Shopping_Cart_Products",
            json!([{ "product_id": 1 }, { "product_id": 2 }]),
        );

        let cleared = carts.clear(CartId::new(5)).await.unwrap();

        assert_eq!(cleared.len(), 2);
        assert_eq!(backend.requests()[0].select, "product_id");
    }

    #[tokio::test]
    async fn storing_nothing_is_rejected() {
        let (backend, carts) = carts();
        let result = carts.store(CartId::new(1), Vec::new()).await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }
}
