//! Catalogue - product lookup, search and category tags.

mod categories;
mod product_filter;
mod products;

pub use categories::Categories;
pub use product_filter::ProductFilter;
pub use products::Products;

use serde::Deserialize;

use crate::domain::foundation::ProductId;
use crate::domain::query::{Projection, SelectItem, SelectList};
use crate::domain::schema::{
    CategorizedProduct, CategorizedProductColumn, Product, ProductColumn,
};

/// A product id, read from the products table (`id`) or the category join
/// table (`id:product_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct ProductKey {
    pub id: ProductId,
}

impl Projection<Product> for ProductKey {
    fn select_list() -> SelectList<ProductColumn> {
        SelectList::columns([ProductColumn::Id])
    }
}

impl Projection<CategorizedProduct> for ProductKey {
    fn select_list() -> SelectList<CategorizedProductColumn> {
        SelectList::items([SelectItem::Aliased {
            alias: "id",
            column: CategorizedProductColumn::ProductId,
        }])
    }
}
