//! ProductFilter - validating builder for product searches.
//!
//! ```ignore
//! let mut filter = products.filter();
//! filter.price(50.0, 10.0)?.stock(1, 20)?.categories([books, notes])?;
//! let found = filter.find().await?;
//! ```
//!
//! `find` runs in two phases. Phase one selects product ids under the seller,
//! price and stock predicates. Only when categories were given, phase two
//! keeps the ids tagged with any of them.

use std::collections::HashSet;

use super::ProductKey;
use crate::application::client::DataClient;
use crate::domain::foundation::{CategoryId, DataResult, UserId, ValidationError};
use crate::domain::schema::{CategorizedProduct, CategorizedProductColumn, Product, ProductColumn};

/// Orders two bounds and rejects negative or non-finite ones.
pub(crate) fn price_bounds(a: f64, b: f64) -> Result<(f64, f64), ValidationError> {
    for bound in [a, b] {
        if !bound.is_finite() {
            return Err(ValidationError::invalid_format("price", "bound must be a finite number"));
        }
        if bound < 0.0 {
            return Err(ValidationError::negative("price", bound));
        }
    }
    Ok((a.min(b), a.max(b)))
}

pub(crate) fn stock_bounds(a: i64, b: i64) -> Result<(i64, i64), ValidationError> {
    for bound in [a, b] {
        if bound < 0 {
            return Err(ValidationError::negative("stock", bound as f64));
        }
    }
    Ok((a.min(b), a.max(b)))
}

/// Accumulated product search predicates. Single use: `find` consumes it.
pub struct ProductFilter {
    client: DataClient,
    seller: Option<UserId>,
    price: Option<(f64, f64)>,
    stock: Option<(i64, i64)>,
    categories: Vec<CategoryId>,
}

impl ProductFilter {
    pub(crate) fn new(client: DataClient) -> Self {
        Self {
            client,
            seller: None,
            price: None,
            stock: None,
            categories: Vec::new(),
        }
    }

    /// Only products listed by `user`.
    pub fn seller(&mut self, user: UserId) -> DataResult<&mut Self> {
        self.seller = Some(user);
        Ok(self)
    }

    /// Price between `a` and `b` inclusive, in either order.
    pub fn price(&mut self, a: f64, b: f64) -> DataResult<&mut Self> {
        self.price = Some(price_bounds(a, b)?);
        Ok(self)
    }

    /// Stock count between `a` and `b` inclusive, in either order.
    pub fn stock(&mut self, a: i64, b: i64) -> DataResult<&mut Self> {
        self.stock = Some(stock_bounds(a, b)?);
        Ok(self)
    }

    /// Products tagged with any of `categories`.
    pub fn categories(
        &mut self,
        categories: impl IntoIterator<Item = CategoryId>,
    ) -> DataResult<&mut Self> {
        let categories: Vec<CategoryId> = categories.into_iter().collect();
        if categories.is_empty() {
            return Err(ValidationError::empty_field("categories").into());
        }
        for category in categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        Ok(self)
    }

    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.price
    }

    pub fn stock_range(&self) -> Option<(i64, i64)> {
        self.stock
    }

    /// Runs the search and returns matching product ids.
    pub async fn find(self) -> DataResult<Vec<ProductKey>> {
        let mut query = self.client.from::<Product>().select::<ProductKey>();
        if let Some(seller) = self.seller {
            query = query.eq(ProductColumn::UserId, seller);
        }
        if let Some((min, max)) = self.price {
            query = query.gte(ProductColumn::Price, min).lte(ProductColumn::Price, max);
        }
        if let Some((min, max)) = self.stock {
            query = query
                .gte(ProductColumn::StockCount, min)
                .lte(ProductColumn::StockCount, max);
        }
        let matched = query.many().await?;

        if self.categories.is_empty() || matched.is_empty() {
            return Ok(matched);
        }

        let tagged = self
            .client
            .from::<CategorizedProduct>()
            .select::<ProductKey>()
            .is_in(
                CategorizedProductColumn::ProductId,
                matched.iter().map(|key| key.id),
            )
            .is_in(CategorizedProductColumn::CategoryId, self.categories)
            .many()
            .await?;

        let mut seen = HashSet::new();
        Ok(tagged.into_iter().filter(|key| seen.insert(key.id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_ordered() {
        assert_eq!(price_bounds(50.0, 10.0), Ok((10.0, 50.0)));
        assert_eq!(stock_bounds(3, 3), Ok((3, 3)));
    }

    #[test]
    fn negative_bound_is_rejected() {
        assert_eq!(
            price_bounds(-1.0, 10.0),
            Err(ValidationError::negative("price", -1.0))
        );
        assert!(stock_bounds(0, -4).is_err());
    }

    #[test]
    fn nan_bound_is_rejected() {
        assert!(price_bounds(f64::NAN, 1.0).is_err());
        assert!(price_bounds(1.0, f64::INFINITY).is_err());
    }
}
