//! Product draft and attribute builders.
//!
//! Both share the field setters; the draft inserts a new product, the
//! attribute builder updates an existing one with only the fields it was
//! given.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::application::catalogue::ProductKey;
use crate::application::client::DataClient;
use crate::domain::foundation::{present, DataResult, ProductId, UserId, ValidationError};
use crate::domain::schema::{Product, ProductColumn, ProductPatch};

/// Relative `.png`/`.jpg` path, e.g. `listings/42/front.jpg`.
static IMAGE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\w|\.|/[a-z_\-\s0-9.]+)+\.(png|jpg)$").expect("image path pattern is valid")
});

fn check_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(value.to_string())
}

fn check_image(path: &str) -> Result<String, ValidationError> {
    if !IMAGE_PATH.is_match(path) {
        return Err(ValidationError::invalid_format(
            "image",
            "expected a relative .png or .jpg path",
        ));
    }
    Ok(path.to_string())
}

/// Field setters shared by both builders.
#[derive(Debug, Clone, Default)]
struct Fields {
    patch: ProductPatch,
    images: Vec<String>,
}

impl Fields {
    fn title(&mut self, title: &str) -> Result<(), ValidationError> {
        self.patch.title = Some(check_text("title", title)?);
        Ok(())
    }

    fn description(&mut self, description: &str) -> Result<(), ValidationError> {
        self.patch.description = Some(check_text("description", description)?);
        Ok(())
    }

    fn image(&mut self, path: &str) -> Result<(), ValidationError> {
        let path = check_image(path)?;
        self.images.push(path);
        Ok(())
    }

    /// Patch with the collected images folded in as a JSON array.
    fn into_patch(mut self) -> ProductPatch {
        if !self.images.is_empty() {
            let images = self.images.into_iter().map(Value::String).collect();
            self.patch.image = Some(Some(Value::Array(images)));
        }
        self.patch
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ProductDraft
// ════════════════════════════════════════════════════════════════════════════

/// A product being registered. Single use: `build` consumes it.
pub struct ProductDraft {
    client: DataClient,
    seller: UserId,
    fields: Fields,
    price: Option<f64>,
    stock: Option<i64>,
}

impl ProductDraft {
    pub(crate) fn new(client: DataClient, seller: UserId) -> Self {
        Self {
            client,
            seller,
            fields: Fields::default(),
            price: None,
            stock: None,
        }
    }

    pub fn title(&mut self, title: &str) -> DataResult<&mut Self> {
        self.fields.title(title)?;
        Ok(self)
    }

    pub fn description(&mut self, description: &str) -> DataResult<&mut Self> {
        self.fields.description(description)?;
        Ok(self)
    }

    /// Adds an image path; may be called once per image.
    pub fn image(&mut self, path: &str) -> DataResult<&mut Self> {
        self.fields.image(path)?;
        Ok(self)
    }

    pub fn price(&mut self, price: f64) -> DataResult<&mut Self> {
        if !price.is_finite() {
            return Err(ValidationError::invalid_format("price", "must be a finite number").into());
        }
        if price < 0.0 {
            return Err(ValidationError::negative("price", price).into());
        }
        self.price = Some(price);
        Ok(self)
    }

    pub fn stock(&mut self, stock: i64) -> DataResult<&mut Self> {
        if stock < 0 {
            return Err(ValidationError::negative("stock", stock as f64).into());
        }
        self.stock = Some(stock);
        Ok(self)
    }

    /// Inserts the product and returns its id.
    ///
    /// Title, description, price and stock are required.
    pub async fn build(self) -> DataResult<ProductKey> {
        let mut patch = self.fields.into_patch();
        present("title", patch.title.as_ref())?;
        present("description", patch.description.as_ref())?;
        patch.price = Some(present("price", self.price)?);
        patch.stock_count = Some(present("stock", self.stock)?);
        patch.user_id = Some(self.seller);

        self.client
            .from::<Product>()
            .insert(&patch)?
            .returning::<ProductKey>()
            .one()
            .await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ProductAttributes
// ════════════════════════════════════════════════════════════════════════════

/// Changes to an existing product. Single use: `modify` consumes it.
pub struct ProductAttributes {
    client: DataClient,
    product: ProductId,
    fields: Fields,
}

impl ProductAttributes {
    pub(crate) fn new(client: DataClient, product: ProductId) -> Self {
        Self {
            client,
            product,
            fields: Fields::default(),
        }
    }

    pub fn title(&mut self, title: &str) -> DataResult<&mut Self> {
        self.fields.title(title)?;
        Ok(self)
    }

    pub fn description(&mut self, description: &str) -> DataResult<&mut Self> {
        self.fields.description(description)?;
        Ok(self)
    }

    /// Adds an image path. Any image given replaces the stored list.
    pub fn image(&mut self, path: &str) -> DataResult<&mut Self> {
        self.fields.image(path)?;
        Ok(self)
    }

    /// Writes the changed fields.
    pub async fn modify(self) -> DataResult<ProductKey> {
        let patch = self.fields.into_patch();
        if patch == ProductPatch::default() {
            return Err(ValidationError::empty_field("attributes").into());
        }

        self.client
            .from::<Product>()
            .update(&patch)?
            .eq(ProductColumn::Id, self.product)
            .returning::<ProductKey>()
            .one()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_follow_the_listing_convention() {
        for path in [
            "database/images/test.jpg",
            "test.jpg",
            "test.png",
            "/test/image.png",
            "/test/IMAGE.JPG",
        ] {
            assert!(check_image(path).is_ok(), "{} should be accepted", path);
        }
        for path in ["", ". database/images/test.jpg", "$!@#,", "c:/", ".png", ".jpg", "a.gif"] {
            assert!(check_image(path).is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn blank_text_is_rejected_and_trimmed_text_kept() {
        assert_eq!(check_text("title", "  "), Err(ValidationError::empty_field("title")));
        assert_eq!(check_text("title", " Lamp "), Ok("Lamp".to_string()));
    }

    #[test]
    fn images_fold_into_json_array() {
        let mut fields = Fields::default();
        fields.image("a.png").unwrap();
        fields.image("b.jpg").unwrap();

        let patch = fields.into_patch();
        assert_eq!(
            patch.image,
            Some(Some(serde_json::json!(["a.png", "b.jpg"])))
        );
    }
}
