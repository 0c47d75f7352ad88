//! Review - ratings left on sellers and their products.

use serde::Deserialize;

use crate::application::client::DataClient;
use crate::domain::foundation::{
    present, DataResult, ProductId, ReviewId, UserId, ValidationError,
};
use crate::domain::query::{Aggregate, Projection, SelectItem, SelectList};
use crate::domain::schema::{Review, ReviewColumn, ReviewPatch};

pub const MAX_RATING: i32 = 5;

crate::pick! {
    /// Id of a written review.
    pub struct ReviewKey from Review {
        id: ReviewId = ReviewColumn::Id,
    }
}

/// Average rating of one product; `None` when it has no reviews.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRating {
    pub product_id: ProductId,
    pub rating: Option<f64>,
}

impl Projection<Review> for ProductRating {
    fn select_list() -> SelectList<ReviewColumn> {
        SelectList::items([
            SelectItem::Column(ReviewColumn::ProductId),
            SelectItem::Aggregate {
                alias: "rating",
                column: ReviewColumn::Rating,
                function: Aggregate::Avg,
            },
        ])
    }
}

/// Average rating across every review of one seller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SellerRating {
    pub created_on_id: UserId,
    pub rating: Option<f64>,
}

impl Projection<Review> for SellerRating {
    fn select_list() -> SelectList<ReviewColumn> {
        SelectList::items([
            SelectItem::Column(ReviewColumn::CreatedOnId),
            SelectItem::Aggregate {
                alias: "rating",
                column: ReviewColumn::Rating,
                function: Aggregate::Avg,
            },
        ])
    }
}

fn check_rating(rating: i32) -> Result<i32, ValidationError> {
    if !(0..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::out_of_range("rating", 0, MAX_RATING, rating));
    }
    Ok(rating)
}

fn check_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::empty_field("description"));
    }
    Ok(description.to_string())
}

/// Review access.
#[derive(Clone)]
pub struct Reviews {
    client: DataClient,
}

impl Reviews {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// Reviews about `product`, newest first.
    pub async fn for_product(&self, product: ProductId) -> DataResult<Vec<Review>> {
        self.client
            .from::<Review>()
            .select::<Review>()
            .eq(ReviewColumn::ProductId, product)
            .order(ReviewColumn::CreatedAt, false)
            .many()
            .await
    }

    pub async fn for_product_by(
        &self,
        reviewer: UserId,
        product: ProductId,
    ) -> DataResult<Vec<Review>> {
        self.client
            .from::<Review>()
            .select::<Review>()
            .eq(ReviewColumn::ProductId, product)
            .eq(ReviewColumn::CreatedById, reviewer)
            .order(ReviewColumn::CreatedAt, false)
            .many()
            .await
    }

    /// Reviews about `seller`, newest first.
    pub async fn for_seller(&self, seller: UserId) -> DataResult<Vec<Review>> {
        self.client
            .from::<Review>()
            .select::<Review>()
            .eq(ReviewColumn::CreatedOnId, seller)
            .order(ReviewColumn::CreatedAt, false)
            .many()
            .await
    }

    pub async fn for_seller_by(&self, reviewer: UserId, seller: UserId) -> DataResult<Vec<Review>> {
        self.client
            .from::<Review>()
            .select::<Review>()
            .eq(ReviewColumn::CreatedById, reviewer)
            .eq(ReviewColumn::CreatedOnId, seller)
            .order(ReviewColumn::CreatedAt, false)
            .many()
            .await
    }

    pub async fn product_rating(&self, product: ProductId) -> DataResult<ProductRating> {
        self.client
            .from::<Review>()
            .select::<ProductRating>()
            .eq(ReviewColumn::ProductId, product)
            .one()
            .await
    }

    pub async fn seller_rating(&self, seller: UserId) -> DataResult<SellerRating> {
        self.client
            .from::<Review>()
            .select::<SellerRating>()
            .eq(ReviewColumn::CreatedOnId, seller)
            .one()
            .await
    }

    /// Starts a review written by `reviewer` about `seller`.
    pub fn compose(&self, reviewer: UserId, seller: UserId) -> ReviewComposer {
        ReviewComposer {
            client: self.client.clone(),
            reviewer,
            seller,
            draft: ReviewPatch::default(),
        }
    }

    pub async fn remove(&self, review: ReviewId) -> DataResult<Review> {
        self.client
            .from::<Review>()
            .delete()
            .eq(ReviewColumn::Id, review)
            .one()
            .await
    }

    /// Rewrites the rating and description of an existing review.
    pub async fn update(
        &self,
        review: ReviewId,
        rating: i32,
        description: &str,
    ) -> DataResult<ReviewKey> {
        let patch = ReviewPatch {
            rating: Some(check_rating(rating)?),
            description: Some(check_description(description)?),
            ..Default::default()
        };
        self.client
            .from::<Review>()
            .update(&patch)?
            .eq(ReviewColumn::Id, review)
            .returning::<ReviewKey>()
            .one()
            .await
    }
}

/// A review being written. Single use: `publish` consumes it.
pub struct ReviewComposer {
    client: DataClient,
    reviewer: UserId,
    seller: UserId,
    draft: ReviewPatch,
}

impl ReviewComposer {
    pub fn description(&mut self, description: &str) -> DataResult<&mut Self> {
        self.draft.description = Some(check_description(description)?);
        Ok(self)
    }

    /// Rating from 0 to [`MAX_RATING`] inclusive.
    pub fn rating(&mut self, rating: i32) -> DataResult<&mut Self> {
        self.draft.rating = Some(check_rating(rating)?);
        Ok(self)
    }

    /// Ties the review to one product of the seller.
    pub fn product(&mut self, product: ProductId) -> DataResult<&mut Self> {
        self.draft.product_id = Some(Some(product));
        Ok(self)
    }

    /// Inserts the review. Description and rating are required.
    pub async fn publish(self) -> DataResult<Review> {
        let mut draft = self.draft;
        present("description", draft.description.as_ref())?;
        present("rating", draft.rating)?;
        draft.created_by_id = Some(self.reviewer);
        draft.created_on_id = Some(self.seller);

        self.client.from::<Review>().insert(&draft)?.one().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn reviews() -> (Arc<InMemoryBackend>, Reviews) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), Reviews::new(DataClient::new(backend)))
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(check_rating(0).is_ok());
        assert!(check_rating(5).is_ok());
        assert_eq!(
            check_rating(6),
            Err(ValidationError::out_of_range("rating", 0, 5, 6))
        );
        assert!(check_rating(-1).is_err());
    }

    #[tokio::test]
    async fn failed_setter_leaves_draft_untouched() {
        let (_, reviews) = reviews();
        let mut composer = reviews.compose(UserId::random(), UserId::random());
        composer.rating(4).unwrap();

        assert!(composer.rating(9).is_err());
        assert_eq!(composer.draft.rating, Some(4));
    }

    #[tokio::test]
    async fn publish_without_rating_fails_before_any_request() {
        let (backend, reviews) = reviews();
        let mut composer = reviews.compose(UserId::random(), UserId::random());
        composer.description("Quick replies, item as described").unwrap();

        let result = composer.publish().await;

        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn publish_sends_author_target_and_product() {
        let (backend, reviews) = reviews();
        let (reviewer, seller) = (UserId::random(), UserId::random());
        backend.respond_with(
            "Reviews",
            json!({
                "id": 3,
                "created_at": "2024-03-01T12:00:00Z",
                "created_by_id": reviewer,
                "created_on_id": seller,
                "product_id": 9,
                "rating": 5,
                "description": "Great",
            }),
        );

        let mut composer = reviews.compose(reviewer, seller);
        composer
            .description("Great")
            .unwrap()
            .rating(5)
            .unwrap()
            .product(ProductId::new(9))
            .unwrap();
        let review = composer.publish().await.unwrap();

        assert_eq!(review.id, ReviewId::new(3));
        assert_eq!(
            backend.requests()[0].body,
            Some(json!({
                "created_by_id": reviewer,
                "created_on_id": seller,
                "product_id": 9,
                "rating": 5,
                "description": "Great",
            }))
        );
    }

    #[tokio::test]
    async fn product_rating_selects_the_average() {
        let (backend, reviews) = reviews();
        backend.respond_with("Reviews", json!({ "product_id": 2, "rating": 4.5 }));

        let rating = reviews.product_rating(ProductId::new(2)).await.unwrap();

        assert_eq!(rating.rating, Some(4.5));
        let sent = &backend.requests()[0];
        assert_eq!(sent.select, "product_id,rating:rating.avg()");
        assert_eq!(sent.param("product_id").as_deref(), Some("eq.2"));
    }

    #[tokio::test]
    async fn seller_reviews_are_newest_first() {
        let (backend, reviews) = reviews();
        backend.respond_with("Reviews", json!([]));
        let seller = UserId::random();

        assert!(reviews.for_seller(seller).await.unwrap().is_empty());
        let sent = &backend.requests()[0];
        assert_eq!(sent.param("created_on_id"), Some(format!("eq.{}", seller)));
        assert_eq!(sent.param("order").as_deref(), Some("created_at.desc"));
    }
}
