//! Repository traits describing persistence adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{
    CategoryRecord, CommentRecord, ContactMessageRecord, FeedbackRecord, PostRecord,
    PostTranslation, ProductRecord, ReservationRecord, ShopCategoryRecord, TagRecord,
};
use crate::domain::types::{ContactSubject, PostStatus, ProductType, PurchaseType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filters of the public news list. Slugs are resolved to ids by the caller.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Language whose title/body the search text is matched against.
    pub language: String,
    pub tag_id: Option<i64>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

/// Published posts immediately before and after a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostNeighbors {
    pub previous: Option<PostRecord>,
    pub next: Option<PostRecord>,
}

#[derive(Debug, Clone)]
pub struct PostWriteParams {
    pub author: String,
    pub publish: OffsetDateTime,
    pub status: PostStatus,
    pub category_id: i64,
    pub tag_ids: Vec<i64>,
    pub auto_meta: bool,
    pub featured_image: Option<String>,
    pub translations: BTreeMap<String, PostTranslation>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    /// Posts in `ids`, in no particular order; unknown ids are ignored.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<PostRecord>, RepoError>;

    /// Ids of published posts matching `filter`, newest first.
    async fn list_published_ids(&self, filter: &PostFilter) -> Result<Vec<i64>, RepoError>;

    /// Published posts with `start <= publish < end`.
    async fn list_published_in_window(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Published posts sharing at least one of `tag_ids`, excluding
    /// `post_id`, ordered by shared tag count then newest first.
    async fn list_similar(
        &self,
        post_id: i64,
        tag_ids: &[i64],
        limit: usize,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn neighbors(&self, post: &PostRecord) -> Result<PostNeighbors, RepoError>;

    async fn latest_published(&self, limit: usize) -> Result<Vec<PostRecord>, RepoError>;

    /// Whether another post already uses `slug` in `language`.
    async fn slug_taken(
        &self,
        language: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError>;

    async fn create_post(&self, params: PostWriteParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, id: i64, params: PostWriteParams)
    -> Result<PostRecord, RepoError>;

    /// Delete a post and its comments.
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    /// Categories with their published post count, count > 0, most used first.
    async fn categories_with_counts(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    /// Every tag ordered by name.
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;

    /// Tags used by published posts, most used first.
    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagRecord>, RepoError>;

    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn category_slug_taken(&self, slug: &str) -> Result<bool, RepoError>;

    async fn tag_slug_taken(&self, slug: &str) -> Result<bool, RepoError>;

    async fn create_category(&self, name: &str, slug: &str) -> Result<CategoryRecord, RepoError>;

    async fn create_tag(&self, name: &str, slug: &str) -> Result<TagRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Active comments of a post, newest first.
    async fn list_active_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;

    /// Store a new, inactive comment.
    async fn create_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: i64) -> Result<CommentRecord, RepoError>;

    /// Distinct owning post ids of the given comments.
    async fn distinct_post_ids(&self, comment_ids: &[i64]) -> Result<Vec<i64>, RepoError>;

    /// Returns the number of comments updated.
    async fn bulk_set_active(&self, comment_ids: &[i64], active: bool) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub purchase_type: PurchaseType,
    /// Overwritten with the policy deposit before persisting.
    pub deposit: i64,
}

#[async_trait]
pub trait ReservationsRepo: Send + Sync {
    async fn create_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<ReservationRecord, RepoError>;

    async fn count_reservations(&self) -> Result<u64, RepoError>;

    async fn count_by_type(&self, purchase_type: PurchaseType) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub comment: String,
}

#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord, RepoError>;

    /// `None` when no feedback exists.
    async fn average_rating(&self) -> Result<Option<f64>, RepoError>;

    /// Feedback with `rating >= min_rating`, newest first.
    async fn list_testimonials(
        &self,
        min_rating: i16,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: ContactSubject,
    pub message: String,
}

#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn create_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageRecord, RepoError>;
}

/// Catalog ordering requested through `?sort=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
    /// Featured first, then display order, then newest.
    #[default]
    Featured,
}

impl ProductSort {
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name") => Self::Name,
            Some("newest") => Self::Newest,
            _ => Self::Featured,
        }
    }

    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Self::PriceAsc => Some("price_asc"),
            Self::PriceDesc => Some("price_desc"),
            Self::Name => Some("name"),
            Self::Newest => Some("newest"),
            Self::Featured => None,
        }
    }
}

/// Active products matching every set field.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub product_type: Option<ProductType>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn count_products(&self, filter: &ProductFilter) -> Result<u64, RepoError>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProductRecord>, RepoError>;

    /// Active shop categories with their active product counts.
    async fn categories_with_counts(&self) -> Result<Vec<ShopCategoryRecord>, RepoError>;

    async fn find_active_category(&self, id: i64)
    -> Result<Option<ShopCategoryRecord>, RepoError>;

    async fn list_featured(&self, limit: usize) -> Result<Vec<ProductRecord>, RepoError>;

    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError>;

    /// Other active products of the same category.
    async fn list_related(
        &self,
        product: &ProductRecord,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Round-trip to the store.
    async fn ping(&self) -> Result<(), RepoError>;
}
