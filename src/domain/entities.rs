//! Domain entities mirrored from persistent storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{ContactSubject, PostStatus, ProductType, PurchaseType};

/// Per-language text of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostTranslation {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub meta_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A news post together with its translations, keyed by language code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub author: String,
    pub publish: OffsetDateTime,
    pub status: PostStatus,
    pub category: CategoryRef,
    pub tags: Vec<TagRef>,
    pub auto_meta: bool,
    pub featured_image: Option<String>,
    pub translations: BTreeMap<String, PostTranslation>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub purchase_type: PurchaseType,
    pub deposit: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessageRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: ContactSubject,
    pub message: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopCategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: i64,
    pub product_type: ProductType,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub display_order: i32,
    pub created_at: OffsetDateTime,
}
