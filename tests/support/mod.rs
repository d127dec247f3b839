//! In-memory repositories and fixtures shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use landing_news::application::admin::{AdminPostService, AdminTaxonomyService};
use landing_news::application::captcha::CaptchaStore;
use landing_news::application::comments::CommentService;
use landing_news::application::contact::ContactService;
use landing_news::application::landing::LandingService;
use landing_news::application::localization::Localization;
use landing_news::application::news::NewsService;
use landing_news::application::repos::{
    CommentsRepo, ContactRepo, FeedbackRepo, HealthRepo, NewComment, NewContactMessage,
    NewFeedback, NewReservation, PostFilter, PostNeighbors, PostWriteParams, PostsRepo,
    ProductFilter, ProductSort, ProductsRepo, RepoError, ReservationsRepo, TaxonomyRepo,
};
use landing_news::application::shop::ShopService;
use landing_news::cache::{
    CacheBackend, CacheConfig, ContentCache, InvalidationCoordinator, MemoryCache,
};
use landing_news::domain::entities::{
    CategoryRecord, CategoryRef, CommentRecord, ContactMessageRecord, FeedbackRecord, PostRecord,
    PostTranslation, ProductRecord, ReservationRecord, ShopCategoryRecord, TagRecord, TagRef,
};
use landing_news::domain::types::{PostStatus, ProductType, PurchaseType};
use landing_news::infra::http::{ApiState, HttpState, RouterState};

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn localization(languages: &[&str]) -> Arc<Localization> {
    Arc::new(
        Localization::new(
            languages.iter().map(|code| code.to_string()).collect(),
            languages[0],
            chrono_tz::America::Santiago,
        )
        .expect("localization"),
    )
}

pub fn translation(title: &str, slug: &str) -> PostTranslation {
    PostTranslation {
        title: title.to_string(),
        slug: slug.to_string(),
        body: format!("<p>{title}</p>"),
        meta_description: String::new(),
    }
}

/// Published post in category 1 tagged with tag 1.
pub fn post(id: i64, publish: OffsetDateTime, translations: &[(&str, &str, &str)]) -> PostRecord {
    PostRecord {
        id,
        author: "Redacción".to_string(),
        publish,
        status: PostStatus::Published,
        category: CategoryRef {
            id: 1,
            name: "Producto".to_string(),
            slug: "producto".to_string(),
        },
        tags: vec![TagRef {
            id: 1,
            name: "Accesibilidad".to_string(),
            slug: "accesibilidad".to_string(),
        }],
        auto_meta: true,
        featured_image: None,
        translations: translations
            .iter()
            .map(|(language, title, slug)| (language.to_string(), translation(title, slug)))
            .collect(),
        created_at: publish,
        updated_at: publish,
    }
}

pub fn comment(id: i64, post_id: i64, active: bool) -> CommentRecord {
    CommentRecord {
        id,
        post_id,
        name: format!("Lector {id}"),
        email: format!("lector{id}@example.com"),
        body: "Muy útil".to_string(),
        active,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn product(id: i64, slug: &str, price: i64, product_type: ProductType) -> ProductRecord {
    ProductRecord {
        id,
        name: format!("Producto {id}"),
        slug: slug.to_string(),
        description: "Descripción".to_string(),
        price,
        product_type,
        category_id: Some(1),
        category_name: Some("Accesorios".to_string()),
        featured: false,
        active: true,
        display_order: 0,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[derive(Default)]
struct State {
    posts: BTreeMap<i64, PostRecord>,
    categories: Vec<CategoryRecord>,
    tags: Vec<TagRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    reservations: Vec<ReservationRecord>,
    feedback: Vec<FeedbackRecord>,
    messages: Vec<ContactMessageRecord>,
    products: Vec<ProductRecord>,
    shop_categories: Vec<ShopCategoryRecord>,
}

/// Every repository trait over one shared in-memory state.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    pub async fn insert_post(&self, post: PostRecord) {
        self.state.lock().await.posts.insert(post.id, post);
    }

    pub async fn insert_comment(&self, comment: CommentRecord) {
        self.state.lock().await.comments.insert(comment.id, comment);
    }

    pub async fn insert_category(&self, id: i64, name: &str, slug: &str) {
        self.state.lock().await.categories.push(CategoryRecord {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            post_count: 0,
        });
    }

    pub async fn insert_feedback(&self, name: &str, rating: i16) {
        let mut state = self.state.lock().await;
        let id = state.feedback.len() as i64 + 1;
        state.feedback.push(FeedbackRecord {
            id,
            name: name.to_string(),
            email: String::new(),
            rating,
            comment: format!("Comentario de {name}"),
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(id),
        });
    }

    pub async fn insert_product(&self, product: ProductRecord) {
        self.state.lock().await.products.push(product);
    }

    pub async fn reservations(&self) -> Vec<ReservationRecord> {
        self.state.lock().await.reservations.clone()
    }

    pub async fn comment_by_id(&self, id: i64) -> Option<CommentRecord> {
        self.state.lock().await.comments.get(&id).cloned()
    }

    pub async fn comments_for(&self, post_id: i64) -> Vec<CommentRecord> {
        self.state
            .lock()
            .await
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect()
    }
}

fn published(posts: &BTreeMap<i64, PostRecord>) -> Vec<PostRecord> {
    let mut posts: Vec<PostRecord> = posts
        .values()
        .filter(|post| post.status == PostStatus::Published)
        .cloned()
        .collect();
    posts.sort_by(|a, b| b.publish.cmp(&a.publish).then(b.id.cmp(&a.id)));
    posts
}

#[async_trait]
impl PostsRepo for FakeStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.posts.get(id).cloned())
            .collect())
    }

    async fn list_published_ids(&self, filter: &PostFilter) -> Result<Vec<i64>, RepoError> {
        let state = self.state.lock().await;
        Ok(published(&state.posts)
            .into_iter()
            .filter(|post| filter.tag_id.is_none_or(|id| post.tags.iter().any(|t| t.id == id)))
            .filter(|post| filter.category_id.is_none_or(|id| post.category.id == id))
            .filter(|post| match filter.search.as_deref() {
                Some(search) => post.translations.get(&filter.language).is_some_and(|t| {
                    t.title.to_lowercase().contains(&search.to_lowercase())
                        || t.body.to_lowercase().contains(&search.to_lowercase())
                }),
                None => true,
            })
            .map(|post| post.id)
            .collect())
    }

    async fn list_published_in_window(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(published(&state.posts)
            .into_iter()
            .filter(|post| post.publish >= start && post.publish < end)
            .collect())
    }

    async fn list_similar(
        &self,
        post_id: i64,
        tag_ids: &[i64],
        limit: usize,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(published(&state.posts)
            .into_iter()
            .filter(|post| post.id != post_id)
            .filter(|post| post.tags.iter().any(|tag| tag_ids.contains(&tag.id)))
            .take(limit)
            .collect())
    }

    async fn neighbors(&self, post: &PostRecord) -> Result<PostNeighbors, RepoError> {
        let state = self.state.lock().await;
        let all = published(&state.posts);
        let next = all
            .iter()
            .filter(|other| other.publish > post.publish)
            .min_by_key(|other| other.publish)
            .cloned();
        let previous = all
            .iter()
            .filter(|other| other.publish < post.publish)
            .max_by_key(|other| other.publish)
            .cloned();
        Ok(PostNeighbors { previous, next })
    }

    async fn latest_published(&self, limit: usize) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(published(&state.posts).into_iter().take(limit).collect())
    }

    async fn slug_taken(
        &self,
        language: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError> {
        let state = self.state.lock().await;
        Ok(state.posts.values().any(|post| {
            Some(post.id) != exclude
                && post
                    .translations
                    .get(language)
                    .is_some_and(|translation| translation.slug == slug)
        }))
    }

    async fn create_post(&self, params: PostWriteParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().await;
        let id = state.posts.keys().max().copied().unwrap_or(0) + 1;
        let record = build_post(&state, id, params)?;
        state.posts.insert(id, record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        id: i64,
        params: PostWriteParams,
    ) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        let record = build_post(&state, id, params)?;
        state.posts.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        state.posts.remove(&id).ok_or(RepoError::NotFound)?;
        state.comments.retain(|_, comment| comment.post_id != id);
        Ok(())
    }
}

fn build_post(state: &State, id: i64, params: PostWriteParams) -> Result<PostRecord, RepoError> {
    let category = state
        .categories
        .iter()
        .find(|category| category.id == params.category_id)
        .ok_or_else(|| RepoError::Integrity {
            message: format!("unknown category {}", params.category_id),
        })?;
    let tags = state
        .tags
        .iter()
        .filter(|tag| params.tag_ids.contains(&tag.id))
        .map(|tag| TagRef {
            id: tag.id,
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        })
        .collect();
    Ok(PostRecord {
        id,
        author: params.author,
        publish: params.publish,
        status: params.status,
        category: CategoryRef {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        },
        tags,
        auto_meta: params.auto_meta,
        featured_image: params.featured_image,
        translations: params.translations,
        created_at: params.publish,
        updated_at: params.publish,
    })
}

#[async_trait]
impl TaxonomyRepo for FakeStore {
    async fn categories_with_counts(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        let posts = published(&state.posts);
        let mut categories: Vec<CategoryRecord> = state
            .categories
            .iter()
            .map(|category| CategoryRecord {
                post_count: posts
                    .iter()
                    .filter(|post| post.category.id == category.id)
                    .count() as i64,
                ..category.clone()
            })
            .filter(|category| category.post_count > 0)
            .collect();
        categories.sort_by(|a, b| b.post_count.cmp(&a.post_count));
        Ok(categories)
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.state.lock().await.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagRecord>, RepoError> {
        let state = self.state.lock().await;
        let posts = published(&state.posts);
        let mut tags: Vec<TagRecord> = state
            .tags
            .iter()
            .map(|tag| TagRecord {
                post_count: posts
                    .iter()
                    .filter(|post| post.tags.iter().any(|t| t.id == tag.id))
                    .count() as i64,
                ..tag.clone()
            })
            .filter(|tag| tag.post_count > 0)
            .collect();
        tags.sort_by(|a, b| b.post_count.cmp(&a.post_count));
        tags.truncate(limit);
        Ok(tags)
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().find(|t| t.slug == slug).cloned())
    }

    async fn category_slug_taken(&self, slug: &str) -> Result<bool, RepoError> {
        let state = self.state.lock().await;
        Ok(state.categories.iter().any(|c| c.slug == slug))
    }

    async fn tag_slug_taken(&self, slug: &str) -> Result<bool, RepoError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().any(|t| t.slug == slug))
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<CategoryRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = CategoryRecord {
            id: state.categories.len() as i64 + 1,
            name: name.to_string(),
            slug: slug.to_string(),
            post_count: 0,
        };
        state.categories.push(record.clone());
        Ok(record)
    }

    async fn create_tag(&self, name: &str, slug: &str) -> Result<TagRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = TagRecord {
            id: state.tags.len() as i64 + 1,
            name: name.to_string(),
            slug: slug.to_string(),
            post_count: 0,
        };
        state.tags.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CommentsRepo for FakeStore {
    async fn list_active_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .values()
            .rev()
            .filter(|comment| comment.post_id == post_id && comment.active)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        let mut state = self.state.lock().await;
        let id = state.comments.keys().max().copied().unwrap_or(0) + 1;
        let record = CommentRecord {
            id,
            post_id: comment.post_id,
            name: comment.name,
            email: comment.email,
            body: comment.body,
            active: false,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        Ok(self.state.lock().await.comments.get(&id).cloned())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<CommentRecord, RepoError> {
        let mut state = self.state.lock().await;
        let comment = state.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.active = active;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> Result<CommentRecord, RepoError> {
        self.state
            .lock()
            .await
            .comments
            .remove(&id)
            .ok_or(RepoError::NotFound)
    }

    async fn distinct_post_ids(&self, comment_ids: &[i64]) -> Result<Vec<i64>, RepoError> {
        let state = self.state.lock().await;
        let ids: BTreeSet<i64> = comment_ids
            .iter()
            .filter_map(|id| state.comments.get(id).map(|comment| comment.post_id))
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn bulk_set_active(&self, comment_ids: &[i64], active: bool) -> Result<u64, RepoError> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for id in comment_ids {
            if let Some(comment) = state.comments.get_mut(id) {
                comment.active = active;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl ReservationsRepo for FakeStore {
    async fn create_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<ReservationRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = ReservationRecord {
            id: state.reservations.len() as i64 + 1,
            name: reservation.name,
            email: reservation.email,
            phone: reservation.phone,
            purchase_type: reservation.purchase_type,
            deposit: reservation.deposit,
            created_at: OffsetDateTime::now_utc(),
        };
        state.reservations.push(record.clone());
        Ok(record)
    }

    async fn count_reservations(&self) -> Result<u64, RepoError> {
        Ok(self.state.lock().await.reservations.len() as u64)
    }

    async fn count_by_type(&self, purchase_type: PurchaseType) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .iter()
            .filter(|reservation| reservation.purchase_type == purchase_type)
            .count() as u64)
    }
}

#[async_trait]
impl FeedbackRepo for FakeStore {
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord, RepoError> {
        let mut state = self.state.lock().await;
        let id = state.feedback.len() as i64 + 1;
        let record = FeedbackRecord {
            id,
            name: feedback.name,
            email: feedback.email,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(id),
        };
        state.feedback.push(record.clone());
        Ok(record)
    }

    async fn average_rating(&self) -> Result<Option<f64>, RepoError> {
        let state = self.state.lock().await;
        if state.feedback.is_empty() {
            return Ok(None);
        }
        let sum: f64 = state.feedback.iter().map(|f| f64::from(f.rating)).sum();
        Ok(Some(sum / state.feedback.len() as f64))
    }

    async fn list_testimonials(
        &self,
        min_rating: i16,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut testimonials: Vec<FeedbackRecord> = state
            .feedback
            .iter()
            .filter(|feedback| feedback.rating >= min_rating)
            .cloned()
            .collect();
        testimonials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        testimonials.truncate(limit);
        Ok(testimonials)
    }
}

#[async_trait]
impl ContactRepo for FakeStore {
    async fn create_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = ContactMessageRecord {
            id: state.messages.len() as i64 + 1,
            name: message.name,
            email: message.email,
            phone: message.phone,
            company: message.company,
            subject: message.subject,
            message: message.message,
            created_at: OffsetDateTime::now_utc(),
        };
        state.messages.push(record.clone());
        Ok(record)
    }
}

fn matches_product(product: &ProductRecord, filter: &ProductFilter) -> bool {
    product.active
        && filter.category_id.is_none_or(|id| product.category_id == Some(id))
        && filter.product_type.is_none_or(|kind| product.product_type == kind)
        && filter.min_price.is_none_or(|min| product.price >= min)
        && filter.max_price.is_none_or(|max| product.price <= max)
}

#[async_trait]
impl ProductsRepo for FakeStore {
    async fn count_products(&self, filter: &ProductFilter) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|product| matches_product(product, filter))
            .count() as u64)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut products: Vec<ProductRecord> = state
            .products
            .iter()
            .filter(|product| matches_product(product, filter))
            .cloned()
            .collect();
        match sort {
            ProductSort::PriceAsc => products.sort_by_key(|product| product.price),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::Featured => products.sort_by(|a, b| {
                b.featured
                    .cmp(&a.featured)
                    .then(a.display_order.cmp(&b.display_order))
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }
        Ok(products.into_iter().skip(offset).take(limit).collect())
    }

    async fn categories_with_counts(&self) -> Result<Vec<ShopCategoryRecord>, RepoError> {
        Ok(self.state.lock().await.shop_categories.clone())
    }

    async fn find_active_category(
        &self,
        id: i64,
    ) -> Result<Option<ShopCategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.shop_categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_featured(&self, limit: usize) -> Result<Vec<ProductRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|product| product.active && product.featured)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .find(|product| product.active && product.slug == slug)
            .cloned())
    }

    async fn list_related(
        &self,
        product: &ProductRecord,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|other| {
                other.active && other.id != product.id && other.category_id == product.category_id
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HealthRepo for FakeStore {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Services wired over one [`FakeStore`] and an in-process cache.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub memory: Arc<MemoryCache>,
    pub localization: Arc<Localization>,
    pub state: RouterState,
}

impl Harness {
    pub fn new(languages: &[&str]) -> Self {
        Self::with_token(languages, Some(ADMIN_TOKEN))
    }

    pub fn with_token(languages: &[&str], token: Option<&str>) -> Self {
        let store = Arc::new(FakeStore::default());
        let memory = Arc::new(MemoryCache::new(&CacheConfig::default()));
        let backend: Arc<dyn CacheBackend> = memory.clone();
        let cache = ContentCache::new(backend);
        let localization = localization(languages);
        let invalidation = InvalidationCoordinator::new(cache.clone(), localization.clone());
        let captcha = Arc::new(CaptchaStore::new(Duration::from_secs(300)));

        let comments = Arc::new(CommentService::new(
            store.clone(),
            store.clone(),
            captcha.clone(),
            invalidation.clone(),
        ));
        let http = HttpState {
            landing: Arc::new(LandingService::new(store.clone(), store.clone())),
            contact: Arc::new(ContactService::new(store.clone(), captcha.clone())),
            news: Arc::new(NewsService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                cache,
                localization.clone(),
                "https://teclafacil.test",
            )),
            comments: comments.clone(),
            shop: Arc::new(ShopService::new(store.clone())),
            captcha,
            localization: localization.clone(),
            health: store.clone(),
        };
        let api = ApiState {
            posts: Arc::new(AdminPostService::new(
                store.clone(),
                localization.clone(),
                invalidation,
            )),
            taxonomy: Arc::new(AdminTaxonomyService::new(store.clone())),
            comments,
            token: token.map(Arc::from),
        };

        Self {
            store,
            memory,
            localization,
            state: RouterState { http, api },
        }
    }

    pub fn app(&self) -> axum::Router {
        landing_news::infra::http::build_app(self.state.clone())
    }

    pub async fn seed_cache(&self, key: &str) {
        self.memory
            .set(key, "{}".to_string(), Duration::from_secs(600))
            .await
            .expect("seed cache");
    }

    /// A captcha key together with its answer.
    pub fn solved_captcha(&self) -> (String, String) {
        let key = self.state.http.captcha.generate_key();
        let answer = self
            .state
            .http
            .captcha
            .challenge(&key)
            .expect("fresh captcha");
        (key, answer)
    }
}
