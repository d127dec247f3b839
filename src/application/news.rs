//! Read side of the news section: list pages, detail pages and sidebar data.
//!
//! Everything read here goes through [`ContentCache`] under the keys the
//! invalidation coordinator knows how to delete.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

use crate::application::localization::Localization;
use crate::application::pagination::{Page, PageWindow, parse_page_number};
use crate::application::repos::{
    CommentsRepo, PostFilter, PostNeighbors, PostsRepo, RepoError, TaxonomyRepo,
};
use crate::application::urls::{LanguageUrl, LocalizedUrlResolver, Resolution, SlugFallback};
use crate::cache::{CacheKey, ContentCache, POPULAR_TAG_WIDGET_LIMIT, PostListKey};
use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord, TagRecord};
use crate::domain::text::{self, DEFAULT_EXCERPT_WORDS};
use crate::util::timezone::format_display_date;

pub const POSTS_PER_PAGE: usize = 6;
pub const SIMILAR_POSTS_LIMIT: usize = 4;
pub const POPULAR_TAGS_LIMIT: usize = 12;
pub const LATEST_POSTS_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Query-string part of a list request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

/// A list request: optional path filters plus the query string.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub path_tag: Option<String>,
    pub path_category: Option<String>,
    pub query: ListQuery,
}

impl ListRequest {
    fn category_slug(&self) -> Option<&str> {
        self.path_category
            .as_deref()
            .or(self.query.category.as_deref())
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
    }

    fn search(&self) -> Option<String> {
        self.query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_string)
    }

    fn base_path(&self) -> String {
        match (&self.path_tag, &self.path_category) {
            (Some(tag), _) => format!("/news/tag/{tag}/"),
            (None, Some(category)) => format!("/news/category/{category}/"),
            (None, None) => "/news/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub url: String,
    /// Language the card text is shown in.
    pub language: String,
    pub published: String,
    pub author: String,
    pub category: String,
    pub featured_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsListPage {
    pub posts: Page<PostCard>,
    pub tag: Option<TagRecord>,
    pub category: Option<CategoryRecord>,
    pub search_query: String,
    pub categories: Vec<CategoryRecord>,
    pub tags: Vec<TagRecord>,
    pub popular_tags: Vec<TagRecord>,
    pub canonical_url: String,
}

#[derive(Debug, Clone)]
pub struct NewsDetail {
    pub post: PostRecord,
    pub language: String,
    pub title: String,
    pub body: String,
    pub meta_description: String,
    pub published: String,
    pub available_in_current_language: bool,
    pub comments: Vec<CommentRecord>,
    pub similar: Vec<PostCard>,
    pub popular_tags: Vec<TagRecord>,
    pub previous: Option<PostCard>,
    pub next: Option<PostCard>,
    pub language_urls: Vec<LanguageUrl>,
    /// Absent when the post has no translation in the requested language.
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DetailOutcome {
    Page(Box<NewsDetail>),
    Redirect(String),
}

/// Cached page window of a list request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListWindow {
    ids: Vec<i64>,
    number: u32,
    num_pages: u32,
    total: u64,
}

#[derive(Clone)]
pub struct NewsService {
    posts: Arc<dyn PostsRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
    comments: Arc<dyn CommentsRepo>,
    resolver: LocalizedUrlResolver,
    cache: ContentCache,
    localization: Arc<Localization>,
    base_url: String,
}

impl NewsService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        taxonomy: Arc<dyn TaxonomyRepo>,
        comments: Arc<dyn CommentsRepo>,
        cache: ContentCache,
        localization: Arc<Localization>,
        base_url: impl Into<String>,
    ) -> Self {
        let resolver =
            LocalizedUrlResolver::new(posts.clone(), cache.clone(), localization.clone());
        Self {
            posts,
            taxonomy,
            comments,
            resolver,
            cache,
            localization,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn resolver(&self) -> &LocalizedUrlResolver {
        &self.resolver
    }

    pub async fn list(&self, language: &str, request: &ListRequest) -> Result<NewsListPage, NewsError> {
        let tag = match request.path_tag.as_deref() {
            Some(slug) => Some(
                self.taxonomy
                    .find_tag_by_slug(slug)
                    .await?
                    .ok_or_else(|| NewsError::UnknownTag(slug.to_string()))?,
            ),
            None => None,
        };
        let category = match request.category_slug() {
            Some(slug) => Some(
                self.taxonomy
                    .find_category_by_slug(slug)
                    .await?
                    .ok_or_else(|| NewsError::UnknownCategory(slug.to_string()))?,
            ),
            None => None,
        };
        let search = request.search();
        let requested = parse_page_number(request.query.page.as_deref());

        let list_key = PostListKey {
            language: language.to_string(),
            tag: tag.as_ref().map(|tag| tag.slug.clone()),
            category: category.as_ref().map(|category| category.slug.clone()),
            search: search.clone(),
            page: requested,
        };

        let window = match self
            .cache
            .get_json::<ListWindow>(&CacheKey::PostList(list_key.clone()))
            .await
        {
            Some(window) => window,
            None => {
                let filter = PostFilter {
                    language: language.to_string(),
                    tag_id: tag.as_ref().map(|tag| tag.id),
                    category_id: category.as_ref().map(|category| category.id),
                    search: search.clone(),
                };
                let ids: Vec<i64> = self
                    .cache
                    .get_or_load(&CacheKey::Queryset(list_key.clone()), || {
                        self.posts.list_published_ids(&filter)
                    })
                    .await?;
                let total = ids.len() as u64;
                let page = PageWindow::new(total, requested, POSTS_PER_PAGE);
                let window = ListWindow {
                    ids: page.slice(&ids),
                    number: page.number,
                    num_pages: page.num_pages,
                    total,
                };
                self.cache
                    .set_json(&CacheKey::PostList(list_key), &window)
                    .await;
                window
            }
        };

        let posts = self.load_in_order(&window.ids).await?;
        let cards = posts
            .iter()
            .filter_map(|post| self.card(post, language))
            .collect();

        Ok(NewsListPage {
            posts: Page {
                items: cards,
                number: window.number,
                num_pages: window.num_pages,
                total: window.total,
            },
            tag,
            category,
            search_query: search.unwrap_or_default(),
            categories: self.categories_with_counts(language).await?,
            tags: self.all_tags(language).await?,
            popular_tags: self.popular_tags_with_counts(language).await?,
            canonical_url: self.list_canonical_url(language, request),
        })
    }

    /// Canonical list URL, keeping `category`, `search` and `page != 1`.
    fn list_canonical_url(&self, language: &str, request: &ListRequest) -> String {
        let path = self
            .localization
            .localized_path(language, &request.base_path());
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_params = false;
        if request.path_category.is_none() {
            if let Some(category) = request.query.category.as_deref().filter(|c| !c.is_empty()) {
                query.append_pair("category", category);
                has_params = true;
            }
        }
        if let Some(page) = request.query.page.as_deref().filter(|p| !p.is_empty() && *p != "1") {
            query.append_pair("page", page);
            has_params = true;
        }
        if let Some(search) = request.query.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
            has_params = true;
        }

        if has_params {
            format!("{}{path}?{}", self.base_url, query.finish())
        } else {
            format!("{}{path}", self.base_url)
        }
    }

    async fn load_in_order(&self, ids: &[i64]) -> Result<Vec<PostRecord>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut by_id: HashMap<i64, PostRecord> = self
            .posts
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|post| (post.id, post))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Listing card in `language`, falling back to any translated language.
    pub fn card(&self, post: &PostRecord, language: &str) -> Option<PostCard> {
        let (shown, translation) =
            post.display_translation(language, self.localization.languages())?;
        let url = match self.resolver.detail_path(post, language, SlugFallback::AnyLanguage) {
            Ok(url) => url,
            Err(err) => {
                debug!(post_id = post.id, error = %err, "Skipping post without any slug");
                return None;
            }
        };
        Some(PostCard {
            id: post.id,
            title: translation.title.clone(),
            excerpt: text::excerpt(&translation.body, DEFAULT_EXCERPT_WORDS),
            url,
            language: shown.to_string(),
            published: format_display_date(post.publish, self.localization.display_timezone()),
            author: post.author.clone(),
            category: post.category.name.clone(),
            featured_image: post.featured_image.clone(),
        })
    }

    pub async fn detail(
        &self,
        language: &str,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
    ) -> Result<DetailOutcome, NewsError> {
        let post = match self.resolver.resolve(year, month, day, slug, language).await? {
            Resolution::Found(post) => *post,
            Resolution::Redirect(target) => return Ok(DetailOutcome::Redirect(target)),
            Resolution::NotFound => return Err(NewsError::NotFound),
        };

        let (title, body) = post
            .display_translation(language, self.localization.languages())
            .map(|(_, translation)| (translation.title.clone(), translation.body.clone()))
            .unwrap_or_default();
        let meta_language = if post.has_translation(language) {
            language.to_string()
        } else {
            post.available_languages(self.localization.languages())
                .first()
                .map(|code| code.to_string())
                .unwrap_or_default()
        };

        let comments = self.active_comments(post.id).await?;
        let similar = self
            .similar_posts(&post, language)
            .await?
            .iter()
            .filter_map(|similar| self.card(similar, language))
            .collect();
        let neighbors = self.navigation(&post).await?;

        let canonical_url = self
            .resolver
            .detail_path(&post, language, SlugFallback::Strict)
            .ok()
            .map(|path| format!("{}{path}", self.base_url));

        let detail = NewsDetail {
            language: language.to_string(),
            title,
            body,
            meta_description: post.meta_description(&meta_language),
            published: format_display_date(post.publish, self.localization.display_timezone()),
            available_in_current_language: post.has_translation(language),
            comments,
            similar,
            popular_tags: self.popular_tags(language).await?,
            previous: neighbors
                .previous
                .as_ref()
                .and_then(|previous| self.card(previous, language)),
            next: neighbors
                .next
                .as_ref()
                .and_then(|next| self.card(next, language)),
            language_urls: self.resolver.language_urls(&post, &self.base_url),
            canonical_url,
            post,
        };
        Ok(DetailOutcome::Page(Box::new(detail)))
    }

    pub async fn active_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        self.cache
            .get_or_load(&CacheKey::PostComments { post_id }, || {
                self.comments.list_active_for_post(post_id)
            })
            .await
    }

    pub async fn similar_posts(
        &self,
        post: &PostRecord,
        language: &str,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let tag_ids = post.tag_ids();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.cache
            .get_or_load(&CacheKey::similar_posts(post.id, language), || {
                self.posts.list_similar(post.id, &tag_ids, SIMILAR_POSTS_LIMIT)
            })
            .await
    }

    pub async fn navigation(&self, post: &PostRecord) -> Result<PostNeighbors, RepoError> {
        self.cache
            .get_or_load(&CacheKey::PostNavigation { post_id: post.id }, || {
                self.posts.neighbors(post)
            })
            .await
    }

    pub async fn categories_with_counts(
        &self,
        language: &str,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        self.cache
            .get_or_load(&CacheKey::all_categories(language), || {
                self.taxonomy.categories_with_counts()
            })
            .await
    }

    pub async fn all_tags(&self, language: &str) -> Result<Vec<TagRecord>, RepoError> {
        self.cache
            .get_or_load(&CacheKey::all_tags(language), || self.taxonomy.list_tags())
            .await
    }

    /// Detail-page sidebar tags.
    pub async fn popular_tags(&self, language: &str) -> Result<Vec<TagRecord>, RepoError> {
        self.cache
            .get_or_load(&CacheKey::popular_tags(language, None), || {
                self.taxonomy.popular_tags(POPULAR_TAGS_LIMIT)
            })
            .await
    }

    /// Tag cloud with counts on the list page.
    pub async fn popular_tags_with_counts(
        &self,
        language: &str,
    ) -> Result<Vec<TagRecord>, RepoError> {
        self.cache
            .get_or_load(
                &CacheKey::popular_tags(language, Some(POPULAR_TAG_WIDGET_LIMIT)),
                || self.taxonomy.popular_tags(POPULAR_TAG_WIDGET_LIMIT),
            )
            .await
    }

    /// Home page widget.
    pub async fn latest(&self, language: &str) -> Result<Vec<PostCard>, RepoError> {
        let posts = self.posts.latest_published(LATEST_POSTS_LIMIT).await?;
        Ok(posts
            .iter()
            .filter_map(|post| self.card(post, language))
            .collect())
    }
}
