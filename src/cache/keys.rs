//! Cache key definitions.
//!
//! Every cached value lives under a deterministic string key built from a
//! namespace, the language it was computed for, and the inputs of the query.
//! The rendered strings are part of the operational contract (they show up in
//! logs and in shared stores), so their layout is fixed here and nowhere else.

use std::fmt;
use std::time::Duration;

use md5::{Digest, Md5};

use crate::util::timezone::DisplayDate;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// List and id-set queries.
pub const LIST_TTL: Duration = Duration::from_secs(30 * MINUTE);
/// Resolved post detail.
pub const DETAIL_TTL: Duration = Duration::from_secs(6 * HOUR);
/// Cached slug-correction redirects.
pub const REDIRECT_TTL: Duration = Duration::from_secs(24 * HOUR);
/// Category and tag aggregates.
pub const TAXONOMY_TTL: Duration = Duration::from_secs(2 * HOUR);
/// Sidebar popular tags on the detail page.
pub const POPULAR_TAGS_TTL: Duration = Duration::from_secs(4 * HOUR);
pub const SIMILAR_POSTS_TTL: Duration = Duration::from_secs(2 * HOUR);
/// Previous/next links.
pub const NAVIGATION_TTL: Duration = Duration::from_secs(HOUR);

/// Marks a `post_detail_*` value as a redirect target instead of content.
pub const REDIRECT_PREFIX: &str = "redirect:";

const NO_SEARCH: &str = "no_search";

/// Inputs of a post list page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PostListKey {
    pub language: String,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    PostList(PostListKey),
    /// Matching post ids behind a list page.
    Queryset(PostListKey),
    PostDetail {
        date: DisplayDate,
        slug: String,
        language: String,
    },
    AllCategories {
        language: String,
    },
    AllTags {
        language: String,
    },
    PopularTags {
        language: String,
        count: Option<usize>,
    },
    PostComments {
        post_id: i64,
    },
    SimilarPosts {
        post_id: i64,
        language: String,
    },
    PostNavigation {
        post_id: i64,
    },
}

impl CacheKey {
    pub fn post_detail(date: DisplayDate, slug: impl Into<String>, language: impl Into<String>) -> Self {
        Self::PostDetail {
            date,
            slug: slug.into(),
            language: language.into(),
        }
    }

    pub fn all_categories(language: impl Into<String>) -> Self {
        Self::AllCategories {
            language: language.into(),
        }
    }

    pub fn all_tags(language: impl Into<String>) -> Self {
        Self::AllTags {
            language: language.into(),
        }
    }

    pub fn popular_tags(language: impl Into<String>, count: Option<usize>) -> Self {
        Self::PopularTags {
            language: language.into(),
            count,
        }
    }

    pub fn similar_posts(post_id: i64, language: impl Into<String>) -> Self {
        Self::SimilarPosts {
            post_id,
            language: language.into(),
        }
    }

    /// Logical namespace, used as a metrics label.
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKey::PostList(_) => "post_list",
            CacheKey::Queryset(_) => "queryset",
            CacheKey::PostDetail { .. } => "post_detail",
            CacheKey::AllCategories { .. } => "all_categories",
            CacheKey::AllTags { .. } => "all_tags",
            CacheKey::PopularTags { .. } => "popular_tags",
            CacheKey::PostComments { .. } => "post_comments",
            CacheKey::SimilarPosts { .. } => "similar_posts",
            CacheKey::PostNavigation { .. } => "post_navigation",
        }
    }

    /// Default lifetime of a value stored under this key.
    pub fn ttl(&self) -> Duration {
        match self {
            CacheKey::PostList(_) | CacheKey::Queryset(_) | CacheKey::PostComments { .. } => {
                LIST_TTL
            }
            CacheKey::PostDetail { .. } => DETAIL_TTL,
            CacheKey::AllCategories { .. } | CacheKey::AllTags { .. } => TAXONOMY_TTL,
            CacheKey::PopularTags { count: None, .. } => POPULAR_TAGS_TTL,
            CacheKey::PopularTags { count: Some(_), .. } => TAXONOMY_TTL,
            CacheKey::SimilarPosts { .. } => SIMILAR_POSTS_TTL,
            CacheKey::PostNavigation { .. } => NAVIGATION_TTL,
        }
    }
}

impl fmt::Display for PostListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let search = match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => search_hash(query),
            _ => NO_SEARCH.to_string(),
        };
        let page = format!("page_{}", self.page);
        let parts = [
            "post_list",
            self.language.as_str(),
            self.tag.as_deref().unwrap_or_default(),
            self.category.as_deref().unwrap_or_default(),
            search.as_str(),
            page.as_str(),
        ];
        let joined = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_");
        f.write_str(&joined)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::PostList(list) => write!(f, "{list}"),
            CacheKey::Queryset(list) => write!(f, "queryset_{list}"),
            CacheKey::PostDetail {
                date,
                slug,
                language,
            } => write!(
                f,
                "post_detail_{}_{}_{}_{slug}_{language}",
                date.year, date.month, date.day
            ),
            CacheKey::AllCategories { language } => write!(f, "all_categories_{language}"),
            CacheKey::AllTags { language } => write!(f, "all_tags_{language}"),
            CacheKey::PopularTags {
                language,
                count: None,
            } => write!(f, "popular_tags_{language}"),
            CacheKey::PopularTags {
                language,
                count: Some(count),
            } => write!(f, "popular_tags_{language}_{count}"),
            CacheKey::PostComments { post_id } => write!(f, "post_comments_{post_id}"),
            CacheKey::SimilarPosts { post_id, language } => {
                write!(f, "similar_posts_{post_id}_{language}")
            }
            CacheKey::PostNavigation { post_id } => write!(f, "post_navigation_{post_id}"),
        }
    }
}

/// First eight hex digits of the MD5 of a search query.
pub fn search_hash(query: &str) -> String {
    let digest = Md5::digest(query.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(8);
    encoded
}
