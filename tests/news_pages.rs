mod support;

use time::macros::datetime;

use landing_news::application::news::{DetailOutcome, ListQuery, ListRequest, NewsError};
use landing_news::cache::CacheBackend;

use support::{Harness, comment, post};

async fn harness() -> Harness {
    let harness = Harness::new(&["es", "en"]);
    harness.store.insert_category(1, "Producto", "producto").await;
    harness
        .store
        .insert_post(post(
            1,
            datetime!(2024-03-01 02:30 UTC),
            &[("es", "Lanzamiento", "lanzamiento"), ("en", "Launch", "launch")],
        ))
        .await;
    harness
        .store
        .insert_post(post(2, datetime!(2024-03-05 12:00 UTC), &[("es", "Novedades", "novedades")]))
        .await;
    harness.store.insert_comment(comment(1, 1, true)).await;
    harness.store.insert_comment(comment(2, 1, false)).await;
    harness
}

#[tokio::test]
async fn detail_uses_the_display_date() {
    let harness = harness().await;
    let outcome = harness
        .state
        .http
        .news
        .detail("es", 2024, 2, 29, "lanzamiento")
        .await
        .expect("detail");

    let DetailOutcome::Page(detail) = outcome else {
        panic!("expected a page");
    };
    assert_eq!(detail.title, "Lanzamiento");
    assert!(detail.available_in_current_language);
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(
        detail.canonical_url.as_deref(),
        Some("https://teclafacil.test/news/2024/2/29/lanzamiento/")
    );
    let urls: Vec<&str> = detail.language_urls.iter().map(|url| url.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://teclafacil.test/news/2024/2/29/lanzamiento/",
            "https://teclafacil.test/en/news/2024/2/29/launch/",
        ]
    );

    let utc_day = harness
        .state
        .http
        .news
        .detail("es", 2024, 3, 1, "lanzamiento")
        .await;
    assert!(matches!(utc_day, Err(NewsError::NotFound)));
}

#[tokio::test]
async fn foreign_slug_redirects_to_the_language_slug() {
    let harness = harness().await;
    let outcome = harness
        .state
        .http
        .news
        .detail("en", 2024, 2, 29, "lanzamiento")
        .await
        .expect("detail");

    let DetailOutcome::Redirect(target) = outcome else {
        panic!("expected a redirect");
    };
    assert_eq!(target, "/en/news/2024/2/29/launch/");

    let cached = harness
        .memory
        .get("post_detail_2024_2_29_lanzamiento_en")
        .await
        .expect("cache read");
    assert!(cached.is_some());
}

#[tokio::test]
async fn untranslated_post_falls_back_to_another_language() {
    let harness = harness().await;
    let outcome = harness
        .state
        .http
        .news
        .detail("en", 2024, 3, 5, "novedades")
        .await
        .expect("detail");

    let DetailOutcome::Page(detail) = outcome else {
        panic!("expected a page");
    };
    assert!(!detail.available_in_current_language);
    assert_eq!(detail.title, "Novedades");
    assert_eq!(detail.canonical_url, None);
}

#[tokio::test]
async fn list_is_newest_first_with_cards_per_language() {
    let harness = harness().await;
    let page = harness
        .state
        .http
        .news
        .list("en", &ListRequest::default())
        .await
        .expect("list");

    assert_eq!(page.posts.total, 2);
    let urls: Vec<&str> = page.posts.items.iter().map(|card| card.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["/news/2024/3/5/novedades/", "/en/news/2024/2/29/launch/"]
    );
    assert_eq!(page.canonical_url, "https://teclafacil.test/en/news/");
}

#[tokio::test]
async fn unknown_filters_are_not_found() {
    let harness = harness().await;
    let request = ListRequest {
        path_tag: Some("inexistente".to_string()),
        ..ListRequest::default()
    };
    let result = harness.state.http.news.list("es", &request).await;
    assert!(matches!(result, Err(NewsError::UnknownTag(_))));

    let request = ListRequest {
        query: ListQuery {
            category: Some("nada".to_string()),
            ..ListQuery::default()
        },
        ..ListRequest::default()
    };
    let result = harness.state.http.news.list("es", &request).await;
    assert!(matches!(result, Err(NewsError::UnknownCategory(_))));
}

#[tokio::test]
async fn canonical_list_url_keeps_filters() {
    let harness = harness().await;
    let request = ListRequest {
        query: ListQuery {
            category: Some("producto".to_string()),
            search: Some("lanza".to_string()),
            page: Some("1".to_string()),
        },
        ..ListRequest::default()
    };
    let page = harness
        .state
        .http
        .news
        .list("es", &request)
        .await
        .expect("list");

    assert_eq!(page.posts.total, 1);
    assert_eq!(
        page.canonical_url,
        "https://teclafacil.test/news/?category=producto&search=lanza"
    );
}
