mod support;

use std::collections::BTreeMap;

use time::macros::datetime;

use landing_news::application::admin::posts::{AdminPostError, PostCommand};
use landing_news::application::admin::taxonomy::TaxonomyCommand;
use landing_news::application::news::{DetailOutcome, NewsError};
use landing_news::cache::CacheBackend;
use landing_news::domain::entities::PostTranslation;
use landing_news::domain::types::PostStatus;

use support::{Harness, translation};

fn command(translations: &[(&str, &str, &str)]) -> PostCommand {
    PostCommand {
        author: "Redacción".to_string(),
        publish: datetime!(2024-03-01 02:30 UTC),
        status: PostStatus::Published,
        category_id: 1,
        tag_ids: Vec::new(),
        auto_meta: true,
        featured_image: None,
        translations: translations
            .iter()
            .map(|(language, title, slug)| (language.to_string(), translation(title, slug)))
            .collect::<BTreeMap<String, PostTranslation>>(),
    }
}

async fn harness() -> Harness {
    let harness = Harness::new(&["es", "en", "pt"]);
    harness.store.insert_category(1, "Producto", "producto").await;
    harness
}

fn detail_keys(keys: &[&str]) -> Vec<String> {
    let mut keys: Vec<String> = keys
        .iter()
        .filter(|key| key.starts_with("post_detail_"))
        .map(|key| key.to_string())
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn creating_a_post_targets_every_translated_language() {
    let harness = harness().await;
    let change = harness
        .state
        .api
        .posts
        .create_post(command(&[
            ("es", "Lanzamiento", "lanzamiento"),
            ("en", "Launch", "launch"),
            ("pt", "Lançamento", "lancamento"),
        ]))
        .await
        .expect("create");

    let targeted = change.invalidation.targeted_keys();
    // 02:30 UTC on March 1st is still February 29th in Santiago.
    let detail = detail_keys(&targeted);
    for key in [
        "post_detail_2024_2_29_lancamento_pt",
        "post_detail_2024_2_29_lanzamiento_es",
        "post_detail_2024_2_29_launch_en",
    ] {
        assert!(detail.contains(&key.to_string()), "missing {key}");
    }
    // Every language under every slug: own pages plus slug redirects.
    assert_eq!(detail.len(), 9);
    assert!(targeted.contains(&format!("post_comments_{}", change.post.id).as_str()));
    for language in ["es", "en", "pt"] {
        assert!(targeted.contains(&format!("all_categories_{language}").as_str()));
        assert!(targeted.contains(&format!("popular_tags_{language}_15").as_str()));
    }
}

#[tokio::test]
async fn untranslated_languages_clear_their_fallback_pages() {
    let harness = harness().await;
    let change = harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Solo español", "")]))
        .await
        .expect("create");

    assert_eq!(change.post.slug_for("es"), Some("solo-espanol"));
    assert_eq!(
        detail_keys(&change.invalidation.targeted_keys()),
        vec![
            "post_detail_2024_2_29_solo-espanol_en",
            "post_detail_2024_2_29_solo-espanol_es",
            "post_detail_2024_2_29_solo-espanol_pt",
        ]
    );
}

#[tokio::test]
async fn deleted_post_is_not_served_from_a_fallback_page() {
    let harness = harness().await;
    let created = harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Hola", "hola")]))
        .await
        .expect("create");

    let warmed = harness
        .state
        .http
        .news
        .detail("en", 2024, 2, 29, "hola")
        .await
        .expect("fallback page");
    assert!(matches!(warmed, DetailOutcome::Page(_)));
    assert!(
        harness
            .memory
            .get("post_detail_2024_2_29_hola_en")
            .await
            .expect("cache read")
            .is_some()
    );

    harness
        .state
        .api
        .posts
        .delete_post(created.post.id)
        .await
        .expect("delete");

    for language in ["es", "en"] {
        let result = harness
            .state
            .http
            .news
            .detail(language, 2024, 2, 29, "hola")
            .await;
        assert!(
            matches!(result, Err(NewsError::NotFound)),
            "{language} still served"
        );
    }
}

#[tokio::test]
async fn renaming_a_slug_drops_cached_redirects_to_it() {
    let harness = harness().await;
    let created = harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Hola", "hola"), ("en", "Hello", "hello")]))
        .await
        .expect("create");

    let redirect = harness
        .state
        .http
        .news
        .detail("en", 2024, 2, 29, "hola")
        .await
        .expect("redirect");
    assert!(matches!(
        redirect,
        DetailOutcome::Redirect(ref target) if target == "/en/news/2024/2/29/hello/"
    ));

    harness
        .state
        .api
        .posts
        .update_post(
            created.post.id,
            command(&[("es", "Hola", "hola"), ("en", "Hello", "hello-world")]),
        )
        .await
        .expect("update");

    let redirect = harness
        .state
        .http
        .news
        .detail("en", 2024, 2, 29, "hola")
        .await
        .expect("redirect");
    assert!(matches!(
        redirect,
        DetailOutcome::Redirect(ref target) if target == "/en/news/2024/2/29/hello-world/"
    ));
    let renamed = harness
        .state
        .http
        .news
        .detail("en", 2024, 2, 29, "hello-world")
        .await
        .expect("renamed page");
    assert!(matches!(renamed, DetailOutcome::Page(_)));
}

#[tokio::test]
async fn moving_a_slug_invalidates_old_and_new_detail_keys() {
    let harness = harness().await;
    let created = harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Lanzamiento", "lanzamiento"), ("en", "Launch", "launch")]))
        .await
        .expect("create");
    harness
        .seed_cache("post_detail_2024_2_29_lanzamiento_es")
        .await;

    let updated = harness
        .state
        .api
        .posts
        .update_post(
            created.post.id,
            command(&[("es", "Lanzamiento", "lanzamiento-2024"), ("en", "Launch", "launch")]),
        )
        .await
        .expect("update");

    let keys = detail_keys(&updated.invalidation.targeted_keys());
    assert!(keys.contains(&"post_detail_2024_2_29_lanzamiento_es".to_string()));
    assert!(keys.contains(&"post_detail_2024_2_29_lanzamiento-2024_es".to_string()));
    assert_eq!(updated.invalidation.count("deleted"), 1);
}

#[tokio::test]
async fn slugs_are_unique_per_language() {
    let harness = harness().await;
    harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Lanzamiento", "lanzamiento")]))
        .await
        .expect("first");

    let err = harness
        .state
        .api
        .posts
        .create_post(command(&[("es", "Otro", "lanzamiento")]))
        .await
        .expect_err("duplicate slug");
    assert!(matches!(err, AdminPostError::SlugTaken { .. }));

    harness
        .state
        .api
        .posts
        .create_post(command(&[("en", "Launch", "lanzamiento")]))
        .await
        .expect("same slug in another language");
}

#[tokio::test]
async fn unknown_languages_are_rejected() {
    let harness = harness().await;
    let err = harness
        .state
        .api
        .posts
        .create_post(command(&[("fr", "Lancement", "lancement")]))
        .await
        .expect_err("unknown language");
    assert!(matches!(err, AdminPostError::UnknownLanguage(code) if code == "fr"));
}

#[tokio::test]
async fn taxonomy_slugs_are_generated_and_deduplicated() {
    let harness = harness().await;
    let first = harness
        .state
        .api
        .taxonomy
        .create_tag(TaxonomyCommand {
            name: "Ergonomía".to_string(),
        })
        .await
        .expect("tag");
    let second = harness
        .state
        .api
        .taxonomy
        .create_tag(TaxonomyCommand {
            name: "Ergonomía".to_string(),
        })
        .await
        .expect("second tag");

    assert_eq!(first.slug, "ergonomia");
    assert_ne!(second.slug, first.slug);
    assert!(second.slug.starts_with("ergonomia"));
}
