mod support;

use time::macros::datetime;

use landing_news::application::comments::{CommentError, CommentForm, CommentSubmission};
use landing_news::cache::KeyOutcome;
use landing_news::domain::types::PostStatus;

use support::{Harness, comment, post};

async fn seeded() -> Harness {
    let harness = Harness::new(&["es", "en"]);
    harness
        .store
        .insert_post(post(
            1,
            datetime!(2024-05-10 15:00 UTC),
            &[("es", "Lanzamiento", "lanzamiento"), ("en", "Launch", "launch")],
        ))
        .await;
    harness
        .store
        .insert_post(post(2, datetime!(2024-05-11 15:00 UTC), &[("es", "Kit", "kit")]))
        .await;
    harness
        .store
        .insert_post(post(3, datetime!(2024-05-12 15:00 UTC), &[("es", "Piloto", "piloto")]))
        .await;
    for (id, post_id) in [(1, 1), (2, 1), (3, 2), (4, 3), (5, 3)] {
        harness.store.insert_comment(comment(id, post_id, false)).await;
    }
    harness
}

#[tokio::test]
async fn bulk_approval_invalidates_each_post_once() {
    let harness = seeded().await;
    harness.seed_cache("post_detail_2024_5_10_lanzamiento_es").await;
    harness.seed_cache("post_comments_1").await;
    harness.seed_cache("post_comments_3").await;

    let summary = harness
        .state
        .api
        .comments
        .moderate(&[1, 2, 3, 4, 5], true)
        .await
        .expect("moderate");

    assert_eq!(summary.updated, 5);
    assert_eq!(summary.post_ids, vec![1, 2, 3]);

    let comment_keys: Vec<&str> = summary
        .invalidation
        .targeted_keys()
        .into_iter()
        .filter(|key| key.starts_with("post_comments_"))
        .collect();
    assert_eq!(
        comment_keys,
        vec!["post_comments_1", "post_comments_2", "post_comments_3"]
    );
    assert!(summary
        .invalidation
        .targeted_keys()
        .contains(&"post_detail_2024_5_10_launch_en"));
    assert_eq!(summary.invalidation.count("deleted"), 3);

    for id in 1..=5 {
        let stored = harness.store.comment_by_id(id).await.expect("comment");
        assert!(stored.active);
    }
}

#[tokio::test]
async fn toggle_flips_state_and_clears_the_post() {
    let harness = seeded().await;
    harness.seed_cache("post_comments_2").await;

    let (comment, report) = harness.state.api.comments.toggle(3).await.expect("toggle");
    assert!(comment.active);
    let attempt = report
        .attempts
        .iter()
        .find(|attempt| attempt.key == "post_comments_2")
        .expect("comment key attempted");
    assert_eq!(attempt.outcome, KeyOutcome::Deleted);

    let (comment, _) = harness.state.api.comments.toggle(3).await.expect("toggle back");
    assert!(!comment.active);
}

#[tokio::test]
async fn deleting_an_unknown_comment_is_not_found() {
    let harness = seeded().await;
    let err = harness
        .state
        .api
        .comments
        .delete(99)
        .await
        .expect_err("missing comment");
    assert!(matches!(err, CommentError::NotFound(99)));
}

#[tokio::test]
async fn submitted_comments_wait_for_moderation() {
    let harness = seeded().await;
    let (key, answer) = harness.solved_captcha();

    let outcome = harness
        .state
        .http
        .comments
        .submit(CommentForm {
            post_id: "2".to_string(),
            name: "  Ana  ".to_string(),
            email: "ana@example.com".to_string(),
            body: "¿Tiene versión inalámbrica?".to_string(),
            captcha_key: key,
            captcha_value: answer.to_lowercase(),
            ajax: Some("1".to_string()),
        })
        .await
        .expect("submit");

    let CommentSubmission::Accepted { comment } = outcome else {
        panic!("expected accepted comment, got {outcome:?}");
    };
    assert_eq!(comment.name, "Ana");
    assert!(!comment.active);
    assert_eq!(harness.store.comments_for(2).await.len(), 2);
}

#[tokio::test]
async fn comments_on_drafts_are_rejected() {
    let harness = seeded().await;
    let mut draft = post(4, datetime!(2024-05-13 15:00 UTC), &[("es", "Borrador", "borrador")]);
    draft.status = PostStatus::Draft;
    harness.store.insert_post(draft).await;
    let (key, answer) = harness.solved_captcha();

    let outcome = harness
        .state
        .http
        .comments
        .submit(CommentForm {
            post_id: "4".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            body: "Hola".to_string(),
            captcha_key: key,
            captcha_value: answer,
            ajax: None,
        })
        .await
        .expect("submit");
    assert!(matches!(outcome, CommentSubmission::PostNotFound));
}

#[tokio::test]
async fn wrong_captcha_is_a_field_error() {
    let harness = seeded().await;
    let (key, _) = harness.solved_captcha();

    let outcome = harness
        .state
        .http
        .comments
        .submit(CommentForm {
            post_id: "1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            body: "Hola".to_string(),
            captcha_key: key,
            captcha_value: "nope!".to_string(),
            ajax: None,
        })
        .await
        .expect("submit");
    let CommentSubmission::Invalid(errors) = outcome else {
        panic!("expected invalid submission");
    };
    assert!(errors.contains("captcha"));
    assert_eq!(harness.store.comments_for(1).await.len(), 2);
}
