mod common;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tinylink::domain::entities::NewLink;
use tinylink::domain::repositories::LinkRepository;
use tinylink::domain::repositories::link_repository::{CODE_CONSTRAINT, ORIGINAL_URL_CONSTRAINT};
use tinylink::error::AppError;
use tinylink::infrastructure::persistence::PgLinkRepository;

fn new_link(code: &str, url: &str) -> NewLink {
    NewLink::new(
        code.to_string(),
        url.to_string(),
        Utc::now(),
        Duration::hours(24),
    )
}

#[sqlx::test]
async fn test_create_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let input = new_link("test123", "https://example.com");
    let expected_expiry = input.expires_at;

    let link = repo.create(input).await.unwrap();

    assert_eq!(link.code, "test123");
    assert_eq!(link.original_url, "https://example.com");
    assert_eq!(link.usage_count, 0);
    assert!(link.deleted_at.is_none());
    // Postgres stores microseconds.
    assert!((link.expires_at - expected_expiry).num_milliseconds().abs() < 1);
}

#[sqlx::test]
async fn test_find_by_code(pool: PgPool) {
    common::create_test_link(&pool, "abc123", "https://example.com").await;

    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo.find_by_code("abc123").await.unwrap();

    assert_eq!(link.unwrap().code, "abc123");
}

#[sqlx::test]
async fn test_find_by_code_not_found(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo.find_by_code("notfound").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
async fn test_find_by_code_returns_deleted_rows(pool: PgPool) {
    common::create_deleted_link(&pool, "deleted1", "https://example.com").await;

    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo.find_by_code("deleted1").await.unwrap().unwrap();

    assert!(link.is_deleted());
}

#[sqlx::test]
async fn test_duplicate_code_conflict(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link("dup123", "https://example.com/a"))
        .await
        .unwrap();
    let err = repo
        .create(new_link("dup123", "https://example.com/b"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
    assert!(err.is_conflict_on(CODE_CONSTRAINT));
}

#[sqlx::test]
async fn test_deleted_code_is_never_reused(pool: PgPool) {
    common::create_deleted_link(&pool, "old123", "https://example.com/a").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let err = repo
        .create(new_link("old123", "https://example.com/b"))
        .await
        .unwrap_err();

    assert!(err.is_conflict_on(CODE_CONSTRAINT));
}

#[sqlx::test]
async fn test_duplicate_active_url_conflict(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link("first1", "https://example.com"))
        .await
        .unwrap();
    let err = repo
        .create(new_link("second", "https://example.com"))
        .await
        .unwrap_err();

    assert!(err.is_conflict_on(ORIGINAL_URL_CONSTRAINT));
}

#[sqlx::test]
async fn test_url_reusable_after_soft_delete(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link("first1", "https://example.com"))
        .await
        .unwrap();
    assert!(repo.soft_delete("first1").await.unwrap());

    assert!(
        repo.find_active_by_original_url("https://example.com")
            .await
            .unwrap()
            .is_none()
    );

    let link = repo
        .create(new_link("second", "https://example.com"))
        .await
        .unwrap();
    assert_eq!(link.code, "second");

    let active = repo
        .find_active_by_original_url("https://example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.code, "second");
}

#[sqlx::test]
async fn test_increment_usage(pool: PgPool) {
    common::create_test_link(&pool, "inc123", "https://example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert_eq!(repo.increment_usage("inc123").await.unwrap(), Some(1));
    assert_eq!(repo.increment_usage("inc123").await.unwrap(), Some(2));
    assert_eq!(repo.increment_usage("missing").await.unwrap(), None);
}

#[sqlx::test]
async fn test_increment_usage_skips_deleted(pool: PgPool) {
    common::create_deleted_link(&pool, "deleted1", "https://example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    assert_eq!(repo.increment_usage("deleted1").await.unwrap(), None);
    assert_eq!(common::usage_count(&pool, "deleted1").await, 0);
}

#[sqlx::test]
async fn test_concurrent_increments_are_not_lost(pool: PgPool) {
    common::create_test_link(&pool, "race01", "https://example.com").await;
    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool.clone())));

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_usage("race01").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(common::usage_count(&pool, "race01").await, 25);
}

#[sqlx::test]
async fn test_soft_delete(pool: PgPool) {
    common::create_test_link(&pool, "del123", "https://example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.soft_delete("del123").await.unwrap());
    assert!(!repo.soft_delete("del123").await.unwrap());
    assert!(!repo.soft_delete("missing").await.unwrap());

    let link = repo.find_by_code("del123").await.unwrap().unwrap();
    assert!(link.deleted_at.is_some());
}

#[sqlx::test]
async fn test_list_newest_first(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let now = Utc::now();

    for (i, code) in ["older1", "middle", "newest"].iter().enumerate() {
        repo.create(NewLink::new(
            code.to_string(),
            format!("https://example.com/{code}"),
            now + Duration::seconds(i as i64),
            Duration::hours(24),
        ))
        .await
        .unwrap();
    }
    repo.soft_delete("middle").await.unwrap();

    let live: Vec<String> = repo
        .list(false)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.code)
        .collect();
    assert_eq!(live, vec!["newest", "older1"]);

    let all: Vec<String> = repo
        .list(true)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.code)
        .collect();
    assert_eq!(all, vec!["newest", "middle", "older1"]);
}

#[sqlx::test]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.ping().await.is_ok());
}
