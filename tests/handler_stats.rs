mod common;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tinylink::routes::router;

fn make_server(ctx: &common::TestContext) -> TestServer {
    let app = router(ctx.state.clone()).layer(common::MockConnectInfoLayer::default());
    TestServer::new(app).unwrap()
}

#[sqlx::test]
async fn test_stats_counts_redirects(pool: PgPool) {
    let ctx = common::create_test_context(pool.clone());
    let server = make_server(&ctx);

    common::create_test_link(&pool, "stats1", "https://example.com").await;

    for _ in 0..3 {
        server
            .get("/stats1")
            .await
            .assert_status(axum::http::StatusCode::FOUND);
    }

    let response = server.get("/stats/stats1").await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["code"], "stats1");
    assert_eq!(json["short_url"], format!("{}/stats1", common::BASE_URL));
    assert_eq!(json["original_url"], "https://example.com");
    assert_eq!(json["usage_count"], 3);
    assert_eq!(json["expired"], false);
    assert!(json["created_at"].is_string());
    assert!(json["expires_at"].is_string());
}

#[sqlx::test]
async fn test_stats_not_found(pool: PgPool) {
    let ctx = common::create_test_context(pool);
    let server = make_server(&ctx);

    server.get("/stats/nonexistent").await.assert_status_not_found();
}

#[sqlx::test]
async fn test_stats_deleted_link(pool: PgPool) {
    let ctx = common::create_test_context(pool.clone());
    let server = make_server(&ctx);

    common::create_deleted_link(&pool, "deleted1", "https://example.com").await;

    server.get("/stats/deleted1").await.assert_status_not_found();
}

#[sqlx::test]
async fn test_stats_expired_link_still_reported(pool: PgPool) {
    let ctx = common::create_test_context(pool.clone());
    let server = make_server(&ctx);

    common::create_link_expiring(
        &pool,
        "old001",
        "https://example.com",
        Utc::now() - Duration::hours(1),
    )
    .await;

    let response = server.get("/stats/old001").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["expired"], true);
}

#[sqlx::test]
async fn test_stats_not_rate_limited(pool: PgPool) {
    let ctx = common::create_test_context_with_limit(pool.clone(), 1);
    let server = make_server(&ctx);

    common::create_test_link(&pool, "stats2", "https://example.com").await;

    for _ in 0..5 {
        server.get("/stats/stats2").await.assert_status_ok();
    }
}
