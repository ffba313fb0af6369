use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rust_embed::RustEmbed;
use tower::ServiceExt;

use crate::error::RouterError;
use crate::ui::{handler, NextRouter, Resolved};

#[derive(RustEmbed)]
#[folder = "tests/fixtures/site/"]
struct Site;

#[derive(RustEmbed)]
#[folder = "tests/fixtures/conflict/"]
struct Conflict;

#[derive(RustEmbed)]
#[folder = "tests/fixtures/malformed/"]
struct Malformed;

fn site() -> Router {
    NextRouter::<Site>::new().unwrap().into_router()
}

async fn request(router: Router, method: Method, path: &str) -> (StatusCode, String, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

async fn get(router: Router, path: &str) -> (StatusCode, String, String) {
    request(router, Method::GET, path).await
}

#[tokio::test]
async fn root_serves_embedded_index() {
    let (status, content_type, body) = get(site(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/html; charset=utf-8");
    assert!(body.contains("fixture home"));
}

#[tokio::test]
async fn walletd_handler_serves_index() {
    let (status, _, body) = get(handler().unwrap(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>walletd</h1>"));
}

#[tokio::test]
async fn pages_resolve_without_extension() {
    let (status, _, body) = get(site(), "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("about"));

    let (_, _, body) = get(site(), "/wallets").await;
    assert!(body.contains("wallet list"));

    let (_, _, body) = get(site(), "/wallets/").await;
    assert!(body.contains("wallet list"));
}

#[tokio::test]
async fn dynamic_segment_matches_any_value() {
    let (status, _, body) = get(site(), "/wallets/hot-wallet").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("wallet detail"));
}

#[tokio::test]
async fn catch_all_needs_at_least_one_segment() {
    let (status, _, body) = get(site(), "/docs/a/b/c").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("docs"));

    let (status, _, body) = get(site(), "/docs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("fixture not found"));
}

#[tokio::test]
async fn optional_catch_all_matches_zero_segments() {
    for path in ["/shop", "/shop/x", "/shop/x/y/z"] {
        let (status, _, body) = get(site(), path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body.contains("shop"), "{path}");
    }
}

#[tokio::test]
async fn static_files_carry_their_mime_type() {
    let (status, content_type, body) = get(site(), "/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/css"));
    assert!(body.contains("margin"));

    let (status, content_type, _) = get(site(), "/_next/static/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.contains("javascript"), "{content_type}");
}

#[tokio::test]
async fn unknown_path_serves_not_found_page() {
    let (status, content_type, body) = get(site(), "/no/such/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type, "text/html; charset=utf-8");
    assert!(body.contains("fixture not found"));
}

#[tokio::test]
async fn only_get_and_head_are_allowed() {
    let (status, _, _) = request(site(), Method::POST, "/").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _, body) = request(site(), Method::HEAD, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[test]
fn traversal_segments_are_rejected() {
    let router = NextRouter::<Site>::new().unwrap();
    assert_eq!(router.resolve("/../index.html"), Resolved::BadRequest);
    assert_eq!(router.resolve("/docs/./x"), Resolved::BadRequest);
    assert_eq!(router.resolve("/a\\b"), Resolved::BadRequest);
}

#[test]
fn encoded_traversal_is_rejected() {
    let router = NextRouter::<Site>::new().unwrap();
    assert_eq!(router.resolve("/%2e%2e/index.html"), Resolved::BadRequest);
    assert_eq!(router.resolve("/docs/a%2Fb"), Resolved::BadRequest);
    assert_eq!(router.resolve("/docs/%5C"), Resolved::BadRequest);
    assert_eq!(router.resolve("/%ff"), Resolved::BadRequest);
}

#[tokio::test]
async fn percent_encoded_paths_are_decoded() {
    let (status, _, body) = get(site(), "/release%20notes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("release notes"));

    let router = NextRouter::<Site>::new().unwrap();
    assert_eq!(
        router.resolve("/docs/caf%C3%A9"),
        Resolved::File("docs/[...slug].html".to_string())
    );
}

#[test]
fn exact_files_win_over_routes() {
    let router = NextRouter::<Site>::new().unwrap();
    assert_eq!(
        router.resolve("/about.html"),
        Resolved::File("about.html".to_string())
    );
    assert_eq!(
        router.resolve("/wallets/x"),
        Resolved::File("wallets/[id].html".to_string())
    );
}

#[test]
fn conflicting_slug_names_fail_construction() {
    match NextRouter::<Conflict>::new() {
        Err(RouterError::ConflictingSlug { existing, new, .. }) => {
            let mut names = [existing, new];
            names.sort();
            assert_eq!(names, ["id".to_string(), "name".to_string()]);
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("router should not build"),
    }
}

#[test]
fn malformed_segments_fail_construction() {
    assert!(matches!(
        NextRouter::<Malformed>::new(),
        Err(RouterError::MalformedSegment { .. })
    ));
}
