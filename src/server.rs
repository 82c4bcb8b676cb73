use std::{any::Any, borrow::Cow, sync::Arc};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{OriginalUri, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer};
use tracing::{debug, error};

use crate::{
    badge::BadgeResolver,
    constants::{NO_CACHE, SERVER_HEADER},
    models::CheckKind,
};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<BadgeResolver>,
    pub redirect: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(request_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::SERVER,
            HeaderValue::from_static(SERVER_HEADER),
        ))
}

async fn request_handler(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    debug!("got request '{}'", uri.path());

    let path = decode_path(uri.path());

    if !is_valid_request_path(&path) {
        return fallback_response(state.redirect.as_deref());
    }

    let (token, kind) = parse_path(&path);

    debug!("generating badge for token '{token}' (check kind: {kind})");

    svg_response(state.resolver.resolve(token, kind).await)
}

/// Percent-decodes the request path. Invalid UTF-8 is replaced, not rejected.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Accepts `/{token}/{badge}.svg` shaped paths. The badge name itself is
/// checked by [`parse_path`].
pub fn is_valid_request_path(path: &str) -> bool {
    path.matches('/').count() == 2 && path.ends_with(".svg")
}

pub fn parse_path(path: &str) -> (&str, CheckKind) {
    let mut fields = path.split('/').skip(1);
    let token = fields.next().unwrap_or_default();
    let segment = fields.next().unwrap_or_default();

    match CheckKind::from_segment(segment) {
        CheckKind::Unknown => ("", CheckKind::Unknown),
        kind => (token, kind),
    }
}

fn svg_response(svg: Bytes) -> Response {
    let mut response = Response::new(Body::from(svg));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("image/svg+xml"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    response
}

fn fallback_response(redirect: Option<&str>) -> Response {
    let Some(location) = redirect.and_then(|url| HeaderValue::from_str(url).ok()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    };

    error!("recovered internal error in HTTP request handler: {detail}");

    StatusCode::NOT_IMPLEMENTED.into_response()
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::{AppState, build_router, decode_path, is_valid_request_path, parse_path};
    use crate::{
        badge::BadgeResolver,
        cache::BadgeCache,
        models::CheckKind,
        svg::Style,
        testing::FakeFetcher,
    };

    fn router(fetcher: Arc<FakeFetcher>, redirect: Option<&str>) -> Router {
        let cache = BadgeCache::new(Duration::from_secs(60), Duration::from_secs(60), 100);
        build_router(AppState {
            resolver: Arc::new(BadgeResolver::new(cache, fetcher, Style::FlatSquare)),
            redirect: redirect.map(str::to_string),
        })
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn valid_paths_need_two_slashes_and_svg_suffix() {
        assert!(is_valid_request_path("/ngg8/status.svg"));
        assert!(is_valid_request_path("/ngg8/foo.svg"));
        assert!(!is_valid_request_path("/ngg8/status.png"));
        assert!(!is_valid_request_path("/status.svg"));
        assert!(!is_valid_request_path("/a/ngg8/status.svg"));
        assert!(!is_valid_request_path("/"));
    }

    #[test]
    fn parse_known_kinds() {
        assert_eq!(parse_path("/ngg8/status.svg"), ("ngg8", CheckKind::Status));
        assert_eq!(parse_path("/ngg8/uptime.svg"), ("ngg8", CheckKind::Uptime));
        assert_eq!(parse_path("/ngg8/apdex.svg"), ("ngg8", CheckKind::Apdex));
    }

    #[test]
    fn parse_unknown_kind_drops_token() {
        assert_eq!(parse_path("/ngg8/foo.svg"), ("", CheckKind::Unknown));
        assert_eq!(parse_path("/ngg8/.svg"), ("", CheckKind::Unknown));
    }

    #[test]
    fn parse_keeps_empty_token_for_known_kind() {
        assert_eq!(parse_path("//status.svg"), ("", CheckKind::Status));
        assert_eq!(parse_path("//uptime.svg"), ("", CheckKind::Uptime));
    }

    #[test]
    fn decode_path_unescapes_token() {
        let path = decode_path("/a%20b/status.svg");
        assert_eq!(path, "/a b/status.svg");
        assert_eq!(parse_path(&path), ("a b", CheckKind::Status));
        assert_eq!(decode_path("/ngg8/uptime.svg"), "/ngg8/uptime.svg");
    }

    #[tokio::test]
    async fn badge_response_has_no_cache_headers() {
        let fetcher = Arc::new(FakeFetcher::with_status(99.0, false));
        let resp = router(fetcher, None)
            .oneshot(get("/ngg8/status.svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");
        assert!(
            headers[header::SERVER]
                .to_str()
                .unwrap()
                .starts_with("UpdownBadgeServer/")
        );

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(">up</text>"));
    }

    #[tokio::test]
    async fn fetch_failure_still_returns_ok() {
        let fetcher = Arc::new(FakeFetcher::failing());
        let resp = router(fetcher, None)
            .oneshot(get("/ngg8/apdex.svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(">unknown</text>"));
    }

    #[tokio::test]
    async fn unknown_kind_renders_unknown_status() {
        let fetcher = Arc::new(FakeFetcher::with_status(99.0, false));
        let resp = router(fetcher.clone(), None)
            .oneshot(get("/ngg8/foo.svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(">status</text>"));
        assert!(body.contains(">unknown</text>"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_path_without_redirect_is_not_found() {
        let fetcher = Arc::new(FakeFetcher::failing());
        let app = router(fetcher.clone(), None);

        for uri in ["/", "/ngg8", "/ngg8/status.png", "/a/b/status.svg"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_path_with_redirect_is_moved_permanently() {
        let fetcher = Arc::new(FakeFetcher::failing());
        let resp = router(fetcher, Some("https://updown.io"))
            .oneshot(get("/favicon.ico"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], "https://updown.io");
    }

    #[tokio::test]
    async fn empty_token_follows_requested_kind() {
        let fetcher = Arc::new(FakeFetcher::failing());
        let resp = router(fetcher.clone(), None)
            .oneshot(get("//uptime.svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(">uptime</text>"));
        assert!(body.contains(">unknown</text>"));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fetcher.tokens(), vec![String::new()]);
    }

    #[tokio::test]
    async fn encoded_token_is_decoded_before_fetch() {
        let fetcher = Arc::new(FakeFetcher::with_status(99.0, false));
        let resp = router(fetcher.clone(), None)
            .oneshot(get("/a%20b/status.svg"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fetcher.tokens(), vec!["a b".to_string()]);
    }

    #[tokio::test]
    async fn query_string_is_ignored() {
        let fetcher = Arc::new(FakeFetcher::with_status(99.0, true));
        let resp = router(fetcher, None)
            .oneshot(get("/ngg8/status.svg?cache=bust"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(">down</text>"));
    }

    #[tokio::test]
    async fn panic_in_pipeline_becomes_not_implemented() {
        let fetcher = Arc::new(FakeFetcher::panicking());
        let app = router(fetcher.clone(), None);

        let resp = app.clone().oneshot(get("/ngg8/uptime.svg")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

        // The router keeps serving after a panic.
        let resp = app.oneshot(get("/ngg8/foo.svg")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fetcher.calls(), 1);
    }
}
