//! End-to-end tests for the identity middleware against a real router.

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use doorman::{identifier, Error, IdentificatorLayer, PeerAddr};

/// Echoes the attached identifier, or 401s explicitly when it is absent.
async fn echo_identifier(request: Request<Body>) -> Response {
    match identifier(request.extensions()) {
        Ok(id) => id.to_string().into_response(),
        Err(Error::NoIdentifier) => StatusCode::UNAUTHORIZED.into_response(),
        Err(error) => panic!("unexpected accessor error: {error}"),
    }
}

/// Any-method router, mirroring a mux that leaves method filtering to
/// handlers.
fn any_method_app() -> Router {
    Router::new()
        .route("/get", any(echo_identifier))
        .layer(IdentificatorLayer::new())
}

async fn send(app: Router, method: &str, path: &str, addr: Option<&str>) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(addr) = addr {
        builder = builder.extension(ConnectInfo(PeerAddr::from(addr)));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn extracts_host_from_host_port_address() {
    let (status, body) = send(any_method_app(), "GET", "/get", Some("192.0.2.1:12345")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"192.0.2.1");

    let (status, body) = send(any_method_app(), "GET", "/get", Some("127.0.0.1:666")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"127.0.0.1");
}

#[tokio::test]
async fn unbrackets_ipv6_hosts() {
    let (status, body) = send(any_method_app(), "GET", "/get", Some("[::1]:8080")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"::1");
}

#[tokio::test]
async fn rejects_portless_address_for_any_method() {
    for method in ["GET", "POST", "PUT", "DELETE"] {
        let (status, body) = send(any_method_app(), method, "/get", Some("127.0.0.1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "method {method}");
        assert!(body.is_empty(), "401 body must be empty");
    }
}

#[tokio::test]
async fn rejects_request_without_peer_address() {
    let (status, body) = send(any_method_app(), "GET", "/get", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn does_not_filter_methods_itself() {
    let (status, body) = send(any_method_app(), "POST", "/get", Some("192.0.2.1:12345")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"192.0.2.1");
}

#[tokio::test]
async fn unmatched_path_is_rejected_by_router_not_middleware() {
    // Path routing happens before the layer runs, so even a malformed peer
    // address yields the router's 404 here.
    let (status, _) = send(any_method_app(), "POST", "/post", Some("192.0.2.1:12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(any_method_app(), "GET", "/post", Some("127.0.0.1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn method_mismatch_behavior_follows_the_router() {
    let app = || {
        Router::new()
            .route("/get", get(echo_identifier))
            .layer(IdentificatorLayer::new())
    };

    // Method dispatch lives inside the matched route, so the middleware runs
    // first: a valid address falls through to 405, an invalid one is already
    // rejected with 401.
    let (status, body) = send(app(), "POST", "/get", Some("192.0.2.1:12345")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body.is_empty());

    let (status, body) = send(app(), "POST", "/get", Some("127.0.0.1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn repeated_lookups_in_one_request_agree() {
    async fn handler(request: Request<Body>) -> Response {
        let first = identifier(request.extensions()).unwrap().clone();
        let second = identifier(request.extensions()).unwrap().clone();
        assert_eq!(first, second);
        first.to_string().into_response()
    }

    let app = Router::new()
        .route("/get", get(handler))
        .layer(IdentificatorLayer::new());

    let (status, body) = send(app, "GET", "/get", Some("192.0.2.1:12345")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"192.0.2.1");
}
