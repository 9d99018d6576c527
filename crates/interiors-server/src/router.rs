//! Axum router construction.
//!
//! Builds the full application router: admin pages behind the session
//! middleware, the JSON API, the OpenAPI document, health, and media files.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::middleware::session::session_middleware;
use crate::routes;
use crate::templates::{BULK_UPLOAD_PATH, CHANGELIST_PATH};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::interiors::list_interiors,
        routes::interiors::get_interior,
        routes::interiors::import_interiors,
    ),
    components(schemas(
        routes::interiors::InteriorResponse,
        routes::interiors::ImportResponse,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let body_limit = DefaultBodyLimit::max(ctx.config.uploads.max_body_bytes);

    // Browser-facing pages share the session cookie.
    let admin_routes = Router::new()
        .route("/", get(routes::admin::index))
        .route("/admin/", get(routes::admin::index))
        .route(CHANGELIST_PATH, get(routes::admin::changelist))
        .route(
            BULK_UPLOAD_PATH,
            get(routes::admin::bulk_upload_form).post(routes::admin::bulk_upload_submit),
        )
        .layer(middleware::from_fn_with_state(ctx.clone(), session_middleware));

    let api = Router::new()
        .route("/interiors", get(routes::interiors::list_interiors))
        .route("/interiors/{id}", get(routes::interiors::get_interior))
        .route("/interiors/import", post(routes::interiors::import_interiors));

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .merge(admin_routes);

    match media_mount(&ctx.config.media.url_prefix) {
        Some(prefix) => {
            tracing::debug!("Serving media from {:?} at {prefix}", ctx.storage.root());
            app = app.nest_service(&prefix, ServeDir::new(ctx.storage.root()));
        }
        None => tracing::warn!(
            "media.url_prefix '{}' cannot be mounted; media files will not be served",
            ctx.config.media.url_prefix
        ),
    }

    app.layer(body_limit)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Mount point for the media directory, or `None` when the prefix is not an
/// absolute non-root path.
fn media_mount(url_prefix: &str) -> Option<String> {
    let prefix = url_prefix.trim_end_matches('/');
    (prefix.starts_with('/') && prefix.len() > 1).then(|| prefix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use interiors_core::config::Config;
    use interiors_db::pool::init_memory_pool;
    use tower::ServiceExt;

    fn app_with_media(media_root: &std::path::Path) -> Router {
        let mut config = Config::default();
        config.media.root = media_root.to_path_buf();
        build_router(AppContext::new(config, init_memory_pool().unwrap()))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn media_mount_points() {
        assert_eq!(media_mount("/media").as_deref(), Some("/media"));
        assert_eq!(media_mount("/media/").as_deref(), Some("/media"));
        assert_eq!(media_mount("/"), None);
        assert_eq!(media_mount("media"), None);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(body_string(response).await.contains("\"healthy\""));
    }

    #[tokio::test]
    async fn root_redirects_to_changelist() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], CHANGELIST_PATH);
    }

    #[tokio::test]
    async fn changelist_issues_session_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get(CHANGELIST_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("interiors_session="));
        assert!(cookie.contains("; Max-Age=1209600"));
        assert!(body_string(response).await.contains("<table>"));
    }

    #[tokio::test]
    async fn api_does_not_issue_session_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get("/api/interiors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn malformed_interior_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get("/api/interiors/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_interior_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(Request::get("/api/interiors/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_upload_without_multipart_rerenders_form() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(
                Request::post(BULK_UPLOAD_PATH)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("images=x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("Check the encoding type on the form."));
    }

    #[tokio::test]
    async fn openapi_document_lists_paths() {
        let dir = tempfile::tempdir().unwrap();
        let response = app_with_media(dir.path())
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_string(response).await;
        assert!(json.contains("/api/interiors/{id}"));
        assert!(json.contains("/api/interiors/import"));
    }

    #[tokio::test]
    async fn media_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("interiors")).unwrap();
        std::fs::write(dir.path().join("interiors/a.txt"), b"hello").unwrap();

        let response = app_with_media(dir.path())
            .oneshot(
                Request::get("/media/interiors/a.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "hello");
    }
}
