//! HTTP front end: landing page, meme generation, and serving the results.

use std::net::SocketAddr;
use std::num::NonZeroU16;
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::{MemeError, PipelineError};
use crate::pipeline::MemePipeline;

mod files;

use files::{resolve_requested_path, serve_meme_file};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pipeline: Arc<MemePipeline>,
    serve_root: PathBuf,
}

impl AppState {
    /// `serve_root` is what `/get-meme/{path}` paths are relative to.
    pub fn new(pipeline: MemePipeline, serve_root: impl Into<PathBuf>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            serve_root: serve_root.into(),
        }
    }
}

/// Body of a successful `POST /generate-meme`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Always true here; failures go through [`PipelineError`]
    pub success: bool,
    /// Where the meme was written
    pub image_path: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    generate_url: &'static str,
    get_meme_prefix: &'static str,
}

async fn root_handler() -> IndexTemplate {
    IndexTemplate {
        generate_url: "/generate-meme",
        get_meme_prefix: "/get-meme/",
    }
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

#[instrument(skip_all)]
async fn generate_meme_handler(
    State(state): State<AppState>,
) -> Result<Json<GenerateResponse>, PipelineError> {
    let image_path = state.pipeline.run().await?;
    info!("Generated meme {}", image_path.display());
    Ok(Json(GenerateResponse {
        success: true,
        image_path: image_path.display().to_string(),
    }))
}

async fn get_meme_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(requested): Path<String>,
) -> Result<Response, MemeError> {
    let path = resolve_requested_path(&state.serve_root, &requested)?;
    serve_meme_file(&path, &headers).await
}

/// All routes, state not yet attached.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .route(
            "/generate-meme",
            axum::routing::post(generate_meme_handler),
        )
        .route("/get-meme/{*path}", axum::routing::get(get_meme_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Creates the output directories and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: MemePipeline,
) -> Result<(), anyhow::Error> {
    pipeline.ensure_dirs().await?;
    let app = create_router().with_state(AppState::new(pipeline, StdPath::new(".")));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let bound: SocketAddr = listener.local_addr()?;
    info!("Listening on {}", bound);
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::header::{CACHE_CONTROL, IF_MODIFIED_SINCE, LAST_MODIFIED};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::MemeConfig;

    fn setup_state(root: &StdPath) -> AppState {
        let mut config = MemeConfig::new("sk-test");
        config.originals_dir = root.join("originals");
        config.finals_dir = root.join("finals");
        let pipeline = MemePipeline::new(&config).expect("build pipeline");
        AppState::new(pipeline, root)
    }

    async fn read_body(response: axum::response::Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn landing_page_renders() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = create_router().with_state(setup_state(dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(&read_body(response).await).to_string();
        assert!(body.contains("/generate-meme"));
    }

    #[tokio::test]
    async fn get_meme_serves_jpeg() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("finals")).expect("mkdir");
        let contents = b"\xFF\xD8not really a jpeg\xFF\xD9";
        std::fs::write(dir.path().join("finals/meme_20240309_140507.jpg"), contents)
            .expect("write meme");
        let app = create_router().with_state(setup_state(dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/get-meme/finals/meme_20240309_140507.jpg")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
        assert!(
            response
                .headers()
                .get(CACHE_CONTROL)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.contains("immutable"))
        );
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .cloned()
            .expect("last-modified");
        assert_eq!(read_body(response).await, contents.to_vec());

        let request = Request::builder()
            .method("GET")
            .uri("/get-meme/finals/meme_20240309_140507.jpg")
            .header(IF_MODIFIED_SINCE, last_modified)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn get_meme_missing_file_is_404() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = create_router().with_state(setup_state(dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/get-meme/finals/nope.jpg")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_meme_rejects_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = create_router().with_state(setup_state(dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/get-meme/finals/../../etc/passwd")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn styles_are_served_as_css() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = create_router().with_state(setup_state(dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/static/styles.css")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/css");
    }
}
