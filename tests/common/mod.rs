//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary media
//! root, and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;

use interiors_core::config::{Config, SessionBackend};
use interiors_db::pool::{init_memory_pool, DbPool};
use interiors_server::context::AppContext;
use interiors_server::router::build_router;
use tempfile::TempDir;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary media directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub media: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The media root is
    /// always replaced by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let media = tempfile::tempdir().expect("failed to create media dir");
        config.media.root = media.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());

        Self { ctx, db, media }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Start a server whose sessions live in process memory.
    pub async fn with_memory_sessions() -> (Self, SocketAddr) {
        let mut config = Config::default();
        config.sessions.backend = SessionBackend::Memory;
        Self::with_server_config(config).await
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> interiors_db::pool::PooledConnection {
        interiors_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// All records, ordered by id.
    pub fn interiors(&self) -> Vec<interiors_db::models::Interior> {
        interiors_db::queries::interiors::list_interiors(&self.conn(), None)
            .expect("failed to list interiors")
    }
}

/// A client that does not follow redirects, so tests can inspect them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build client")
}

/// The `name=value` pair of the session cookie set by a response, if any.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("interiors_session="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

/// Encode a solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 140, 160]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode png");
    buf.into_inner()
}

/// A multipart form with one `images` part per `(filename, bytes)` pair.
pub fn images_form(files: Vec<(&str, Vec<u8>)>) -> reqwest::multipart::Form {
    files
        .into_iter()
        .fold(reqwest::multipart::Form::new(), |form, (name, data)| {
            form.part(
                "images",
                reqwest::multipart::Part::bytes(data).file_name(name.to_string()),
            )
        })
}
