//! Blog server with on-demand post generation
//!
//! Serves the generated `public/` directory. Posts that were not known at
//! generation time are rendered on first request: the reader gets a loading
//! placeholder while a background task fetches and writes the page.

mod error;

pub use error::AppError;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::client::{self, ContentSource};
use crate::content::{is_valid_uid, Post};
use crate::error::ContentError;
use crate::generator::Generator;
use crate::helpers::post_path;
use crate::Blog;

/// Route of the load-more endpoint
pub const LOAD_MORE_ROUTE: &str = "/api/posts";

/// Progress of an on-demand post generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// A task is fetching the post
    Pending,
    /// The content API does not know the post
    Missing,
    /// The post exists but cannot be rendered
    Invalid,
}

impl FallbackState {
    fn is_terminal(self) -> bool {
        !matches!(self, FallbackState::Pending)
    }
}

#[derive(Debug, Clone, Copy)]
struct FallbackEntry {
    state: FallbackState,
    since: Instant,
}

/// Server state
pub struct ServerState<S> {
    generator: Generator<S>,
    public_dir: PathBuf,
    loading_html: String,
    not_found_html: String,
    /// Terminal states are forgotten after this long
    fallback_ttl: Duration,
    max_fallback_entries: usize,
    fallback: Mutex<HashMap<String, FallbackEntry>>,
}

impl<S: ContentSource + 'static> ServerState<S> {
    pub fn new(blog: &Blog, generator: Generator<S>) -> Result<Self> {
        Ok(Self {
            loading_html: generator.render_loading()?,
            not_found_html: generator.render_not_found()?,
            generator,
            public_dir: blog.public_dir.clone(),
            fallback_ttl: blog.config.fallback_ttl(),
            max_fallback_entries: blog.config.max_fallback_entries.max(1),
            fallback: Mutex::new(HashMap::new()),
        })
    }

    /// Current fallback state of `uid`, if any
    pub async fn fallback_state(&self, uid: &str) -> Option<FallbackState> {
        self.fallback.lock().await.get(uid).map(|entry| entry.state)
    }

    fn is_expired(&self, entry: &FallbackEntry) -> bool {
        entry.state.is_terminal() && entry.since.elapsed() >= self.fallback_ttl
    }

    /// Make room for one more entry
    ///
    /// Drops expired entries, then the oldest terminal ones. Returns false
    /// when every slot holds a running generation.
    fn reserve_slot(&self, fallback: &mut HashMap<String, FallbackEntry>) -> bool {
        fallback.retain(|_, entry| !self.is_expired(entry));

        while fallback.len() >= self.max_fallback_entries {
            let oldest = fallback
                .iter()
                .filter(|(_, entry)| entry.state.is_terminal())
                .min_by_key(|(_, entry)| entry.since)
                .map(|(uid, _)| uid.clone());
            match oldest {
                Some(uid) => {
                    fallback.remove(&uid);
                }
                None => return false,
            }
        }
        true
    }

    fn not_found(&self) -> Response {
        (StatusCode::NOT_FOUND, Html(self.not_found_html.clone())).into_response()
    }

    fn loading(&self) -> Response {
        (
            [(header::CACHE_CONTROL, "no-store")],
            Html(self.loading_html.clone()),
        )
            .into_response()
    }
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let source = Arc::new(blog.client()?);
    let generator = Generator::new(blog, source)?.with_load_more(LOAD_MORE_ROUTE);

    tracing::info!("Generating static files...");
    let report = generator.generate().await?;
    tracing::info!(
        "Generated {} index pages and {} posts",
        report.index_pages,
        report.post_pages.len()
    );

    let state = Arc::new(ServerState::new(blog, generator)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router<S: ContentSource + 'static>(state: Arc<ServerState<S>>) -> Router {
    let static_files = ServeDir::new(&state.public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(state.public_dir.join("404.html")));

    Router::new()
        .route(LOAD_MORE_ROUTE, get(load_more_handler::<S>))
        .route("/post/:uid", get(post_handler::<S>))
        .route("/post/:uid/", get(post_handler::<S>))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: Option<String>,
}

/// One page of posts for in-place replacement of the list
#[derive(Debug, Serialize)]
struct LoadMoreResponse {
    next_page: Option<String>,
    has_next: bool,
    results: Vec<Post>,
    html: String,
}

/// Fetch the page behind a `next_page` cursor
async fn load_more_handler<S: ContentSource + 'static>(
    State(state): State<Arc<ServerState<S>>>,
    Query(params): Query<LoadMoreParams>,
) -> Result<Json<LoadMoreResponse>, AppError> {
    let cursor = params
        .cursor
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing cursor".to_string()))?;
    let page = client::next_posts(state.generator.source().as_ref(), &cursor).await?;
    let html = state.generator.render_post_list(&page.results)?;

    Ok(Json(LoadMoreResponse {
        has_next: page.has_next(),
        next_page: page.next_page,
        results: page.results,
        html,
    }))
}

/// Serve a post, generating it on first request when unknown
async fn post_handler<S: ContentSource + 'static>(
    State(state): State<Arc<ServerState<S>>>,
    Path(uid): Path<String>,
) -> Response {
    if !is_valid_uid(&uid) {
        return state.not_found();
    }

    let file = state.public_dir.join(post_path(&uid)).join("index.html");
    if let Ok(html) = tokio::fs::read_to_string(&file).await {
        return Html(html).into_response();
    }

    {
        let mut fallback = state.fallback.lock().await;
        if let Some(entry) = fallback.get(&uid).copied() {
            if state.is_expired(&entry) {
                fallback.remove(&uid);
            } else if entry.state.is_terminal() {
                return state.not_found();
            } else {
                return state.loading();
            }
        }

        if !state.reserve_slot(&mut fallback) {
            tracing::warn!("Too many posts generating, refusing {}", uid);
            return (StatusCode::SERVICE_UNAVAILABLE, state.loading()).into_response();
        }
        fallback.insert(
            uid.clone(),
            FallbackEntry {
                state: FallbackState::Pending,
                since: Instant::now(),
            },
        );
    }

    tracing::info!("Generating {} on demand", uid);
    let task_state = state.clone();
    tokio::spawn(async move {
        let result = task_state.generator.generate_post(&uid).await;

        let mut fallback = task_state.fallback.lock().await;
        let terminal = match result {
            Ok(path) => {
                tracing::info!("Generated {:?} on demand", path);
                None
            }
            Err(e) => match content_error(&e) {
                Some(err) if err.is_not_found() => {
                    tracing::info!("Post {} does not exist upstream", uid);
                    Some(FallbackState::Missing)
                }
                Some(ContentError::InvalidDocument { .. }) => {
                    tracing::warn!("Post {} cannot be rendered: {:#}", uid, e);
                    Some(FallbackState::Invalid)
                }
                _ => {
                    tracing::error!("On-demand generation of {} failed: {:#}", uid, e);
                    None
                }
            },
        };

        match terminal {
            Some(state) => {
                fallback.insert(
                    uid,
                    FallbackEntry {
                        state,
                        since: Instant::now(),
                    },
                );
            }
            None => {
                fallback.remove(&uid);
            }
        }
    });

    state.loading()
}

fn content_error(err: &anyhow::Error) -> Option<&ContentError> {
    err.downcast_ref::<ContentError>()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
