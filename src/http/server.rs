//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Redirect `/` to the project page
//! - Run the feed pipeline: translate → fetch → filter headers → rewrite

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::{ProxyConfig, TimeoutConfig};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{copy_headers, ProxyError, FORWARDED_RESPONSE_HEADERS};
use crate::observability::metrics;
use crate::rewrite::FeedRewriter;
use crate::routing::FeedAddress;
use crate::upstream::{FetchError, UpstreamClient, UpstreamResponse};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub origin: Arc<str>,
    pub home_url: HeaderValue,
    pub upstream: UpstreamClient,
    pub rewriter: Arc<FeedRewriter>,
}

/// HTTP server for the feed proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails when the upstream client cannot be built or the home URL is not
    /// a valid header value.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let upstream = UpstreamClient::new(&config.timeouts)?;
        let home_url = HeaderValue::from_str(&config.upstream.home_url)
            .map_err(|_| ServerError::HomeUrl(config.upstream.home_url.clone()))?;

        let state = AppState {
            origin: Arc::from(config.upstream.origin.as_str()),
            home_url,
            upstream,
            rewriter: Arc::new(FeedRewriter::new(&config.rewrite)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(home_handler))
            .route("/{*path}", any(feed_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        inbound_deadline(&config.timeouts),
                    )),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.upstream.origin,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Extra time the inbound layer allows beyond the upstream deadline.
const INBOUND_GRACE: Duration = Duration::from_secs(2);

/// Upper bound for a whole inbound request.
///
/// Outlives the upstream client's deadline so an upstream timeout is reported
/// by the handler as a transport failure.
fn inbound_deadline(timeouts: &TimeoutConfig) -> Duration {
    Duration::from_secs(timeouts.request_secs) + INBOUND_GRACE
}

/// Errors constructing the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] FetchError),

    #[error("home URL {0:?} is not a valid Location header")]
    HomeUrl(String),
}

/// `/` → permanent redirect to the project page.
async fn home_handler(State(state): State<AppState>) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, state.home_url.clone())],
    )
        .into_response()
}

/// Feed paths → proxied, rewritten feed.
async fn feed_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let method_str = method.to_string();
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        "Proxying feed request"
    );

    let response = match proxy_feed(&state, method, uri.path(), &headers).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Feed request failed");
            metrics::record_failure(e.kind());
            e.into_response()
        }
    };

    metrics::record_request(&method_str, response.status().as_u16(), start_time);
    response
}

async fn proxy_feed(
    state: &AppState,
    method: Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    let address = FeedAddress::from_path(path);
    let feed_url = address.upstream_url(&state.origin);
    let url = Url::parse(&feed_url).map_err(|source| ProxyError::InvalidUrl {
        url: feed_url.clone(),
        source,
    })?;

    let head_only = method == Method::HEAD;
    let feed = match state.upstream.fetch(method, url, headers).await? {
        UpstreamResponse::NotModified => return Ok(StatusCode::NOT_MODIFIED.into_response()),
        UpstreamResponse::Fetched(feed) => feed,
    };

    let body = if feed.status.is_success() && !head_only {
        let rewritten = state.rewriter.rewrite(&feed.body)?;
        tracing::debug!(
            username = %address.username,
            feed = %address.feed_or_default(),
            items = rewritten.items,
            rewritten = rewritten.rewritten,
            "Feed rewritten"
        );
        metrics::record_items_rewritten(rewritten.rewritten);
        Body::from(rewritten.body)
    } else {
        if !feed.status.is_success() {
            tracing::warn!(status = %feed.status, url = %feed_url, "Upstream returned non-success status");
        }
        Body::from(feed.body)
    };

    let mut response = Response::new(body);
    *response.status_mut() = feed.status;
    *response.headers_mut() = copy_headers(&feed.headers, &FORWARDED_RESPONSE_HEADERS);
    Ok(response)
}
