//! Fixed-window admission control, keyed per client address and endpoint.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::{error::ApiError, state::AppState};

/// Counter for one `(client, endpoint)` pair.
#[derive(Debug)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// In-process fixed-window rate limiter. Windows do not slide: the count
/// resets only once the full window length has elapsed from the window
/// start, so bursts across a boundary are accepted.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<(String, String), Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Returns `true` when the request is admitted. The DashMap entry guard
    /// holds the key's shard lock, so concurrent requests from the same
    /// client cannot observe a stale count.
    pub fn check_and_increment(&self, client: &str, endpoint: &str) -> bool {
        let mut entry = self
            .windows
            .entry((client.to_owned(), endpoint.to_owned()))
            .or_insert_with(|| Window {
                count: 0,
                started_at: Instant::now(),
            });

        if entry.started_at.elapsed() >= self.window {
            entry.count = 0;
            entry.started_at = Instant::now();
        }

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Clears every counter. Test/operational hook only, never called on
    /// the request path.
    pub fn reset(&self) {
        self.windows.clear();
    }
}

fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return real_ip.to_owned();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Admission gate applied ahead of every handler. Denied requests answer
/// 429 without reaching validation, authentication, or the database.
pub async fn middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&req);
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    if !state.limiter.check_and_increment(&client, &endpoint) {
        tracing::warn!(%client, %endpoint, "rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(req).await)
}
