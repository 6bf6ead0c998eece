use crate::AppState;
use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Map size above which expired windows are swept on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Result of one increment-and-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the caller's window resets.
    pub reset_after: Duration,
}

/// Fixed window rate limiter keyed by client address.
///
/// Each address gets `max_requests` per `window`; the counter resets when a
/// request arrives after the window has elapsed. State is in-memory only, so
/// it does not survive restarts or span instances.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn check(&self, addr: IpAddr) -> RateLimitDecision {
        self.check_at(addr, Instant::now())
    }

    /// Count one request from `addr` at `now`. The lock is held for the whole
    /// read-modify-write so concurrent requests cannot undercount.
    pub fn check_at(&self, addr: IpAddr, now: Instant) -> RateLimitDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(addr).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self
                .window
                .saturating_sub(now.duration_since(entry.started)),
        }
    }

    /// Number of addresses currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Middleware to enforce the per-address quota on API routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.limits.rate_limit_enabled {
        return Ok(next.run(req).await);
    }

    let decision = state.rate_limiter.check(addr.ip());
    if !decision.allowed {
        // Round up so clients never retry a moment too early.
        let retry_after_secs = decision.reset_after.as_secs()
            + u64::from(decision.reset_after.subsec_nanos() > 0);
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    Ok(response)
}
