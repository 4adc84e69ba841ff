//! Per-route fetch strategies and the worker lifecycle.
//!
//! Routing policy, applied to same-origin and known-backend GET requests
//! only (everything else passes through untouched):
//!
//! - auth/session routes: never intercepted, so a stale token can never be
//!   served from cache;
//! - API routes: network-first, falling back to the last cached response,
//!   then to a synthesized offline payload;
//! - everything else (the app shell and other static assets): cache-first,
//!   with successful responses written back, and an offline page for
//!   navigations that miss both cache and network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::buckets::CacheStorage;
use crate::request::{CachedResponse, FetchError, FetchRequest, Fetcher};

/// Configuration for one worker generation.
#[derive(Debug, Clone)]
pub struct WorkerCacheConfig {
    /// Cache generation tag; bucket names embed it.
    pub version: String,
    /// Origin the app is served from, e.g. `https://app.binflow.app`.
    pub origin: String,
    /// Shell assets precached at install time.
    pub shell_assets: Vec<String>,
    /// Asset served to navigations that miss both cache and network.
    pub offline_shell_url: String,
    /// Same-origin path prefixes treated as API reads.
    pub api_prefixes: Vec<String>,
    /// Backend hosts whose requests are treated as API reads.
    pub backend_hosts: Vec<String>,
    /// Path prefixes that bypass interception entirely.
    pub auth_prefixes: Vec<String>,
    /// URL under which proactively pushed user data is cached.
    pub user_data_url: String,
}

impl WorkerCacheConfig {
    pub fn static_bucket(&self) -> String {
        format!("binflow-static-{}", self.version)
    }

    pub fn api_bucket(&self) -> String {
        format!("binflow-api-{}", self.version)
    }
}

/// What the interception layer decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Not intercepted; the platform performs the request untouched.
    Passthrough,
    /// Respond with this (live, cached, or synthesized) response.
    Respond(CachedResponse),
}

/// Worker-lifecycle failure.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("precache of {url} failed: {source}")]
    Precache { url: String, source: FetchError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteClass {
    Auth,
    Api,
    Static,
}

/// Versioned cache layer for one worker generation.
///
/// The [`CacheStorage`] is shared: it belongs to the origin, not to a worker
/// generation, so a new generation's `activate` can garbage-collect the
/// buckets its predecessors left behind.
pub struct WorkerCache {
    config: WorkerCacheConfig,
    storage: Arc<Mutex<CacheStorage>>,
    fetcher: Arc<dyn Fetcher>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl WorkerCache {
    pub fn new(
        config: WorkerCacheConfig,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<Mutex<CacheStorage>>,
    ) -> Self {
        Self {
            config,
            fetcher,
            storage,
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    /// Install this generation: precache the app shell, then request
    /// immediate activation instead of waiting for old clients to close.
    ///
    /// Any failed shell asset fails the whole install; a half-cached shell
    /// is worse than keeping the previous generation.
    pub async fn install(&self) -> Result<(), WorkerError> {
        for url in &self.config.shell_assets {
            let response = self
                .fetcher
                .fetch(&FetchRequest::get(url.clone()))
                .await
                .map_err(|source| WorkerError::Precache {
                    url: url.clone(),
                    source,
                })?;

            let mut storage = self.storage.lock().await;
            storage.open(&self.config.static_bucket()).put(url.clone(), response);
        }

        tracing::info!(
            assets = self.config.shell_assets.len(),
            bucket = %self.config.static_bucket(),
            "precached app shell"
        );
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Activate this generation: delete every bucket from older generations
    /// and claim all open clients so interception starts without a reload.
    pub async fn activate(&self) {
        let keep = [self.config.static_bucket(), self.config.api_bucket()];

        let mut storage = self.storage.lock().await;
        for name in storage.names() {
            if !keep.contains(&name) {
                storage.delete(&name);
                tracing::info!(bucket = %name, "dropped stale cache generation");
            }
        }
        drop(storage);

        self.clients_claimed.store(true, Ordering::SeqCst);
        tracing::info!(version = %self.config.version, "worker generation active");
    }

    /// Route an intercepted request.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchDecision {
        if !request.is_get() {
            return FetchDecision::Passthrough;
        }

        match self.classify(&request.url) {
            None | Some(RouteClass::Auth) => FetchDecision::Passthrough,
            Some(RouteClass::Api) => self.network_first(request).await,
            Some(RouteClass::Static) => self.cache_first(request).await,
        }
    }

    /// Request immediate activation of this (waiting) generation.
    pub fn request_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Warm the API bucket with pushed user data, so the next offline read
    /// of `user_data_url` is served from cache.
    pub async fn cache_user_data(&self, payload: serde_json::Value) {
        let body = payload.to_string().into_bytes();
        let response =
            CachedResponse::ok(body).with_header("content-type", "application/json");

        let mut storage = self.storage.lock().await;
        storage
            .open(&self.config.api_bucket())
            .put(self.config.user_data_url.clone(), response);
        tracing::debug!(url = %self.config.user_data_url, "cached pushed user data");
    }

    /// Bucket names currently present in storage.
    pub async fn bucket_names(&self) -> Vec<String> {
        self.storage.lock().await.names()
    }

    /// URLs cached in a named bucket.
    pub async fn bucket_urls(&self, name: &str) -> Vec<String> {
        let mut storage = self.storage.lock().await;
        storage.open(name).urls()
    }

    async fn network_first(&self, request: &FetchRequest) -> FetchDecision {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    let mut storage = self.storage.lock().await;
                    storage
                        .open(&self.config.api_bucket())
                        .put(request.url.clone(), response.clone());
                }
                FetchDecision::Respond(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "API fetch failed, trying cache");
                let storage = self.storage.lock().await;
                if let Some(cached) = storage.match_in(&self.config.api_bucket(), &request.url) {
                    return FetchDecision::Respond(cached.clone());
                }
                FetchDecision::Respond(offline_api_response())
            }
        }
    }

    async fn cache_first(&self, request: &FetchRequest) -> FetchDecision {
        {
            let storage = self.storage.lock().await;
            if let Some(cached) = storage.match_any(&request.url) {
                return FetchDecision::Respond(cached.clone());
            }
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    let mut storage = self.storage.lock().await;
                    storage
                        .open(&self.config.static_bucket())
                        .put(request.url.clone(), response.clone());
                }
                FetchDecision::Respond(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "static fetch failed");
                if request.is_navigation() {
                    let storage = self.storage.lock().await;
                    if let Some(shell) = storage
                        .match_in(&self.config.static_bucket(), &self.config.offline_shell_url)
                    {
                        return FetchDecision::Respond(shell.clone());
                    }
                    return FetchDecision::Respond(offline_page());
                }
                FetchDecision::Respond(offline_api_response())
            }
        }
    }

    fn classify(&self, url: &str) -> Option<RouteClass> {
        let (origin, path) = split_url(url);

        let same_origin = match origin {
            None => true,
            Some(o) => o == self.config.origin,
        };

        if same_origin {
            if self.matches_prefix(path, &self.config.auth_prefixes) {
                return Some(RouteClass::Auth);
            }
            if self.matches_prefix(path, &self.config.api_prefixes) {
                return Some(RouteClass::Api);
            }
            return Some(RouteClass::Static);
        }

        let host = origin.and_then(host_of);
        if let Some(host) = host {
            if self.config.backend_hosts.iter().any(|h| h == host) {
                if self.matches_prefix(path, &self.config.auth_prefixes) {
                    return Some(RouteClass::Auth);
                }
                return Some(RouteClass::Api);
            }
        }

        // Foreign origin (extensions, third parties): not ours to handle.
        None
    }

    fn matches_prefix(&self, path: &str, prefixes: &[String]) -> bool {
        prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Split a URL into its origin (scheme + host) and path. Relative URLs have
/// no origin and are treated as same-origin by the caller.
fn split_url(url: &str) -> (Option<&str>, &str) {
    let Some(scheme_end) = url.find("://") else {
        return (None, url);
    };
    let after_scheme = &url[scheme_end + 3..];
    match after_scheme.find('/') {
        Some(slash) => (
            Some(&url[..scheme_end + 3 + slash]),
            &after_scheme[slash..],
        ),
        None => (Some(url), "/"),
    }
}

fn host_of(origin: &str) -> Option<&str> {
    origin.find("://").map(|idx| &origin[idx + 3..])
}

/// Synthesized response for API requests that miss both network and cache.
fn offline_api_response() -> CachedResponse {
    let body = serde_json::json!({
        "error": "offline",
        "message": "This data is unavailable while offline.",
        "offline": true,
    });
    CachedResponse::new(503, body.to_string().into_bytes())
        .with_header("content-type", "application/json")
}

/// Inline offline page for navigations with no cached shell at all.
fn offline_page() -> CachedResponse {
    let body = "<!doctype html><html><body><h1>You are offline</h1>\
                <p>Reconnect to keep using binflow.</p></body></html>";
    CachedResponse::new(503, body.as_bytes().to_vec())
        .with_header("content-type", "text/html")
}
