//! Deduplicating, TTL-based cache over npm registry metadata lookups.
//!
//! Failures at this layer (connect errors, non-2xx, malformed bodies) are
//! swallowed and surfaced as absence - readers and the orchestrator never see
//! a network error as an exception. Concurrent lookups of one key share a
//! single underlying request; the in-flight record is cleared on settle so a
//! failed fetch never poisons later lookups.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Client;
use reqwest::header;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default TTL for package metadata documents.
pub const METADATA_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for platform release indexes (the Node dist index changes rarely).
pub const RELEASE_INDEX_TTL: Duration = Duration::from_secs(60 * 60);

/// Fixed per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Public npm registry base URL.
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Time source injected into the cache so expiry is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`] used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

type Payload = Option<Arc<Value>>;
type InFlight = Shared<BoxFuture<'static, Payload>>;

struct CacheEntry {
    value: Arc<Value>,
    expires_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    inflight: HashMap<String, InFlight>,
}

/// Shared, process-lifetime metadata cache.
///
/// No eviction beyond TTL expiry; key cardinality tracks package names and
/// stays small in practice.
pub struct RegistryCache {
    client: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<CacheState>>,
}

impl fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCache")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RegistryCache {
    /// Cache over an existing client, pointed at `base_url`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            clock: Arc::new(SystemClock),
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Cache against the public npm registry.
    pub fn with_defaults() -> Self {
        Self::new(Client::new(), NPM_REGISTRY_URL)
    }

    /// Replace the time source (deterministic expiry in tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch a JSON document, deduplicated and cached for `ttl`.
    ///
    /// Returns `None` on any fetch failure.
    pub async fn fetch_json(&self, url: &str, ttl: Duration) -> Payload {
        let shared = {
            let mut state = lock_state(&self.state);

            if let Some(entry) = state.entries.get(url) {
                if entry.expires_at > self.clock.now() {
                    return Some(Arc::clone(&entry.value));
                }
            }

            if let Some(pending) = state.inflight.get(url) {
                pending.clone()
            } else {
                let fut = self.spawn_fetch(url.to_string(), ttl);
                state.inflight.insert(url.to_string(), fut.clone());
                fut
            }
        };

        shared.await
    }

    /// Build the single underlying request future for a key.
    ///
    /// Settlement bookkeeping lives inside the future so it runs exactly once
    /// no matter how many callers share it: the in-flight record is removed
    /// and a successful value is written into the cache.
    fn spawn_fetch(&self, url: String, ttl: Duration) -> InFlight {
        let client = self.client.clone();
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);

        async move {
            let value = request_json(&client, &url).await.map(Arc::new);

            let mut guard = lock_state(&state);
            guard.inflight.remove(&url);
            if let Some(value) = &value {
                guard.entries.insert(
                    url,
                    CacheEntry {
                        value: Arc::clone(value),
                        expires_at: clock.now() + ttl,
                    },
                );
            }
            value
        }
        .boxed()
        .shared()
    }

    /// Full registry metadata document for a package.
    pub async fn package_metadata(&self, name: &str) -> Payload {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encode_package_name(name)
        );
        self.fetch_json(&url, METADATA_TTL).await
    }

    /// Version behind a named dist-tag, or `None` when unavailable.
    pub async fn dist_tag(&self, name: &str, tag: &str) -> Option<String> {
        let metadata = self.package_metadata(name).await?;
        metadata
            .get("dist-tags")?
            .get(tag)?
            .as_str()
            .map(String::from)
    }

    /// Version behind the `latest` dist-tag.
    pub async fn latest_version(&self, name: &str) -> Option<String> {
        self.dist_tag(name, "latest").await
    }
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // The guard is never held across an await, so poisoning can only come
    // from a panicking test; recover rather than cascade.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scoped names carry a `/` that must be percent-encoded in registry paths.
fn encode_package_name(name: &str) -> String {
    name.replace('/', "%2F")
}

async fn request_json(client: &Client, url: &str) -> Option<Value> {
    let response = match client
        .get(url)
        .header(header::USER_AGENT, crate::USER_AGENT)
        .header(header::ACCEPT, "application/json")
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(url, error = %err, "registry request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(url, status = %response.status(), "registry returned non-success");
        return None;
    }

    response.json().await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    const METADATA_BODY: &str = r#"{
        "name": "demo",
        "dist-tags": { "latest": "2.1.0", "lts": "1.9.4" }
    }"#;

    #[tokio::test]
    async fn concurrent_lookups_share_one_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/demo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(METADATA_BODY)
            .expect(1)
            .create_async()
            .await;

        let cache = RegistryCache::new(Client::new(), server.url());
        let (a, b) = tokio::join!(cache.latest_version("demo"), cache.latest_version("demo"));

        assert_eq!(a, Some("2.1.0".to_string()));
        assert_eq!(b, Some("2.1.0".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_fetch_does_not_poison_the_key() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/demo")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let cache = RegistryCache::new(Client::new(), server.url());
        assert_eq!(cache.latest_version("demo").await, None);
        failing.assert_async().await;

        // A later request after the in-flight record cleared retries fresh.
        let recovered = server
            .mock("GET", "/demo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(METADATA_BODY)
            .create_async()
            .await;

        assert_eq!(cache.latest_version("demo").await, Some("2.1.0".to_string()));
        recovered.assert_async().await;
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network_until_expiry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/demo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(METADATA_BODY)
            .expect(2)
            .create_async()
            .await;

        let clock = Arc::new(FakeClock::new());
        let cache =
            RegistryCache::new(Client::new(), server.url()).with_clock(Arc::clone(&clock) as _);

        assert!(cache.package_metadata("demo").await.is_some());
        assert!(cache.package_metadata("demo").await.is_some(), "cache hit");

        clock.advance(METADATA_TTL + Duration::from_secs(1));
        assert!(cache.package_metadata("demo").await.is_some(), "refetched");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn dist_tag_and_malformed_bodies() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/demo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(METADATA_BODY)
            .create_async()
            .await;
        server
            .mock("GET", "/broken")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let cache = RegistryCache::new(Client::new(), server.url());
        assert_eq!(cache.dist_tag("demo", "lts").await, Some("1.9.4".to_string()));
        assert_eq!(cache.dist_tag("demo", "beta").await, None);
        assert_eq!(cache.latest_version("broken").await, None);
    }

    #[test]
    fn scoped_names_are_encoded() {
        assert_eq!(encode_package_name("@types/node"), "@types%2Fnode");
        assert_eq!(encode_package_name("eslint"), "eslint");
    }
}
