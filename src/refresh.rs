//! Periodic re-resolution of the provider configuration
//!
//! By default a provider key rotation requires a process restart to be
//! picked up. This module, behind the `key-refresh` feature, offers the
//! opt-in alternative: a TTL on the snapshot plus rate-limited forced
//! refresh, so callers can retry a rejected token against fresh keys.
//!
//! The snapshot handed out is still the same immutable
//! [`OidcConfiguration`]; a refresh swaps the whole `Arc`, it never
//! mutates a configuration someone is already reading.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::discovery::{self, OidcConfiguration};
use crate::error::DiscoveryError;

/// Default snapshot TTL.
const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Minimum interval between re-resolutions, so a burst of rejected
/// tokens cannot turn into a burst of discovery round trips.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

struct Snapshot {
    config: Arc<OidcConfiguration>,
    resolved_at: SystemTime,
}

impl Snapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        match SystemTime::now().duration_since(self.resolved_at) {
            Ok(age) => age < ttl,
            Err(_) => false, // clock went backwards, treat as stale
        }
    }
}

/// Provider configuration that re-resolves itself after a TTL.
pub struct RefreshingConfiguration {
    discovery_url: String,
    http: reqwest::Client,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
    last_attempt: RwLock<SystemTime>,
}

impl RefreshingConfiguration {
    /// Resolve once and wrap the snapshot with the default 10-minute TTL.
    ///
    /// The initial resolution failing is fatal, exactly as with
    /// [`discovery::resolve`]: there is no configuration to serve stale.
    pub async fn resolve(discovery_url: impl Into<String>) -> Result<Self, DiscoveryError> {
        Self::resolve_with_ttl(discovery_url, DEFAULT_TTL).await
    }

    /// Resolve once with a custom TTL.
    pub async fn resolve_with_ttl(
        discovery_url: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, DiscoveryError> {
        let discovery_url = discovery_url.into();
        let http = discovery::http_client();
        let config = discovery::resolve(&http, &discovery_url).await?;
        let now = SystemTime::now();

        Ok(Self {
            discovery_url,
            http,
            ttl,
            snapshot: RwLock::new(Snapshot {
                config: Arc::new(config),
                resolved_at: now,
            }),
            last_attempt: RwLock::new(now),
        })
    }

    /// Current configuration snapshot, re-resolving first if the TTL has
    /// passed. If re-resolution fails the stale snapshot is served: a
    /// provider outage must not take down verification of tokens signed
    /// with keys we already hold.
    pub async fn snapshot(&self) -> Arc<OidcConfiguration> {
        {
            let snapshot = self.snapshot.read().await;
            if snapshot.is_fresh(self.ttl) {
                return Arc::clone(&snapshot.config);
            }
        }

        match self.refresh().await {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    discovery_url = %self.discovery_url,
                    error = %e,
                    "re-resolution failed, serving stale provider configuration"
                );
                Arc::clone(&self.snapshot.read().await.config)
            }
        }
    }

    /// Force a re-resolution, subject to the minimum refresh interval.
    ///
    /// Called rate-limited, this returns the current snapshot instead of
    /// contacting the provider again.
    pub async fn refresh(&self) -> Result<Arc<OidcConfiguration>, DiscoveryError> {
        {
            let last = *self.last_attempt.read().await;
            if let Ok(since) = SystemTime::now().duration_since(last)
                && since < MIN_REFRESH_INTERVAL
            {
                return Ok(Arc::clone(&self.snapshot.read().await.config));
            }
        }

        *self.last_attempt.write().await = SystemTime::now();

        let config = Arc::new(discovery::resolve(&self.http, &self.discovery_url).await?);
        info!(
            discovery_url = %self.discovery_url,
            key_count = config.key_ids().count(),
            "provider configuration re-resolved"
        );

        let mut snapshot = self.snapshot.write().await;
        *snapshot = Snapshot {
            config: Arc::clone(&config),
            resolved_at: SystemTime::now(),
        };

        Ok(config)
    }
}
