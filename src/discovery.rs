//! OIDC discovery resolution
//!
//! Fetches the provider's discovery document and its JWKS, producing the
//! immutable [`OidcConfiguration`] snapshot every later verification and
//! exchange reads. Resolution happens once, at startup: a failure here
//! means no request can ever be authorized, so the hosting process should
//! treat it as fatal rather than retry at runtime.
//!
//! # Security Considerations
//!
//! - Only RSA keys are admitted into the key map; symmetric ("oct")
//!   entries in the JWKS are excluded so they can never be selected by a
//!   forged `kid`.
//! - Both outbound calls carry a bounded timeout; an unresponsive
//!   provider fails startup instead of hanging it.

use std::collections::HashMap;
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::Jwk;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use crate::error::DiscoveryError;

/// Timeout applied to every outbound HTTP call this crate makes.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// OIDC discovery document (partial)
///
/// Only the fields this crate consumes; everything else the provider
/// publishes is ignored. All three are required: a document missing any
/// of them is rejected before the JWKS endpoint is contacted.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    pub token_endpoint: String,
}

/// JWKS response body. Entries are kept as raw JSON so that exotic key
/// types the JWT library does not model cannot poison the whole parse.
#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<serde_json::Value>,
}

/// Immutable snapshot of the provider configuration.
///
/// Built once by [`resolve`] and shared read-only afterwards; safe for
/// concurrent access from arbitrarily many requests without locking.
#[derive(Clone)]
pub struct OidcConfiguration {
    issuer: String,
    token_endpoint: Url,
    public_keys: HashMap<String, DecodingKey>,
}

// Manual Debug: DecodingKey carries no Debug, and key material does not
// belong in logs anyway. Key IDs are enough for diagnosis.
impl std::fmt::Debug for OidcConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfiguration")
            .field("issuer", &self.issuer)
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("key_ids", &self.key_ids().collect::<Vec<_>>())
            .finish()
    }
}

impl OidcConfiguration {
    /// Assemble a configuration from already-known parts.
    ///
    /// [`resolve`] is the normal constructor; this one exists for tests
    /// and for deployments that pin keys out of band.
    pub fn new(
        issuer: impl Into<String>,
        token_endpoint: Url,
        public_keys: HashMap<String, DecodingKey>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            token_endpoint,
            public_keys,
        }
    }

    /// Issuer string inbound tokens must match exactly in `iss`.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Token endpoint the On-Behalf-Of exchange POSTs to.
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    /// Look up a published signing key by its `kid`.
    pub fn key(&self, kid: &str) -> Option<&DecodingKey> {
        self.public_keys.get(kid)
    }

    /// IDs of all published signing keys.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.public_keys.keys().map(String::as_str)
    }
}

/// HTTP client with the crate-wide request timeout applied.
///
/// Build one per process and share it: `reqwest::Client` is an `Arc`
/// internally and reuses connections across clones.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

/// Resolve the provider configuration from its discovery URL.
///
/// Issues exactly two GETs - the discovery document, then the JWKS it
/// names - with no retries. The JWKS endpoint is never contacted if the
/// discovery document is unusable.
///
/// # Errors
///
/// - [`DiscoveryError::ConnectionFailure`] - the discovery endpoint was
///   unreachable
/// - [`DiscoveryError::InvalidDocument`] - it answered with a non-success
///   status or a body missing `issuer`, `jwks_uri`, or `token_endpoint`
/// - [`DiscoveryError::JwksFetchFailure`] - the JWKS could not be
///   fetched or parsed into at least a usable set of RSA keys
pub async fn resolve(
    http: &reqwest::Client,
    discovery_url: &str,
) -> Result<OidcConfiguration, DiscoveryError> {
    let response = http.get(discovery_url).send().await.map_err(|e| {
        error!(discovery_url, error = %e, "could not connect to oidc provider");
        DiscoveryError::ConnectionFailure(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(discovery_url, %status, "discovery endpoint returned error status");
        return Err(DiscoveryError::InvalidDocument(None));
    }

    let document: DiscoveryDocument = response.json().await.map_err(|e| {
        error!(discovery_url, error = %e, "invalid discovery document");
        DiscoveryError::InvalidDocument(Some(e))
    })?;

    let token_endpoint = Url::parse(&document.token_endpoint).map_err(|e| {
        error!(discovery_url, error = %e, "discovery document carries an unparseable token_endpoint");
        DiscoveryError::InvalidDocument(None)
    })?;

    let public_keys = fetch_jwks(http, &document.jwks_uri).await?;

    info!(
        issuer = %document.issuer,
        key_count = public_keys.len(),
        "resolved oidc provider configuration"
    );

    Ok(OidcConfiguration {
        issuer: document.issuer,
        token_endpoint,
        public_keys,
    })
}

/// Fetch the JWKS and build the `kid` -> RSA key map.
///
/// Non-RSA entries are excluded; entries without a `kid` are skipped
/// (the map is addressed by `kid`, so an unaddressable key could never
/// verify anything). A duplicate `kid` keeps the later entry.
async fn fetch_jwks(
    http: &reqwest::Client,
    jwks_uri: &str,
) -> Result<HashMap<String, DecodingKey>, DiscoveryError> {
    let response = http.get(jwks_uri).send().await.map_err(|e| {
        error!(jwks_uri, error = %e, "could not connect to jwks endpoint");
        DiscoveryError::JwksFetchFailure(Some(e))
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(jwks_uri, %status, "jwks endpoint returned error status");
        return Err(DiscoveryError::JwksFetchFailure(None));
    }

    let jwks: JwksDocument = response.json().await.map_err(|e| {
        error!(jwks_uri, error = %e, "jwks body is not a key set");
        DiscoveryError::JwksFetchFailure(Some(e))
    })?;

    build_key_map(jwks)
}

fn build_key_map(jwks: JwksDocument) -> Result<HashMap<String, DecodingKey>, DiscoveryError> {
    let mut public_keys = HashMap::new();

    for entry in jwks.keys {
        if entry.get("kty").and_then(serde_json::Value::as_str) != Some("RSA") {
            debug!("skipping non-RSA jwks entry");
            continue;
        }

        let Some(kid) = entry
            .get("kid")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
        else {
            debug!("skipping RSA jwks entry without kid");
            continue;
        };

        let jwk: Jwk = serde_json::from_value(entry).map_err(|e| {
            error!(kid, error = %e, "jwks entry is not a valid RSA key");
            DiscoveryError::JwksFetchFailure(None)
        })?;

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            error!(kid, error = %e, "could not construct RSA public key from jwk");
            DiscoveryError::JwksFetchFailure(None)
        })?;

        public_keys.insert(kid, key);
    }

    Ok(public_keys)
}
