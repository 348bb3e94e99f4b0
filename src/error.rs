//! Error taxonomy for the authorization core
//!
//! Three groups, matching the three operations:
//!
//! - [`DiscoveryError`] - resolution of the provider configuration failed.
//!   Unrecoverable: nothing can ever be verified without the provider's
//!   keys, so the hosting process should treat this as fatal at startup.
//! - [`VerifyError`] - an inbound bearer token was rejected. Surfaced to
//!   the caller as 403 Forbidden.
//! - [`ExchangeError`] - the On-Behalf-Of exchange failed. Surfaced to the
//!   caller as 401 Unauthorized.
//!
//! # Propagation contract
//!
//! `Display` exposes only the coarse category. Full technical detail
//! (decode errors, upstream status codes, raw provider bodies) is logged
//! server-side via `tracing` at the point of failure and chained through
//! `#[source]` where available. The client secret never appears in any
//! error value or log field.

use http::StatusCode;

/// Failure while resolving the provider's discovery document or JWKS.
///
/// Every variant is fatal for the authorization subsystem: the process
/// should refuse to start rather than run without verifiable keys.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The discovery endpoint could not be reached at all.
    #[error("could not connect to oidc provider")]
    ConnectionFailure(#[source] reqwest::Error),

    /// The discovery endpoint answered, but not with a usable document
    /// (non-success status, unparseable body, or a required field missing).
    #[error("invalid discovery document")]
    InvalidDocument(#[source] Option<reqwest::Error>),

    /// The JWKS endpoint named by the discovery document could not be
    /// fetched or its body could not be parsed.
    #[error("jwks fetch failed")]
    JwksFetchFailure(#[source] Option<reqwest::Error>),
}

/// Structural rejection: the token could not even be matched to a key.
#[derive(Debug, thiserror::Error)]
pub enum TokenFormatError {
    /// The header segment is not base64-encoded JSON.
    #[error("malformed token header")]
    MalformedHeader(#[source] jsonwebtoken::errors::Error),

    /// The header carries no `kid` claim.
    #[error("token header missing kid")]
    MissingKid,

    /// The `kid` does not name any published signing key.
    #[error("unknown signing key")]
    UnknownKid,
}

/// Cryptographic or claims rejection of a structurally sound token.
#[derive(Debug, thiserror::Error)]
pub enum TokenValidationError {
    /// Signature verification failed, or the header declared an
    /// algorithm other than RS256.
    #[error("invalid token signature")]
    BadSignature(#[source] jsonwebtoken::errors::Error),

    /// The `iss` claim does not exactly match the provider's issuer.
    #[error("token issuer mismatch")]
    IssuerMismatch,

    /// The `aud` claim does not exactly match the expected audience.
    #[error("token audience mismatch")]
    AudienceMismatch,

    /// The token is expired (`exp`) or not yet valid (`nbf`).
    #[error("token expired or not yet valid")]
    Expired,
}

/// Rejection of an inbound bearer token.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Format(#[from] TokenFormatError),

    #[error(transparent)]
    Validation(#[from] TokenValidationError),
}

impl VerifyError {
    /// HTTP status the surrounding layer should answer with.
    ///
    /// Every verification rejection is an authorization denial, never a
    /// hint about which step failed.
    pub fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

/// Failure of the On-Behalf-Of exchange against the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The token endpoint answered with a non-success status. The raw
    /// provider body is logged server-side, never carried here.
    #[error("token endpoint rejected request")]
    ProviderRejected {
        /// Status returned by the provider.
        status: StatusCode,
    },

    /// The token endpoint answered 2xx with a body that is not JSON.
    #[error("malformed token endpoint response")]
    MalformedResponse,

    /// The response parsed but carries no `access_token` field.
    #[error("token endpoint response missing access_token")]
    MissingAccessToken,

    /// The token endpoint could not be reached.
    #[error("could not reach token endpoint")]
    ConnectionFailure(#[source] reqwest::Error),
}

impl ExchangeError {
    /// HTTP status the surrounding layer should answer with.
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}
