//! # Basin Auth - bearer-token authorization for the Basin data API
//!
//! Authorizes inbound API calls by validating bearer JWTs issued by an
//! external OpenID Connect provider, and obtains downstream-scoped
//! credentials via the OAuth2 On-Behalf-Of grant so the API can act as
//! the authenticated user against the storage backend.
//!
//! ## Architecture
//!
//! Three components, leaves first:
//!
//! - [`discovery`] - fetches the provider's discovery document and JWKS
//!   once, producing the immutable [`OidcConfiguration`] snapshot
//! - [`verifier`] - validates a token's signature, issuer, and audience
//!   against the snapshot; pure, no I/O
//! - [`exchange`] - swaps a verified token for a downstream-scoped
//!   access token at the provider's token endpoint
//!
//! [`Authenticator`] bundles all three behind one cloneable value for
//! the hosting HTTP layer. Routing, header extraction, and configuration
//! loading stay outside this crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use basin_auth::{Authenticator, OauthSettings};
//!
//! # async fn run(settings: OauthSettings) -> Result<(), Box<dyn std::error::Error>> {
//! // At startup; a failure here should abort the process.
//! let auth = Authenticator::resolve(settings).await?;
//!
//! // Per request:
//! let token = "eyJ0eXAiOiJKV1QiLCJhbGc...";
//! auth.verify(token)?;
//! let downstream = auth.exchange_default(token).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Invariants
//!
//! - **RS256 only.** No other signing algorithm is ever accepted, no
//!   matter what the token header declares.
//! - Only RSA keys from the provider's JWKS enter the key map; symmetric
//!   entries are excluded at resolution time.
//! - The client secret lives in a [`secrecy::SecretString`] and is
//!   exposed only while the exchange form body is built; it appears in
//!   no error, no log field, no `Debug` output.
//! - Callers see coarse rejection categories (403 for verification, 401
//!   for exchange); full detail stays in the server-side `tracing` log.
//!
//! ## Feature Flags
//!
//! - `key-refresh` - opt-in TTL-based re-resolution of the provider
//!   configuration ([`refresh`]). Without it, a provider key rotation
//!   requires a process restart.

pub mod authenticator;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exchange;
#[cfg(feature = "key-refresh")]
pub mod refresh;
pub mod verifier;

#[doc(inline)]
pub use authenticator::Authenticator;
#[doc(inline)]
pub use config::{DEFAULT_SCOPE, OauthSettings};
#[doc(inline)]
pub use discovery::{OidcConfiguration, resolve};
#[doc(inline)]
pub use error::{
    DiscoveryError, ExchangeError, TokenFormatError, TokenValidationError, VerifyError,
};
#[doc(inline)]
pub use exchange::exchange;
#[cfg(feature = "key-refresh")]
#[doc(inline)]
pub use refresh::RefreshingConfiguration;
#[doc(inline)]
pub use verifier::verify;
