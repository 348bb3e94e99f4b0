//! OAuth client settings
//!
//! The surrounding process owns configuration loading; this crate only
//! defines the shape it consumes. The client secret is held as a
//! [`SecretString`] so it is zeroized on drop and redacted from `Debug`
//! output; it is exposed exactly once, while the On-Behalf-Of form body
//! is built.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Downstream scope requested when the caller does not name one.
///
/// The API acts as the user against the storage backend, so the default
/// is the storage service's impersonation scope.
pub const DEFAULT_SCOPE: &str = "https://storage.azure.com/user_impersonation";

/// Static OAuth client settings for one identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthSettings {
    /// Discovery URL for the provider, e.g.
    /// `https://login.example.com/tenant/v2.0/.well-known/openid-configuration`.
    pub authority: String,
    /// Client ID of this API's app registration.
    pub client_id: String,
    /// Client secret (stored securely, zeroized on drop).
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub client_secret: SecretString,
    /// Audience inbound tokens must carry in `aud`.
    pub audience: String,
    /// Default scope for the On-Behalf-Of exchange.
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

// Custom serialization for SecretString
fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use secrecy::ExposeSecret;
    serializer.serialize_str(secret.expose_secret())
}

// Custom deserialization for SecretString
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}
