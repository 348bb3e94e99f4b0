//! On-Behalf-Of token exchange
//!
//! Exchanges a verified user token for a new access token scoped to a
//! downstream resource, via the OAuth2 JWT-bearer grant
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer` with
//! `requested_token_use=on_behalf_of`).
//!
//! Nothing is cached: every call is a fresh round trip to the token
//! endpoint, even for a (token, scope) pair exchanged moments earlier.
//! Memoization, if ever wanted, is the caller's concern.
//!
//! The provider's error bodies are logged server-side for diagnosis but
//! never carried in the returned error, and the client secret leaves the
//! [`SecretString`](secrecy::SecretString) only for the duration of the
//! form-body build.

use http::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::OauthSettings;
use crate::discovery::OidcConfiguration;
use crate::error::ExchangeError;

const GRANT_TYPE_JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Provider success body. Everything but `access_token` is ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchange a verified token for a downstream-scoped access token.
///
/// POSTs the urlencoded JWT-bearer On-Behalf-Of grant to the provider's
/// token endpoint and returns the new access token.
///
/// # Errors
///
/// - [`ExchangeError::ConnectionFailure`] - the token endpoint was
///   unreachable
/// - [`ExchangeError::ProviderRejected`] - it answered non-2xx
/// - [`ExchangeError::MalformedResponse`] - it answered 2xx with a body
///   that is not JSON
/// - [`ExchangeError::MissingAccessToken`] - the body parsed but has no
///   `access_token`
///
/// All surface to callers as 401 Unauthorized.
pub async fn exchange(
    http: &reqwest::Client,
    token: &str,
    scope: &str,
    config: &OidcConfiguration,
    settings: &OauthSettings,
) -> Result<String, ExchangeError> {
    let form = [
        ("grant_type", GRANT_TYPE_JWT_BEARER),
        ("client_id", settings.client_id.as_str()),
        ("client_secret", settings.client_secret.expose_secret()),
        ("assertion", token),
        ("scope", scope),
        ("requested_token_use", "on_behalf_of"),
    ];

    let response = http
        .post(config.token_endpoint().clone())
        .form(&form)
        .send()
        .await
        .map_err(|e| {
            error!(
                token_endpoint = %config.token_endpoint(),
                error = %e,
                "could not reach token endpoint for obo exchange"
            );
            ExchangeError::ConnectionFailure(e)
        })?;

    let status: StatusCode = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        // Full provider body goes to the server log only; the caller
        // sees nothing beyond the rejection category.
        error!(%status, provider_response = %body, "token endpoint rejected obo exchange");
        return Err(ExchangeError::ProviderRejected { status });
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "token endpoint returned a non-JSON success body");
        ExchangeError::MalformedResponse
    })?;

    let access_token = parsed.access_token.ok_or_else(|| {
        error!("token endpoint success body is missing access_token");
        ExchangeError::MissingAccessToken
    })?;

    debug!(scope, "obo exchange succeeded");
    Ok(access_token)
}
