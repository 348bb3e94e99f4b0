//! Per-request authorization façade
//!
//! Bundles the resolved provider configuration, the OAuth client
//! settings, and the shared HTTP client behind one value the HTTP layer
//! clones into every request handler. Holds no mutable state.

use std::sync::Arc;

use crate::config::OauthSettings;
use crate::discovery::{self, OidcConfiguration};
use crate::error::{DiscoveryError, ExchangeError, VerifyError};
use crate::{exchange, verifier};

/// Verifies inbound bearer tokens and performs On-Behalf-Of exchanges.
///
/// Cheap to clone; the configuration snapshot is shared, the HTTP client
/// pools connections across clones.
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: Arc<OidcConfiguration>,
    settings: OauthSettings,
    http: reqwest::Client,
}

impl Authenticator {
    /// Resolve the provider named by `settings.authority` and build the
    /// authenticator around the snapshot.
    ///
    /// # Errors
    ///
    /// Any [`DiscoveryError`]; the hosting process should treat it as
    /// fatal and exit non-zero.
    pub async fn resolve(settings: OauthSettings) -> Result<Self, DiscoveryError> {
        let http = discovery::http_client();
        let config = discovery::resolve(&http, &settings.authority).await?;
        Ok(Self {
            config: Arc::new(config),
            settings,
            http,
        })
    }

    /// Build around an already-resolved configuration.
    pub fn with_configuration(settings: OauthSettings, config: Arc<OidcConfiguration>) -> Self {
        Self {
            config,
            settings,
            http: discovery::http_client(),
        }
    }

    /// Verify an inbound bearer token, returning it unchanged on success.
    pub fn verify<'t>(&self, token: &'t str) -> Result<&'t str, VerifyError> {
        verifier::verify(token, &self.config, &self.settings.audience)
    }

    /// Exchange a verified token for the configured default scope.
    pub async fn exchange_default(&self, token: &str) -> Result<String, ExchangeError> {
        self.exchange_scoped(token, &self.settings.scope).await
    }

    /// Exchange a verified token for an explicit downstream scope.
    pub async fn exchange_scoped(
        &self,
        token: &str,
        scope: &str,
    ) -> Result<String, ExchangeError> {
        exchange::exchange(&self.http, token, scope, &self.config, &self.settings).await
    }

    /// The resolved provider configuration snapshot.
    pub fn configuration(&self) -> &OidcConfiguration {
        &self.config
    }
}
