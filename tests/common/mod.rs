//! Common test utilities for integration tests
//!
//! A mock OIDC provider (discovery document, JWKS, token endpoint) plus
//! an RS256 keypair for signing test tokens against the published JWKS.

#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An RS256 signing key together with its published JWK form.
pub struct ProviderKey {
    pub kid: String,
    private_pem: String,
    n: String,
    e: String,
}

impl ProviderKey {
    /// Generate a fresh 2048-bit RSA keypair.
    pub fn generate(kid: &str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate RSA key");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("failed to encode private key")
            .to_string();

        Self {
            kid: kid.to_string(),
            private_pem,
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    /// The public half as a JWK, as a provider would publish it.
    pub fn jwk(&self) -> serde_json::Value {
        json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": self.kid,
            "n": self.n,
            "e": self.e,
        })
    }

    /// Sign claims into an RS256 token carrying this key's `kid`.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes())
            .expect("invalid RSA private key");
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &key).expect("failed to sign test token")
    }

    /// Sign claims with HS256 but keep this key's `kid` in the header,
    /// imitating an algorithm-confusion attempt.
    pub fn sign_hs256(&self, claims: &serde_json::Value) -> String {
        let key = EncodingKey::from_secret(b"not-the-rsa-key");
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &key).expect("failed to sign test token")
    }
}

/// The signing key shared by most tests. Generated once; RSA keygen is
/// too slow to repeat per test.
pub fn provider_key() -> &'static ProviderKey {
    static KEY: OnceLock<ProviderKey> = OnceLock::new();
    KEY.get_or_init(|| ProviderKey::generate("test-signing-key"))
}

/// Mock OIDC provider backed by wiremock.
pub struct MockProvider {
    pub server: MockServer,
    pub discovery_url: String,
    pub jwks_url: String,
    pub token_url: String,
    pub issuer: String,
}

impl MockProvider {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base = server.uri();

        Self {
            discovery_url: format!("{base}/.well-known/openid-configuration"),
            jwks_url: format!("{base}/keys"),
            token_url: format!("{base}/token"),
            issuer: base.clone(),
            server,
        }
    }

    /// Serve the standard discovery document naming this server's own
    /// JWKS and token endpoints.
    pub async fn mock_discovery(&self) {
        self.mock_discovery_body(json!({
            "issuer": self.issuer,
            "jwks_uri": self.jwks_url,
            "token_endpoint": self.token_url,
        }))
        .await;
    }

    /// Serve an arbitrary discovery body.
    pub async fn mock_discovery_body(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a JWKS with the given key entries.
    pub async fn mock_jwks(&self, keys: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .mount(&self.server)
            .await;
    }

    /// Serve the token endpoint with a fixed response.
    pub async fn mock_token(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

/// Current Unix timestamp.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

/// Standard claims for a token that should verify: matching issuer and
/// audience, one hour to expiry.
pub fn valid_claims(issuer: &str, audience: &str) -> serde_json::Value {
    json!({
        "sub": "user-123",
        "iss": issuer,
        "aud": audience,
        "exp": now() + 3600,
        "iat": now(),
    })
}
