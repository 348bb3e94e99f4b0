//! Token verification against keys published by the mock provider
//!
//! The resolver tests cover how the key map is built; these cover the
//! verification gate itself with real RS256 signatures.

mod common;

use std::collections::HashMap;

use basin_auth::{OidcConfiguration, TokenFormatError, TokenValidationError, VerifyError, verify};
use common::{ProviderKey, now, provider_key, valid_claims};
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::Jwk;
use serde_json::json;
use url::Url;

const ISSUER: &str = "https://login.example.com/tenant/v2.0";
const AUDIENCE: &str = "api://basin";

fn config_with(keys: &[&ProviderKey]) -> OidcConfiguration {
    let mut map = HashMap::new();
    for key in keys {
        let jwk: Jwk = serde_json::from_value(key.jwk()).unwrap();
        map.insert(key.kid.clone(), DecodingKey::from_jwk(&jwk).unwrap());
    }
    OidcConfiguration::new(
        ISSUER,
        Url::parse("https://login.example.com/token").unwrap(),
        map,
    )
}

#[test]
fn valid_token_is_returned_unchanged() {
    let key = provider_key();
    let config = config_with(&[key]);
    let token = key.sign(&valid_claims(ISSUER, AUDIENCE));

    let verified = verify(&token, &config, AUDIENCE).unwrap();
    assert_eq!(verified, token);
}

#[test]
fn wrong_audience_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);
    let token = key.sign(&valid_claims(ISSUER, "api://someone-else"));

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::AudienceMismatch)
    ));
}

#[test]
fn wrong_issuer_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);
    let token = key.sign(&valid_claims("https://rogue.example.com", AUDIENCE));

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::IssuerMismatch)
    ));
}

#[test]
fn expired_token_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);
    let mut claims = valid_claims(ISSUER, AUDIENCE);
    // Well past the library's clock-skew leeway.
    claims["exp"] = json!(now() - 600);
    let token = key.sign(&claims);

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::Expired)
    ));
}

#[test]
fn token_not_yet_valid_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);
    let mut claims = valid_claims(ISSUER, AUDIENCE);
    claims["nbf"] = json!(now() + 600);
    let token = key.sign(&claims);

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::Expired)
    ));
}

#[test]
fn token_without_time_claims_is_accepted() {
    let key = provider_key();
    let config = config_with(&[key]);
    let token = key.sign(&json!({
        "sub": "user-123",
        "iss": ISSUER,
        "aud": AUDIENCE,
    }));

    assert!(verify(&token, &config, AUDIENCE).is_ok());
}

#[test]
fn hs256_token_with_known_kid_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);
    // Header declares HS256 and names a kid that exists in the map; the
    // RS256 pin must reject it before any HMAC math could "succeed".
    let token = key.sign_hs256(&valid_claims(ISSUER, AUDIENCE));

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::BadSignature(_))
    ));
}

#[test]
fn token_signed_by_an_impostor_key_is_rejected() {
    let key = provider_key();
    let config = config_with(&[key]);

    // Same kid, different keypair: the signature cannot check out.
    let impostor = ProviderKey::generate(&key.kid);
    let token = impostor.sign(&valid_claims(ISSUER, AUDIENCE));

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Validation(TokenValidationError::BadSignature(_))
    ));
}

#[test]
fn unknown_kid_is_rejected_before_any_crypto() {
    let key = provider_key();
    let config = config_with(&[]);
    let token = key.sign(&valid_claims(ISSUER, AUDIENCE));

    let err = verify(&token, &config, AUDIENCE).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Format(TokenFormatError::UnknownKid)
    ));
}
