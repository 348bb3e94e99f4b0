//! Bearer token verification
//!
//! The verifier is a gate, not a claims extractor: on success the caller
//! gets the original token string back, untouched. Anything that needs
//! the claims re-decodes the token itself.
//!
//! Verification is a pure read of the shared [`OidcConfiguration`]; it
//! performs no I/O and is safe to call from arbitrarily many concurrent
//! requests without synchronization.
//!
//! # Security Considerations
//!
//! Only RS256 is ever accepted. The algorithm the header *declares* is
//! irrelevant: verification is pinned to RS256 before any cryptography
//! runs, so a token claiming HS256 (or `none`) is rejected outright.
//! This closes the classic algorithm-confusion attack where a public RSA
//! key is abused as an HMAC secret.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use tracing::{debug, warn};

use crate::discovery::OidcConfiguration;
use crate::error::{TokenFormatError, TokenValidationError, VerifyError};

/// Verify an inbound bearer token against the provider configuration.
///
/// Checks run in order, short-circuiting on the first failure:
///
/// 1. base64/JSON-decode the header segment (signature not yet checked)
/// 2. the header must carry a `kid`
/// 3. the `kid` must name a published signing key
/// 4. RS256 signature, exact `iss` and `aud` match, and `exp`/`nbf`
///    when the token carries them
///
/// # Errors
///
/// A [`TokenFormatError`] for steps 1-3, a [`TokenValidationError`] for
/// step 4; both surface to callers as an authorization denial.
pub fn verify<'t>(
    token: &'t str,
    config: &OidcConfiguration,
    expected_audience: &str,
) -> Result<&'t str, VerifyError> {
    let header = decode_header(token).map_err(|e| {
        warn!(error = %e, "bearer token header did not decode");
        TokenFormatError::MalformedHeader(e)
    })?;

    let kid = header.kid.ok_or_else(|| {
        warn!("bearer token header carries no kid");
        TokenFormatError::MissingKid
    })?;

    let key = config.key(&kid).ok_or_else(|| {
        warn!(kid, "bearer token kid matches no published signing key");
        TokenFormatError::UnknownKid
    })?;

    // RS256 only; the header's declared algorithm never widens this.
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[config.issuer()]);
    validation.set_audience(&[expected_audience]);
    // exp and nbf are checked whenever present, but neither is required.
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_nbf = true;

    decode::<serde_json::Value>(token, key, &validation).map_err(|e| {
        warn!(
            kid,
            error = %e,
            issuer = config.issuer(),
            audience = expected_audience,
            "bearer token failed validation"
        );
        classify(e)
    })?;

    debug!(kid, "bearer token verified");
    Ok(token)
}

/// Map the JWT library's failure onto the rejection taxonomy.
fn classify(error: jsonwebtoken::errors::Error) -> VerifyError {
    let known = match error.kind() {
        ErrorKind::InvalidIssuer => Some(TokenValidationError::IssuerMismatch),
        ErrorKind::InvalidAudience => Some(TokenValidationError::AudienceMismatch),
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
            Some(TokenValidationError::Expired)
        }
        // InvalidSignature, InvalidAlgorithm, and anything else the
        // library surfaces: the token is cryptographically unacceptable.
        _ => None,
    };
    known
        .unwrap_or_else(|| TokenValidationError::BadSignature(error))
        .into()
}
