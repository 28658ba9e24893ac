//! Signed-assertion decoding and verification.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::errors::AuthError;

#[cfg(test)]
#[path = "assertion_tests.rs"]
mod tests;

#[derive(Deserialize)]
struct UnverifiedClaims {
    iss: String,
}

/// Extract the issuer (`iss` claim) from an assertion WITHOUT verifying
/// its signature.
///
/// The issuer is the tenant's client key, which we need before we can
/// look up the shared secret to verify against. Nothing from the
/// assertion may be trusted until [`verify_assertion`] has passed.
///
/// # Errors
///
/// Returns [`AuthError::MalformedAssertion`] when the token does not have
/// the expected structure or the claims segment is not decodable JSON.
pub fn unverified_issuer(assertion: &str) -> Result<String, AuthError> {
    let mut segments = assertion.split('.');
    let _header = segments.next().ok_or(AuthError::MalformedAssertion)?;
    let claims_segment = segments.next().ok_or(AuthError::MalformedAssertion)?;

    // The wire format strips base64 padding; restore it before decoding.
    let mut padded = claims_segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let decoded = URL_SAFE
        .decode(padded)
        .map_err(|_| AuthError::MalformedAssertion)?;
    let claims: UnverifiedClaims =
        serde_json::from_slice(&decoded).map_err(|_| AuthError::MalformedAssertion)?;

    Ok(claims.iss)
}

/// Verify an assertion's HS256 signature against the tenant's shared
/// secret, requiring the audience to be the tenant's own client key.
///
/// # Errors
///
/// Returns [`AuthError::InvalidSignature`] for a bad signature, a wrong
/// audience, or an expired assertion.
pub fn verify_assertion(
    assertion: &str,
    shared_secret: &SecretString,
    client_key: &str,
) -> Result<(), AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[client_key]);

    jsonwebtoken::decode::<serde_json::Value>(
        assertion,
        &DecodingKey::from_secret(shared_secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|_| ())
    .map_err(|source| AuthError::InvalidSignature { source })
}
