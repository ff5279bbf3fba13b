//! Signed-token codec: compact tokens carrying a claim set and expiry.
//!
//! `encode`/`decode` are pure sign/verify without expiry enforcement;
//! `validate` additionally requires the `exp` claim and enforces it with
//! leeway against an injected clock reading, so temporal behavior stays
//! deterministic under test.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::TokenError;

/// Claims carried by both session tokens. Unknown claims are ignored on
/// decode.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPayload {
    /// Client address at issuance.
    pub ip: String,
    pub user_id: String,
    /// Opaque cross-check claim minted at login and carried through every
    /// rotation.
    pub token: String,
    /// Session id; doubles as the stable client-visible identifier.
    pub uid: String,
    /// Lifetime in minutes used to derive `exp`.
    pub age: i64,
    /// Absolute expiry, epoch seconds. Standard claim; required by
    /// [`TokenCodec::validate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Signs and verifies compact tokens with a process-wide secret and a
/// single fixed algorithm. Pure and stateless; safe to share.
pub struct TokenCodec {
    header: Header,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    leeway_ms: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, algorithm: Algorithm, leeway_minutes: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            header: Header::new(algorithm),
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            leeway_ms: leeway_minutes * 60_000,
        }
    }

    /// Sign a claim set into a compact token.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&self.header, claims, &self.encoding_key).map_err(into_token_error)
    }

    /// Verify the signature and recover the claims without enforcing
    /// expiry. Used for inspection, e.g. reading the identity out of an
    /// already-expired access token on the refresh path.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding_key, &self.relaxed_validation())
            .map(|data| data.claims)
            .map_err(into_token_error)
    }

    /// Verify the signature and enforce the `exp` claim with leeway.
    /// The claim must be present.
    pub fn validate(&self, token: &str, now_ms: i64) -> Result<TokenPayload, TokenError> {
        let payload: TokenPayload = self.decode(token)?;
        let Some(exp) = payload.exp else {
            return Err(TokenError::MissingClaim("exp"));
        };
        if now_ms > exp * 1000 + self.leeway_ms {
            return Err(TokenError::Expired);
        }
        Ok(payload)
    }

    /// Best-effort shape check: does the string parse as a token payload at
    /// all? Neither signature nor expiry is checked. The guard uses this as
    /// its minimal refresh-token sanity test on the active path.
    #[must_use]
    pub fn is_well_formed(&self, token: &str) -> bool {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        decode::<serde_json::Value>(token, &self.decoding_key, &validation).is_ok()
    }

    fn relaxed_validation(&self) -> Validation {
        // Expiry is enforced separately against the injected clock.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }
}

fn into_token_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        _ => TokenError::Malformed(err.to_string()),
    }
}
