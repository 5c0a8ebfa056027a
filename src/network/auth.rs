//! Identity Resolution
//!
//! Turns a bearer JWT issued by an external provider into the `PlayerId`
//! a session sees as the requester. Tokens are only validated here, never issued.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::game::state::PlayerId;

/// Token validation settings.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Required "iss" claim, if any.
    pub issuer: Option<String>,
    /// Required "aud" claim, if any.
    pub audience: Option<String>,
    /// RS256 public key (PEM). Takes precedence over `secret`.
    pub public_key_pem: Option<String>,
    /// HS256 shared secret.
    pub secret: Option<String>,
    /// Accept expired tokens. Tests only.
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Read `AUTH_ISSUER`, `AUTH_AUDIENCE`, `AUTH_PUBLIC_KEY_PEM`, `AUTH_SECRET`
    /// and `AUTH_SKIP_EXPIRY` from the environment.
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("AUTH_ISSUER").ok(),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("AUTH_SECRET").ok(),
            skip_expiry: std::env::var("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// True if a key or secret is available.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Claims read from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Provider's user id.
    pub sub: String,
    /// Expiry (Unix seconds, 0 = none).
    #[serde(default)]
    pub exp: u64,
    /// Issued at.
    #[serde(default)]
    pub iat: u64,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience (string or list).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Stable player id: first 16 bytes of SHA-256 over a domain tag and `sub`.
    pub fn player_id(&self) -> PlayerId {
        let mut hasher = Sha256::new();
        hasher.update(b"tictac-player:");
        hasher.update(self.sub.as_bytes());
        let hash = hasher.finalize();

        let mut id = [0u8; 16];
        id.copy_from_slice(&hash[..16]);
        PlayerId::new(id)
    }
}

/// Identity resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Neither key nor secret configured.
    #[error("authentication not configured")]
    NotConfigured,
    /// Malformed token.
    #[error("invalid token format")]
    InvalidFormat,
    /// Signature mismatch.
    #[error("invalid signature")]
    InvalidSignature,
    /// Past its expiry.
    #[error("token expired")]
    Expired,
    /// Wrong issuer.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Wrong audience.
    #[error("invalid audience")]
    InvalidAudience,
    /// A claim we need is absent or empty.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Anything else the JWT library reports.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validate a JWT and return its claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let (algorithm, key) = decoding_key(config)?;

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = HashSet::new();
    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match config.audience {
        Some(ref audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let token_data: TokenData<TokenClaims> =
        decode(token, &key, &validation).map_err(map_jwt_error)?;
    let claims = token_data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // jsonwebtoken applies leeway; enforce the exact expiry as well.
    if !config.skip_expiry && claims.exp > 0 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

/// Validate a JWT and derive the requester's identity.
pub fn resolve_identity(token: &str, config: &AuthConfig) -> Result<PlayerId, AuthError> {
    validate_token(token, config).map(|claims| claims.player_id())
}

fn decoding_key(config: &AuthConfig) -> Result<(Algorithm, DecodingKey), AuthError> {
    if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
        Ok((Algorithm::RS256, key))
    } else if let Some(ref secret) = config.secret {
        Ok((Algorithm::HS256, DecodingKey::from_secret(secret.as_bytes())))
    } else {
        Err(AuthError::NotConfigured)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}
