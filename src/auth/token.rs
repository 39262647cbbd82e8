use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Session token lifetime; must match the session cookie max-age
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Signed token payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject (user id)
    sub: String,
    /// Issued at timestamp
    iat: u64,
    /// Expiration timestamp
    exp: u64,
}

/// Issues and verifies signed session tokens.
///
/// Keys are derived once from the configured secret at startup and are
/// immutable for the life of the process. Tokens are not tracked server-side:
/// validity is entirely a function of signature and expiry.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token for the subject, expiring in [`TOKEN_TTL_DAYS`]
    pub fn issue(&self, subject: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        self.issue_at(subject, now, now + Duration::days(TOKEN_TTL_DAYS))
    }

    fn issue_at(
        &self,
        subject: Uuid,
        issued: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued.timestamp().max(0) as u64,
            exp: expires.timestamp().max(0) as u64,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Creation)
    }

    /// Verify a presented token and return its subject.
    ///
    /// Bad signature, expiry, and malformed input all collapse into the same
    /// [`TokenError::Invalid`]; the distinct cause is logged at debug level
    /// and never surfaced to the caller.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!("token rejected: {}", e);
            TokenError::Invalid
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|e| {
            debug!("token subject unparsable: {}", e);
            TokenError::Invalid
        })
    }
}

/// Token errors
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token invalid")]
    Invalid,
    #[error("token creation failed")]
    Creation,
}
