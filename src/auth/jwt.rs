use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::config::JwtConfig;

/// Every token is signed and verified with this algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Signing and verification keys derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: cfg.expiry,
        }
    }

    /// Issues a token whose subject is `email` and whose payload carries `user_id`.
    pub fn sign(&self, email: &str, user_id: i32) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: email.to_string(),
            user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(ALGORITHM);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64ct::{Base64UrlUnpadded, Encoding};

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            expiry: Duration::from_secs(600),
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("test-jwt-secret");
        let token = keys.sign("robin@example.com", 7).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "robin@example.com");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("bad-secret").sign("robin@example.com", 7).unwrap();
        let err = make_keys("test-jwt-secret").verify(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn verify_rejects_altered_payload() {
        let keys = make_keys("test-jwt-secret");
        let token = keys.sign("robin@example.com", 7).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = Claims {
            sub: "fox@example.com".into(),
            user_id: 8,
            iat: 0,
            exp: usize::MAX / 2,
        };
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], payload, parts[2]);
        assert_eq!(keys.verify(&tampered).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("test-jwt-secret");
        let past = (OffsetDateTime::now_utc().unix_timestamp() - 3600) as usize;
        let claims = Claims {
            sub: "robin@example.com".into(),
            user_id: 7,
            iat: past - 600,
            exp: past,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &keys.encoding).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("test-jwt-secret");
        assert_eq!(keys.verify("not-a-token").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let keys = make_keys("test-jwt-secret");
        let claims = Claims {
            sub: "robin@example.com".into(),
            user_id: 7,
            iat: 0,
            exp: usize::MAX / 2,
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &keys.encoding).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }
}
