use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::MAX_SESSION_HOURS;

/// Claims carried by the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sid: Uuid,
    pub user: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sid: Uuid, user: String, now: DateTime<Utc>, max_hours: u64) -> Self {
        let hours = max_hours.min(MAX_SESSION_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sid,
            user,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::TokenGeneration(msg) => write!(f, "Session token generation error: {}", msg),
            AuthError::InvalidToken(msg) => write!(f, "Invalid session token: {}", msg),
            AuthError::InvalidSecret => write!(f, "Invalid session secret"),
        }
    }
}

impl std::error::Error for AuthError {}

pub fn issue_session_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_session_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Anti-forgery token bound to one session: hex SHA-256 of the session id
/// and the server secret
pub fn csrf_token_for(sid: &Uuid, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sid.as_bytes());
    hasher.update(b":csrf:");
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compares two tokens without short-circuiting on the first mismatch
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .bytes()
        .zip(provided.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip_keeps_claims() {
        let sid = Uuid::new_v4();
        let claims = Claims::new(sid, "alice".to_string(), Utc::now(), 1);
        let token = issue_session_token(&claims, SECRET).unwrap();
        let decoded = decode_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.sid, sid);
        assert_eq!(decoded.user, "alice");
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), Utc::now(), 1);
        let token = issue_session_token(&claims, SECRET).unwrap();
        assert!(matches!(
            decode_session_token(&token, "other-secret"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), issued, 1);
        let token = issue_session_token(&claims, SECRET).unwrap();
        assert!(decode_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_huge_lifetime_is_clamped() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), now, u64::MAX);
        let max = (now + Duration::hours(MAX_SESSION_HOURS as i64)).timestamp();
        assert_eq!(claims.exp, max);
    }

    #[test]
    fn test_empty_secret_refused() {
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), Utc::now(), 1);
        assert!(matches!(issue_session_token(&claims, ""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn test_csrf_token_is_per_session() {
        let a = csrf_token_for(&Uuid::new_v4(), SECRET);
        let b = csrf_token_for(&Uuid::new_v4(), SECRET);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(tokens_match(&a, &a.clone()));
        assert!(!tokens_match(&a, &b));
        assert!(!tokens_match(&a, "short"));
    }
}
