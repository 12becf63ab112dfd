// Session tokens: the signed claims live in the `session` cookie, so the
// server keeps no per-session state.
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorMessage;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    user_id: &str,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires_in_seconds)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Returns the user id carried by a valid, unexpired token.
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<Uuid, ErrorMessage> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| ErrorMessage::InvalidToken)?;

    Uuid::parse_str(&decoded.claims.sub).map_err(|_| ErrorMessage::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn token_carries_user_id() {
        let user_id = Uuid::new_v4();
        let token = create_token(&user_id.to_string(), SECRET, 60).unwrap();
        assert_eq!(decode_token(token, SECRET).unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(&Uuid::new_v4().to_string(), SECRET, 60).unwrap();
        assert_eq!(
            decode_token(token, b"other-secret"),
            Err(ErrorMessage::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token(&Uuid::new_v4().to_string(), SECRET, -3600).unwrap();
        assert_eq!(decode_token(token, SECRET), Err(ErrorMessage::InvalidToken));
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(create_token("", SECRET, 60).is_err());
    }
}
