use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use pixio_core::error::{PixioError, Result};

use super::TokenValidator;

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    user_id: String,
    exp: u64,
}

/// HS256 access-token validator (and issuer, for dev tooling and tests).
#[derive(Clone)]
pub struct JwtTokenValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    pub fn new(secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(PixioError::InvalidConfig(format!(
                "access token secret must be at least {MIN_SECRET_LEN} characters long"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let exp = unix_now()?.saturating_add(ACCESS_TOKEN_TTL.as_secs());
        self.issue_with_exp(user_id, exp)
    }

    fn issue_with_exp(&self, user_id: &str, exp: u64) -> Result<String> {
        let claims = AccessTokenClaims { user_id: user_id.to_string(), exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PixioError::Internal(format!("encode access token: {e}")))
    }
}

impl TokenValidator for JwtTokenValidator {
    fn validate_access_token(&self, token: &str) -> Option<String> {
        match decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.user_id.is_empty() => Some(data.claims.user_id),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "access token rejected");
                None
            }
        }
    }
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| PixioError::Internal(format!("system clock is before unix epoch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "pixio_test_secret_that_is_definitely_long_enough";

    #[test]
    fn issues_and_validates_tokens() {
        let jwt = JwtTokenValidator::new(TEST_SECRET).unwrap();
        let token = jwt.issue("u1").unwrap();
        assert_eq!(jwt.validate_access_token(&token).as_deref(), Some("u1"));
    }

    #[test]
    fn rejects_short_secret() {
        assert!(JwtTokenValidator::new("short").is_err());
    }

    #[test]
    fn rejects_tampered_and_foreign_tokens() {
        let jwt = JwtTokenValidator::new(TEST_SECRET).unwrap();
        let token = jwt.issue("u1").unwrap();
        assert!(jwt.validate_access_token(&format!("{token}x")).is_none());

        let other = JwtTokenValidator::new("another_secret_that_is_also_long_enough!").unwrap();
        assert!(other.validate_access_token(&token).is_none());
        assert!(jwt.validate_access_token("not-a-jwt").is_none());
    }

    #[test]
    fn rejects_expired_tokens() {
        let jwt = JwtTokenValidator::new(TEST_SECRET).unwrap();
        let past = unix_now().unwrap() - 60;
        let token = jwt.issue_with_exp("u1", past).unwrap();
        assert!(jwt.validate_access_token(&token).is_none());
    }
}
