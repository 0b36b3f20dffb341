use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AGENCY: &str = "agency";
pub const ROLE_IDO: &str = "ido";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id the token was issued to.
    pub sub: String,
    pub role: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

/// Identity attached to the request after the bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
    pub role: String,
}

impl AuthedUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// HMAC-SHA256 signed bearer tokens: `base64url(claims).base64url(mac)`.
/// Stateless on the server; there is no session store to consult.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: SecretString,
}

impl TokenVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("hmac accepts any key length")
    }

    pub fn sign(&self, claims: &TokenClaims) -> String {
        let payload = serde_json::to_vec(claims).expect("claims serialize");
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{payload_b64}.{signature_b64}")
    }

    pub fn issue(&self, user_id: &str, role: &str, ttl: Duration, now: DateTime<Utc>) -> String {
        self.sign(&TokenClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + ttl).timestamp(),
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(AuthError::Malformed)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SecretString::from("unit-test-secret"))
    }

    #[test]
    fn issued_tokens_verify() {
        let v = verifier();
        let now = Utc::now();
        let token = v.issue("u1", "agency", Duration::hours(1), now);

        let claims = v.verify(&token, now).expect("valid token");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "agency");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let v = verifier();
        let now = Utc::now();
        let token = v.issue("u1", "agency", Duration::hours(1), now);

        let err = v
            .verify(&token, now + Duration::hours(2))
            .expect_err("expired");
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let v = verifier();
        let now = Utc::now();
        let token = v.issue("u1", "agency", Duration::hours(1), now);

        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = TokenClaims {
            sub: "u1".to_string(),
            role: "admin".to_string(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let forged_payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        let err = v.verify(&forged, now).expect_err("forged token");
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let now = Utc::now();
        let token = verifier().issue("u1", "agency", Duration::hours(1), now);

        let other = TokenVerifier::new(SecretString::from("different-secret"));
        assert!(matches!(
            other.verify(&token, now),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
