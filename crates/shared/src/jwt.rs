//! JWT issuance and validation.
//!
//! Staff sessions use RS256-signed access/refresh token pairs. Tokens carry
//! the staff account id as `sub` plus a unique `jti`, and validation applies
//! a small leeway for clock skew between clients and the server.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Which half of the token pair a JWT represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff account id.
    pub sub: String,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Unique token id.
    pub jti: String,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// Default leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Signing and validation material plus expiry policy.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_secs", &self.refresh_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Builds a config from an RSA key pair in PEM format.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
    ) -> Result<Self, JwtError> {
        Self::with_leeway(
            private_key_pem,
            public_key_pem,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            DEFAULT_LEEWAY_SECS,
        )
    }

    /// Builds a config with an explicit clock-skew leeway.
    pub fn with_leeway(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            leeway_secs,
        })
    }

    /// HS256 config for tests only.
    #[cfg(test)]
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 2_592_000,
            leeway_secs: 0,
        }
    }

    /// Issues an access token for the given staff account.
    ///
    /// Returns the token string and its `jti`.
    pub fn generate_access_token(&self, account_id: Uuid) -> Result<(String, String), JwtError> {
        self.generate(account_id, TokenKind::Access, self.access_token_expiry_secs)
    }

    /// Issues a refresh token for the given staff account.
    pub fn generate_refresh_token(&self, account_id: Uuid) -> Result<(String, String), JwtError> {
        self.generate(account_id, TokenKind::Refresh, self.refresh_token_expiry_secs)
    }

    fn generate(
        &self,
        account_id: Uuid,
        kind: TokenKind,
        expiry_secs: i64,
    ) -> Result<(String, String), JwtError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: account_id.to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            kind,
        };

        let token = encode(&Header::new(self.algorithm()), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates any token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm());
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// Validates a token and requires it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.kind != TokenKind::Access {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validates a token and requires it to be a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }

    fn algorithm(&self) -> Algorithm {
        // Tests sign with a shared secret, production with RSA keys.
        #[cfg(test)]
        {
            Algorithm::HS256
        }
        #[cfg(not(test))]
        {
            Algorithm::RS256
        }
    }
}

/// Extracts the staff account id from validated claims.
pub fn account_id_from_claims(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::new_for_testing("ideiaprint_test_signing_secret_0001")
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();
        let account_id = Uuid::new_v4();

        let (token, jti) = config.generate_access_token(account_id).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = test_config();
        let account_id = Uuid::new_v4();

        let (token, _) = config.generate_refresh_token(account_id).unwrap();
        let claims = config.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let config = test_config();
        let account_id = Uuid::new_v4();

        let (access, _) = config.generate_access_token(account_id).unwrap();
        let (refresh, _) = config.generate_refresh_token(account_id).unwrap();

        assert!(matches!(
            config.validate_refresh_token(&access),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            config.validate_access_token(&refresh),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut config = test_config();
        config.access_token_expiry_secs = -10;

        let (token, _) = config.generate_access_token(Uuid::new_v4()).unwrap();
        let result = config.validate_access_token(&token);

        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let config = test_config();
        assert!(config.validate_token("nem.um.jwt").is_err());
        assert!(config.validate_token("nope").is_err());
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let config = test_config();
        let account_id = Uuid::new_v4();

        let (_, jti1) = config.generate_access_token(account_id).unwrap();
        let (_, jti2) = config.generate_access_token(account_id).unwrap();

        assert_ne!(jti1, jti2);
    }

    #[test]
    fn test_account_id_extraction() {
        let config = test_config();
        let account_id = Uuid::new_v4();

        let (token, _) = config.generate_access_token(account_id).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(account_id_from_claims(&claims).unwrap(), account_id);
    }

    #[test]
    fn test_expiry_matches_policy() {
        let config = test_config();
        let (token, _) = config.generate_access_token(Uuid::new_v4()).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, config.access_token_expiry_secs);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
    }
}
