use crate::types::{AppError, Claims, Result};
use crate::utils::toml_config::FabricConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Where verification keys come from.
enum KeySource {
    /// Shared HS256 secret; also used to mint development tokens
    Secret(String),
    /// RSA public key loaded from a PEM file
    Pem(DecodingKey),
    /// Remote key set, fetched lazily and refreshed on unknown `kid`
    Jwks {
        url: String,
        client: reqwest::Client,
        keys: RwLock<Option<JwkSet>>,
    },
}

/// Authentication service for bearer-token verification.
///
/// Accepts HS256 tokens signed with a shared secret, or RS256 tokens checked
/// against a PEM public key or a JWKS endpoint.
pub struct AuthService {
    algorithm: Algorithm,
    source: KeySource,
    audience: Option<String>,
    issuer: Option<String>,
    token_expiry: i64,
}

impl AuthService {
    /// Creates an HS256 service.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing JWTs (should be at least 32 chars)
    /// * `token_expiry` - Lifetime of issued tokens in seconds
    pub fn new(jwt_secret: String, token_expiry: i64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            source: KeySource::Secret(jwt_secret),
            audience: None,
            issuer: None,
            token_expiry,
        }
    }

    /// Build the service described by the `[auth]` section.
    pub fn from_config(config: &FabricConfig) -> Result<Self> {
        let auth = &config.auth;
        let algorithm = auth
            .algorithm()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        let source = match algorithm {
            Algorithm::RS256 => match (&auth.public_key_path, &auth.jwks_url) {
                (Some(path), _) => {
                    let pem = std::fs::read(path).map_err(|e| {
                        AppError::Configuration(format!(
                            "Failed to read public key {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    let key = DecodingKey::from_rsa_pem(&pem)
                        .map_err(|e| AppError::Configuration(format!("Invalid public key: {}", e)))?;
                    KeySource::Pem(key)
                }
                (None, Some(url)) => KeySource::Jwks {
                    url: url.clone(),
                    client: reqwest::Client::new(),
                    keys: RwLock::new(None),
                },
                (None, None) => {
                    return Err(AppError::Configuration(
                        "RS256 requires a public key or a JWKS URL".to_string(),
                    ));
                }
            },
            _ => KeySource::Secret(
                config
                    .jwt_secret()
                    .map_err(|e| AppError::Configuration(e.to_string()))?,
            ),
        };

        Ok(Self {
            algorithm,
            source,
            audience: auth.audience.clone(),
            issuer: auth.issuer.clone(),
            token_expiry: auth.token_expiry,
        })
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Mint an HS256 token for `user_id`.
    ///
    /// Only possible with a shared secret; RS256 deployments receive tokens
    /// from their identity provider.
    pub fn issue_token(&self, user_id: &str, email: Option<&str>) -> Result<String> {
        let KeySource::Secret(secret) = &self.source else {
            return Err(AppError::Auth(
                "Tokens can only be issued with an HS256 secret".to_string(),
            ));
        };

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp() as usize,
            iat: now.timestamp() as usize,
            public_metadata: None,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let mut claims_value = serde_json::to_value(&claims)
            .map_err(|e| AppError::Internal(format!("Failed to encode claims: {}", e)))?;
        if let (Some(aud), Some(map)) = (&self.audience, claims_value.as_object_mut()) {
            map.insert("aud".to_string(), serde_json::json!(aud));
        }
        if let (Some(iss), Some(map)) = (&self.issuer, claims_value.as_object_mut()) {
            map.insert("iss".to_string(), serde_json::json!(iss));
        }

        encode(
            &header,
            &claims_value,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a bearer token and returns its claims.
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let key = self.decoding_key(token).await?;

        let mut validation = Validation::new(self.algorithm);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }

        let claims = decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    warn!("JWT token expired");
                    AppError::Auth("Token has expired".to_string())
                }
                _ => {
                    warn!(error = %e, "Invalid JWT token");
                    AppError::Auth("Invalid token".to_string())
                }
            })?;

        if claims.sub.is_empty() {
            return Err(AppError::Auth("Invalid token: missing user ID".to_string()));
        }

        debug!(user_id = %claims.sub, "JWT verified successfully");
        Ok(claims)
    }

    async fn decoding_key(&self, token: &str) -> Result<DecodingKey> {
        match &self.source {
            KeySource::Secret(secret) => Ok(DecodingKey::from_secret(secret.as_bytes())),
            KeySource::Pem(key) => Ok(key.clone()),
            KeySource::Jwks { url, client, keys } => {
                let kid = decode_header(token)
                    .map_err(|_| AppError::Auth("Invalid token".to_string()))?
                    .kid
                    .ok_or_else(|| AppError::Auth("Invalid token".to_string()))?;

                let cached = keys.read().as_ref().and_then(|set| set.find(&kid).cloned());
                let jwk = match cached {
                    Some(jwk) => jwk,
                    None => {
                        let set = fetch_jwks(client, url).await?;
                        let found = set.find(&kid).cloned();
                        *keys.write() = Some(set);
                        found.ok_or_else(|| AppError::Auth("Invalid token".to_string()))?
                    }
                };

                DecodingKey::from_jwk(&jwk).map_err(|_| AppError::Auth("Invalid token".to_string()))
            }
        }
    }
}

async fn fetch_jwks(client: &reqwest::Client, url: &str) -> Result<JwkSet> {
    debug!(url, "Fetching JWKS");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            warn!(error = %e, "JWKS fetch failed");
            AppError::Auth("Authentication failed".to_string())
        })?;

    response.json::<JwkSet>().await.map_err(|e| {
        warn!(error = %e, "JWKS response unreadable");
        AppError::Auth("Authentication failed".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-chars";

    fn create_test_service() -> AuthService {
        AuthService::new(SECRET.to_string(), 900)
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("should encode")
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let service = create_test_service();

        let token = service
            .issue_token("user-123", Some("test@example.com"))
            .expect("should issue");
        let claims = service.verify_token(&token).await.expect("should verify");

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));

        let now = Utc::now().timestamp() as usize;
        assert!(claims.iat <= now && claims.iat + 5 >= now);
        assert!(claims.exp >= claims.iat + 895 && claims.exp <= claims.iat + 905);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let service = create_test_service();
        let past = (Utc::now() - Duration::hours(2)).timestamp();
        let token = sign(serde_json::json!({"sub": "user", "exp": past}), SECRET);

        let err = service.verify_token(&token).await.unwrap_err();

        assert_eq!(err.to_string(), "Authentication error: Token has expired");
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let other = AuthService::new("secret-two-that-is-32-chars-long!!".to_string(), 900);
        let token = other.issue_token("user", None).unwrap();

        let err = create_test_service().verify_token(&token).await.unwrap_err();

        assert_eq!(err.to_string(), "Authentication error: Invalid token");
    }

    #[tokio::test]
    async fn test_missing_subject() {
        let service = create_test_service();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign(serde_json::json!({"email": "a@b.c", "exp": exp}), SECRET);

        let err = service.verify_token(&token).await.unwrap_err();

        assert!(err.to_string().ends_with("Invalid token: missing user ID"));
    }

    #[tokio::test]
    async fn test_audience_is_enforced() {
        let issuer = AuthService::new(SECRET.to_string(), 900).with_audience("fabric-web");
        let strict = AuthService::new(SECRET.to_string(), 900).with_audience("fabric-mobile");

        let token = issuer.issue_token("user", None).unwrap();

        assert!(issuer.verify_token(&token).await.is_ok());
        assert!(strict.verify_token(&token).await.is_err());
        // no audience configured: aud is not checked
        assert!(create_test_service().verify_token(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let result = create_test_service().verify_token("invalid.token.here").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_requires_secret() {
        let mut config = FabricConfig::default();
        config.auth.jwt_secret_env = "FABRIC_TEST_UNSET_JWT_SECRET".to_string();

        assert!(matches!(
            AuthService::from_config(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
