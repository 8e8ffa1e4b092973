//! Bearer-token authentication for the Fabric API
//!
//! - [`auth::jwt`](crate::auth::jwt) - token verification (HS256 secret, RS256
//!   PEM key or JWKS) and development token minting
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and the
//!   [`AuthUser`](crate::auth::middleware::AuthUser) extractor
//!
//! # Configuration
//!
//! ```toml
//! [auth]
//! algorithm = "RS256"
//! jwks_url = "https://issuer.example.com/.well-known/jwks.json"
//! audience = "fabric"
//! ```
//!
//! With the default `HS256` algorithm the secret is read from the
//! environment variable named by `jwt_secret_env`.
//!
//! # Extracting Claims in Handlers
//!
//! ```ignore
//! async fn protected_handler(AuthUser(claims): AuthUser) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.sub)
//! }
//! ```

/// JWT verification and issuance.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
