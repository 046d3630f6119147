//! Authentication Module
//!
//! This module resolves bearer credentials to principals for the RECIRC API.
//! A credential is a signed JWT carrying the user id (`sub`) and role at
//! issuance time. Resolution is a pure function of the credential: the role
//! is NOT re-checked against current storage, so a role change only takes
//! effect when a new token is issued. That tolerance is a recorded policy
//! choice (see DESIGN.md).
//!
//! The signing side (`issue_token`) is the Authenticator capability consumed
//! by tests and by credential-issuing deployments. User registration and
//! password handling live outside this service.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use recirc_core::{Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS + CI ROBUSTNESS)
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// By owning time validation ourselves (instead of letting `jsonwebtoken` do
/// it), we avoid the `SystemTime::now().duration_since(UNIX_EPOCH).expect()`
/// panic path and make tests fully deterministic.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret with validation.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::missing_field("jwt_secret"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (use sparingly, only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 24 hours)
    pub jwt_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60)
    ///
    /// Allows tokens to be slightly in the future/past to handle clock drift
    /// in distributed systems.
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret_str = std::env::var("RECIRC_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 86_400, // 24 hours, matching issued-credential lifetime
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `RECIRC_JWT_SECRET`: JWT signing secret
    /// - `RECIRC_JWT_EXPIRATION_SECS`: JWT token expiration (default: 86400)
    /// - `RECIRC_JWT_CLOCK_SKEW_SECS`: JWT clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let secret_str = std::env::var("RECIRC_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("RECIRC_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
            jwt_clock_skew_secs: std::env::var("RECIRC_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// Call at server startup. In development mode, warnings are logged but
    /// the server continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("RECIRC_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set RECIRC_JWT_SECRET to a secure value. \
                     RECIRC_ENVIRONMENT={}",
                    environment
                )));
            } else {
                tracing::warn!(
                    "Using insecure default JWT secret. This is acceptable for local \
                     development but MUST be changed before deploying. Set the \
                     RECIRC_JWT_SECRET environment variable to a secure random value \
                     (minimum 32 characters)."
                );
            }
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    "JWT secret is short ({} chars). For production, use at least \
                     32 characters.",
                    self.jwt_secret.len()
                );
            }
        }

        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
///
/// Contains the standard claims plus the role embedded at issuance time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role of the user at issuance time
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user using a clock.
    pub fn new(user_id: UserId, role: Role, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + expiration_secs,
        }
    }

    /// Check if the token has expired according to a clock.
    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// PRINCIPAL
// ============================================================================

/// The resolved identity and role of the caller for one operation.
///
/// Injected into Axum request extensions after successful authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// User ID (from the JWT sub claim)
    pub user_id: UserId,

    /// Role embedded in the credential at issuance time
    pub role: Role,
}

impl Principal {
    /// Create a new principal.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Check eligibility against a statically declared role set.
    ///
    /// An empty set means any authenticated principal is allowed.
    pub fn is_allowed(&self, allowed_roles: &[Role]) -> bool {
        allowed_roles.is_empty() || allowed_roles.contains(&self.role)
    }
}

// ============================================================================
// AUTHENTICATION FUNCTIONS
// ============================================================================

/// Validate JWT claim times using our own clock logic.
///
/// Separated from signature validation so tests are deterministic with
/// injected clocks and custom skew policies apply uniformly.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }
    Ok(())
}

/// Validate a JWT token and extract claims.
///
/// This performs signature validation ONLY (no time validation) in
/// `jsonwebtoken`; time validation runs against the injected clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    // Decode with signature validation ONLY (skip exp validation)
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // We'll do this ourselves with our clock
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;

    let now = config.clock.now_epoch_secs();

    // Fail loud if the production clock returns pre-epoch time
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Resolve validated claims into a principal.
///
/// Fails if the embedded identity payload lacks a parseable id or role.
pub fn resolve_principal(claims: &Claims) -> ApiResult<Principal> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::invalid_token("Token subject is not a valid user id"))?;

    let role: Role = claims
        .role
        .parse()
        .map_err(|_| ApiError::invalid_token("Token carries an unknown role"))?;

    Ok(Principal::new(user_id, role))
}

/// Issue a signed bearer token for a user.
///
/// This is the synchronous signing capability of the Authenticator boundary.
/// Returns the encoded token string.
pub fn issue_token(config: &AuthConfig, user_id: UserId, role: Role) -> ApiResult<String> {
    let claims = Claims::new(user_id, role, config.jwt_expiration_secs, &*config.clock);

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Authenticate a request from its Authorization header.
///
/// Returns the resolved principal, or an error when the credential is
/// missing, malformed, or fails verification. No storage is consulted.
pub fn authenticate(config: &AuthConfig, auth_header: Option<&str>) -> ApiResult<Principal> {
    let auth_value = auth_header.ok_or_else(|| {
        ApiError::unauthorized("Authentication required: provide Authorization header")
    })?;

    let token = auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::invalid_token("Authorization header must use Bearer scheme")
    })?;

    let claims = validate_jwt_token(config, token)?;
    resolve_principal(&claims)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC - always valid for tests
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC - far future for expiry tests
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}
