use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    credentials::{Credential, CredentialTable},
    error::AppError,
    models::{LoginResponse, Role},
};

/// Token lifetime in seconds, also reported as `expiresIn` by the login endpoint.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Claims
///
/// The payload signed into every bearer token. Claim names are part of the external contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the email of the authenticated account.
    pub sub: String,
    /// The account role, "Admin" or "Student".
    pub role: Role,
    /// Present only on Student tokens: the bound student row, string-encoded.
    #[serde(rename = "studentId", default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub iss: String,
    pub aud: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): seconds since the epoch.
    pub iat: usize,
}

/// Identity
///
/// The resolved identity of an authenticated request. Use it as a handler argument: the
/// `FromRequestParts` implementation below rejects the request with 401 when no valid token
/// is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    email: String,
    role: Role,
    student_id: Option<i32>,
}

impl Identity {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: Role::Admin,
            student_id: None,
        }
    }

    pub fn student(email: impl Into<String>, student_id: i32) -> Self {
        Self {
            email: email.into(),
            role: Role::Student,
            student_id: Some(student_id),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn student_id(&self) -> Option<i32> {
        self.student_id
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn from_credential(credential: &Credential) -> Self {
        Self {
            email: credential.email().to_string(),
            role: credential.role(),
            student_id: credential.student_id(),
        }
    }

    /// Rebuilds the identity from verified claims. A Student token must carry a numeric
    /// `studentId` and an Admin token must not carry one at all; anything else was not
    /// issued by us.
    fn from_claims(claims: Claims) -> Result<Self, AppError> {
        match (claims.role, claims.student_id) {
            (Role::Admin, None) => Ok(Self::admin(claims.sub)),
            (Role::Student, Some(raw)) => raw
                .parse::<i32>()
                .map(|id| Self::student(claims.sub, id))
                .map_err(|_| AppError::Unauthorized),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// IssuedToken
///
/// A freshly signed token and the identity it asserts.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
    pub identity: Identity,
}

impl From<IssuedToken> for LoginResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            expires_in: token.expires_in,
            role: token.identity.role(),
            student_id: token.identity.student_id(),
        }
    }
}

/// TokenIssuer
///
/// Signs and verifies HS256 bearer tokens. Issuer and audience are both the configured service
/// name and are checked on every verification, together with signature and expiry.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            lifetime: Duration::seconds(TOKEN_LIFETIME_SECS),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_issuer.clone())
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// authenticate
    ///
    /// Looks the email/password pair up in the credential table and, on a match, signs a
    /// token for it. Any mismatch is `Unauthorized`; the caller cannot tell a wrong password
    /// from an unknown email.
    pub fn authenticate(
        &self,
        credentials: &CredentialTable,
        email: &str,
        password: &str,
    ) -> Result<IssuedToken, AppError> {
        let Some(credential) = credentials.find(email, password) else {
            tracing::info!(email, "login rejected");
            return Err(AppError::Unauthorized);
        };

        let identity = Identity::from_credential(credential);
        let access_token = self.sign(&identity)?;
        tracing::info!(email = identity.email(), role = ?identity.role(), "token issued");

        Ok(IssuedToken {
            access_token,
            expires_in: self.lifetime.num_seconds(),
            identity,
        })
    }

    /// Signs a token for the given identity, valid for one hour from now.
    pub fn sign(&self, identity: &Identity) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.email().to_string(),
            role: identity.role(),
            student_id: identity.student_id().map(|id| id.to_string()),
            iss: self.issuer.clone(),
            aud: self.issuer.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.lifetime).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("token signing failed: {e}")))
    }

    /// verify
    ///
    /// Checks signature, expiry, issuer and audience, then rebuilds the `Identity`.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!(reason = ?other, "rejected invalid token"),
            }
            AppError::Unauthorized
        })?;

        Identity::from_claims(token_data.claims)
    }
}

/// Identity Extractor Implementation
///
/// Makes `Identity` usable as a handler argument. The flow is:
/// 1. Resolve the `TokenIssuer` from the application state.
/// 2. Take the `Authorization: Bearer <token>` header (scheme matched case-insensitively).
/// 3. Verify the token and rebuild the identity.
///
/// Rejection: `AppError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenIssuer::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        tokens.verify(token)
    }
}

/// Splits `<scheme> <token>` and returns the token when the scheme is `Bearer` in any case.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
