//! Authentication: bearer token verification, token issuance, and the
//! local user directory backing `/login`, `/register`, and `/admin/users`.

pub mod jwt;
pub mod users;

use thiserror::Error;

use netmon_core::{Identity, NetmonError, Role};

use crate::error::{
    api_conflict, api_forbidden, api_internal, api_not_found, api_unauthorized,
    api_validation_error, ApiError,
};

pub use jwt::JwtAuthenticator;
pub use users::{UserStore, UserSummary};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    InvalidRole(#[from] NetmonError),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::MissingCredentials | AuthError::InvalidCredentials => {
                api_unauthorized(&err.to_string())
            }
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                tracing::debug!(error = %err, "Bearer token rejected");
                api_forbidden("invalid or expired token")
            }
            AuthError::UserExists(_) => api_conflict("user_exists", &err.to_string()),
            AuthError::UserNotFound(_) => api_not_found(&err.to_string()),
            AuthError::InvalidInput(_) | AuthError::InvalidRole(_) => {
                api_validation_error(&err.to_string())
            }
            AuthError::Crypto(_) => api_internal("authentication failure", &err),
        }
    }
}

/// A freshly signed bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Verifies and issues bearer credentials.
///
/// The gateway only depends on this contract; the signing scheme behind it
/// is replaceable.
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;

    fn issue(&self, subject: &str, role: &Role) -> Result<IssuedToken, AuthError>;
}
