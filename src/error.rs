use thiserror::Error;

/// Failures surfaced by the auth operations.
///
/// Credential and token failures are deliberately coarse: callers see the
/// same variant whether an email is unknown or a password is wrong, and the
/// same variant whether a token is malformed, tampered or expired.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
