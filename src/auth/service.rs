use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::store::{User, UserStore};
use crate::auth::token::TokenKeys;
use crate::error::AuthError;
use crate::mailer::Mailer;

/// Auth operations over the user store, the mailer and the token keys.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    keys: TokenKeys,
    reset_password_url: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        keys: TokenKeys,
        reset_password_url: String,
    ) -> Self {
        Self {
            store,
            mailer,
            keys,
            reset_password_url,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::EmailTaken);
        }
        let hash = hash_password(password)?;
        let user = self.store.create(email, &hash).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a session token. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }
        let token = self.keys.sign_session(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok((user, token))
    }

    /// Resolve a session token to its user.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = match self.keys.verify_session(token) {
            Ok(claims) => claims,
            Err(_) => {
                warn!("invalid or expired session token");
                return Err(AuthError::Unauthenticated);
            }
        };
        match self.store.find_by_id(claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %claims.sub, "session user no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Issue a reset token and email the reset link. Never fails to the
    /// caller, whatever happens, so responses cannot be used to probe which
    /// emails are registered. Failures are logged.
    pub async fn request_reset(&self, email: &str) {
        let user = match self.store.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!(email = %email, "reset requested for unknown email");
                return;
            }
            Err(e) => {
                error!(error = %e, "user lookup failed during reset request");
                return;
            }
        };

        let token = match self.keys.sign_reset(user.id) {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "reset token sign failed");
                return;
            }
        };

        if let Err(e) = self.store.set_reset_token(user.id, &token).await {
            error!(error = %e, user_id = %user.id, "storing reset token failed");
            return;
        }

        let reset_link = format!("{}{}", self.reset_password_url, token);
        let body = format!(
            r#"<p>Click <a href="{}">here</a> to reset your password.</p>"#,
            reset_link
        );
        if let Err(e) = self
            .mailer
            .send(&user.email, "Reset Your Password", &body)
            .await
        {
            error!(error = %e, user_id = %user.id, "reset email delivery failed");
            return;
        }

        info!(user_id = %user.id, email = %user.email, "reset email sent");
    }

    /// Consume a reset token and rotate the password.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let user = self.reset_token_user(token).await?;
        let hash = hash_password(new_password)?;
        self.store.complete_password_reset(user.id, &hash).await?;
        info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    /// Check a reset token without consuming it.
    pub async fn validate_reset_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let user = self.reset_token_user(token).await?;
        Ok(user.id)
    }

    /// A reset token is good only while its signature and expiry check out,
    /// the user still exists, the stored token matches it exactly, and the
    /// stored token has not been consumed.
    async fn reset_token_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = match self.keys.verify_reset(token) {
            Ok(claims) => claims,
            Err(_) => {
                warn!("invalid or expired reset token");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };
        let user = match self.store.find_by_id(claims.sub).await? {
            Some(user) => user,
            None => {
                warn!(user_id = %claims.sub, "reset token for missing user");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };
        if user.reset_token_used || user.reset_token.as_deref() != Some(token) {
            warn!(user_id = %user.id, "reset token already consumed or superseded");
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Ok(user)
    }
}
