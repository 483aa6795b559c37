//! Account lifecycle: signup, login, and the single-use password-reset
//! token handshake.

use std::sync::Arc;

use chrono::{Duration, Utc};
use url::Url;

use crate::error::{ShopError, StoreError};
use crate::models::user::{AuthenticatedUser, SignupPayload, UpdatePasswordPayload, User};
use crate::repositories::UserStore;
use crate::types::UserId;
use crate::utils::email::Mailer;
use crate::utils::{generate_reset_token, hash_password, token_digest, verify_password};
use crate::validation::Validate;

/// Proof of a successful token validation: the matched user's id and current
/// password hash, so `update_password` needs no second lookup.
#[derive(Debug, Clone)]
pub struct ResetClaim {
    pub user_id: UserId,
    pub password_hash: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    reset_token_ttl: Duration,
    base_url: Url,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        reset_token_ttl: Duration,
        base_url: Url,
    ) -> Self {
        Self {
            users,
            mailer,
            reset_token_ttl,
            base_url,
        }
    }

    /// Creates an account with an empty cart and sends the welcome email.
    /// A mailer failure is surfaced but the signup is not rolled back.
    pub async fn signup(&self, payload: &SignupPayload) -> Result<AuthenticatedUser, ShopError> {
        payload.validate()?;
        if payload.password != payload.confirm_password {
            return Err(ShopError::Mismatch);
        }

        let existing = self
            .users
            .find_by_email(&payload.email)
            .await
            .map_err(|err| ShopError::operation("Failed to create account", err))?;
        if existing.is_some() {
            return Err(ShopError::EmailTaken);
        }

        let password_hash = hash_password(&payload.password)
            .map_err(|err| ShopError::operation("Failed to create account", err))?;
        let user = User::new(&payload.email, password_hash);
        match self.users.insert(&user).await {
            Ok(()) => {}
            // Unique-email race between the lookup and the insert.
            Err(StoreError::Conflict(_)) => return Err(ShopError::EmailTaken),
            Err(err) => return Err(ShopError::operation("Failed to create account", err)),
        }
        tracing::info!(user_id = %user.id, "user signed up");

        self.mailer
            .send(&user.email, "Signup succeeded!", &welcome_email_body())
            .await
            .map_err(|err| ShopError::operation("Failed to send welcome email", err))?;

        Ok(AuthenticatedUser::from(&user))
    }

    /// Verifies credentials. Unknown email and wrong password produce the
    /// same `InvalidCredentials`, so the response does not reveal which
    /// accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, ShopError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(|err| ShopError::operation("Failed to log in", err))?
            .ok_or(ShopError::InvalidCredentials)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|err| ShopError::operation("Failed to log in", err))?;
        if !valid {
            return Err(ShopError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(AuthenticatedUser::from(&user))
    }

    /// Issues a fresh reset token for the account registered under `email`
    /// and mails a recovery link carrying the raw token.
    ///
    /// Only the SHA-256 digest of the token is stored. Any previously pending
    /// token is overwritten and stops validating. A mailer failure surfaces
    /// as `Operation` but leaves the stored token in place; requesting again
    /// is the remedy.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ShopError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(|err| ShopError::operation("Failed to request password reset", err))?
            .ok_or_else(|| {
                ShopError::not_found_field(
                    "No user found. Please provide a valid email address",
                    "email",
                )
            })?;

        let token = generate_reset_token();
        let expires_at = Utc::now() + self.reset_token_ttl;
        self.users
            .set_reset_token(user.id, &token_digest(&token), expires_at)
            .await
            .map_err(|err| ShopError::operation("Failed to request password reset", err))?;
        tracing::info!(user_id = %user.id, "password reset token issued");

        let reset_url = self
            .base_url
            .join(&format!("reset-password/{token}"))
            .map_err(|err| ShopError::operation("Failed to request password reset", err))?;
        self.mailer
            .send(
                &user.email,
                "Password Reset Link",
                &reset_email_body(reset_url.as_str(), self.reset_token_ttl),
            )
            .await
            .map_err(|err| ShopError::operation("Failed to send password reset email", err))?;

        Ok(())
    }

    /// Resolves a raw token to the account it belongs to.
    ///
    /// Wrong and expired tokens both fail with `InvalidOrExpired`; the
    /// response never reveals which case applied.
    pub async fn validate_reset_token(&self, token: &str) -> Result<ResetClaim, ShopError> {
        let user = self
            .users
            .find_by_reset_token(&token_digest(token), Utc::now())
            .await
            .map_err(|err| ShopError::operation("Failed to validate password reset link", err))?
            .ok_or(ShopError::InvalidOrExpired)?;

        Ok(ResetClaim {
            user_id: user.id,
            password_hash: user.password_hash,
        })
    }

    /// Sets a new password for the account the token belongs to and consumes
    /// the token.
    ///
    /// The token is re-validated here rather than trusted from an earlier
    /// call. The final write clears both token columns together, conditioned
    /// on the digest still matching, so a token superseded mid-flight cannot
    /// change the password.
    pub async fn update_password(&self, payload: &UpdatePasswordPayload) -> Result<(), ShopError> {
        payload.validate()?;

        let claim = self.validate_reset_token(&payload.token).await?;

        if payload.password != payload.confirm_password {
            return Err(ShopError::Mismatch);
        }

        let same = verify_password(&payload.password, &claim.password_hash)
            .map_err(|err| ShopError::operation("Failed to update password", err))?;
        if same {
            return Err(ShopError::SamePassword);
        }

        let new_hash = hash_password(&payload.password)
            .map_err(|err| ShopError::operation("Failed to update password", err))?;
        let updated = self
            .users
            .update_password_and_clear_token(
                claim.user_id,
                &token_digest(&payload.token),
                &new_hash,
            )
            .await
            .map_err(|err| ShopError::operation("Failed to update password", err))?;
        if !updated {
            return Err(ShopError::InvalidOrExpired);
        }

        tracing::info!(user_id = %claim.user_id, "password updated via reset token");
        Ok(())
    }
}

fn welcome_email_body() -> String {
    "<h1>You successfully signed up!</h1>\
     <p>Welcome to Shopkeeper. Happy shopping!</p>"
        .to_string()
}

fn reset_email_body(reset_url: &str, ttl: Duration) -> String {
    format!(
        "<p>You requested a password reset.</p>\
         <p>Click this <a href=\"{reset_url}\">link</a> to set a new password.</p>\
         <p>The link is valid for {} minutes.</p>",
        ttl.num_minutes()
    )
}
