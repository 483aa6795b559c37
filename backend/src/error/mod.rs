//! Error types shared across services and storage backends.

use thiserror::Error;

/// Machine-readable kind for every failure the services can return.
///
/// The first seven are expected business-rule outcomes and safe to render to
/// the end user; `Operation` is the fatal kind the request layer maps to a
/// 5xx-style response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidOrExpired,
    Mismatch,
    SamePassword,
    EmailTaken,
    InvalidCredentials,
    Validation,
    Operation,
}

/// A validation failure tied to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Failure surface of the shop services.
///
/// Expected business-rule failures are ordinary `Err` values the request
/// layer renders back into the form; only `Operation` signals that something
/// below the services broke.
#[derive(Debug, Error)]
pub enum ShopError {
    /// A referenced entity (user, product, order, cart entry) is absent.
    #[error("{message}")]
    NotFound {
        message: String,
        /// Form field the failure should be rendered against, if any.
        field: Option<&'static str>,
    },

    /// Reset token unknown or past its expiry. The two cases are deliberately
    /// indistinguishable so the response does not leak which one applies.
    #[error("Invalid or expired password reset link")]
    InvalidOrExpired,

    /// New password and its confirmation differ.
    #[error("Passwords have to match")]
    Mismatch,

    /// New password is identical to the current one.
    #[error("New password cannot match old password")]
    SamePassword,

    /// Signup attempted with an email that already has an account.
    #[error("Email already in use. Please provide a different email address")]
    EmailTaken,

    /// Unknown email or wrong password; uniform on purpose.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// One or more payload fields failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Unexpected storage/infra failure. The cause is kept for logs and must
    /// never reach the client.
    #[error("{context}")]
    Operation {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ShopError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ShopError::NotFound {
            message: message.into(),
            field: None,
        }
    }

    pub fn not_found_field(message: impl Into<String>, field: &'static str) -> Self {
        ShopError::NotFound {
            message: message.into(),
            field: Some(field),
        }
    }

    /// Wraps an unexpected failure, recording the full cause chain at error
    /// level. The rendered message stays generic.
    pub fn operation(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        let context = context.into();
        let source = source.into();
        tracing::error!("{}: {:?}", context, source);
        ShopError::Operation { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShopError::NotFound { .. } => ErrorKind::NotFound,
            ShopError::InvalidOrExpired => ErrorKind::InvalidOrExpired,
            ShopError::Mismatch => ErrorKind::Mismatch,
            ShopError::SamePassword => ErrorKind::SamePassword,
            ShopError::EmailTaken => ErrorKind::EmailTaken,
            ShopError::InvalidCredentials => ErrorKind::InvalidCredentials,
            ShopError::Validation(_) => ErrorKind::Validation,
            ShopError::Operation { .. } => ErrorKind::Operation,
        }
    }

    /// Form field the failure should be rendered against, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ShopError::NotFound { field, .. } => *field,
            ShopError::Mismatch => Some("confirm_password"),
            ShopError::SamePassword => Some("password"),
            ShopError::EmailTaken => Some("email"),
            _ => None,
        }
    }

    /// True for failures the request layer should map to a 5xx response.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShopError::Operation { .. })
    }

    /// Message safe to show to the end user. `Operation` failures hide their
    /// cause; the cause goes to the log, not to the client.
    pub fn user_message(&self) -> String {
        match self {
            ShopError::Operation { .. } => "Something went wrong, please try again later".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        ShopError::Validation(fields)
    }
}

/// Failure surface of the storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Uniqueness violation reported by the in-memory backend.
    #[error("{0}")]
    Conflict(String),

    /// Backend unreachable or an injected test failure.
    #[error("{0}")]
    Unavailable(String),
}
