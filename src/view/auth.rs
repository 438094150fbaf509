use std::fmt;
use thiserror::Error;

use crate::api::{ApiClient, ApiError, User};
use crate::session::StoreError;

/// Shortest password the backend accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFormError {
    #[error("Email is required")]
    EmptyEmail,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Form(#[from] AuthFormError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sign-in or registration input.
///
/// `confirm_password` is only set for registration.
#[derive(Clone, Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    pub username: Option<String>,
}

impl AuthForm {
    pub fn sign_in(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn register(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: Some(confirm_password.into()),
            username: None,
        }
    }

    pub fn validate(&self) -> Result<(), AuthFormError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AuthFormError::EmptyEmail);
        }
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            });
        if !valid || email.contains(char::is_whitespace) {
            return Err(AuthFormError::InvalidEmail(email.to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthFormError::PasswordTooShort);
        }
        if let Some(confirm) = &self.confirm_password {
            if *confirm != self.password {
                return Err(AuthFormError::PasswordMismatch);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

/// Log in, store the token, then fetch and cache the profile.
pub async fn sign_in(client: &ApiClient, form: &AuthForm) -> Result<User, AuthError> {
    form.validate()?;
    let email = form.email.trim();

    let token = client.users().login(email, &form.password).await?;
    let session = client.session();
    session.set_token(Some(token.access_token)).await?;

    let user = client.users().me().await?;
    session.set_user(Some(user.clone()))?;
    tracing::info!(user_id = user.id, "Signed in");
    Ok(user)
}

/// Create the account, then sign in with the same credentials.
pub async fn sign_up(client: &ApiClient, form: &AuthForm) -> Result<User, AuthError> {
    form.validate()?;
    let created = client
        .users()
        .register(form.email.trim(), &form.password, form.username.as_deref())
        .await?;
    tracing::info!(user_id = created.id, "Account registered");
    sign_in(client, form).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sign_in_form() {
        assert_eq!(AuthForm::sign_in("a@b.co", "secret").validate(), Ok(()));
    }

    #[test]
    fn test_email_checks() {
        assert_eq!(
            AuthForm::sign_in("  ", "secret").validate(),
            Err(AuthFormError::EmptyEmail)
        );
        assert!(matches!(
            AuthForm::sign_in("no-at-sign", "secret").validate(),
            Err(AuthFormError::InvalidEmail(_))
        ));
        assert!(matches!(
            AuthForm::sign_in("a@b@c", "secret").validate(),
            Err(AuthFormError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_password_length() {
        assert_eq!(
            AuthForm::sign_in("a@b.co", "12345").validate(),
            Err(AuthFormError::PasswordTooShort)
        );
    }

    #[test]
    fn test_registration_requires_matching_confirmation() {
        assert_eq!(
            AuthForm::register("a@b.co", "secret1", "secret2").validate(),
            Err(AuthFormError::PasswordMismatch)
        );
        assert_eq!(
            AuthForm::register("a@b.co", "secret1", "secret1").validate(),
            Ok(())
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", AuthForm::sign_in("a@b.co", "hunter22"));
        assert!(!debug.contains("hunter22"));
    }
}
