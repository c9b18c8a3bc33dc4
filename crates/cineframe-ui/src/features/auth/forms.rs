//! Login/registration form rules and the logged-in route guard.

use cineframe_api_models::RegisterRequest;

use crate::core::session::Session;
use crate::error::FormError;

/// Route the guard redirects to.
pub const LOGIN_ROUTE: &str = "/login";
/// Shortest accepted password on registration.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Fallback shown when a login fails without a backend message.
pub const LOGIN_FAILED: &str = "Login failed. Incorrect email or password.";
/// Fallback shown when a registration fails without a backend message.
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Login form fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl LoginForm {
    /// Both fields present; the submit button is disabled otherwise.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.email.trim().is_empty() {
            return Err(FormError::Required { field: "Email" });
        }
        if self.password.is_empty() {
            return Err(FormError::Required { field: "Password" });
        }
        Ok(())
    }
}

/// Registration form fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
}

impl RegisterForm {
    /// Validate and build the request body.
    pub fn to_request(&self) -> Result<RegisterRequest, FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::Required { field: "Full Name" });
        }
        if self.email.trim().is_empty() {
            return Err(FormError::Required { field: "Email" });
        }
        if self.password != self.password_confirmation {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        })
    }
}

/// Redirect issued by [`require_login`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthRedirect {
    /// Target route.
    pub to: &'static str,
}

/// Gate for pages that need a signed-in user.
pub fn require_login(session: &Session) -> Result<(), AuthRedirect> {
    if session.is_logged_in() {
        Ok(())
    } else {
        Err(AuthRedirect { to: LOGIN_ROUTE })
    }
}
