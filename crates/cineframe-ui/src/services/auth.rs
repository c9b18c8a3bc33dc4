//! Login and registration against `/auth`.

use cineframe_api_models::{LoginRequest, LoginResponse, RegisterRequest};

use crate::error::{ApiError, ApiResult};
use crate::services::api::ApiClient;
use crate::services::transport::{Method, Transport};

/// Client for the authentication endpoints.
pub struct AuthClient<T> {
    api: ApiClient<T>,
}

impl<T> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AuthClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient").field("api", &self.api).finish()
    }
}

impl<T: Transport> AuthClient<T> {
    pub(crate) const fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    /// Exchange credentials for a token and store it in the session.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&request).map_err(ApiError::decode)?;
        let response = self
            .api
            .execute(Method::Post, "/auth/login", Vec::new(), Some(body), false)
            .await?;
        let token = serde_json::from_str::<LoginResponse>(&response)
            .map_err(ApiError::decode)?
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;
        self.api.session().login(token);
        Ok(())
    }

    /// Create an account. The session is left untouched.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        let body = serde_json::to_value(request).map_err(ApiError::decode)?;
        self.api
            .execute(Method::Post, "/auth/register", Vec::new(), Some(body), false)
            .await?;
        Ok(())
    }

    /// Drop the stored token.
    pub fn logout(&self) {
        self.api.session().logout();
    }
}
