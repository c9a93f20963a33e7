use crate::api::client::{check_status, decode};
use crate::api::{ApiClient, ApiError, UserBackend};
use crate::models::{AuthResponse, ChangePassword, RegisterUser, User, UserUpdate};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use tracing::debug;

#[async_trait]
impl UserBackend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        debug!("Logging in {}", email);
        let response = self
            .client
            .post(self.endpoint("user/login"))
            .json(&json!({ "user": { "email": email, "password": password } }))
            .send()
            .await?;
        decode(response).await
    }

    async fn register(&self, user: &RegisterUser) -> Result<AuthResponse, ApiError> {
        debug!("Registering {}", user.email);
        let response = self
            .client
            .post(self.endpoint("user/create"))
            .json(&json!({ "user": user }))
            .send()
            .await?;
        decode(response).await
    }

    async fn profile(&self, token: &str) -> Result<User, ApiError> {
        let response = self
            .client
            .get(self.endpoint("user/profile"))
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_user(&self, update: &UserUpdate, token: &str) -> Result<AuthResponse, ApiError> {
        let response = self
            .client
            .put(self.endpoint("user/update"))
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .json(&json!({ "user": update }))
            .send()
            .await?;
        decode(response).await
    }

    async fn change_password(&self, request: &ChangePassword, token: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.endpoint("user/changePassword"))
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .json(request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.endpoint("user/logout")).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn reset_password(&self, reset_token: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint("user/resetPassword"))
            .json(&json!({ "token": reset_token, "password": password }))
            .send()
            .await?;
        decode(response).await
    }

    async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("user/forgotPassword"))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
