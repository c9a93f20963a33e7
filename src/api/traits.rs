use crate::api::ApiError;
use crate::models::{
    AuthResponse, ChangePassword, Home, Property, PropertyDraft, RegisterUser, User, UserUpdate,
};
use async_trait::async_trait;
use std::path::PathBuf;

/// Property endpoints of the listings backend
#[async_trait]
pub trait PropertyBackend: Send + Sync {
    /// Fetch a single listing; `None` when the backend does not know the id
    async fn find_one(&self, id: i64) -> Result<Option<Property>, ApiError>;

    async fn find_all(&self) -> Result<Vec<Property>, ApiError>;

    /// Curated homepage subsets (featured, land, pinned)
    async fn home(&self) -> Result<Home, ApiError>;

    async fn create(
        &self,
        draft: &PropertyDraft,
        files: &[PathBuf],
        token: &str,
    ) -> Result<Property, ApiError>;

    /// Send the edited listing along with the images to drop and the new files
    async fn update(
        &self,
        id: i64,
        draft: &PropertyDraft,
        deleted_images: &[String],
        files: &[PathBuf],
        token: &str,
    ) -> Result<Property, ApiError>;

    /// `Ok(false)` on any failure except a rejected token, which is `Err(Unauthorized)`
    async fn delete(&self, id: i64, token: &str) -> Result<bool, ApiError>;
}

/// User endpoints of the listings backend
#[async_trait]
pub trait UserBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    async fn register(&self, user: &RegisterUser) -> Result<AuthResponse, ApiError>;

    async fn profile(&self, token: &str) -> Result<User, ApiError>;

    async fn update_user(&self, update: &UserUpdate, token: &str) -> Result<AuthResponse, ApiError>;

    async fn change_password(&self, request: &ChangePassword, token: &str) -> Result<(), ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn reset_password(&self, reset_token: &str, password: &str) -> Result<AuthResponse, ApiError>;

    async fn forgot_password(&self, email: &str) -> Result<(), ApiError>;
}
