//! Logged-in user and bearer token, kept for the session's duration
//!
//! Stored as a small JSON file next to the listing cache. Any
//! authentication failure wipes it.

use crate::api::{ApiError, UserBackend};
use crate::models::{AuthResponse, ChangePassword, RegisterUser, User, UserUpdate};
use crate::validation::{self, ValidationError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Sesión expirada. Por favor inicie sesión nuevamente.")]
    NotLoggedIn,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
    user: Option<User>,
}

pub struct Session {
    backend: Arc<dyn UserBackend>,
    path: PathBuf,
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// Pick up a previous session; a half-written one (token without user) is discarded
    pub async fn restore(backend: Arc<dyn UserBackend>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stored = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<StoredSession>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable session file: {}", e);
                StoredSession::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => StoredSession::default(),
            Err(e) => {
                warn!("Failed to read session file {}: {}", path.display(), e);
                StoredSession::default()
            }
        };

        let (token, user) = match (stored.token, stored.user) {
            (Some(token), Some(user)) => (Some(token), Some(user)),
            _ => (None, None),
        };

        Self {
            backend,
            path,
            token,
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn require_token(&self) -> Result<&str, SessionError> {
        self.token.as_deref().ok_or(SessionError::NotLoggedIn)
    }

    async fn persist(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let stored = StoredSession {
            token: self.token.clone(),
            user: self.user.clone(),
        };
        let json = serde_json::to_string_pretty(&stored).context("Failed to serialize session")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    /// Forget the user and token, on disk too
    pub async fn clear(&mut self) {
        self.token = None;
        self.user = None;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove session file: {}", e);
            }
        }
    }

    /// Store a user and token obtained elsewhere (e.g. after a password reset)
    pub async fn handle_user_data(&mut self, user: User, token: String) -> Result<(), SessionError> {
        self.token = Some(token);
        self.user = Some(user);
        if let Err(e) = self.persist().await {
            self.clear().await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn accept(&mut self, result: Result<AuthResponse, ApiError>) -> Result<&User, SessionError> {
        match result {
            Ok(auth) => {
                self.handle_user_data(auth.user, auth.token).await?;
                let user = self.user.as_ref().ok_or(SessionError::NotLoggedIn)?;
                info!("Logged in as {}", user.email);
                Ok(user)
            }
            Err(e) => {
                error!("Authentication failed: {}", e);
                self.clear().await;
                Err(e.into())
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, SessionError> {
        validation::validate_login(email, password)?;
        let result = self.backend.login(email, password).await;
        self.accept(result).await
    }

    pub async fn register(&mut self, user: &RegisterUser) -> Result<&User, SessionError> {
        validation::validate_registration(user)?;
        let result = self.backend.register(user).await;
        self.accept(result).await
    }

    /// Refresh the stored user from the backend; on failure the user is dropped
    pub async fn fetch_profile(&mut self) -> Result<Option<&User>, SessionError> {
        let Some(token) = self.token.clone() else {
            self.user = None;
            return Ok(None);
        };

        match self.backend.profile(&token).await {
            Ok(user) => {
                self.user = Some(user);
                self.persist().await?;
                Ok(self.user.as_ref())
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Session rejected while fetching profile");
                self.clear().await;
                Err(e.into())
            }
            Err(e) => {
                warn!("Error fetching user profile: {}", e);
                self.user = None;
                self.persist().await?;
                Err(e.into())
            }
        }
    }

    /// The backend answers with a fresh token, which replaces the old one
    pub async fn update_profile(&mut self, update: &UserUpdate) -> Result<&User, SessionError> {
        let token = self.require_token()?.to_string();
        match self.backend.update_user(update, &token).await {
            Ok(auth) => {
                self.handle_user_data(auth.user, auth.token).await?;
                self.user.as_ref().ok_or(SessionError::NotLoggedIn)
            }
            Err(e) => {
                error!("Error updating user profile: {}", e);
                self.clear().await;
                Err(e.into())
            }
        }
    }

    pub async fn change_password(&mut self, request: &ChangePassword) -> Result<(), SessionError> {
        validation::validate_change_password(request)?;
        let token = self.require_token()?.to_string();
        match self.backend.change_password(request, &token).await {
            Ok(()) => {
                info!("Password changed");
                Ok(())
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.clear().await;
                }
                Err(e.into())
            }
        }
    }

    /// Finish the emailed reset flow and log in with the returned credentials
    pub async fn reset_password(
        &mut self,
        reset_token: Option<&str>,
        password: &str,
        confirm: &str,
    ) -> Result<&User, SessionError> {
        validation::validate_reset_password(password, confirm)?;
        let reset_token = reset_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::MissingResetToken)?;

        let auth = self.backend.reset_password(reset_token, password).await?;
        self.handle_user_data(auth.user, auth.token).await?;
        self.user.as_ref().ok_or(SessionError::NotLoggedIn)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), SessionError> {
        if !validation::is_valid_email(email) {
            return Err(ValidationError::InvalidEmail.into());
        }
        self.backend.forgot_password(email).await?;
        Ok(())
    }

    /// Local state is always cleared; the backend call is best effort
    pub async fn logout(&mut self) {
        self.clear().await;
        if let Err(e) = self.backend.logout().await {
            debug!("Backend logout failed: {}", e);
        }
        info!("Session closed");
    }

    /// Clear the session if `err` means the backend no longer accepts our token
    pub async fn on_api_error(&mut self, err: &ApiError) {
        if err.is_unauthorized() {
            warn!("Token rejected, clearing session");
            self.clear().await;
        }
    }

    /// Pass an authenticated call's result through, ending the session on a rejected token
    pub async fn guard<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            self.on_api_error(e).await;
        }
        result
    }
}
