use crate::api::client::{check_status, decode, decode_optional, property_form};
use crate::api::{ApiClient, ApiError, PropertyBackend};
use crate::models::{DraftWithId, Home, Property, PropertyDraft};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[async_trait]
impl PropertyBackend for ApiClient {
    async fn find_one(&self, id: i64) -> Result<Option<Property>, ApiError> {
        let url = self.endpoint("properties/findOne");
        debug!("Fetching property {} from {}", id, url);

        let response = self.client.get(&url).query(&[("id", id)]).send().await?;
        decode_optional(response).await
    }

    async fn find_all(&self) -> Result<Vec<Property>, ApiError> {
        let url = self.endpoint("properties/findAll");
        debug!("Fetching URL: {}", url);

        let response = self.client.get(&url).send().await?;
        let properties: Vec<Property> = decode(response).await?;
        info!("Fetched {} properties", properties.len());
        Ok(properties)
    }

    async fn home(&self) -> Result<Home, ApiError> {
        let url = self.endpoint("properties/home");
        debug!("Fetching URL: {}", url);

        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    async fn create(
        &self,
        draft: &PropertyDraft,
        files: &[PathBuf],
        token: &str,
    ) -> Result<Property, ApiError> {
        let url = self.endpoint("properties/create");
        let form = property_form(serde_json::to_string(draft)?, None, files).await?;
        info!("Creating property \"{}\" with {} images", draft.title, files.len());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn update(
        &self,
        id: i64,
        draft: &PropertyDraft,
        deleted_images: &[String],
        files: &[PathBuf],
        token: &str,
    ) -> Result<Property, ApiError> {
        let url = self.endpoint("properties/update");
        let payload = serde_json::to_string(&DraftWithId { id, draft })?;
        let form = property_form(payload, Some(deleted_images), files).await?;
        info!(
            "Updating property {} ({} new images, {} removed)",
            id,
            files.len(),
            deleted_images.len()
        );

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, id: i64, token: &str) -> Result<bool, ApiError> {
        let url = self.endpoint("properties/delete");

        let result = async {
            let response = self
                .client
                .delete(&url)
                .query(&[("id", id)])
                .header(AUTHORIZATION, Self::auth_header(token)?)
                .send()
                .await?;
            let response = check_status(response).await?;
            let body = response.text().await?;
            Ok::<bool, ApiError>(serde_json::from_str(&body).unwrap_or(true))
        }
        .await;

        match result {
            Ok(deleted) => Ok(deleted),
            Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
            Err(e) => {
                error!("Failed to delete property {}: {}", id, e);
                Ok(false)
            }
        }
    }
}
