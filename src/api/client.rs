use crate::api::ApiError;
use crate::config::ApiConfig;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("rocha-listings/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the listings REST backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from the `[api]` section of the config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_base_url(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The backend expects the raw token, without a `Bearer` prefix
    pub(crate) fn auth_header(token: &str) -> Result<HeaderValue, ApiError> {
        HeaderValue::from_str(token).map_err(|_| ApiError::Unauthorized)
    }
}

/// Map error statuses, then decode the JSON body
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = check_status(response).await?.text().await?;
    debug!("Decoding {} bytes of JSON", body.len());
    Ok(serde_json::from_str(&body)?)
}

/// Decode a body that may legitimately be empty or `null`
pub(crate) async fn decode_optional<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, ApiError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let body = check_status(response).await?.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(&body)?)
}

pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!("Backend rejected credentials: {}", status);
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned status: {}", status);
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Build a multipart form carrying a JSON `property` part plus one `files` part per image
pub(crate) async fn property_form(
    property_json: String,
    deleted_images: Option<&[String]>,
    files: &[impl AsRef<Path>],
) -> Result<Form, ApiError> {
    let mut form = Form::new().text("property", property_json);

    if let Some(deleted) = deleted_images {
        form = form.text("deletedImages", serde_json::to_string(deleted)?);
    }

    for path in files {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(path))?;
        form = form.part("files", part);
    }

    Ok(form)
}

pub(crate) fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ApiClient::with_base_url("http://localhost:3001/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001/api");
        assert_eq!(
            client.endpoint("/properties/findAll"),
            "http://localhost:3001/api/properties/findAll"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(ApiClient::with_base_url("ftp://example.com", Duration::from_secs(5)).is_err());
        assert!(ApiClient::with_base_url("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn guesses_image_mime_from_extension() {
        assert_eq!(image_mime(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("photo.webp")), "image/webp");
        assert_eq!(image_mime(Path::new("photo")), "application/octet-stream");
    }

    #[tokio::test]
    async fn property_form_reports_missing_file() {
        let err = property_form("{}".into(), None, &[Path::new("/definitely/missing.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ImageRead { .. }));
    }
}
