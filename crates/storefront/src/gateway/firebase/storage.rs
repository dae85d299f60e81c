//! Firebase Storage v0 object endpoints.
//!
//! Download URLs have the form
//! `{storage_url}/v0/b/{bucket}/o/{percent-encoded path}?alt=media&token={token}`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{FirebaseGateway, check, verbatim};
use crate::gateway::{DataUrl, FileStorage, GatewayError, IdToken};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseGateway {
    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.objects_url, urlencoding::encode(path))
    }

    fn download_url(&self, metadata: &ObjectMetadata) -> Result<String, GatewayError> {
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GatewayError::Decode(format!("object {} has no download token", metadata.name))
            })?;

        Ok(format!(
            "{}?alt=media&token={}",
            self.object_url(&metadata.name),
            urlencoding::encode(token)
        ))
    }
}

#[async_trait]
impl FileStorage for FirebaseGateway {
    #[instrument(skip(self, token, data_url))]
    async fn upload_data_url(
        &self,
        token: &IdToken,
        path: &str,
        data_url: &str,
    ) -> Result<String, GatewayError> {
        let DataUrl {
            content_type,
            bytes,
        } = DataUrl::parse(data_url)?;
        let size = bytes.len();

        let url = format!(
            "{}?uploadType=media&name={}",
            self.inner.objects_url,
            urlencoding::encode(path)
        );

        let response = self
            .client()
            .post(&url)
            .header("Authorization", format!("Firebase {}", token.expose()))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let metadata: ObjectMetadata = check(response, verbatim).await?.json().await?;
        debug!(name = %metadata.name, size, "Uploaded file");
        self.download_url(&metadata)
    }

    fn path_from_url(&self, url: &str) -> Result<String, GatewayError> {
        storage_path_from_url(url)
    }

    #[instrument(skip(self, token))]
    async fn delete(&self, token: &IdToken, path: &str) -> Result<(), GatewayError> {
        let response = self
            .client()
            .delete(self.object_url(path))
            .header("Authorization", format!("Firebase {}", token.expose()))
            .send()
            .await?;

        check(response, verbatim).await?;
        Ok(())
    }
}

/// Resolve a Firebase Storage reference to its object path.
///
/// Accepts download URLs (`https://.../o/{encoded}?...`), `gs://bucket/path`
/// URLs and bare paths.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidFileUrl`] for anything else.
pub fn storage_path_from_url(reference: &str) -> Result<String, GatewayError> {
    let reference = reference.trim();
    let invalid = || GatewayError::InvalidFileUrl(reference.to_string());

    if reference.is_empty() {
        return Err(invalid());
    }
    if !reference.contains("://") {
        let path = reference.trim_start_matches('/');
        return if path.is_empty() {
            Err(invalid())
        } else {
            Ok(path.to_string())
        };
    }

    let parsed = url::Url::parse(reference).map_err(|_| invalid())?;
    let encoded = match parsed.scheme() {
        "gs" => parsed.path().trim_start_matches('/'),
        "http" | "https" => parsed
            .path()
            .split_once("/o/")
            .map(|(_, encoded)| encoded)
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    let path = urlencoding::decode(encoded).map_err(|_| invalid())?;
    if path.is_empty() {
        return Err(invalid());
    }
    Ok(path.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_download_url() {
        let url = "https://firebasestorage.googleapis.com/v0/b/shop.appspot.com/o/u1%2F1700000000000?alt=media&token=abc";
        assert_eq!(storage_path_from_url(url).unwrap(), "u1/1700000000000");
    }

    #[test]
    fn test_path_from_emulator_url() {
        let url = "http://127.0.0.1:9199/v0/b/shop/o/u1%2Fimg%20one.png?alt=media";
        assert_eq!(storage_path_from_url(url).unwrap(), "u1/img one.png");
    }

    #[test]
    fn test_path_from_gs_url_and_bare_path() {
        assert_eq!(
            storage_path_from_url("gs://shop.appspot.com/u1/123").unwrap(),
            "u1/123"
        );
        assert_eq!(storage_path_from_url("/u1/123").unwrap(), "u1/123");
    }

    #[test]
    fn test_path_from_url_rejects() {
        for reference in [
            "",
            "   ",
            "https://example.com/images/a.png",
            "ftp://shop/o/u1%2F1",
            "gs://bucket-only",
        ] {
            assert!(
                matches!(
                    storage_path_from_url(reference),
                    Err(GatewayError::InvalidFileUrl(_))
                ),
                "{reference:?} should be rejected"
            );
        }
    }
}
