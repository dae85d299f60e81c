//! Add/update product form controller.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use corner_shop_core::{Product, ProductDraft, ProductError, ProductId};

use crate::gateway::{DataUrl, Gateway, GatewayError, encode, paths};
use crate::models::CurrentUser;

/// Why a product could not be saved.
#[derive(Debug, Error)]
pub enum SaveProductError {
    /// The form is invalid.
    #[error(transparent)]
    Invalid(#[from] ProductError),

    /// The gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Saves products for one signed-in user.
pub struct ProductForm<'a> {
    gateway: &'a Gateway,
    user: &'a CurrentUser,
}

impl<'a> ProductForm<'a> {
    /// Form acting for `user`.
    #[must_use]
    pub const fn new(gateway: &'a Gateway, user: &'a CurrentUser) -> Self {
        Self { gateway, user }
    }

    /// Create a product: upload its image to `{uid}/{unix_millis}`, then add
    /// the document with the image's download URL.
    ///
    /// # Errors
    ///
    /// Returns `SaveProductError::Invalid` for a bad draft or a missing image,
    /// `SaveProductError::Gateway` if the upload or the write fails.
    #[instrument(skip_all, fields(uid = %self.user.uid))]
    pub async fn create(
        &self,
        draft: ProductDraft,
        image: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Product, SaveProductError> {
        let mut draft = draft.validate()?;
        let image = non_empty(image).ok_or(ProductError::MissingImage)?;
        check_image(image)?;

        let path = paths::product_image(&self.user.uid, now.timestamp_millis());
        draft.image = self
            .gateway
            .files
            .upload_data_url(&self.user.id_token, &path, image)
            .await?;

        let document = self
            .gateway
            .documents
            .add(
                &self.user.id_token,
                &paths::user_products(&self.user.uid),
                encode(&draft)?,
            )
            .await?;

        info!(product_id = %document.id, "Product created");
        Ok(Product::from_draft(ProductId::new(document.id), draft))
    }

    /// Update a product. A new image replaces the file at the existing
    /// image's path; without one the current image is kept.
    ///
    /// # Errors
    ///
    /// Returns `SaveProductError::Invalid` for a bad draft,
    /// `SaveProductError::Gateway` if the upload or the write fails.
    #[instrument(skip_all, fields(uid = %self.user.uid, product_id = %existing.id))]
    pub async fn update(
        &self,
        existing: &Product,
        draft: ProductDraft,
        image: Option<&str>,
    ) -> Result<Product, SaveProductError> {
        let mut draft = draft.validate()?;

        draft.image = match non_empty(image) {
            Some(image) => {
                check_image(image)?;
                let path = self.gateway.files.path_from_url(&existing.image)?;
                self.gateway
                    .files
                    .upload_data_url(&self.user.id_token, &path, image)
                    .await?
            }
            None => existing.image.clone(),
        };

        self.gateway
            .documents
            .update(
                &self.user.id_token,
                &paths::user_product(&self.user.uid, &existing.id),
                encode(&draft)?,
            )
            .await?;

        info!("Product updated");
        Ok(Product::from_draft(existing.id.clone(), draft))
    }
}

fn non_empty(image: Option<&str>) -> Option<&str> {
    image.map(str::trim).filter(|s| !s.is_empty())
}

fn check_image(data_url: &str) -> Result<(), GatewayError> {
    if DataUrl::parse(data_url)?.is_image() {
        Ok(())
    } else {
        Err(GatewayError::InvalidDataUrl(
            "the selected file is not an image".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use corner_shop_core::{Email, Price, UserId};

    use super::*;
    use crate::gateway::memory::{MemoryGateway, Operation};
    use crate::gateway::{IdToken, RefreshToken};

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";
    const GIF: &str = "data:image/gif;base64,R0lGODlh";

    fn user() -> CurrentUser {
        CurrentUser {
            uid: UserId::new("u1"),
            email: Email::parse("ana@example.com").unwrap(),
            name: "Ana".to_string(),
            id_token: IdToken::new("memory-id-u1"),
            refresh_token: RefreshToken::new("memory-refresh-u1"),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn draft(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price: Price::from_cents(999),
            sold_units: 0,
            image: String::new(),
        }
    }

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[tokio::test]
    async fn test_create_uploads_then_adds_document() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();

        let product = ProductForm::new(&gateway, &user)
            .create(draft("  Termo  "), Some(PNG), at_millis(1_700_000_000_000))
            .await
            .unwrap();

        assert_eq!(product.name, "Termo");
        assert_eq!(product.image, "memory://u1/1700000000000");
        assert_eq!(memory.file("u1/1700000000000").unwrap().content_type, "image/png");

        let stored = memory
            .document(&paths::user_product(&user.uid, &product.id))
            .unwrap();
        assert_eq!(stored["name"], "Termo");
        assert_eq!(stored["image"], "memory://u1/1700000000000");
        assert_eq!(
            memory.operations(),
            [Operation::UploadFile, Operation::AddDocument]
        );
    }

    #[tokio::test]
    async fn test_create_requires_valid_draft_and_image() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();
        let form = ProductForm::new(&gateway, &user);
        let now = Utc::now();

        assert!(matches!(
            form.create(draft("Tea"), Some(PNG), now).await,
            Err(SaveProductError::Invalid(ProductError::NameTooShort { .. }))
        ));
        assert!(matches!(
            form.create(draft("Termo"), Some("  "), now).await,
            Err(SaveProductError::Invalid(ProductError::MissingImage))
        ));
        assert!(matches!(
            form.create(draft("Termo"), Some("data:text/plain,hi"), now).await,
            Err(SaveProductError::Gateway(GatewayError::InvalidDataUrl(_)))
        ));
        assert!(memory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_upload_failure_writes_no_document() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();
        memory.fail(Operation::UploadFile, "quota exceeded");

        let err = ProductForm::new(&gateway, &user)
            .create(draft("Termo"), Some(PNG), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(memory.operations(), [Operation::UploadFile]);
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_url() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();
        let form = ProductForm::new(&gateway, &user);
        let created = form
            .create(draft("Termo"), Some(PNG), Utc::now())
            .await
            .unwrap();
        memory.clear_calls();

        let mut changes = created.to_draft();
        changes.price = Price::from_cents(1299);
        let updated = form.update(&created, changes, None).await.unwrap();

        assert_eq!(updated.image, created.image);
        assert_eq!(updated.price, Price::from_cents(1299));
        assert_eq!(memory.operations(), [Operation::UpdateDocument]);
    }

    #[tokio::test]
    async fn test_update_with_image_overwrites_existing_path() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();
        let form = ProductForm::new(&gateway, &user);
        let created = form
            .create(draft("Termo"), Some(PNG), at_millis(42))
            .await
            .unwrap();

        let updated = form
            .update(&created, created.to_draft(), Some(GIF))
            .await
            .unwrap();

        assert_eq!(updated.image, "memory://u1/42");
        assert_eq!(memory.file("u1/42").unwrap().content_type, "image/gif");
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        let user = user();
        let ghost = Product::from_draft(ProductId::new("ghost"), draft("Ghost"));

        let err = ProductForm::new(&gateway, &user)
            .update(&ghost, ghost.to_draft(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SaveProductError::Gateway(e) if e.is_not_found()));
    }
}
