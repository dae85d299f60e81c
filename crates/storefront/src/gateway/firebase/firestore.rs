//! Firestore v1 document endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::value::{decode_fields, encode_fields};
use super::{FirebaseGateway, check, verbatim};
use crate::gateway::{Document, DocumentStore, Fields, GatewayError, IdToken};

/// Documents requested per list page.
const PAGE_SIZE: u32 = 300;

#[derive(Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirestoreDocument {
    fn into_document(self) -> Result<Document, GatewayError> {
        // name is "projects/{p}/databases/(default)/documents/{path}"
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Document {
            id,
            fields: decode_fields(&self.fields)?,
        })
    }
}

impl FirebaseGateway {
    fn document_url(&self, path: &str) -> Result<url::Url, GatewayError> {
        let raw = format!("{}/{}", self.inner.documents_url, path.trim_matches('/'));
        url::Url::parse(&raw).map_err(|e| GatewayError::Decode(format!("document URL {raw}: {e}")))
    }
}

#[async_trait]
impl DocumentStore for FirebaseGateway {
    #[instrument(skip(self, token))]
    async fn list(
        &self,
        token: &IdToken,
        collection: &str,
    ) -> Result<Vec<Document>, GatewayError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.document_url(collection)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(page_token) = &page_token {
                    query.append_pair("pageToken", page_token);
                }
            }

            let response = self
                .client()
                .get(url)
                .bearer_auth(token.expose())
                .send()
                .await?;
            let page: ListDocumentsResponse = check(response, verbatim).await?.json().await?;

            for document in page.documents {
                documents.push(document.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }

    #[instrument(skip(self, token))]
    async fn get(&self, token: &IdToken, path: &str) -> Result<Option<Document>, GatewayError> {
        let response = self
            .client()
            .get(self.document_url(path)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: FirestoreDocument = check(response, verbatim).await?.json().await?;
        document.into_document().map(Some)
    }

    #[instrument(skip(self, token, fields))]
    async fn add(
        &self,
        token: &IdToken,
        collection: &str,
        fields: Fields,
    ) -> Result<Document, GatewayError> {
        let response = self
            .client()
            .post(self.document_url(collection)?)
            .bearer_auth(token.expose())
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        let document: FirestoreDocument = check(response, verbatim).await?.json().await?;
        let document = document.into_document()?;
        debug!(id = %document.id, "Added document");
        Ok(document)
    }

    #[instrument(skip(self, token, fields))]
    async fn set(&self, token: &IdToken, path: &str, fields: Fields) -> Result<(), GatewayError> {
        // PATCH without an update mask replaces the whole document.
        let response = self
            .client()
            .patch(self.document_url(path)?)
            .bearer_auth(token.expose())
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        check(response, verbatim).await?;
        Ok(())
    }

    #[instrument(skip(self, token, fields))]
    async fn update(
        &self,
        token: &IdToken,
        path: &str,
        fields: Fields,
    ) -> Result<(), GatewayError> {
        let mut url = self.document_url(path)?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", key);
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let response = self
            .client()
            .patch(url)
            .bearer_auth(token.expose())
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        check(response, verbatim).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn delete(&self, token: &IdToken, path: &str) -> Result<(), GatewayError> {
        let response = self
            .client()
            .delete(self.document_url(path)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        check(response, verbatim).await?;
        Ok(())
    }
}
