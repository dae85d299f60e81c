//! In-process gateway for tests.
//!
//! Built for this crate's unit tests and, with the `test-support` feature,
//! for other crates' tests.
//!
//! [`MemoryGateway`] keeps documents, files and accounts in maps behind a
//! mutex. Clones share state. Every call is recorded, and any operation can
//! be made to fail so error paths can be exercised:
//!
//! ```rust,ignore
//! let memory = MemoryGateway::new();
//! memory.fail(Operation::DeleteFile, "storage unavailable");
//!
//! let gateway = Gateway::memory(&memory);
//! assert!(gateway.files.delete(&token, "u1/1").await.is_err());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use corner_shop_core::{Email, UserId};

use super::{
    AuthSession, Authenticator, DataUrl, Document, DocumentStore, Fields, FileStorage,
    GatewayError, IdToken, RefreshToken, TokenRefresh,
};

/// Scheme of download URLs handed out by [`MemoryGateway`].
pub const URL_PREFIX: &str = "memory://";

/// Lifetime of issued ID tokens.
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Gateway operations, for failure injection and the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`DocumentStore::list`]
    ListDocuments,
    /// [`DocumentStore::get`]
    GetDocument,
    /// [`DocumentStore::add`]
    AddDocument,
    /// [`DocumentStore::set`]
    SetDocument,
    /// [`DocumentStore::update`]
    UpdateDocument,
    /// [`DocumentStore::delete`]
    DeleteDocument,
    /// [`FileStorage::upload_data_url`]
    UploadFile,
    /// [`FileStorage::delete`]
    DeleteFile,
    /// [`Authenticator::sign_in`]
    SignIn,
    /// [`Authenticator::sign_up`]
    SignUp,
    /// [`Authenticator::update_profile`]
    UpdateProfile,
    /// [`Authenticator::send_password_reset`]
    SendPasswordReset,
    /// [`Authenticator::refresh`]
    RefreshToken,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// What was called.
    pub operation: Operation,
    /// Path, collection or email the call targeted.
    pub target: String,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Declared media type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<String, Fields>,
    files: BTreeMap<String, StoredFile>,
    accounts: HashMap<String, Account>,
    password_resets: Vec<String>,
    failures: HashMap<Operation, String>,
    calls: Vec<Call>,
    next_id: u64,
}

impl MemoryState {
    /// Log the call, then fail it if a failure is injected.
    fn enter(&mut self, operation: Operation, target: &str) -> Result<(), GatewayError> {
        self.calls.push(Call {
            operation,
            target: target.to_string(),
        });
        match self.failures.get(&operation) {
            Some(message) => Err(GatewayError::Provider {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    fn account_by_uid(&mut self, uid: &str) -> Option<&mut Account> {
        self.accounts
            .values_mut()
            .find(|account| account.uid.as_str() == uid)
    }
}

/// In-memory implementation of every gateway capability.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    /// An empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later call of `operation` fail with `message`.
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.state().failures.insert(operation, message.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Calls made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Operations called so far, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.state().calls.iter().map(|c| c.operation).collect()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Fields of the document at `path`.
    #[must_use]
    pub fn document(&self, path: &str) -> Option<Fields> {
        self.state().documents.get(path).cloned()
    }

    /// Store a document directly, bypassing the call log.
    pub fn insert_document(&self, path: impl Into<String>, fields: Fields) {
        self.state().documents.insert(path.into(), fields);
    }

    /// The file at `path`.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<StoredFile> {
        self.state().files.get(path).cloned()
    }

    /// Store a file directly and return its download URL.
    pub fn insert_file(&self, path: impl Into<String>, content_type: &str, bytes: &[u8]) -> String {
        let path = path.into();
        let url = download_url(&path);
        self.state().files.insert(
            path,
            StoredFile {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        url
    }

    /// Register an account directly and return its uid.
    pub fn add_account(&self, email: &Email, password: &str, display_name: Option<&str>) -> UserId {
        let mut state = self.state();
        let uid = UserId::new(state.next_id("uid"));
        state.accounts.insert(
            email.as_str().to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                display_name: display_name.map(ToString::to_string),
            },
        );
        uid
    }

    /// Display name currently set on the account `uid`.
    #[must_use]
    pub fn display_name(&self, uid: &UserId) -> Option<String> {
        self.state()
            .account_by_uid(uid.as_str())
            .and_then(|a| a.display_name.clone())
    }

    /// Emails a password reset was sent to, oldest first.
    #[must_use]
    pub fn password_resets(&self) -> Vec<String> {
        self.state().password_resets.clone()
    }
}

/// Download URL for a stored path.
#[must_use]
pub fn download_url(path: &str) -> String {
    format!("{URL_PREFIX}{path}")
}

fn session(uid: &UserId, email: &Email, display_name: Option<String>) -> AuthSession {
    AuthSession {
        uid: uid.clone(),
        email: email.clone(),
        display_name,
        id_token: IdToken::new(format!("memory-id-{uid}")),
        refresh_token: RefreshToken::new(format!("memory-refresh-{uid}")),
        expires_in: TOKEN_LIFETIME_SECS,
    }
}

// =============================================================================
// DocumentStore
// =============================================================================

#[async_trait]
impl DocumentStore for MemoryGateway {
    async fn list(
        &self,
        _token: &IdToken,
        collection: &str,
    ) -> Result<Vec<Document>, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::ListDocuments, collection)?;

        let prefix = format!("{}/", collection.trim_matches('/'));
        let documents = state
            .documents
            .iter()
            .filter_map(|(path, fields)| {
                let id = path.strip_prefix(&prefix)?;
                (!id.contains('/')).then(|| Document {
                    id: id.to_string(),
                    fields: fields.clone(),
                })
            })
            .collect();
        Ok(documents)
    }

    async fn get(&self, _token: &IdToken, path: &str) -> Result<Option<Document>, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::GetDocument, path)?;

        Ok(state.documents.get(path).map(|fields| Document {
            id: path.rsplit('/').next().unwrap_or_default().to_string(),
            fields: fields.clone(),
        }))
    }

    async fn add(
        &self,
        _token: &IdToken,
        collection: &str,
        fields: Fields,
    ) -> Result<Document, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::AddDocument, collection)?;

        let id = state.next_id("doc");
        let path = format!("{}/{id}", collection.trim_matches('/'));
        state.documents.insert(path, fields.clone());
        Ok(Document { id, fields })
    }

    async fn set(&self, _token: &IdToken, path: &str, fields: Fields) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::SetDocument, path)?;

        state.documents.insert(path.to_string(), fields);
        Ok(())
    }

    async fn update(
        &self,
        _token: &IdToken,
        path: &str,
        fields: Fields,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::UpdateDocument, path)?;

        let Some(existing) = state.documents.get_mut(path) else {
            return Err(GatewayError::Provider {
                status: 404,
                message: format!("No document to update: {path}"),
            });
        };
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, _token: &IdToken, path: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::DeleteDocument, path)?;

        state.documents.remove(path);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

#[async_trait]
impl FileStorage for MemoryGateway {
    async fn upload_data_url(
        &self,
        _token: &IdToken,
        path: &str,
        data_url: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::UploadFile, path)?;

        let DataUrl {
            content_type,
            bytes,
        } = DataUrl::parse(data_url)?;
        state.files.insert(
            path.to_string(),
            StoredFile {
                content_type,
                bytes,
            },
        );
        Ok(download_url(path))
    }

    fn path_from_url(&self, url: &str) -> Result<String, GatewayError> {
        url.strip_prefix(URL_PREFIX)
            .filter(|path| !path.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| GatewayError::InvalidFileUrl(url.to_string()))
    }

    async fn delete(&self, _token: &IdToken, path: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::DeleteFile, path)?;

        match state.files.remove(path) {
            Some(_) => Ok(()),
            None => Err(GatewayError::Provider {
                status: 404,
                message: "Object does not exist at location.".to_string(),
            }),
        }
    }
}

// =============================================================================
// Authenticator
// =============================================================================

#[async_trait]
impl Authenticator for MemoryGateway {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::SignIn, email.as_str())?;

        match state.accounts.get(email.as_str()) {
            Some(account) if account.password == password.expose_secret() => Ok(session(
                &account.uid,
                email,
                account.display_name.clone(),
            )),
            _ => Err(GatewayError::Provider {
                status: 400,
                message: "Invalid email or password".to_string(),
            }),
        }
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::SignUp, email.as_str())?;

        if state.accounts.contains_key(email.as_str()) {
            return Err(GatewayError::Provider {
                status: 400,
                message: "An account with this email already exists".to_string(),
            });
        }
        if password.expose_secret().chars().count() < 6 {
            return Err(GatewayError::Provider {
                status: 400,
                message: "Password should be at least 6 characters".to_string(),
            });
        }

        let uid = UserId::new(state.next_id("uid"));
        state.accounts.insert(
            email.as_str().to_string(),
            Account {
                uid: uid.clone(),
                password: password.expose_secret().to_string(),
                display_name: None,
            },
        );
        Ok(session(&uid, email, None))
    }

    async fn update_profile(
        &self,
        token: &IdToken,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::UpdateProfile, display_name)?;

        let uid = token.expose().strip_prefix("memory-id-").unwrap_or_default();
        let account = state
            .account_by_uid(uid)
            .ok_or_else(|| GatewayError::Provider {
                status: 400,
                message: "Your session has expired, please sign in again".to_string(),
            })?;
        account.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn send_password_reset(&self, email: &Email) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.enter(Operation::SendPasswordReset, email.as_str())?;

        if !state.accounts.contains_key(email.as_str()) {
            return Err(GatewayError::Provider {
                status: 400,
                message: "Invalid email or password".to_string(),
            });
        }
        state.password_resets.push(email.as_str().to_string());
        Ok(())
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenRefresh, GatewayError> {
        let mut state = self.state();
        state.enter(Operation::RefreshToken, "")?;

        let uid = refresh_token
            .expose()
            .strip_prefix("memory-refresh-")
            .unwrap_or_default();
        let Some(account) = state.account_by_uid(uid) else {
            return Err(GatewayError::Provider {
                status: 400,
                message: "Your session has expired, please sign in again".to_string(),
            });
        };

        Ok(TokenRefresh {
            id_token: IdToken::new(format!("memory-id-{}", account.uid)),
            refresh_token: refresh_token.clone(),
            expires_in: TOKEN_LIFETIME_SECS,
        })
    }
}
