//! Storage backend capability.
//!
//! The transport to the object store lives outside this crate. It is consumed
//! through two traits: [`StorageBackend`] authenticates and yields an
//! [`Account`], and the account performs container and object calls while
//! counting its round-trips.

pub mod memory;
mod status;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::error::CommandResult;
use crate::model::{Container, Metadata, PageCursor, StoredObject, Visibility};

pub use memory::MemoryBackend;
pub use status::StatusKind;

/// Object content delivered by the backend, one chunk at a time.
pub type DownloadStream = BoxStream<'static, CommandResult<Bytes>>;

/// Object content handed to the backend, one chunk at a time.
///
/// Read failures are local; a backend reports them as
/// [`CommandError::Transport`](crate::error::CommandError::Transport).
pub type UploadBody = BoxStream<'static, std::io::Result<Bytes>>;

/// Upload body made of a single in-memory chunk.
pub fn upload_body(data: impl Into<Bytes>) -> UploadBody {
    stream::once(futures::future::ready(Ok(data.into()))).boxed()
}

/// Login parameters for an object-storage endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_url: String,
    pub tenant: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        auth_url: impl Into<String>,
        tenant: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            tenant: tenant.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_url", &self.auth_url)
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Entry point of a storage service.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Authenticate and return a handle to the account.
    async fn authenticate(&self, credentials: &Credentials) -> CommandResult<Arc<dyn Account>>;
}

/// An authenticated account.
///
/// Every method except [`Account::number_of_calls`] is one round-trip to the
/// backend and increments the call counter, whether it succeeds or not.
#[async_trait]
pub trait Account: Send + Sync {
    /// List up to `page_size` containers after `cursor`, ordered by name.
    async fn list_containers(
        &self,
        cursor: &PageCursor,
        page_size: usize,
    ) -> CommandResult<Vec<Container>>;

    /// Snapshot of a container. Missing containers yield `exists == false`.
    async fn container(&self, name: &str) -> CommandResult<Container>;

    async fn create_container(&self, name: &str) -> CommandResult<Container>;

    async fn set_container_visibility(
        &self,
        name: &str,
        visibility: Visibility,
    ) -> CommandResult<()>;

    /// Delete an empty container.
    async fn delete_container(&self, name: &str) -> CommandResult<()>;

    async fn container_metadata(&self, name: &str) -> CommandResult<Metadata>;

    /// List up to `page_size` objects whose names start with `prefix` and
    /// sort after `cursor`, ordered by name.
    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
        cursor: &PageCursor,
        page_size: usize,
    ) -> CommandResult<Vec<StoredObject>>;

    /// Store the content of `body` under `name`, replacing any existing
    /// object.
    async fn upload_object(
        &self,
        container: &str,
        name: &str,
        body: UploadBody,
    ) -> CommandResult<StoredObject>;

    /// Stream the content of an object.
    async fn download_object(&self, container: &str, name: &str) -> CommandResult<DownloadStream>;

    async fn delete_object(&self, container: &str, name: &str) -> CommandResult<()>;

    async fn object_metadata(&self, container: &str, name: &str) -> CommandResult<Metadata>;

    /// Cumulative number of backend round-trips made through this account.
    fn number_of_calls(&self) -> u64;
}
