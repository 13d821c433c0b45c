//! In-process storage backend.
//!
//! Behaves like a small object store: containers and objects are kept in
//! name order, deleting a non-empty container is a conflict, and every
//! account call is counted and written to a journal in `VERB /path` form.
//! Used for tests, demos and offline development.
//!
//! The journal keeps every entry until [`MemoryBackend::clear_journal`] is
//! called, so long-running sessions should clear it periodically.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream;

use super::{Account, Credentials, DownloadStream, StorageBackend, UploadBody};
use crate::error::{CommandError, CommandResult};
use crate::model::{Container, Metadata, PageCursor, StoredObject, Visibility};

#[derive(Default)]
struct MemoryStore {
    containers: BTreeMap<String, MemoryContainer>,
}

struct MemoryContainer {
    visibility: Visibility,
    metadata: Metadata,
    objects: BTreeMap<String, MemoryObject>,
}

impl MemoryContainer {
    fn new() -> Self {
        Self {
            visibility: Visibility::Private,
            metadata: Metadata::new(),
            objects: BTreeMap::new(),
        }
    }
}

struct MemoryObject {
    data: Bytes,
    content_type: String,
    metadata: Metadata,
}

type Journal = Arc<Mutex<Vec<String>>>;

/// Size of the chunks downloads are split into.
const CHUNK_SIZE: usize = 64 * 1024;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Object store kept entirely in memory.
///
/// Accounts obtained from the same backend share its containers, so fixtures
/// seeded through the backend are visible to every logged-in session.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
    journal: Journal,
    users: Option<HashMap<(String, String), String>>,
}

impl MemoryBackend {
    /// Create a backend that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. Once a user is registered, only registered
    /// tenant/user/password combinations can authenticate.
    pub fn with_user(
        mut self,
        tenant: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.users
            .get_or_insert_with(HashMap::new)
            .insert((tenant.into(), username.into()), password.into());
        self
    }

    /// Create a container directly, without going through an account.
    pub fn seed_container(&self, name: &str, visibility: Visibility) {
        let mut store = lock(&self.store);
        let container = store
            .containers
            .entry(name.to_string())
            .or_insert_with(MemoryContainer::new);
        container.visibility = visibility;
    }

    /// Store an object directly, creating its container if needed.
    pub fn seed_object(&self, container: &str, name: &str, data: impl Into<Bytes>) {
        let mut store = lock(&self.store);
        let container = store
            .containers
            .entry(container.to_string())
            .or_insert_with(MemoryContainer::new);
        container.objects.insert(
            name.to_string(),
            MemoryObject {
                data: data.into(),
                content_type: guess_content_type(name),
                metadata: Metadata::new(),
            },
        );
    }

    pub fn set_container_metadata(&self, container: &str, key: &str, value: &str) {
        if let Some(container) = lock(&self.store).containers.get_mut(container) {
            container.metadata.insert(key.to_string(), value.to_string());
        }
    }

    pub fn set_object_metadata(&self, container: &str, name: &str, key: &str, value: &str) {
        let mut store = lock(&self.store);
        if let Some(object) = store
            .containers
            .get_mut(container)
            .and_then(|c| c.objects.get_mut(name))
        {
            object.metadata.insert(key.to_string(), value.to_string());
        }
    }

    pub fn has_container(&self, name: &str) -> bool {
        lock(&self.store).containers.contains_key(name)
    }

    pub fn container_visibility(&self, name: &str) -> Option<Visibility> {
        lock(&self.store).containers.get(name).map(|c| c.visibility)
    }

    /// Names of the objects in a container, in listing order.
    pub fn object_names(&self, container: &str) -> Vec<String> {
        lock(&self.store)
            .containers
            .get(container)
            .map(|c| c.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call made through any account of this backend, in order.
    pub fn journal(&self) -> Vec<String> {
        lock(&self.journal).clone()
    }

    /// Drop all journal entries. Call counters are not affected.
    pub fn clear_journal(&self) {
        lock(&self.journal).clear();
    }

    fn accepts(&self, credentials: &Credentials) -> bool {
        match &self.users {
            None => true,
            Some(users) => users
                .get(&(credentials.tenant.clone(), credentials.username.clone()))
                .is_some_and(|password| *password == credentials.password),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn authenticate(&self, credentials: &Credentials) -> CommandResult<Arc<dyn Account>> {
        lock(&self.journal).push("POST /auth".to_string());
        if !self.accepts(credentials) {
            return Err(CommandError::Unauthorized);
        }

        let storage_url = format!(
            "{}/v1/AUTH_{}",
            credentials.auth_url.trim_end_matches('/'),
            credentials.tenant
        );

        Ok(Arc::new(MemoryAccount {
            store: Arc::clone(&self.store),
            journal: Arc::clone(&self.journal),
            storage_url,
            // The authentication round-trip counts as the first call.
            calls: AtomicU64::new(1),
        }))
    }
}

struct MemoryAccount {
    store: Arc<Mutex<MemoryStore>>,
    journal: Journal,
    storage_url: String,
    calls: AtomicU64,
}

impl MemoryAccount {
    fn record(&self, verb: &str, path: String) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.journal).push(format!("{} {}", verb, path));
    }

    fn container_snapshot(name: &str, container: &MemoryContainer) -> Container {
        Container {
            name: name.to_string(),
            visibility: container.visibility,
            exists: true,
            object_count: container.objects.len() as u64,
            bytes_used: container
                .objects
                .values()
                .map(|o| o.data.len() as u64)
                .sum(),
            metadata: None,
        }
    }

    fn object_snapshot(
        &self,
        container_name: &str,
        container: &MemoryContainer,
        name: &str,
        object: &MemoryObject,
    ) -> StoredObject {
        let public_url = container
            .visibility
            .is_public()
            .then(|| format!("{}/{}/{}", self.storage_url, container_name, name));

        StoredObject {
            container: container_name.to_string(),
            name: name.to_string(),
            content_length: object.data.len() as u64,
            content_type: object.content_type.clone(),
            metadata: None,
            public_url,
        }
    }
}

#[async_trait]
impl Account for MemoryAccount {
    async fn list_containers(
        &self,
        cursor: &PageCursor,
        page_size: usize,
    ) -> CommandResult<Vec<Container>> {
        self.record("GET", "/".to_string());
        let store = lock(&self.store);
        Ok(store
            .containers
            .iter()
            .filter(|(name, _)| cursor.admits(name))
            .take(page_size)
            .map(|(name, container)| Self::container_snapshot(name, container))
            .collect())
    }

    async fn container(&self, name: &str) -> CommandResult<Container> {
        self.record("HEAD", format!("/{}", name));
        let store = lock(&self.store);
        Ok(store
            .containers
            .get(name)
            .map(|container| Self::container_snapshot(name, container))
            .unwrap_or_else(|| Container::absent(name)))
    }

    async fn create_container(&self, name: &str) -> CommandResult<Container> {
        self.record("PUT", format!("/{}", name));
        let mut store = lock(&self.store);
        let container = store
            .containers
            .entry(name.to_string())
            .or_insert_with(MemoryContainer::new);
        Ok(Self::container_snapshot(name, container))
    }

    async fn set_container_visibility(
        &self,
        name: &str,
        visibility: Visibility,
    ) -> CommandResult<()> {
        self.record("POST", format!("/{}", name));
        let mut store = lock(&self.store);
        let container = store
            .containers
            .get_mut(name)
            .ok_or_else(|| CommandError::NotFound(name.to_string()))?;
        container.visibility = visibility;
        Ok(())
    }

    async fn delete_container(&self, name: &str) -> CommandResult<()> {
        self.record("DELETE", format!("/{}", name));
        let mut store = lock(&self.store);
        match store.containers.get(name) {
            None => Err(CommandError::NotFound(name.to_string())),
            Some(container) if !container.objects.is_empty() => {
                Err(CommandError::Conflict(format!("container {} is not empty", name)))
            }
            Some(_) => {
                store.containers.remove(name);
                Ok(())
            }
        }
    }

    async fn container_metadata(&self, name: &str) -> CommandResult<Metadata> {
        self.record("HEAD", format!("/{}", name));
        let store = lock(&self.store);
        store
            .containers
            .get(name)
            .map(|c| c.metadata.clone())
            .ok_or_else(|| CommandError::NotFound(name.to_string()))
    }

    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
        cursor: &PageCursor,
        page_size: usize,
    ) -> CommandResult<Vec<StoredObject>> {
        self.record("GET", format!("/{}", container));
        let store = lock(&self.store);
        let entry = store
            .containers
            .get(container)
            .ok_or_else(|| CommandError::NotFound(container.to_string()))?;

        Ok(entry
            .objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix) && cursor.admits(name))
            .take(page_size)
            .map(|(name, object)| self.object_snapshot(container, entry, name, object))
            .collect())
    }

    async fn upload_object(
        &self,
        container: &str,
        name: &str,
        mut body: UploadBody,
    ) -> CommandResult<StoredObject> {
        self.record("PUT", format!("/{}/{}", container, name));

        let mut data = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                CommandError::Transport(format!("reading upload body: {}", e))
            })?;
            data.extend_from_slice(&chunk);
        }

        let mut store = lock(&self.store);
        let entry = store
            .containers
            .get_mut(container)
            .ok_or_else(|| CommandError::NotFound(container.to_string()))?;

        entry.objects.insert(
            name.to_string(),
            MemoryObject {
                data: data.freeze(),
                content_type: guess_content_type(name),
                metadata: Metadata::new(),
            },
        );

        let entry = &*entry;
        let object = entry
            .objects
            .get(name)
            .ok_or_else(|| CommandError::NotFound(format!("{}/{}", container, name)))?;
        Ok(self.object_snapshot(container, entry, name, object))
    }

    async fn download_object(&self, container: &str, name: &str) -> CommandResult<DownloadStream> {
        self.record("GET", format!("/{}/{}", container, name));
        let data = lock(&self.store)
            .containers
            .get(container)
            .and_then(|c| c.objects.get(name))
            .map(|o| o.data.clone())
            .ok_or_else(|| CommandError::NotFound(format!("{}/{}", container, name)))?;

        let chunks: Vec<CommandResult<Bytes>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..data.len().min(start + CHUNK_SIZE))))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    async fn delete_object(&self, container: &str, name: &str) -> CommandResult<()> {
        self.record("DELETE", format!("/{}/{}", container, name));
        let mut store = lock(&self.store);
        store
            .containers
            .get_mut(container)
            .and_then(|c| c.objects.remove(name))
            .map(|_| ())
            .ok_or_else(|| CommandError::NotFound(format!("{}/{}", container, name)))
    }

    async fn object_metadata(&self, container: &str, name: &str) -> CommandResult<Metadata> {
        self.record("HEAD", format!("/{}/{}", container, name));
        let store = lock(&self.store);
        store
            .containers
            .get(container)
            .and_then(|c| c.objects.get(name))
            .map(|o| o.metadata.clone())
            .ok_or_else(|| CommandError::NotFound(format!("{}/{}", container, name)))
    }

    fn number_of_calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Guess a MIME type from the file extension.
fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::upload_body;

    fn credentials() -> Credentials {
        Credentials::new("http://localhost:8080/auth/", "tenant", "user", "pass")
    }

    #[tokio::test]
    async fn test_authenticate_with_registered_user() {
        let backend = MemoryBackend::new().with_user("tenant", "user", "pass");
        assert!(backend.authenticate(&credentials()).await.is_ok());

        let wrong = Credentials::new("http://localhost:8080/auth", "tenant", "user", "nope");
        let err = backend.authenticate(&wrong).await.err();
        assert_eq!(err, Some(CommandError::Unauthorized));
    }

    #[tokio::test]
    async fn test_calls_are_counted_even_on_failure() {
        let backend = MemoryBackend::new();
        let account = backend.authenticate(&credentials()).await.unwrap();
        assert_eq!(account.number_of_calls(), 1);

        account.container("missing").await.unwrap();
        assert!(account.delete_container("missing").await.is_err());
        assert_eq!(account.number_of_calls(), 3);
        assert_eq!(
            backend.journal(),
            vec!["POST /auth", "HEAD /missing", "DELETE /missing"]
        );
    }

    #[tokio::test]
    async fn test_list_objects_resumes_after_cursor() {
        let backend = MemoryBackend::new();
        for name in ["a.txt", "b.txt", "c.txt", "docs/d.txt"] {
            backend.seed_object("x", name, "data");
        }
        let account = backend.authenticate(&credentials()).await.unwrap();

        let first = account
            .list_objects("x", "", &PageCursor::start(), 2)
            .await
            .unwrap();
        let names: Vec<_> = first.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let second = account
            .list_objects("x", "", &PageCursor::after("b.txt"), 2)
            .await
            .unwrap();
        let names: Vec<_> = second.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "docs/d.txt"]);

        let prefixed = account
            .list_objects("x", "docs/", &PageCursor::start(), 10)
            .await
            .unwrap();
        assert_eq!(prefixed.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_non_empty_container_conflicts() {
        let backend = MemoryBackend::new();
        backend.seed_object("x", "y", "data");
        let account = backend.authenticate(&credentials()).await.unwrap();

        let err = account.delete_container("x").await.unwrap_err();
        assert!(matches!(err, CommandError::Conflict(_)));

        account.delete_object("x", "y").await.unwrap();
        account.delete_container("x").await.unwrap();
        assert!(!backend.has_container("x"));
    }

    #[tokio::test]
    async fn test_public_url_only_for_public_containers() {
        let backend = MemoryBackend::new();
        backend.seed_container("open", Visibility::Public);
        backend.seed_container("closed", Visibility::Private);
        let account = backend.authenticate(&credentials()).await.unwrap();

        let open = account
            .upload_object("open", "photo.png", upload_body("png"))
            .await
            .unwrap();
        assert_eq!(open.content_type, "image/png");
        assert_eq!(
            open.public_url.as_deref(),
            Some("http://localhost:8080/auth/v1/AUTH_tenant/open/photo.png")
        );

        let closed = account
            .upload_object("closed", "photo.png", upload_body("png"))
            .await
            .unwrap();
        assert_eq!(closed.public_url, None);
    }

    #[tokio::test]
    async fn test_upload_into_missing_container_fails() {
        let backend = MemoryBackend::new();
        let account = backend.authenticate(&credentials()).await.unwrap();
        let err = account
            .upload_object("nowhere", "a.txt", upload_body("a"))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::NotFound("nowhere".to_string()));
    }

    #[tokio::test]
    async fn test_upload_failure_while_reading_body() {
        let backend = MemoryBackend::new();
        backend.seed_container("x", Visibility::Private);
        let account = backend.authenticate(&credentials()).await.unwrap();

        let body: UploadBody = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("disk gone")),
        ])
        .boxed();
        let err = account.upload_object("x", "a.bin", body).await.unwrap_err();

        assert!(matches!(err, CommandError::Transport(_)));
        assert!(backend.object_names("x").is_empty());
    }

    #[tokio::test]
    async fn test_download_is_chunked() {
        let backend = MemoryBackend::new();
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 10)).map(|i| (i % 251) as u8).collect();
        backend.seed_object("x", "big.bin", data.clone());
        backend.seed_object("x", "empty.bin", Bytes::new());
        let account = backend.authenticate(&credentials()).await.unwrap();

        let chunks: Vec<Bytes> = account
            .download_object("x", "big.bin")
            .await
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].len(), 10);
        assert_eq!(chunks.concat(), data);

        let empty: Vec<_> = account
            .download_object("x", "empty.bin")
            .await
            .unwrap()
            .collect()
            .await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_clear_journal_keeps_call_count() {
        let backend = MemoryBackend::new();
        let account = backend.authenticate(&credentials()).await.unwrap();
        account.container("a").await.unwrap();

        backend.clear_journal();
        assert!(backend.journal().is_empty());
        assert_eq!(account.number_of_calls(), 2);

        account.container("b").await.unwrap();
        assert_eq!(backend.journal(), vec!["HEAD /b"]);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("notes.TXT"), "text/plain");
        assert_eq!(guess_content_type("photo.png"), "image/png");
        assert_eq!(guess_content_type("archive.tar.zip"), "application/zip");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }
}
