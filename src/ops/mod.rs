//! Storage use-cases.
//!
//! [`CloudieOperations`] runs each use-case against the logged-in account and
//! reports results to a [`Callback`]. It never catches or retries: a backend
//! rejection comes back as [`OpError::Recoverable`], anything else as
//! [`OpError::Fatal`], and the caller (normally the
//! [`CommandDispatcher`](crate::CommandDispatcher)) decides what to do with it.

mod containers;
mod listing;
mod objects;
mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::debug;

use crate::backend::{Account, Credentials, StorageBackend};
use crate::callback::Callback;
use crate::error::{CloudieError, CommandError, OpError, OpResult, Result};
use crate::model::{Container, ContainerSpecification, StoredObject};
use crate::session::SessionHandle;

/// Page size used when the backend is asked for listings.
pub const MAX_PAGE_SIZE: usize = 9999;

/// The full set of storage operations.
///
/// Implemented by [`CloudieOperations`]; the dispatcher wraps any
/// implementation, so tests and alternative front-ends can supply their own.
#[async_trait]
pub trait Operations: Send + Sync {
    async fn login(&self, credentials: &Credentials, callback: &dyn Callback) -> OpResult<()>;

    async fn logout(&self, callback: &dyn Callback) -> OpResult<()>;

    /// Does nothing when `spec` is `None`.
    async fn create_container(
        &self,
        spec: Option<&ContainerSpecification>,
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn create_stored_objects(
        &self,
        container: &Container,
        files: &[PathBuf],
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn delete_container(&self, container: &Container, callback: &dyn Callback)
    -> OpResult<()>;

    async fn delete_stored_objects(
        &self,
        container: &Container,
        objects: &[StoredObject],
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn download_stored_object(
        &self,
        container: &Container,
        object: &StoredObject,
        target: &Path,
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn empty_container(&self, container: &Container, callback: &dyn Callback)
    -> OpResult<()>;

    async fn purge_container(&self, container: &Container, callback: &dyn Callback)
    -> OpResult<()>;

    async fn refresh_containers(&self, callback: &dyn Callback) -> OpResult<()>;

    async fn refresh_stored_objects(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn get_container_metadata(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()>;

    async fn get_object_metadata(
        &self,
        object: &StoredObject,
        callback: &dyn Callback,
    ) -> OpResult<()>;
}

/// Tunables for [`CloudieOperations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationsConfig {
    /// Number of entries requested per listing page
    pub page_size: usize,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl OperationsConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CloudieError::Configuration(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage operations over a [`StorageBackend`].
///
/// Holds the session for the account logged in through it. Cloning shares
/// the same session.
#[derive(Clone)]
pub struct CloudieOperations {
    backend: Arc<dyn StorageBackend>,
    session: SessionHandle,
    config: OperationsConfig,
}

impl CloudieOperations {
    /// Create a logged-out service on the current tokio runtime.
    pub fn new(backend: impl StorageBackend + 'static) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| {
            CloudieError::Configuration("no tokio runtime is running".to_string())
        })?;
        Ok(Self::with_runtime(backend, &runtime))
    }

    /// Create a logged-out service whose session lives on `runtime`.
    pub fn with_runtime(backend: impl StorageBackend + 'static, runtime: &Handle) -> Self {
        Self {
            backend: Arc::new(backend),
            session: SessionHandle::spawn_on(runtime),
            config: OperationsConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: OperationsConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &OperationsConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The logged-in account, or [`CommandError::NotLoggedIn`].
    async fn account(&self) -> OpResult<Arc<dyn Account>> {
        self.session
            .account()
            .await?
            .ok_or(OpError::Recoverable(CommandError::NotLoggedIn))
    }

    /// Authenticate and install the resulting account as the live session.
    pub async fn login(&self, credentials: &Credentials, callback: &dyn Callback) -> OpResult<()> {
        debug!(
            auth_url = %credentials.auth_url,
            tenant = %credentials.tenant,
            username = %credentials.username,
            "logging in"
        );
        let account = self.backend.authenticate(credentials).await?;
        let calls = account.number_of_calls();
        self.session.install(account).await?;

        callback.on_login_success();
        callback.on_number_of_calls(calls);
        Ok(())
    }

    /// Drop the live session. No backend call is made.
    pub async fn logout(&self, callback: &dyn Callback) -> OpResult<()> {
        let was_live = self.session.clear().await?;
        debug!(was_live, "logged out");

        callback.on_logout_success();
        callback.on_number_of_calls(0);
        Ok(())
    }
}

#[async_trait]
impl Operations for CloudieOperations {
    async fn login(&self, credentials: &Credentials, callback: &dyn Callback) -> OpResult<()> {
        CloudieOperations::login(self, credentials, callback).await
    }

    async fn logout(&self, callback: &dyn Callback) -> OpResult<()> {
        CloudieOperations::logout(self, callback).await
    }

    async fn create_container(
        &self,
        spec: Option<&ContainerSpecification>,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::create_container(self, spec, callback).await
    }

    async fn create_stored_objects(
        &self,
        container: &Container,
        files: &[PathBuf],
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::create_stored_objects(self, container, files, callback).await
    }

    async fn delete_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::delete_container(self, container, callback).await
    }

    async fn delete_stored_objects(
        &self,
        container: &Container,
        objects: &[StoredObject],
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::delete_stored_objects(self, container, objects, callback).await
    }

    async fn download_stored_object(
        &self,
        container: &Container,
        object: &StoredObject,
        target: &Path,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::download_stored_object(self, container, object, target, callback).await
    }

    async fn empty_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::empty_container(self, container, callback).await
    }

    async fn purge_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::purge_container(self, container, callback).await
    }

    async fn refresh_containers(&self, callback: &dyn Callback) -> OpResult<()> {
        CloudieOperations::refresh_containers(self, callback).await
    }

    async fn refresh_stored_objects(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::refresh_stored_objects(self, container, callback).await
    }

    async fn get_container_metadata(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::get_container_metadata(self, container, callback).await
    }

    async fn get_object_metadata(
        &self,
        object: &StoredObject,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        CloudieOperations::get_object_metadata(self, object, callback).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{credentials, drain};
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::callback::{CallbackEvent, ChannelCallback};
    use crate::session::SessionState;

    #[tokio::test]
    async fn test_login_emits_success_then_calls() {
        let ops = CloudieOperations::new(MemoryBackend::new()).unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        ops.login(&credentials(), &callback).await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![CallbackEvent::LoginSuccess, CallbackEvent::NumberOfCalls(1)]
        );
        assert_eq!(
            ops.session().state().await.unwrap(),
            SessionState::LoggedIn
        );
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let backend = MemoryBackend::new().with_user("tenant", "user", "other");
        let ops = CloudieOperations::new(backend).unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        let err = ops.login(&credentials(), &callback).await.unwrap_err();

        assert!(matches!(
            err,
            OpError::Recoverable(CommandError::Unauthorized)
        ));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(
            ops.session().state().await.unwrap(),
            SessionState::LoggedOut
        );
    }

    #[tokio::test]
    async fn test_logout_emits_zero_calls() {
        let backend = MemoryBackend::new();
        let ops = testing::logged_in(&backend, MAX_PAGE_SIZE).await;
        let (callback, mut rx) = ChannelCallback::new();

        ops.logout(&callback).await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![CallbackEvent::LogoutSuccess, CallbackEvent::NumberOfCalls(0)]
        );
        assert_eq!(
            ops.session().state().await.unwrap(),
            SessionState::LoggedOut
        );
        // Logging out is local only.
        assert_eq!(backend.journal(), vec!["POST /auth".to_string()]);
    }

    #[tokio::test]
    async fn test_operations_require_login() {
        let ops = CloudieOperations::new(MemoryBackend::new()).unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        let err = ops.refresh_containers(&callback).await.unwrap_err();

        assert!(matches!(err, OpError::Recoverable(CommandError::NotLoggedIn)));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected() {
        let ops = CloudieOperations::new(MemoryBackend::new()).unwrap();
        let err = ops
            .with_config(OperationsConfig::default().with_page_size(0))
            .err()
            .unwrap();
        assert!(matches!(err, CloudieError::Configuration(_)));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let err = CloudieOperations::new(MemoryBackend::new()).err().unwrap();
        assert!(matches!(err, CloudieError::Configuration(_)));
    }

    #[test]
    fn test_default_page_size() {
        assert_eq!(OperationsConfig::default().page_size, 9999);
    }
}
