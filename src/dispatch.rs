//! Non-blocking front-end for [`Operations`].
//!
//! Every call returns as soon as a worker task has been spawned. The worker
//! frames the operation for the callback:
//!
//! - `on_start` before the operation runs;
//! - `on_error` when the backend rejected it;
//! - `on_done` afterwards, whatever happened.
//!
//! Fatal failures and panics are not reported to the callback. They are
//! logged and re-raised as a panic of the worker task once `on_done` has been
//! delivered, and surface through [`Dispatched::finished`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::backend::Credentials;
use crate::callback::SharedCallback;
use crate::error::{CloudieError, FatalError, OpError, OpResult, Result};
use crate::model::{Container, ContainerSpecification, StoredObject};
use crate::ops::{CloudieOperations, Operations};

/// Runs operations on worker tasks.
pub struct CommandDispatcher<O: ?Sized = CloudieOperations> {
    ops: Arc<O>,
    runtime: Handle,
}

impl<O: ?Sized> Clone for CommandDispatcher<O> {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
            runtime: self.runtime.clone(),
        }
    }
}

/// Completion handle of one dispatched operation.
///
/// Dropping it detaches the worker; the operation still runs to completion.
/// There is no way to abort it.
#[derive(Debug)]
pub struct Dispatched {
    operation: &'static str,
    handle: JoinHandle<()>,
}

impl Dispatched {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker to end.
    ///
    /// Recoverable errors were already delivered to the callback and count
    /// as success here. Returns an error when the operation failed fatally
    /// or panicked.
    pub async fn finished(self) -> Result<()> {
        match self.handle.await {
            Ok(()) => Ok(()),
            Err(err) if err.is_panic() => {
                Err(FatalError::Defect(panic_message(err.into_panic())).into())
            }
            Err(err) => Err(FatalError::Defect(format!("{}: {}", self.operation, err)).into()),
        }
    }
}

/// How a worker ended when the callback could not be told.
enum Failure {
    Fatal(FatalError),
    Panic(Box<dyn Any + Send>),
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl<O: Operations + ?Sized + 'static> CommandDispatcher<O> {
    /// Dispatch onto the current tokio runtime.
    pub fn new(ops: Arc<O>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| {
            CloudieError::Configuration("no tokio runtime is running".to_string())
        })?;
        Ok(Self::with_runtime(ops, runtime))
    }

    /// Dispatch onto `runtime`. Usable from threads outside any runtime.
    pub fn with_runtime(ops: Arc<O>, runtime: Handle) -> Self {
        Self { ops, runtime }
    }

    pub fn operations(&self) -> &Arc<O> {
        &self.ops
    }

    fn dispatch<F, Fut>(
        &self,
        operation: &'static str,
        callback: Option<SharedCallback>,
        run: F,
    ) -> Result<Dispatched>
    where
        F: FnOnce(Arc<O>, SharedCallback) -> Fut,
        Fut: Future<Output = OpResult<()>> + Send + 'static,
    {
        let callback = callback.ok_or_else(|| {
            CloudieError::Configuration(format!("{} requires a callback", operation))
        })?;
        let work = run(Arc::clone(&self.ops), Arc::clone(&callback));

        debug!(operation, "dispatching");
        let handle = self.runtime.spawn(async move {
            let guarded = {
                let callback = Arc::clone(&callback);
                async move {
                    callback.on_start();
                    work.await
                }
            };
            let outcome = AssertUnwindSafe(guarded).catch_unwind().await;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(OpError::Recoverable(err))) => {
                    warn!(operation, error = %err, "operation failed");
                    callback.on_error(&err);
                    None
                }
                Ok(Err(OpError::Fatal(err))) => Some(Failure::Fatal(err)),
                Err(payload) => Some(Failure::Panic(payload)),
            };

            callback.on_done();
            debug!(operation, "operation done");

            match failure {
                None => {}
                Some(Failure::Fatal(err)) => {
                    error!(operation, error = %err, "operation failed fatally");
                    panic!("{} failed: {}", operation, err);
                }
                Some(Failure::Panic(payload)) => {
                    error!(operation, "operation panicked");
                    std::panic::resume_unwind(payload);
                }
            }
        });

        Ok(Dispatched { operation, handle })
    }

    pub fn login(
        &self,
        credentials: Credentials,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("login", callback, move |ops, callback| async move {
            ops.login(&credentials, &*callback).await
        })
    }

    pub fn logout(&self, callback: Option<SharedCallback>) -> Result<Dispatched> {
        self.dispatch("logout", callback, |ops, callback| async move {
            ops.logout(&*callback).await
        })
    }

    pub fn create_container(
        &self,
        spec: Option<ContainerSpecification>,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("create_container", callback, move |ops, callback| async move {
            ops.create_container(spec.as_ref(), &*callback).await
        })
    }

    pub fn create_stored_objects(
        &self,
        container: Container,
        files: Vec<PathBuf>,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("create_stored_objects", callback, move |ops, callback| async move {
            ops.create_stored_objects(&container, &files, &*callback).await
        })
    }

    pub fn delete_container(
        &self,
        container: Container,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("delete_container", callback, move |ops, callback| async move {
            ops.delete_container(&container, &*callback).await
        })
    }

    pub fn delete_stored_objects(
        &self,
        container: Container,
        objects: Vec<StoredObject>,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("delete_stored_objects", callback, move |ops, callback| async move {
            ops.delete_stored_objects(&container, &objects, &*callback).await
        })
    }

    pub fn download_stored_object(
        &self,
        container: Container,
        object: StoredObject,
        target: PathBuf,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("download_stored_object", callback, move |ops, callback| async move {
            ops.download_stored_object(&container, &object, &target, &*callback)
                .await
        })
    }

    pub fn empty_container(
        &self,
        container: Container,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("empty_container", callback, move |ops, callback| async move {
            ops.empty_container(&container, &*callback).await
        })
    }

    pub fn purge_container(
        &self,
        container: Container,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("purge_container", callback, move |ops, callback| async move {
            ops.purge_container(&container, &*callback).await
        })
    }

    pub fn refresh_containers(&self, callback: Option<SharedCallback>) -> Result<Dispatched> {
        self.dispatch("refresh_containers", callback, |ops, callback| async move {
            ops.refresh_containers(&*callback).await
        })
    }

    pub fn refresh_stored_objects(
        &self,
        container: Container,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("refresh_stored_objects", callback, move |ops, callback| async move {
            ops.refresh_stored_objects(&container, &*callback).await
        })
    }

    pub fn get_container_metadata(
        &self,
        container: Container,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("get_container_metadata", callback, move |ops, callback| async move {
            ops.get_container_metadata(&container, &*callback).await
        })
    }

    pub fn get_object_metadata(
        &self,
        object: StoredObject,
        callback: Option<SharedCallback>,
    ) -> Result<Dispatched> {
        self.dispatch("get_object_metadata", callback, move |ops, callback| async move {
            ops.get_object_metadata(&object, &*callback).await
        })
    }
}
