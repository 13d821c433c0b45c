//! Delegating callback with per-notification overrides.

use std::fmt;
use std::sync::Arc;

use super::{Callback, SharedCallback};
use crate::error::CommandError;
use crate::model::{Container, StoredObject};

/// Hook run instead of forwarding `on_error`.
pub type ErrorHook = Arc<dyn Fn(&CommandError) + Send + Sync>;

/// Hook run before forwarding a notification that carries no data.
pub type NotifyHook = Arc<dyn Fn() + Send + Sync>;

/// Forwards every notification to an inner callback.
///
/// Hooks let a caller intercept individual notifications for a single
/// operation, e.g. a login dialog that closes itself on success and shows
/// failures locally instead of in the main window:
///
/// ```no_run
/// use std::sync::Arc;
/// use cloudie::callback::{ChannelCallback, ForwardingCallback};
///
/// let (main_window, _events) = ChannelCallback::shared();
/// let login_callback = ForwardingCallback::new(main_window)
///     .before_login_success(|| println!("closing login dialog"))
///     .replace_on_error(|err| eprintln!("Login failed: {}", err));
/// let login_callback = Arc::new(login_callback);
/// ```
#[derive(Clone)]
pub struct ForwardingCallback {
    inner: SharedCallback,
    on_error: Option<ErrorHook>,
    before_login_success: Option<NotifyHook>,
    before_done: Option<NotifyHook>,
}

impl fmt::Debug for ForwardingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingCallback")
            .field("on_error", &self.on_error.is_some())
            .field("before_login_success", &self.before_login_success.is_some())
            .field("before_done", &self.before_done.is_some())
            .finish()
    }
}

impl ForwardingCallback {
    pub fn new(inner: SharedCallback) -> Self {
        Self {
            inner,
            on_error: None,
            before_login_success: None,
            before_done: None,
        }
    }

    /// Handle errors locally; they are no longer forwarded.
    pub fn replace_on_error(mut self, f: impl Fn(&CommandError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Run `f` before `on_login_success` is forwarded.
    pub fn before_login_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_login_success = Some(Arc::new(f));
        self
    }

    /// Run `f` before `on_done` is forwarded.
    pub fn before_done(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_done = Some(Arc::new(f));
        self
    }
}

impl Callback for ForwardingCallback {
    fn on_start(&self) {
        self.inner.on_start();
    }

    fn on_done(&self) {
        if let Some(hook) = &self.before_done {
            hook();
        }
        self.inner.on_done();
    }

    fn on_error(&self, error: &CommandError) {
        match &self.on_error {
            Some(hook) => hook(error),
            None => self.inner.on_error(error),
        }
    }

    fn on_update_containers(&self, containers: &[Container]) {
        self.inner.on_update_containers(containers);
    }

    fn on_new_stored_objects(&self) {
        self.inner.on_new_stored_objects();
    }

    fn on_append_stored_objects(&self, container: &Container, page: usize, objects: &[StoredObject]) {
        self.inner.on_append_stored_objects(container, page, objects);
    }

    fn on_login_success(&self) {
        if let Some(hook) = &self.before_login_success {
            hook();
        }
        self.inner.on_login_success();
    }

    fn on_logout_success(&self) {
        self.inner.on_logout_success();
    }

    fn on_container_update(&self, container: &Container) {
        self.inner.on_container_update(container);
    }

    fn on_stored_object_update(&self, object: &StoredObject) {
        self.inner.on_stored_object_update(object);
    }

    fn on_number_of_calls(&self, calls: u64) {
        self.inner.on_number_of_calls(calls);
    }

    fn on_stored_object_deleted(&self, container: &Container, object: &StoredObject) {
        self.inner.on_stored_object_deleted(container, object);
    }
}
