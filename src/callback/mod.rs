//! Notification sink for storage operations.
//!
//! Operations report progress and results by calling methods on a
//! [`Callback`]. The dispatcher adds lifecycle framing around each call:
//!
//! ```text
//! on_start
//!   ... data notifications (containers, object pages, call counts) ...
//!   on_error            (only when the backend rejected the operation)
//! on_done
//! ```
//!
//! Sinks are invoked from worker tasks on arbitrary threads. A sink that must
//! run on one particular thread (a UI event loop, typically) should hand the
//! dispatcher a [`ChannelCallback`] and replay the received
//! [`CallbackEvent`]s on that thread.

mod channel;
mod forward;

use std::sync::Arc;

use crate::error::CommandError;
use crate::model::{Container, StoredObject};

pub use channel::{CallbackEvent, ChannelCallback};
pub use forward::ForwardingCallback;

/// Receiver of operation notifications.
///
/// Every method has an empty default so a sink only implements what it
/// displays.
pub trait Callback: Send + Sync {
    /// An operation is about to run.
    fn on_start(&self) {}

    /// The operation has ended. Always follows `on_start`.
    fn on_done(&self) {}

    /// The backend rejected the operation.
    fn on_error(&self, _error: &CommandError) {}

    /// The complete, ordered container list.
    fn on_update_containers(&self, _containers: &[Container]) {}

    /// A fresh object listing starts; discard previously appended pages.
    fn on_new_stored_objects(&self) {}

    /// Next page of an object listing. `page` counts from 0.
    fn on_append_stored_objects(
        &self,
        _container: &Container,
        _page: usize,
        _objects: &[StoredObject],
    ) {
    }

    fn on_login_success(&self) {}

    fn on_logout_success(&self) {}

    /// Replacement snapshot of a container, e.g. after a metadata fetch.
    fn on_container_update(&self, _container: &Container) {}

    /// Replacement snapshot of an object, e.g. after a metadata fetch.
    fn on_stored_object_update(&self, _object: &StoredObject) {}

    /// Cumulative backend calls made in the current session.
    fn on_number_of_calls(&self, _calls: u64) {}

    fn on_stored_object_deleted(&self, _container: &Container, _object: &StoredObject) {}
}

/// Callback shared between the caller and a worker task.
pub type SharedCallback = Arc<dyn Callback>;
