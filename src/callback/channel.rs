//! Channel-backed callback for thread-affine consumers.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{Callback, SharedCallback};
use crate::error::CommandError;
use crate::model::{Container, StoredObject};

/// One notification, as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CallbackEvent {
    Start,
    Done,
    Error(CommandError),
    UpdateContainers(Vec<Container>),
    NewStoredObjects,
    AppendStoredObjects {
        container: Container,
        page: usize,
        objects: Vec<StoredObject>,
    },
    LoginSuccess,
    LogoutSuccess,
    ContainerUpdate(Container),
    StoredObjectUpdate(StoredObject),
    NumberOfCalls(u64),
    StoredObjectDeleted {
        container: Container,
        object: StoredObject,
    },
}

impl CallbackEvent {
    /// Replay this event onto `target`.
    pub fn deliver(&self, target: &dyn Callback) {
        match self {
            CallbackEvent::Start => target.on_start(),
            CallbackEvent::Done => target.on_done(),
            CallbackEvent::Error(error) => target.on_error(error),
            CallbackEvent::UpdateContainers(containers) => target.on_update_containers(containers),
            CallbackEvent::NewStoredObjects => target.on_new_stored_objects(),
            CallbackEvent::AppendStoredObjects {
                container,
                page,
                objects,
            } => target.on_append_stored_objects(container, *page, objects),
            CallbackEvent::LoginSuccess => target.on_login_success(),
            CallbackEvent::LogoutSuccess => target.on_logout_success(),
            CallbackEvent::ContainerUpdate(container) => target.on_container_update(container),
            CallbackEvent::StoredObjectUpdate(object) => target.on_stored_object_update(object),
            CallbackEvent::NumberOfCalls(calls) => target.on_number_of_calls(*calls),
            CallbackEvent::StoredObjectDeleted { container, object } => {
                target.on_stored_object_deleted(container, object)
            }
        }
    }
}

/// Callback that turns every notification into a [`CallbackEvent`] on an
/// unbounded channel.
///
/// The receiving side drains events on whichever thread owns the real sink,
/// either with `recv().await` or, from a non-async loop, `blocking_recv()` /
/// `try_recv()`. Events sent after the receiver is dropped are discarded.
#[derive(Clone)]
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<CallbackEvent>,
}

impl ChannelCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallbackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Same as [`ChannelCallback::new`], already wrapped for the dispatcher.
    pub fn shared() -> (SharedCallback, mpsc::UnboundedReceiver<CallbackEvent>) {
        let (callback, rx) = Self::new();
        (std::sync::Arc::new(callback), rx)
    }

    fn send(&self, event: CallbackEvent) {
        let _ = self.tx.send(event);
    }
}

impl Callback for ChannelCallback {
    fn on_start(&self) {
        self.send(CallbackEvent::Start);
    }

    fn on_done(&self) {
        self.send(CallbackEvent::Done);
    }

    fn on_error(&self, error: &CommandError) {
        self.send(CallbackEvent::Error(error.clone()));
    }

    fn on_update_containers(&self, containers: &[Container]) {
        self.send(CallbackEvent::UpdateContainers(containers.to_vec()));
    }

    fn on_new_stored_objects(&self) {
        self.send(CallbackEvent::NewStoredObjects);
    }

    fn on_append_stored_objects(&self, container: &Container, page: usize, objects: &[StoredObject]) {
        self.send(CallbackEvent::AppendStoredObjects {
            container: container.clone(),
            page,
            objects: objects.to_vec(),
        });
    }

    fn on_login_success(&self) {
        self.send(CallbackEvent::LoginSuccess);
    }

    fn on_logout_success(&self) {
        self.send(CallbackEvent::LogoutSuccess);
    }

    fn on_container_update(&self, container: &Container) {
        self.send(CallbackEvent::ContainerUpdate(container.clone()));
    }

    fn on_stored_object_update(&self, object: &StoredObject) {
        self.send(CallbackEvent::StoredObjectUpdate(object.clone()));
    }

    fn on_number_of_calls(&self, calls: u64) {
        self.send(CallbackEvent::NumberOfCalls(calls));
    }

    fn on_stored_object_deleted(&self, container: &Container, object: &StoredObject) {
        self.send(CallbackEvent::StoredObjectDeleted {
            container: container.clone(),
            object: object.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counter {
        calls: Mutex<Vec<u64>>,
        done: Mutex<usize>,
    }

    impl Callback for Counter {
        fn on_number_of_calls(&self, calls: u64) {
            self.calls.lock().unwrap().push(calls);
        }

        fn on_done(&self) {
            *self.done.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_events_replay_in_order() {
        let (callback, mut rx) = ChannelCallback::new();
        callback.on_start();
        callback.on_number_of_calls(3);
        callback.on_number_of_calls(4);
        callback.on_done();

        let target = Counter::default();
        while let Ok(event) = rx.try_recv() {
            event.deliver(&target);
        }

        assert_eq!(*target.calls.lock().unwrap(), vec![3, 4]);
        assert_eq!(*target.done.lock().unwrap(), 1);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_ignored() {
        let (callback, rx) = ChannelCallback::new();
        drop(rx);
        callback.on_start();
        callback.on_error(&CommandError::NotLoggedIn);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(CallbackEvent::NumberOfCalls(7)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "number_of_calls", "data": 7}));

        let json = serde_json::to_value(CallbackEvent::Start).unwrap();
        assert_eq!(json, serde_json::json!({"type": "start"}));
    }
}
