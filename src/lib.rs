//! # cloudie
//!
//! Asynchronous operations layer for an object-storage browser.
//!
//! ## Features
//!
//! - **Non-blocking operations**: every storage call runs on its own worker
//!   task and reports back through a [`Callback`].
//! - **Lifecycle framing**: each call delivers exactly one `on_start` and one
//!   `on_done`, with `on_error` in between when the backend refused it.
//! - **Paged listings**: object listings stream to the callback page by page,
//!   ending on the first empty page.
//! - **Single-writer session**: login, logout and operations share the session
//!   through an actor, so concurrent calls are well defined.
//! - **Thread-affine sinks**: [`ChannelCallback`] turns notifications into
//!   [`CallbackEvent`]s for a UI thread to replay.
//! - **In-memory backend**: [`MemoryBackend`] for tests, demos and offline use.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cloudie::{
//!     ChannelCallback, CloudieOperations, CommandDispatcher, ContainerSpecification,
//!     Credentials, MemoryBackend,
//! };
//!
//! # async fn example() -> cloudie::Result<()> {
//! let ops = CloudieOperations::new(MemoryBackend::new())?;
//! let dispatcher = CommandDispatcher::new(Arc::new(ops))?;
//! let (callback, mut events) = ChannelCallback::shared();
//!
//! let credentials = Credentials::new("https://auth.example.com/v1.0", "tenant", "user", "secret");
//! dispatcher.login(credentials, Some(callback.clone()))?;
//! dispatcher.create_container(
//!     Some(ContainerSpecification::new("photos", true)),
//!     Some(callback.clone()),
//! )?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod callback;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod ops;
pub mod session;

// Re-export commonly used types
pub use backend::{Account, Credentials, MemoryBackend, StorageBackend};
pub use callback::{Callback, CallbackEvent, ChannelCallback, ForwardingCallback, SharedCallback};
pub use dispatch::{CommandDispatcher, Dispatched};
pub use error::{CloudieError, CommandError, FatalError, OpError, OpResult, Result};
pub use model::{Container, ContainerSpecification, Metadata, PageCursor, StoredObject, Visibility};
pub use ops::{CloudieOperations, Operations, OperationsConfig};
pub use session::{SessionHandle, SessionState};
