//! Actor owning the session.
//!
//! Login, logout and every operation run on their own worker tasks. The
//! session they share is only touched by the actor task, so concurrent
//! login/logout/operation calls are applied one at a time in arrival order.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::backend::Account;
use crate::error::{CloudieError, Result};
use crate::session::core::{Session, SessionState};

/// Snapshot of the session as seen by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub state: SessionState,
    pub number_of_calls: u64,
    pub logins: u64,
}

/// Cloneable handle to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

enum SessionCommand {
    Install {
        account: Arc<dyn Account>,
        reply: oneshot::Sender<()>,
    },
    Clear {
        reply: oneshot::Sender<bool>,
    },
    Account {
        reply: oneshot::Sender<Option<Arc<dyn Account>>>,
    },
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct SessionActor {
    session: Session,
    rx: mpsc::Receiver<SessionCommand>,
}

impl SessionHandle {
    /// Start a logged-out session on the current tokio runtime.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn spawn() -> Self {
        SessionActor::spawn(&Handle::current())
    }

    /// Start a logged-out session on the given runtime.
    pub fn spawn_on(runtime: &Handle) -> Self {
        SessionActor::spawn(runtime)
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> SessionCommand,
    ) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        let cmd = build(tx);
        self.tx
            .send(cmd)
            .await
            .map_err(|_| CloudieError::SessionStopped)?;
        rx.await.map_err(|_| CloudieError::SessionStopped)
    }

    /// Make `account` the live session, replacing any previous one.
    pub async fn install(&self, account: Arc<dyn Account>) -> Result<()> {
        self.request(|reply| SessionCommand::Install { account, reply })
            .await
    }

    /// Log out locally. Returns whether a session was live.
    pub async fn clear(&self) -> Result<bool> {
        self.request(|reply| SessionCommand::Clear { reply }).await
    }

    /// The live account, if any.
    pub async fn account(&self) -> Result<Option<Arc<dyn Account>>> {
        self.request(|reply| SessionCommand::Account { reply })
            .await
    }

    pub async fn info(&self) -> Result<SessionInfo> {
        self.request(|reply| SessionCommand::Info { reply }).await
    }

    pub async fn state(&self) -> Result<SessionState> {
        Ok(self.info().await?.state)
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(SessionCommand::Shutdown { reply: tx }).await;
        let _ = rx.await;
    }
}

impl SessionActor {
    fn spawn(runtime: &Handle) -> SessionHandle {
        let (tx, rx) = mpsc::channel(64);
        let actor = SessionActor {
            session: Session::default(),
            rx,
        };
        runtime.spawn(actor.run());
        SessionHandle { tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            if self.handle_command(cmd) {
                break;
            }
        }
        debug!("session actor stopped");
    }

    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Install { account, reply } => {
                self.session.install(account);
                debug!(logins = self.session.logins(), "session installed");
                let _ = reply.send(());
            }
            SessionCommand::Clear { reply } => {
                let was_live = self.session.clear();
                debug!(was_live, "session cleared");
                let _ = reply.send(was_live);
            }
            SessionCommand::Account { reply } => {
                let _ = reply.send(self.session.account());
            }
            SessionCommand::Info { reply } => {
                let info = SessionInfo {
                    state: self.session.state(),
                    number_of_calls: self.session.number_of_calls(),
                    logins: self.session.logins(),
                };
                let _ = reply.send(info);
            }
            SessionCommand::Shutdown { reply } => {
                let _ = reply.send(());
                return true;
            }
        }
        false
    }
}
