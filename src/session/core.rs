//! Session state.

use std::fmt;
use std::sync::Arc;

use crate::backend::Account;

/// Whether an account is currently authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

/// The live session.
///
/// Owned exclusively by the session actor; everything else sees snapshots of
/// the account handle.
#[derive(Default)]
pub(crate) struct Session {
    /// Authenticated account, `None` while logged out
    account: Option<Arc<dyn Account>>,
    /// Number of logins performed over the lifetime of this session owner
    logins: u64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("number_of_calls", &self.number_of_calls())
            .field("logins", &self.logins)
            .finish()
    }
}

impl Session {
    /// Replace the current account. Any previous account is dropped.
    pub(crate) fn install(&mut self, account: Arc<dyn Account>) {
        self.account = Some(account);
        self.logins += 1;
    }

    /// Forget the current account. Returns whether one was installed.
    pub(crate) fn clear(&mut self) -> bool {
        self.account.take().is_some()
    }

    pub(crate) fn account(&self) -> Option<Arc<dyn Account>> {
        self.account.clone()
    }

    pub(crate) fn state(&self) -> SessionState {
        if self.account.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    /// Backend calls made through the current account; 0 while logged out.
    pub(crate) fn number_of_calls(&self) -> u64 {
        self.account
            .as_ref()
            .map(|account| account.number_of_calls())
            .unwrap_or(0)
    }

    pub(crate) fn logins(&self) -> u64 {
        self.logins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Credentials, MemoryBackend, StorageBackend};

    #[tokio::test]
    async fn test_install_and_clear() {
        let backend = MemoryBackend::new();
        let account = backend
            .authenticate(&Credentials::new("http://localhost", "t", "u", "p"))
            .await
            .unwrap();

        let mut session = Session::default();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert_eq!(session.number_of_calls(), 0);

        session.install(account);
        assert_eq!(session.state(), SessionState::LoggedIn);
        assert_eq!(session.number_of_calls(), 1);
        assert_eq!(session.logins(), 1);

        assert!(session.clear());
        assert!(!session.clear());
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert_eq!(session.number_of_calls(), 0);
    }
}
