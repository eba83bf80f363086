use tokio::sync::watch;
use tracing::info;

use shared_models::auth::Session;

use crate::models::View;

/// Holder of the current authenticated session.
///
/// Shared behind an `Arc`. Readers that react to login/logout hold a
/// receiver from [`SessionStore::subscribe`].
#[derive(Debug)]
pub struct SessionStore {
    sender: watch::Sender<Option<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replaces any existing session.
    pub fn login(&self, session: Session) {
        info!("User {} logged in", session.email);
        self.sender.send_replace(Some(session));
    }

    pub fn logout(&self) -> Option<Session> {
        let previous = self.sender.send_replace(None);
        if let Some(session) = &previous {
            info!("User {} logged out", session.email);
        }
        previous
    }

    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_some()
    }

    pub fn active_view(&self) -> View {
        if self.is_authenticated() {
            View::Dashboard
        } else {
            View::Auth
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }
}
