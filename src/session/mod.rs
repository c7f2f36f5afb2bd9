//! Signed-in session scope.
//!
//! Services are built once per process by [`crate::initialize`] and handed to
//! whoever needs them; there are no global singletons. A [`Session`] ties one
//! signed-in user to one [`ProductController`], so signing out tears down
//! every task and cache that belonged to that user.
//!
//! # Example
//!
//! ```no_run
//! use gestly::session::{SessionManager, Services};
//! use gestly::store::JsonProductStore;
//! use gestly::app::ProductSettings;
//! use gestly::User;
//! use std::sync::Arc;
//!
//! # async fn demo() -> gestly::Result<()> {
//! let services = Services::new(
//!     Arc::new(JsonProductStore::in_memory()),
//!     SessionManager::in_memory(),
//!     ProductSettings::default(),
//! );
//!
//! let session = services.sign_in(User::new("u-1", "Ana", "ana@example.com"))?;
//! session.products().load_products();
//! services.sign_out(session)?;
//! # Ok(())
//! # }
//! ```

pub mod manager;

pub use manager::{SessionManager, SessionRecord, DEFAULT_USER_NAME};

use crate::app::{ProductController, ProductSettings};
use crate::domain::error::Result;
use crate::domain::User;
use crate::store::ProductStore;
use std::sync::Arc;

/// Process-wide collaborators, built once at startup.
pub struct Services {
    store: Arc<dyn ProductStore>,
    sessions: SessionManager,
    settings: ProductSettings,
}

impl Services {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, sessions: SessionManager, settings: ProductSettings) -> Self {
        Self {
            store,
            sessions,
            settings,
        }
    }

    /// Persists `user` as signed in and opens a product session for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved or no Tokio runtime is
    /// running.
    pub fn sign_in(&self, user: User) -> Result<Session> {
        let _span = tracing::debug_span!("sign_in", uid = %user.uid).entered();

        self.sessions.save_user_session(&user)?;
        self.open_session(user)
    }

    /// Reopens the session of the persisted user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or updated, or no Tokio
    /// runtime is running.
    pub fn resume(&self) -> Result<Option<Session>> {
        let Some(user) = self.sessions.current_user()? else {
            tracing::debug!("no saved session to resume");
            return Ok(None);
        };

        tracing::debug!(uid = %user.uid, "resuming saved session");
        self.sessions.update_last_activity()?;
        self.open_session(user).map(Some)
    }

    /// Closes `session` and forgets the persisted user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be removed. The product
    /// session is closed either way.
    pub fn sign_out(&self, session: Session) -> Result<()> {
        let _span = tracing::debug_span!("sign_out", uid = %session.user.uid).entered();

        session.controller.close();
        self.sessions.clear_user_session()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub const fn settings(&self) -> &ProductSettings {
        &self.settings
    }

    fn open_session(&self, user: User) -> Result<Session> {
        let controller = ProductController::new(Arc::clone(&self.store), self.settings.clone())?;
        Ok(Session { user, controller })
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("sessions", &self.sessions)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One signed-in user and their product screen state.
#[derive(Debug)]
pub struct Session {
    user: User,
    controller: ProductController,
}

impl Session {
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn products(&self) -> &ProductController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonProductStore;

    fn services() -> Services {
        Services::new(
            Arc::new(JsonProductStore::in_memory()),
            SessionManager::in_memory(),
            ProductSettings::default(),
        )
    }

    #[tokio::test]
    async fn sign_in_then_resume_then_sign_out() {
        let services = services();
        assert!(services.resume().unwrap().is_none());

        let session = services.sign_in(User::new("u-1", "Ana", "ana@example.com")).unwrap();
        assert_eq!(session.user().uid, "u-1");
        assert!(services.sessions().is_logged_in().unwrap());

        let resumed = services.resume().unwrap().unwrap();
        assert_eq!(resumed.user().uid, "u-1");

        services.sign_out(session).unwrap();
        assert!(!services.sessions().is_logged_in().unwrap());
        assert!(services.resume().unwrap().is_none());
    }

    #[test]
    fn sign_in_outside_runtime_is_a_config_error() {
        let services = services();
        let result = services.sign_in(User::new("u-1", "Ana", "ana@example.com"));
        assert!(matches!(result, Err(crate::GestlyError::Config(_))));
    }
}
