//! Signed-in user model.

use serde::{Deserialize, Serialize};

/// An authenticated user of the client.
///
/// Authentication itself happens outside this crate; a `User` is handed to
/// [`crate::Services::sign_in`] once the identity provider has accepted the
/// credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub full_name: String,
    pub email: String,
    /// Account creation time, epoch milliseconds.
    pub created_at: i64,
    pub is_active: bool,
}

impl User {
    /// Creates an active user with `created_at` set to now.
    ///
    /// ```
    /// use gestly::User;
    ///
    /// let user = User::new("u-1", "Ana Ruiz", "ana@example.com");
    /// assert!(user.is_active);
    /// ```
    pub fn new(uid: impl Into<String>, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            full_name: full_name.into(),
            email: email.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
            is_active: true,
        }
    }
}
