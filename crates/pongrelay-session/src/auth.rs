//! Name check for declared player names.
//!
//! pongrelay has no accounts. The only gate a connection passes is a
//! format check on the name it sends as its very first frame. The check
//! sits behind the [`Authenticator`] trait so a deployment can swap in a
//! stricter policy (reserved names, a registry lookup) without touching
//! the server.

use std::future::Future;

use pongrelay_protocol::PlayerName;

use crate::SessionError;

/// Validates the raw name frame and returns the player's name.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the lifetime of the server. The returned future is
/// `Send` so handlers can run on any Tokio worker thread.
///
/// # Example
///
/// ```rust
/// use pongrelay_protocol::PlayerName;
/// use pongrelay_session::{Authenticator, SessionError};
///
/// /// Accepts only names from a fixed roster.
/// struct Roster(Vec<&'static str>);
///
/// impl Authenticator for Roster {
///     async fn authenticate(
///         &self,
///         raw: &[u8],
///     ) -> Result<PlayerName, SessionError> {
///         let name = std::str::from_utf8(raw)
///             .map_err(|_| SessionError::NameNotUtf8)?;
///         if self.0.contains(&name) {
///             Ok(PlayerName::new(name))
///         } else {
///             Err(SessionError::InvalidName(name.to_string()))
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Checks the name frame a client sent and returns its identity.
    ///
    /// # Returns
    /// - `Ok(PlayerName)`: the name is acceptable
    /// - `Err(SessionError::InvalidName | NameNotUtf8)`: close the
    ///   connection without replying
    fn authenticate(
        &self,
        raw: &[u8],
    ) -> impl Future<Output = Result<PlayerName, SessionError>> + Send;
}

/// The default policy: a non-empty name made only of alphanumeric
/// characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphanumericNames;

impl AlphanumericNames {
    /// Returns `true` if `name` passes the format check.
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty() && name.chars().all(char::is_alphanumeric)
    }
}

impl Authenticator for AlphanumericNames {
    async fn authenticate(
        &self,
        raw: &[u8],
    ) -> Result<PlayerName, SessionError> {
        let name =
            std::str::from_utf8(raw).map_err(|_| SessionError::NameNotUtf8)?;
        if Self::is_valid(name) {
            Ok(PlayerName::new(name))
        } else {
            Err(SessionError::InvalidName(name.to_string()))
        }
    }
}
