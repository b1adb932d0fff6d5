//! Session port.

use async_trait::async_trait;

use crate::error::Result;

/// An authenticated session with the management endpoint.
///
/// The reconciler checks this once before doing anything else, so a
/// missing session aborts the run before any catalog fetch or mutation.
#[async_trait]
pub trait Session: Send + Sync {
    /// Whether the session is currently usable.
    ///
    /// Transport failures while checking are errors; a rejected or absent
    /// session is `Ok(false)`.
    async fn is_active(&self) -> Result<bool>;

    /// Endpoint name for logging/debugging.
    fn endpoint(&self) -> String;
}
