//! Abstract session provider capability for Chargeguard
//!
//! The monitoring state machine talks to the charging service only through
//! this trait: authenticate, fetch the most recent session snapshot, and
//! stop a session. The concrete ChargePoint client implements it; tests
//! substitute a scripted mock.

use crate::error::Result;
use crate::session::SessionSnapshot;

/// Session provider trait
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Authenticate against the service. Must succeed before any other
    /// operation is called; the driver calls it exactly once per run.
    async fn authenticate(&mut self) -> Result<()>;

    /// Fetch the single most recent charging session
    async fn fetch_current_session(&mut self) -> Result<SessionSnapshot>;

    /// Request the station identified by the snapshot's device and port to
    /// stop charging
    async fn stop_session(&mut self, session: &SessionSnapshot) -> Result<()>;
}
