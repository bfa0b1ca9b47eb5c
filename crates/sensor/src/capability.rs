//! The trait a sensor implementation must provide.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::SensorError;
use crate::events::SensorEvent;

/// Opaque handle to a live sensor session.
///
/// Returned by [`SensorCapability::begin_session`] and required to end the
/// session. The session controller is its sole owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: Uuid,
}

impl SessionHandle {
    /// Mint a fresh handle. Called by capability implementations only.
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// The unique id of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A source of live heart-rate telemetry.
///
/// Implementations wrap whatever the platform provides (a health store, a
/// BLE strap, a scripted feed). Sample delivery is push-based: the caller
/// registers an [`mpsc::Sender`] at begin time and the capability sends
/// [`SensorEvent`]s until the session ends. This keeps the core free of any
/// sensor-side callback interfaces.
#[async_trait]
pub trait SensorCapability: Send + Sync {
    /// Ask the platform for permission to read heart-rate data.
    ///
    /// Returns [`SensorError::AuthorizationDenied`] on refusal. Safe to call
    /// repeatedly once granted.
    async fn request_authorization(&self) -> Result<(), SensorError>;

    /// Open a sensor session and start pushing events to `events`.
    ///
    /// At most one session may be live per capability instance; a second
    /// call before [`end_session`](SensorCapability::end_session) returns
    /// [`SensorError::Busy`].
    async fn begin_session(
        &self,
        events: mpsc::Sender<SensorEvent>,
    ) -> Result<SessionHandle, SensorError>;

    /// Close a session and stop its event stream. Idempotent: ending an
    /// unknown or already-ended session is a no-op.
    async fn end_session(&self, handle: &SessionHandle);
}
