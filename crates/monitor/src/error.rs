use pulsewatch_core::SessionState;

/// Failure taxonomy of the monitoring core.
///
/// None of these abort the process. `AuthorizationDenied`,
/// `SessionStartFailure`, and `SessionInterrupted` leave the session in
/// `Failed` with a matching [`Fault`](crate::snapshot::Fault) on the
/// snapshot; `InvalidTransition` is a caller programming error that is
/// logged and ignored.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The sensor capability refused access to heart-rate data.
    #[error("Sensor authorization denied")]
    AuthorizationDenied,

    /// The requested lifecycle operation is not legal from the current
    /// state.
    #[error("Invalid transition: {attempted} is not allowed from {from}")]
    InvalidTransition {
        from: SessionState,
        attempted: &'static str,
    },

    /// The sensor session could not be opened (device busy or faulty).
    #[error("Failed to start sensor session: {0}")]
    SessionStartFailure(String),

    /// The sensor reported an asynchronous fault mid-collection.
    #[error("Sensor session interrupted: {0}")]
    SessionInterrupted(String),
}
