/// Errors surfaced by a sensor capability.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The user or platform refused access to heart-rate data.
    #[error("Sensor authorization denied")]
    AuthorizationDenied,

    /// A session is already live; only one may exist at a time.
    #[error("A sensor session is already active")]
    Busy,

    /// The sensor device failed to begin or sustain a session.
    #[error("Sensor device error: {0}")]
    Device(String),
}
