/// Errors reported by session backends and preference stores.
///
/// [`RemoteControl`](crate::RemoteControl) never propagates these: a failing
/// now-playing surface must not interrupt playback, so the adapter logs them
/// and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Remote control sessions are not supported on this platform.
    #[error("remote control not supported on this platform")]
    NotSupported,
    /// The OS session could not be created or registered.
    #[error("failed to initialize remote session: {0}")]
    InitializationFailed(String),
    /// The OS session rejected a metadata or state update.
    #[error("failed to update remote session: {0}")]
    UpdateFailed(String),
    /// The preference store could not be read.
    #[error("failed to read preferences: {0}")]
    Preferences(String),
}
