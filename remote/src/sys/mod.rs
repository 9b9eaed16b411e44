//! Platform-specific session hosts.
//!
//! - Linux: MPRIS over D-Bus
//! - Windows: SystemMediaTransportControls
//! - Android: framework `MediaSession` via JNI

use crate::{RemoteConfig, RemoteError, SessionHandle, SessionHost, TransportCallbacks};

#[cfg(target_os = "android")]
pub mod android;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

/// The session host for the current platform.
pub fn platform_host() -> Box<dyn SessionHost> {
    #[cfg(target_os = "linux")]
    let host: Box<dyn SessionHost> = Box::new(linux::MprisHost);

    #[cfg(target_os = "windows")]
    let host: Box<dyn SessionHost> = Box::new(windows::SmtcHost);

    #[cfg(target_os = "android")]
    let host: Box<dyn SessionHost> = Box::new(android::MediaSessionHost);

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "android")))]
    let host: Box<dyn SessionHost> = Box::new(UnsupportedHost);

    host
}

/// Host for platforms without a supported session API.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedHost;

impl SessionHost for UnsupportedHost {
    fn create_session(
        &self,
        _config: &RemoteConfig,
        _callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError> {
        Err(RemoteError::NotSupported)
    }
}
