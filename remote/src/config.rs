//! Remote control configuration.

use crate::error::RemoteError;
use crate::session::{Actions, SessionFlags};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which callback and action set a session exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Framework session: play/pause, next and previous, with the
    /// first-play rebroadcast.
    #[default]
    Standard,
    /// Compat session: the full transport set plus repeat, shuffle, custom
    /// actions and queue commands.
    Legacy,
}

/// Configuration for [`RemoteControl`](crate::RemoteControl).
///
/// Can be built in code or deserialized:
///
/// ```
/// use waterkit_remote::{RemoteConfig, Variant};
///
/// let config = RemoteConfig::from_json(r#"{ "variant": "legacy", "rebroadcast_delay_ms": null }"#)?;
/// assert_eq!(config.variant, Variant::Legacy);
/// assert_eq!(config.rebroadcast_delay_ms, None);
/// # Ok::<(), waterkit_remote::RemoteError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Session tag; also the MPRIS bus name suffix on Linux.
    pub identity: String,
    /// Callback and action set.
    pub variant: Variant,
    /// Delay of the one-time state re-push after the first switch to
    /// playing. `None` disables it.
    pub rebroadcast_delay_ms: Option<u64>,
    /// Media button receiver class, where the platform routes buttons
    /// through a broadcast receiver. A leading `.` is relative to the app
    /// package. Defaults to `<package>.MediaButtonReceiver`.
    pub button_receiver: Option<String>,
}

/// 10 ms is not reliably enough for the head units that need it.
const DEFAULT_REBROADCAST_DELAY_MS: u64 = 100;

/// Receiver class used when none is configured, relative to the package.
const DEFAULT_BUTTON_RECEIVER: &str = ".MediaButtonReceiver";

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            identity: "waterkit".to_string(),
            variant: Variant::Standard,
            rebroadcast_delay_ms: Some(DEFAULT_REBROADCAST_DELAY_MS),
            button_receiver: None,
        }
    }
}

impl RemoteConfig {
    /// Create the standard configuration, including the 100 ms first-play
    /// rebroadcast some Bluetooth head units need to show the right
    /// progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Legacy configuration: repeat/shuffle/custom actions and queue
    /// commands, no rebroadcast.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            variant: Variant::Legacy,
            rebroadcast_delay_ms: None,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`RemoteError::InitializationFailed`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, RemoteError> {
        serde_json::from_str(json)
            .map_err(|e| RemoteError::InitializationFailed(format!("invalid config: {e}")))
    }

    /// Set the session identity.
    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Set the variant.
    #[must_use]
    pub const fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set or disable the first-play rebroadcast delay.
    #[must_use]
    pub fn rebroadcast_delay(mut self, delay: Option<Duration>) -> Self {
        self.rebroadcast_delay_ms = delay.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the media button receiver class.
    #[must_use]
    pub fn button_receiver(mut self, class: impl Into<String>) -> Self {
        self.button_receiver = Some(class.into());
        self
    }

    /// Whether legacy callbacks and actions are enabled.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self.variant, Variant::Legacy)
    }

    /// The configured rebroadcast delay.
    #[must_use]
    pub fn rebroadcast_delay_duration(&self) -> Option<Duration> {
        self.rebroadcast_delay_ms.map(Duration::from_millis)
    }

    /// Actions advertised with a playback state push.
    #[must_use]
    pub const fn actions(&self, playing: bool) -> Actions {
        match self.variant {
            Variant::Standard => Actions::standard(playing),
            Variant::Legacy => Actions::LEGACY,
        }
    }

    /// Flags declared when the session is registered.
    #[must_use]
    pub const fn session_flags(&self) -> SessionFlags {
        let flags = SessionFlags(
            SessionFlags::HANDLES_MEDIA_BUTTONS.0 | SessionFlags::HANDLES_TRANSPORT_CONTROLS.0,
        );
        match self.variant {
            Variant::Standard => flags,
            Variant::Legacy => SessionFlags(flags.0 | SessionFlags::HANDLES_QUEUE_COMMANDS.0),
        }
    }

    /// Fully qualified media button receiver class for the app `package`.
    #[must_use]
    pub fn button_receiver_class(&self, package: &str) -> String {
        let class = self
            .button_receiver
            .as_deref()
            .unwrap_or(DEFAULT_BUTTON_RECEIVER);
        if class.starts_with('.') {
            format!("{package}{class}")
        } else {
            class.to_string()
        }
    }
}
