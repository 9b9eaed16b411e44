//! The OS session surface, as seen by [`RemoteControl`](crate::RemoteControl).

use crate::callback::TransportCallbacks;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::metadata::{PlaybackSnapshot, TrackMetadata};
use std::ops::{BitOr, BitOrAssign};

/// Transport controls a session advertises.
///
/// Values match Android's `PlaybackState` action bits; other backends map
/// them onto their own capability switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Actions(pub u64);

impl Actions {
    /// Stop.
    pub const STOP: Self = Self(1);
    /// Pause.
    pub const PAUSE: Self = Self(1 << 1);
    /// Play.
    pub const PLAY: Self = Self(1 << 2);
    /// Skip to previous.
    pub const SKIP_TO_PREVIOUS: Self = Self(1 << 4);
    /// Skip to next.
    pub const SKIP_TO_NEXT: Self = Self(1 << 5);
    /// Play/pause toggle.
    pub const PLAY_PAUSE: Self = Self(1 << 9);
    /// Set repeat mode.
    pub const SET_REPEAT_MODE: Self = Self(1 << 18);
    /// Set shuffle mode.
    pub const SET_SHUFFLE_MODE: Self = Self(1 << 21);

    /// Every transport control a session can offer.
    pub const TRANSPORT: Self = Self(
        Self::PLAY.0
            | Self::PAUSE.0
            | Self::PLAY_PAUSE.0
            | Self::STOP.0
            | Self::SKIP_TO_NEXT.0
            | Self::SKIP_TO_PREVIOUS.0,
    );

    /// Transport plus repeat and shuffle, independent of playback state.
    pub const LEGACY: Self =
        Self(Self::TRANSPORT.0 | Self::SET_REPEAT_MODE.0 | Self::SET_SHUFFLE_MODE.0);

    /// Play/pause, next and previous, plus pause while playing or play
    /// while paused. No stop.
    #[must_use]
    pub const fn standard(playing: bool) -> Self {
        let toggle = if playing { Self::PAUSE } else { Self::PLAY };
        Self(Self::PLAY_PAUSE.0 | Self::SKIP_TO_NEXT.0 | Self::SKIP_TO_PREVIOUS.0 | toggle.0)
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Actions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Actions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Session-level capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionFlags(pub u32);

impl SessionFlags {
    /// The session receives media button events.
    pub const HANDLES_MEDIA_BUTTONS: Self = Self(1);
    /// The session receives transport control commands.
    pub const HANDLES_TRANSPORT_CONTROLS: Self = Self(1 << 1);
    /// The session receives queue commands (compat sessions only).
    pub const HANDLES_QUEUE_COMMANDS: Self = Self(1 << 2);

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SessionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Factory for OS sessions.
pub trait SessionHost: Send {
    /// Create a session with `callbacks` installed.
    ///
    /// # Errors
    /// Returns [`RemoteError::NotSupported`] or
    /// [`RemoteError::InitializationFailed`] if no session can be created.
    fn create_session(
        &self,
        config: &RemoteConfig,
        callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError>;
}

/// A live OS session.
pub trait SessionHandle: Send {
    /// Declare what kinds of events the session handles.
    ///
    /// # Errors
    /// Returns [`RemoteError::InitializationFailed`] if the OS refuses.
    fn set_flags(&mut self, flags: SessionFlags) -> Result<(), RemoteError>;

    /// Route hardware button broadcasts to this session.
    ///
    /// # Errors
    /// Returns [`RemoteError::InitializationFailed`] if the receiver cannot
    /// be attached.
    fn attach_button_receiver(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }

    /// Publish track metadata.
    ///
    /// # Errors
    /// Returns [`RemoteError::UpdateFailed`] if the update is rejected.
    fn set_metadata(&mut self, metadata: &TrackMetadata) -> Result<(), RemoteError>;

    /// Publish playback state.
    ///
    /// # Errors
    /// Returns [`RemoteError::UpdateFailed`] if the update is rejected.
    fn set_playback_state(&mut self, state: &PlaybackSnapshot) -> Result<(), RemoteError>;

    /// Mark the session as the active media target, or withdraw it.
    ///
    /// # Errors
    /// Returns [`RemoteError::UpdateFailed`] if the update is rejected.
    fn set_active(&mut self, active: bool) -> Result<(), RemoteError>;

    /// Release the OS resource.
    fn release(self: Box<Self>);
}
