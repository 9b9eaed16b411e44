//! Cross-platform remote control session.
//!
//! Registers the app as the system's active media target so that headset
//! buttons, lock-screen controls and desktop media keys reach the player,
//! and mirrors the current song and playback state into the system's
//! "Now Playing" surfaces.
//!
//! - **Android**: framework `MediaSession` (lock screen, notification, Bluetooth)
//! - **Windows**: `SystemMediaTransportControls`
//! - **Linux**: MPRIS over D-Bus
//!
//! The entry point is [`RemoteControl`]. It owns the OS session and talks to
//! your player through the [`PlaybackEngine`] trait:
//!
//! ```ignore
//! use std::sync::Arc;
//! use waterkit_remote::{RemoteConfig, RemoteControl, Song, StateFlags};
//!
//! let mut remote = RemoteControl::with_platform_host(RemoteConfig::new(), Arc::new(engine));
//! remote.initialize_remote();
//!
//! let song = Song::new("Clair de Lune").artist("Debussy").album("Suite bergamasque");
//! remote.update_remote(Some(&song), StateFlags::PLAYING, false);
//! ```

mod callback;
mod config;
mod engine;
mod error;
mod keys;
mod metadata;
pub mod preference;
mod remote;
mod session;
mod sys;

pub use callback::{
    CommandDispatch, KeyDispatch, RepeatMode, SessionCommand, TransportAction, TransportCallbacks,
};
pub use config::{RemoteConfig, Variant};
pub use engine::PlaybackEngine;
pub use error::RemoteError;
pub use keys::{KeyAction, KeyCode, KeyEvent};
pub use metadata::{Artwork, PlaybackSnapshot, PlaybackStatus, Song, StateFlags, TrackMetadata};
pub use preference::{CoverPreference, JsonPreferences, PreferenceStore};
pub use remote::RemoteControl;
pub use session::{Actions, SessionFlags, SessionHandle, SessionHost};
pub use sys::{UnsupportedHost, platform_host};

#[cfg(target_os = "android")]
pub use sys::android;
