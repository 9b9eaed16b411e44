//! Song and playback snapshots pushed to the OS session.

use crate::session::Actions;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;
use std::time::Duration;

/// Cover art for a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Artwork {
    /// Image file on local storage.
    File(PathBuf),
    /// Remote or already URI-encoded image location.
    Url(String),
}

impl Artwork {
    /// The artwork as a URI string, for session APIs that only take URIs.
    ///
    /// Returns `None` for relative file paths, which cannot be expressed as
    /// `file://` URIs.
    #[must_use]
    pub fn to_uri(&self) -> Option<String> {
        match self {
            Self::File(path) => url::Url::from_file_path(path).ok().map(String::from),
            Self::Url(url) => Some(url.clone()),
        }
    }
}

/// A song as the playback engine knows it.
///
/// Owned by the engine; the remote control only borrows it for the duration
/// of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    /// Track title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// Track length.
    pub duration: Duration,
    /// Cover art, if the engine found any.
    pub artwork: Option<Artwork>,
}

impl Song {
    /// Create a song with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the artist.
    #[must_use]
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album.
    #[must_use]
    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the duration.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the cover art.
    #[must_use]
    pub fn artwork(mut self, artwork: Artwork) -> Self {
        self.artwork = Some(artwork);
        self
    }
}

/// Metadata pushed to the OS "Now Playing" surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Title of the track.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// Total duration.
    pub duration: Duration,
    /// Cover art, present only when it should be shown.
    pub artwork: Option<Artwork>,
}

impl TrackMetadata {
    /// Snapshot the textual fields of a song, without artwork.
    #[must_use]
    pub fn from_song(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            duration: song.duration,
            artwork: None,
        }
    }

    /// Attach artwork.
    #[must_use]
    pub fn with_artwork(mut self, artwork: Option<Artwork>) -> Self {
        self.artwork = artwork;
        self
    }
}

/// Engine-side playback flags, passed on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateFlags(pub u32);

impl StateFlags {
    /// No flags set: paused with media loaded.
    pub const NONE: Self = Self(0);
    /// Playback is running.
    pub const PLAYING: Self = Self(0x1);
    /// No media is loaded.
    pub const NO_MEDIA: Self = Self(0x2);
    /// The last track failed to load.
    pub const ERROR: Self = Self(0x4);
    /// The queue is empty.
    pub const EMPTY_QUEUE: Self = Self(0x8);

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether playback is running.
    #[must_use]
    pub const fn is_playing(self) -> bool {
        self.contains(Self::PLAYING)
    }
}

impl BitOr for StateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Current playback status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackStatus {
    /// Media is currently playing.
    Playing,
    /// Media is paused.
    Paused,
    /// Media is stopped (no active playback).
    #[default]
    Stopped,
}

/// Playback state pushed to the OS session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    /// Current playback status.
    pub status: PlaybackStatus,
    /// Current playback position.
    pub position: Duration,
    /// Playback speed reported alongside the position.
    pub rate: f32,
    /// When `position` was sampled, on the OS monotonic clock (time since
    /// boot). `None` lets the backend stamp it when it is pushed.
    pub update_time: Option<Duration>,
    /// Transport controls the session should offer.
    pub actions: Actions,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            position: Duration::ZERO,
            rate: 1.0,
            update_time: None,
            actions: Actions::default(),
        }
    }
}

impl PlaybackSnapshot {
    /// Build a snapshot from engine flags. The rate is always normal speed.
    #[must_use]
    pub fn from_flags(flags: StateFlags, position: Duration, actions: Actions) -> Self {
        let status = if flags.is_playing() {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        };
        Self {
            status,
            position,
            rate: 1.0,
            update_time: None,
            actions,
        }
    }

    /// Set the time `position` was sampled.
    #[must_use]
    pub const fn with_update_time(mut self, update_time: Option<Duration>) -> Self {
        self.update_time = update_time;
        self
    }
}
