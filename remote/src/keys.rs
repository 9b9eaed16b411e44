//! Key events exchanged with the playback engine.
//!
//! Key codes use the Android `KeyEvent` numbering on every platform, so the
//! engine has one key handler no matter where the press came from.

/// A media key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub i32);

impl KeyCode {
    /// Wired headset button.
    pub const HEADSETHOOK: Self = Self(79);
    /// Play/pause toggle.
    pub const MEDIA_PLAY_PAUSE: Self = Self(85);
    /// Stop.
    pub const MEDIA_STOP: Self = Self(86);
    /// Next track.
    pub const MEDIA_NEXT: Self = Self(87);
    /// Previous track.
    pub const MEDIA_PREVIOUS: Self = Self(88);
    /// Play.
    pub const MEDIA_PLAY: Self = Self(126);
    /// Pause.
    pub const MEDIA_PAUSE: Self = Self(127);

    /// Raw platform value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyAction {
    /// Key pressed.
    #[default]
    Down,
    /// Key released.
    Up,
}

impl KeyAction {
    /// Raw platform value (`ACTION_DOWN = 0`, `ACTION_UP = 1`).
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Down => 0,
            Self::Up => 1,
        }
    }

    /// Parse a raw platform value. Anything other than `1` is a press.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == 1 { Self::Up } else { Self::Down }
    }
}

/// A key press delivered to the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Press or release.
    pub action: KeyAction,
    /// Which key.
    pub code: KeyCode,
}

impl KeyEvent {
    /// Create a key event.
    #[must_use]
    pub const fn new(action: KeyAction, code: KeyCode) -> Self {
        Self { action, code }
    }

    /// A synthetic key press, as produced by transport callbacks.
    #[must_use]
    pub const fn press(code: KeyCode) -> Self {
        Self::new(KeyAction::Down, code)
    }
}
