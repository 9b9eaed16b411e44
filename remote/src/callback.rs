//! Callbacks installed on the OS session.
//!
//! Transport buttons become synthetic key presses so the engine handles a
//! lock-screen "next" exactly like a headset "next". Nothing here touches
//! adapter state.

use crate::keys::{KeyCode, KeyEvent};
use std::fmt;
use std::sync::Arc;

/// Key dispatch entry point of the playback engine.
pub type KeyDispatch = Arc<dyn Fn(KeyEvent) + Send + Sync>;

/// Command dispatch entry point of the playback engine.
pub type CommandDispatch = Arc<dyn Fn(SessionCommand) + Send + Sync>;

/// A transport control surfaced by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportAction {
    /// Play.
    Play,
    /// Pause.
    Pause,
    /// Skip to next track.
    Next,
    /// Skip to previous track.
    Previous,
    /// Stop.
    Stop,
}

impl TransportAction {
    /// The key this action is translated into.
    ///
    /// Play and pause both press the headset button, which the engine
    /// treats as a toggle. Stop pauses.
    #[must_use]
    pub const fn key_code(self) -> KeyCode {
        match self {
            Self::Play | Self::Pause => KeyCode::HEADSETHOOK,
            Self::Next => KeyCode::MEDIA_NEXT,
            Self::Previous => KeyCode::MEDIA_PREVIOUS,
            Self::Stop => KeyCode::MEDIA_PAUSE,
        }
    }
}

/// Repeat mode requested by a legacy controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatMode {
    /// Play the queue once.
    None,
    /// Repeat the current track.
    One,
    /// Repeat the whole queue.
    All,
}

impl RepeatMode {
    /// Parse the platform value (`0` none, `1` one, `2`/`3` all or group).
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::One,
            2 | 3 => Self::All,
            _ => Self::None,
        }
    }
}

/// Non-key requests from the session, forwarded to the engine as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Generic named command.
    Command(String),
    /// Change the repeat mode.
    SetRepeatMode(RepeatMode),
    /// Enable or disable shuffle.
    SetShuffle(bool),
    /// Application-defined custom action.
    Custom(String),
}

/// The callback set bound to one OS session.
///
/// Backends hold a clone and call the `on_*` methods from whatever thread the
/// OS delivers events on.
#[derive(Clone)]
pub struct TransportCallbacks {
    keys: KeyDispatch,
    commands: CommandDispatch,
    legacy: bool,
}

impl fmt::Debug for TransportCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportCallbacks")
            .field("legacy", &self.legacy)
            .finish_non_exhaustive()
    }
}

impl TransportCallbacks {
    /// Bind callbacks to the engine's dispatch functions.
    pub fn new(
        keys: impl Fn(KeyEvent) + Send + Sync + 'static,
        commands: impl Fn(SessionCommand) + Send + Sync + 'static,
    ) -> Self {
        Self {
            keys: Arc::new(keys),
            commands: Arc::new(commands),
            legacy: false,
        }
    }

    /// Also accept repeat, shuffle and custom actions.
    #[must_use]
    pub const fn with_legacy_actions(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    /// Whether repeat, shuffle and custom actions are accepted.
    #[must_use]
    pub const fn has_legacy_actions(&self) -> bool {
        self.legacy
    }

    /// Forward a transport control as one synthetic key press.
    pub fn on_transport(&self, action: TransportAction) {
        log::debug!("remote transport callback: {action:?}");
        (self.keys)(KeyEvent::press(action.key_code()));
    }

    /// Play pressed.
    pub fn on_play(&self) {
        self.on_transport(TransportAction::Play);
    }

    /// Pause pressed.
    pub fn on_pause(&self) {
        self.on_transport(TransportAction::Pause);
    }

    /// Next pressed.
    pub fn on_next(&self) {
        self.on_transport(TransportAction::Next);
    }

    /// Previous pressed.
    pub fn on_previous(&self) {
        self.on_transport(TransportAction::Previous);
    }

    /// Stop pressed.
    pub fn on_stop(&self) {
        self.on_transport(TransportAction::Stop);
    }

    /// A raw media button event, forwarded unchanged.
    pub fn on_media_button(&self, event: KeyEvent) {
        log::debug!("remote media button: {event:?}");
        (self.keys)(event);
    }

    /// A generic session command.
    pub fn on_command(&self, command: impl Into<String>) {
        (self.commands)(SessionCommand::Command(command.into()));
    }

    /// Repeat mode change (legacy only).
    pub fn on_set_repeat_mode(&self, mode: RepeatMode) {
        self.forward_legacy(SessionCommand::SetRepeatMode(mode));
    }

    /// Shuffle change (legacy only).
    pub fn on_set_shuffle(&self, shuffle: bool) {
        self.forward_legacy(SessionCommand::SetShuffle(shuffle));
    }

    /// Custom action (legacy only).
    pub fn on_custom_action(&self, action: impl Into<String>) {
        self.forward_legacy(SessionCommand::Custom(action.into()));
    }

    fn forward_legacy(&self, command: SessionCommand) {
        if self.legacy {
            (self.commands)(command);
        } else {
            log::debug!("ignoring {command:?}: legacy actions not installed");
        }
    }
}
