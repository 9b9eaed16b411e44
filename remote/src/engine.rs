//! The playback engine seam.

use crate::callback::SessionCommand;
use crate::keys::KeyEvent;
use crate::metadata::StateFlags;
use crate::preference::{MEDIA_BUTTON, MEDIA_BUTTON_DEFAULT, PreferenceStore};
use std::time::Duration;

/// The playback engine behind a [`RemoteControl`](crate::RemoteControl).
///
/// The engine owns all playback state. The remote control only reads it and
/// forwards key events and commands into it.
pub trait PlaybackEngine: Send + Sync {
    /// Current position in the playing track, if known.
    fn position(&self) -> Option<Duration>;

    /// Current playback flags.
    fn state_flags(&self) -> StateFlags;

    /// User preferences.
    fn preferences(&self) -> &dyn PreferenceStore;

    /// Handle a key press, whether from a headset or a synthesized transport
    /// control.
    fn dispatch_key(&self, event: KeyEvent);

    /// Handle a non-key session command. Ignored by default.
    fn handle_command(&self, command: SessionCommand) {
        log::debug!("unhandled session command: {command:?}");
    }

    /// Whether the user allows the app to take over headset buttons.
    fn headset_controls_enabled(&self) -> bool {
        self.preferences().get_bool(MEDIA_BUTTON, MEDIA_BUTTON_DEFAULT)
    }
}
