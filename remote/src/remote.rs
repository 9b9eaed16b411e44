//! The session adapter.

use crate::callback::TransportCallbacks;
use crate::config::RemoteConfig;
use crate::engine::PlaybackEngine;
use crate::error::RemoteError;
use crate::metadata::{PlaybackSnapshot, Song, StateFlags, TrackMetadata};
use crate::preference::CoverPreference;
use crate::session::{SessionHandle, SessionHost};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-time state re-push after the first switch to playing.
///
/// Some Bluetooth stacks ignore the position in the first playing state they
/// receive and show progress from the start of the track until the next
/// update. This only exists to work around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstPlayRebroadcast {
    Armed(Duration),
    Scheduled(Instant),
    Done,
}

/// Registers the app as the OS remote control target and mirrors playback
/// into it.
///
/// All methods are best effort: OS failures are logged and never returned,
/// and every method is a no-op while no session is registered.
///
/// # Example
///
/// ```ignore
/// use waterkit_remote::{RemoteConfig, RemoteControl, Song, StateFlags};
///
/// let mut remote = RemoteControl::with_platform_host(RemoteConfig::new(), engine);
/// remote.initialize_remote();
/// remote.update_remote(Some(&Song::new("Title").artist("Artist")), StateFlags::PLAYING, false);
/// ```
pub struct RemoteControl {
    config: RemoteConfig,
    host: Box<dyn SessionHost>,
    engine: Arc<dyn PlaybackEngine>,
    session: Option<Box<dyn SessionHandle>>,
    show_cover: CoverPreference,
    first_play: FirstPlayRebroadcast,
}

impl std::fmt::Debug for RemoteControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteControl")
            .field("config", &self.config)
            .field("registered", &self.session.is_some())
            .field("show_cover", &self.show_cover)
            .field("first_play", &self.first_play)
            .finish_non_exhaustive()
    }
}

impl RemoteControl {
    /// Create an unregistered remote control.
    #[must_use]
    pub fn new(
        config: RemoteConfig,
        host: Box<dyn SessionHost>,
        engine: Arc<dyn PlaybackEngine>,
    ) -> Self {
        let first_play = config
            .rebroadcast_delay_duration()
            .map_or(FirstPlayRebroadcast::Done, FirstPlayRebroadcast::Armed);

        Self {
            config,
            host,
            engine,
            session: None,
            show_cover: CoverPreference::Unknown,
            first_play,
        }
    }

    /// Create an unregistered remote control backed by this platform's
    /// session API.
    #[must_use]
    pub fn with_platform_host(config: RemoteConfig, engine: Arc<dyn PlaybackEngine>) -> Self {
        let host = crate::sys::platform_host();
        Self::new(config, host, engine)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Whether a session is currently registered.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.session.is_some()
    }

    /// (Re)register with the OS.
    ///
    /// Tears down any existing session first. Registers nothing if the user
    /// disabled headset controls.
    pub fn initialize_remote(&mut self) {
        self.unregister_remote();

        if !self.engine.headset_controls_enabled() {
            log::info!("headset controls disabled, not registering remote session");
            return;
        }

        let callbacks = self.callbacks();
        let mut session = match self.host.create_session(&self.config, callbacks) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("remote session unavailable: {e}");
                return;
            }
        };

        if let Err(e) = register(&mut *session, &self.config) {
            log::warn!("remote session registration failed: {e}");
            session.release();
            return;
        }

        log::info!("remote session registered as '{}'", self.config.identity);
        self.session = Some(session);
    }

    /// Withdraw and release the session, if any.
    pub fn unregister_remote(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Err(e) = session.set_active(false) {
            log::warn!("failed to deactivate remote session: {e}");
        }
        session.release();
        log::info!("remote session released");
    }

    /// Forget the cached show-cover preference; the next update re-reads it.
    pub fn reload_preference(&mut self) {
        self.show_cover = CoverPreference::Unknown;
    }

    /// Push `song` and `state` to the OS, stamped at the time of the push.
    pub fn update_remote(&mut self, song: Option<&Song>, state: StateFlags, keep_paused: bool) {
        self.update_remote_with(song, state, keep_paused, None);
    }

    /// Push `song` and `state` to the OS.
    ///
    /// Cover art is included only if the user enabled it and playback is
    /// running or `keep_paused` asks to keep it while paused. `update_time`
    /// is when the engine sampled its position, on the OS monotonic clock.
    pub fn update_remote_with(
        &mut self,
        song: Option<&Song>,
        state: StateFlags,
        keep_paused: bool,
        update_time: Option<Duration>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let show_cover = self.show_cover.resolve(self.engine.preferences());
        let playing = state.is_playing();

        if let Some(song) = song {
            let artwork = if show_cover && (playing || keep_paused) {
                song.artwork.clone()
            } else {
                None
            };
            let metadata = TrackMetadata::from_song(song).with_artwork(artwork);
            if let Err(e) = session.set_metadata(&metadata) {
                log::warn!("failed to push remote metadata: {e}");
            }
        }

        let position = self.engine.position().unwrap_or_default();
        let snapshot =
            PlaybackSnapshot::from_flags(state, position, self.config.actions(playing))
                .with_update_time(update_time);
        push_state(&mut **session, &snapshot);

        if playing {
            if let FirstPlayRebroadcast::Armed(delay) = self.first_play {
                self.first_play = FirstPlayRebroadcast::Scheduled(Instant::now() + delay);
            }
        }
    }

    /// When the pending first-play rebroadcast is due, if one is pending.
    #[must_use]
    pub const fn rebroadcast_deadline(&self) -> Option<Instant> {
        match self.first_play {
            FirstPlayRebroadcast::Scheduled(deadline) => Some(deadline),
            _ => None,
        }
    }

    /// Run the first-play rebroadcast if it is due at `now`.
    ///
    /// Call from the host's event loop.
    pub fn poll(&mut self, now: Instant) {
        let FirstPlayRebroadcast::Scheduled(deadline) = self.first_play else {
            return;
        };
        if now < deadline {
            return;
        }
        self.first_play = FirstPlayRebroadcast::Done;

        let Some(session) = self.session.as_mut() else {
            return;
        };

        let state = self.engine.state_flags();
        let position = self.engine.position().unwrap_or_default();
        let snapshot =
            PlaybackSnapshot::from_flags(state, position, self.config.actions(state.is_playing()));
        log::debug!("re-pushing first playing state: {snapshot:?}");
        push_state(&mut **session, &snapshot);
    }

    fn callbacks(&self) -> TransportCallbacks {
        let keys = Arc::clone(&self.engine);
        let commands = Arc::clone(&self.engine);
        TransportCallbacks::new(
            move |event| keys.dispatch_key(event),
            move |command| commands.handle_command(command),
        )
        .with_legacy_actions(self.config.is_legacy())
    }
}

impl Drop for RemoteControl {
    fn drop(&mut self) {
        self.unregister_remote();
    }
}

fn register(session: &mut dyn SessionHandle, config: &RemoteConfig) -> Result<(), RemoteError> {
    session.attach_button_receiver()?;
    session.set_flags(config.session_flags())
}

fn push_state(session: &mut dyn SessionHandle, snapshot: &PlaybackSnapshot) {
    if let Err(e) = session.set_playback_state(snapshot) {
        log::warn!("failed to push remote playback state: {e}");
    }
    if let Err(e) = session.set_active(true) {
        log::warn!("failed to activate remote session: {e}");
    }
}
