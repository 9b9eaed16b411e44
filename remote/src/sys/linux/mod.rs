//! Linux remote session over MPRIS D-Bus.

use crate::{
    Actions, KeyCode, KeyEvent, PlaybackSnapshot, PlaybackStatus, RemoteConfig, RemoteError,
    RepeatMode, SessionFlags, SessionHandle, SessionHost, TrackMetadata, TransportCallbacks,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use zbus::zvariant::{ObjectPath, Value};
use zbus::{connection, interface};

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_ID: &str = "/org/waterkit/remote/track";
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Properties served on the bus, written by the handle and read by D-Bus.
#[derive(Debug, Default)]
struct PlayerState {
    metadata: Option<TrackMetadata>,
    snapshot: PlaybackSnapshot,
    flags: SessionFlags,
}

impl PlayerState {
    fn can(&self, action: Actions) -> bool {
        self.flags.contains(SessionFlags::HANDLES_TRANSPORT_CONTROLS)
            && self.snapshot.actions.contains(action)
    }
}

type SharedState = Arc<RwLock<PlayerState>>;

fn read_state<T>(state: &SharedState, read: impl FnOnce(&PlayerState) -> T) -> Option<T> {
    state.read().ok().map(|guard| read(&guard))
}

/// Property changes to announce.
#[derive(Debug, Clone, Copy)]
enum Change {
    Metadata,
    Playback,
    Shutdown,
}

/// MPRIS root interface.
struct MediaPlayer2 {
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl MediaPlayer2 {
    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }

    fn raise(&self) {}
    fn quit(&self) {}
}

/// MPRIS player interface.
struct MprisPlayer {
    state: SharedState,
    callbacks: TransportCallbacks,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl MprisPlayer {
    #[zbus(property)]
    fn playback_status(&self) -> String {
        let status = read_state(&self.state, |s| s.snapshot.status).unwrap_or_default();
        match status {
            PlaybackStatus::Playing => "Playing".to_string(),
            PlaybackStatus::Paused => "Paused".to_string(),
            PlaybackStatus::Stopped => "Stopped".to_string(),
        }
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, Value<'static>> {
        read_state(&self.state, |s| s.metadata.as_ref().map(mpris_metadata))
            .flatten()
            .unwrap_or_default()
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        read_state(&self.state, |s| micros(s.snapshot.position)).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        read_state(&self.state, |s| f64::from(s.snapshot.rate)).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    /// The engine never reports its repeat mode back, so this stays "None".
    #[zbus(property)]
    fn loop_status(&self) -> String {
        "None".to_string()
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) -> zbus::fdo::Result<()> {
        self.request_loop_status(&value)
            .map_err(|e| zbus::fdo::Error::NotSupported(e.to_string()))
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) -> zbus::fdo::Result<()> {
        self.request_shuffle(value)
            .map_err(|e| zbus::fdo::Error::NotSupported(e.to_string()))
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        read_state(&self.state, |s| s.can(Actions::SKIP_TO_NEXT)).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        read_state(&self.state, |s| s.can(Actions::SKIP_TO_PREVIOUS)).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        read_state(&self.state, |s| s.can(Actions::PLAY)).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        read_state(&self.state, |s| s.can(Actions::PAUSE)).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        read_state(&self.state, |s| {
            s.flags.contains(SessionFlags::HANDLES_TRANSPORT_CONTROLS)
        })
        .unwrap_or(false)
    }

    fn next(&self) {
        self.callbacks.on_next();
    }

    fn previous(&self) {
        self.callbacks.on_previous();
    }

    fn pause(&self) {
        self.callbacks.on_pause();
    }

    fn play_pause(&self) {
        self.callbacks
            .on_media_button(KeyEvent::press(KeyCode::MEDIA_PLAY_PAUSE));
    }

    fn stop(&self) {
        self.callbacks.on_stop();
    }

    fn play(&self) {
        self.callbacks.on_play();
    }

    fn seek(&self, _offset: i64) {}

    fn set_position(&self, _track_id: ObjectPath<'_>, _position: i64) {}

    fn open_uri(&self, uri: String) {
        self.callbacks.on_command(format!("open_uri:{uri}"));
    }
}

impl MprisPlayer {
    /// Forward a `LoopStatus` write. Only legacy sessions accept it.
    fn request_loop_status(&self, value: &str) -> Result<(), RemoteError> {
        if !self.callbacks.has_legacy_actions() {
            return Err(RemoteError::NotSupported);
        }
        let mode = match value {
            "Track" => RepeatMode::One,
            "Playlist" => RepeatMode::All,
            _ => RepeatMode::None,
        };
        self.callbacks.on_set_repeat_mode(mode);
        Ok(())
    }

    /// Forward a `Shuffle` write. Only legacy sessions accept it.
    fn request_shuffle(&self, value: bool) -> Result<(), RemoteError> {
        if !self.callbacks.has_legacy_actions() {
            return Err(RemoteError::NotSupported);
        }
        self.callbacks.on_set_shuffle(value);
        Ok(())
    }
}

fn micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

fn mpris_metadata(metadata: &TrackMetadata) -> HashMap<String, Value<'static>> {
    let mut map: HashMap<String, Value<'static>> = HashMap::new();

    if let Ok(path) = ObjectPath::try_from(TRACK_ID) {
        map.insert("mpris:trackid".to_string(), Value::from(path));
    }
    map.insert(
        "xesam:title".to_string(),
        Value::from(metadata.title.clone()),
    );
    map.insert(
        "xesam:artist".to_string(),
        Value::from(vec![metadata.artist.clone()]),
    );
    map.insert(
        "xesam:album".to_string(),
        Value::from(metadata.album.clone()),
    );
    map.insert(
        "mpris:length".to_string(),
        Value::from(micros(metadata.duration)),
    );
    if let Some(url) = metadata.artwork.as_ref().and_then(crate::Artwork::to_uri) {
        map.insert("mpris:artUrl".to_string(), Value::from(url));
    }

    map
}

/// Serves MPRIS on the session bus.
#[derive(Debug, Default)]
pub struct MprisHost;

impl SessionHost for MprisHost {
    fn create_session(
        &self,
        config: &RemoteConfig,
        callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError> {
        let state = SharedState::default();
        let (changes, receiver) = unbounded_channel();
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

        let root = MediaPlayer2 {
            identity: config.identity.clone(),
        };
        let player = MprisPlayer {
            state: Arc::clone(&state),
            callbacks,
        };
        let bus_name = format!("org.mpris.MediaPlayer2.{}", config.identity);

        std::thread::Builder::new()
            .name("waterkit-remote-mpris".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("tokio runtime: {e}")));
                        return;
                    }
                };

                rt.block_on(async move {
                    if let Err(e) = serve(bus_name, root, player, receiver, ready_tx).await {
                        log::warn!("MPRIS service stopped: {e}");
                    }
                });
            })
            .map_err(|e| RemoteError::InitializationFailed(format!("spawn MPRIS thread: {e}")))?;

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(MprisSession { state, changes })),
            Ok(Err(e)) => Err(RemoteError::InitializationFailed(e)),
            Err(e) => Err(RemoteError::InitializationFailed(format!(
                "MPRIS service did not start: {e}"
            ))),
        }
    }
}

async fn serve(
    bus_name: String,
    root: MediaPlayer2,
    player: MprisPlayer,
    mut changes: UnboundedReceiver<Change>,
    ready: std::sync::mpsc::SyncSender<Result<(), String>>,
) -> zbus::Result<()> {
    let connection = match connect(bus_name, root, player).await {
        Ok(connection) => {
            let _ = ready.send(Ok(()));
            connection
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return Err(e);
        }
    };

    let iface = connection
        .object_server()
        .interface::<_, MprisPlayer>(MPRIS_PATH)
        .await?;

    while let Some(change) = changes.recv().await {
        let emitter = iface.signal_emitter();
        let player = iface.get().await;
        match change {
            Change::Metadata => player.metadata_changed(emitter).await?,
            Change::Playback => {
                player.playback_status_changed(emitter).await?;
                player.can_play_changed(emitter).await?;
                player.can_pause_changed(emitter).await?;
                player.can_go_next_changed(emitter).await?;
                player.can_go_previous_changed(emitter).await?;
                player.can_control_changed(emitter).await?;
            }
            Change::Shutdown => break,
        }
    }

    Ok(())
}

async fn connect(
    bus_name: String,
    root: MediaPlayer2,
    player: MprisPlayer,
) -> zbus::Result<zbus::Connection> {
    connection::Builder::session()?
        .name(bus_name)?
        .serve_at(MPRIS_PATH, root)?
        .serve_at(MPRIS_PATH, player)?
        .build()
        .await
}

struct MprisSession {
    state: SharedState,
    changes: UnboundedSender<Change>,
}

impl MprisSession {
    fn write(&self, write: impl FnOnce(&mut PlayerState)) -> Result<(), RemoteError> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| RemoteError::UpdateFailed(format!("lock poisoned: {e}")))?;
        write(&mut guard);
        Ok(())
    }

    fn announce(&self, change: Change) -> Result<(), RemoteError> {
        self.changes
            .send(change)
            .map_err(|_| RemoteError::UpdateFailed("MPRIS service is gone".into()))
    }
}

impl SessionHandle for MprisSession {
    fn set_flags(&mut self, flags: SessionFlags) -> Result<(), RemoteError> {
        self.write(|s| s.flags = flags)?;
        self.announce(Change::Playback)
    }

    fn set_metadata(&mut self, metadata: &TrackMetadata) -> Result<(), RemoteError> {
        let metadata = metadata.clone();
        self.write(|s| s.metadata = Some(metadata))?;
        self.announce(Change::Metadata)
    }

    fn set_playback_state(&mut self, state: &PlaybackSnapshot) -> Result<(), RemoteError> {
        let snapshot = state.clone();
        self.write(|s| s.snapshot = snapshot)?;
        self.announce(Change::Playback)
    }

    fn set_active(&mut self, active: bool) -> Result<(), RemoteError> {
        if active {
            return Ok(());
        }
        self.write(|s| {
            s.metadata = None;
            s.snapshot.status = PlaybackStatus::Stopped;
        })?;
        self.announce(Change::Metadata)?;
        self.announce(Change::Playback)
    }

    fn release(self: Box<Self>) {
        let _ = self.changes.send(Change::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionCommand;
    use std::sync::Mutex;

    fn player(legacy: bool) -> (MprisPlayer, Arc<Mutex<Vec<SessionCommand>>>) {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&commands);
        let callbacks = TransportCallbacks::new(|_| {}, move |c| sink.lock().unwrap().push(c))
            .with_legacy_actions(legacy);
        let player = MprisPlayer {
            state: SharedState::default(),
            callbacks,
        };
        (player, commands)
    }

    #[test]
    fn standard_session_refuses_loop_and_shuffle_writes() {
        let (player, commands) = player(false);

        assert_eq!(
            player.request_loop_status("Track"),
            Err(RemoteError::NotSupported)
        );
        assert_eq!(player.request_shuffle(true), Err(RemoteError::NotSupported));

        assert!(commands.lock().unwrap().is_empty());
        assert_eq!(player.loop_status(), "None");
        assert!(!player.shuffle());
    }

    #[test]
    fn legacy_session_forwards_without_changing_served_state() {
        let (player, commands) = player(true);

        player.request_loop_status("Playlist").unwrap();
        player.request_shuffle(true).unwrap();

        assert_eq!(
            commands.lock().unwrap().as_slice(),
            &[
                SessionCommand::SetRepeatMode(RepeatMode::All),
                SessionCommand::SetShuffle(true),
            ]
        );
        assert_eq!(player.loop_status(), "None");
        assert!(!player.shuffle());
    }

    #[test]
    fn rate_follows_the_pushed_snapshot() {
        let (player, _commands) = player(false);
        assert!((player.rate() - 1.0).abs() < f64::EPSILON);

        player.state.write().unwrap().snapshot.rate = 2.0;
        assert!((player.rate() - 2.0).abs() < f64::EPSILON);
    }
}
