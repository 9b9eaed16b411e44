//! Recording session host and scripted engine shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waterkit_remote::{
    KeyEvent, PlaybackEngine, PlaybackSnapshot, PreferenceStore, RemoteConfig, RemoteControl,
    RemoteError, SessionCommand, SessionFlags, SessionHandle, SessionHost, StateFlags,
    TrackMetadata, TransportCallbacks,
};

/// Everything a session was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Created(u32),
    ButtonReceiver(u32),
    Flags(u32, SessionFlags),
    Metadata(u32, TrackMetadata),
    State(u32, PlaybackSnapshot),
    Active(u32, bool),
    Released(u32),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub callbacks: Option<TransportCallbacks>,
    next_id: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub create: bool,
    pub flags: bool,
    pub metadata: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub recorder: Arc<Mutex<Recorder>>,
    pub failures: Arc<Mutex<Failures>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<Call> {
        self.recorder.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.recorder.lock().unwrap().calls.clear();
    }

    pub fn callbacks(&self) -> TransportCallbacks {
        self.recorder
            .lock()
            .unwrap()
            .callbacks
            .clone()
            .expect("no session was created")
    }

    pub fn metadata(&self) -> Vec<TrackMetadata> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Metadata(_, metadata) => Some(metadata),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<PlaybackSnapshot> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::State(_, state) => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl SessionHost for RecordingHost {
    fn create_session(
        &self,
        _config: &RemoteConfig,
        callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError> {
        if self.failures.lock().unwrap().create {
            return Err(RemoteError::InitializationFailed("refused".into()));
        }

        let mut recorder = self.recorder.lock().unwrap();
        recorder.next_id += 1;
        let id = recorder.next_id;
        recorder.calls.push(Call::Created(id));
        recorder.callbacks = Some(callbacks);

        Ok(Box::new(RecordingSession {
            id,
            recorder: Arc::clone(&self.recorder),
            failures: Arc::clone(&self.failures),
        }))
    }
}

struct RecordingSession {
    id: u32,
    recorder: Arc<Mutex<Recorder>>,
    failures: Arc<Mutex<Failures>>,
}

impl RecordingSession {
    fn record(&self, call: Call) {
        self.recorder.lock().unwrap().calls.push(call);
    }
}

impl SessionHandle for RecordingSession {
    fn set_flags(&mut self, flags: SessionFlags) -> Result<(), RemoteError> {
        if self.failures.lock().unwrap().flags {
            return Err(RemoteError::InitializationFailed("flags refused".into()));
        }
        self.record(Call::Flags(self.id, flags));
        Ok(())
    }

    fn attach_button_receiver(&mut self) -> Result<(), RemoteError> {
        self.record(Call::ButtonReceiver(self.id));
        Ok(())
    }

    fn set_metadata(&mut self, metadata: &TrackMetadata) -> Result<(), RemoteError> {
        if self.failures.lock().unwrap().metadata {
            return Err(RemoteError::UpdateFailed("metadata refused".into()));
        }
        self.record(Call::Metadata(self.id, metadata.clone()));
        Ok(())
    }

    fn set_playback_state(&mut self, state: &PlaybackSnapshot) -> Result<(), RemoteError> {
        self.record(Call::State(self.id, state.clone()));
        Ok(())
    }

    fn set_active(&mut self, active: bool) -> Result<(), RemoteError> {
        self.record(Call::Active(self.id, active));
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.record(Call::Released(self.id));
    }
}

/// Preferences that count how often they are read.
#[derive(Debug, Default)]
pub struct CountingPreferences {
    values: Mutex<HashMap<String, bool>>,
    reads: AtomicUsize,
}

impl CountingPreferences {
    pub fn set(&self, key: &str, value: bool) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PreferenceStore for CountingPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.values.lock().unwrap().get_bool(key, default)
    }
}

/// A playback engine whose state the test controls.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub position: Mutex<Option<Duration>>,
    pub flags: Mutex<StateFlags>,
    pub preferences: CountingPreferences,
    pub keys: Mutex<Vec<KeyEvent>>,
    pub commands: Mutex<Vec<SessionCommand>>,
}

impl ScriptedEngine {
    pub fn set_position(&self, position: Option<Duration>) {
        *self.position.lock().unwrap() = position;
    }

    pub fn set_flags(&self, flags: StateFlags) {
        *self.flags.lock().unwrap() = flags;
    }

    pub fn keys(&self) -> Vec<KeyEvent> {
        self.keys.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<SessionCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl PlaybackEngine for ScriptedEngine {
    fn position(&self) -> Option<Duration> {
        *self.position.lock().unwrap()
    }

    fn state_flags(&self) -> StateFlags {
        *self.flags.lock().unwrap()
    }

    fn preferences(&self) -> &dyn PreferenceStore {
        &self.preferences
    }

    fn dispatch_key(&self, event: KeyEvent) {
        self.keys.lock().unwrap().push(event);
    }

    fn handle_command(&self, command: SessionCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

pub fn remote_with(config: RemoteConfig) -> (RemoteControl, RecordingHost, Arc<ScriptedEngine>) {
    let host = RecordingHost::default();
    let engine = Arc::new(ScriptedEngine::default());
    let remote = RemoteControl::new(config, Box::new(host.clone()), engine.clone());
    (remote, host, engine)
}

pub fn remote() -> (RemoteControl, RecordingHost, Arc<ScriptedEngine>) {
    remote_with(RemoteConfig::new())
}
