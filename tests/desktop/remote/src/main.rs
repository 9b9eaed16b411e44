//! Desktop test binary for waterkit-remote.
//!
//! Run with: cargo run -p waterkit-remote-test [-- prefs.json]
//!
//! Registers a remote session, publishes a fake track and prints every key
//! the OS sends back. Use media keys, the Windows media overlay or an MPRIS
//! client such as `playerctl` to send commands.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use waterkit_remote::{
    JsonPreferences, KeyAction, KeyCode, KeyEvent, PlaybackEngine, PreferenceStore, RemoteConfig,
    RemoteControl, SessionCommand, Song, StateFlags,
};

/// A pretend player that only tracks play/pause and a clock.
struct FakeEngine {
    playing: AtomicBool,
    position_ms: AtomicU64,
    preferences: JsonPreferences,
    pending: Mutex<Vec<KeyEvent>>,
}

impl PlaybackEngine for FakeEngine {
    fn position(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.position_ms.load(Ordering::Relaxed)))
    }

    fn state_flags(&self) -> StateFlags {
        if self.playing.load(Ordering::Relaxed) {
            StateFlags::PLAYING
        } else {
            StateFlags::NONE
        }
    }

    fn preferences(&self) -> &dyn PreferenceStore {
        &self.preferences
    }

    fn dispatch_key(&self, event: KeyEvent) {
        println!("📱 Key: {:?} {:?}", event.action, event.code);
        if event.action != KeyAction::Down {
            return;
        }

        match event.code {
            KeyCode::MEDIA_PLAY => self.playing.store(true, Ordering::Relaxed),
            KeyCode::MEDIA_PAUSE | KeyCode::MEDIA_STOP => {
                self.playing.store(false, Ordering::Relaxed);
            }
            KeyCode::MEDIA_PLAY_PAUSE | KeyCode::HEADSETHOOK => {
                self.playing.fetch_xor(true, Ordering::Relaxed);
            }
            KeyCode::MEDIA_NEXT | KeyCode::MEDIA_PREVIOUS => {
                self.position_ms.store(0, Ordering::Relaxed);
            }
            _ => {}
        }
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(event);
        }
    }

    fn handle_command(&self, command: SessionCommand) {
        println!("📱 Command: {command:?}");
    }
}

fn main() {
    env_logger::init();
    println!("=== Waterkit Remote Test ===\n");

    let prefs_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "remote-prefs.json".to_string());
    let preferences = match JsonPreferences::open(&prefs_path) {
        Ok(p) => p,
        Err(e) => {
            println!("✗ Failed to load preferences: {e}");
            return;
        }
    };
    println!("Preferences: {prefs_path}");

    let engine = Arc::new(FakeEngine {
        playing: AtomicBool::new(true),
        position_ms: AtomicU64::new(0),
        preferences,
        pending: Mutex::new(Vec::new()),
    });

    let config = RemoteConfig::legacy().identity("waterkit_remote_test");
    let mut remote = RemoteControl::with_platform_host(config, engine.clone());

    println!("Registering remote session...");
    remote.initialize_remote();
    if remote.is_registered() {
        println!("✓ Remote session registered\n");
    } else {
        println!("✗ Remote session unavailable on this platform\n");
        return;
    }

    let song = Song::new("Test Track")
        .artist("Waterkit Test")
        .album("Test Album")
        .duration(Duration::from_secs(180));
    remote.update_remote(Some(&song), engine.state_flags(), false);

    println!("========================================");
    println!("Send play/pause/next/previous from your");
    println!("desktop media controls. This test will");
    println!("run for 30 seconds...");
    println!("========================================\n");

    let end = Instant::now() + Duration::from_secs(30);
    let tick = Duration::from_millis(100);
    while Instant::now() < end {
        std::thread::sleep(tick);

        if engine.playing.load(Ordering::Relaxed) {
            engine.position_ms.fetch_add(100, Ordering::Relaxed);
        }

        let pressed = engine
            .pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default();
        if !pressed.is_empty() {
            remote.update_remote(Some(&song), engine.state_flags(), false);
        }

        remote.poll(Instant::now());
    }

    println!("\nCleaning up...");
    remote.unregister_remote();
    println!("✓ Remote session released");

    println!("\n=== Test Complete ===");
}
