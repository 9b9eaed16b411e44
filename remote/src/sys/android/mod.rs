//! Android remote session using the framework `MediaSession` through JNI.
//!
//! Session callbacks arrive through `RemoteSessionCallback.kt`, which the app
//! compiles into its APK; its native methods land in the exports at the
//! bottom of this file.

#![allow(non_snake_case)]

use crate::{
    Artwork, KeyAction, KeyCode, KeyEvent, PlaybackSnapshot, PlaybackStatus, RemoteConfig,
    RemoteError, RepeatMode, SessionFlags, SessionHandle, SessionHost, TrackMetadata,
    TransportAction, TransportCallbacks,
};
use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use std::sync::{OnceLock, RwLock};

const CALLBACK_CLASS: &str = "waterkit.remote.RemoteSessionCallback";
const ACTION_MEDIA_BUTTON: &str = "android.intent.action.MEDIA_BUTTON";
const PENDING_INTENT_FLAG_IMMUTABLE: i32 = 0x0400_0000;

const METADATA_TITLE: &str = "android.media.metadata.TITLE";
const METADATA_ARTIST: &str = "android.media.metadata.ARTIST";
const METADATA_ALBUM: &str = "android.media.metadata.ALBUM";
const METADATA_DURATION: &str = "android.media.metadata.DURATION";
const METADATA_ALBUM_ART: &str = "android.media.metadata.ALBUM_ART";
const METADATA_ALBUM_ART_URI: &str = "android.media.metadata.ALBUM_ART_URI";

const STATE_STOPPED: i32 = 1;
const STATE_PAUSED: i32 = 2;
const STATE_PLAYING: i32 = 3;

/// Application context captured by [`init_with_context`].
struct AndroidContext {
    vm: JavaVM,
    context: GlobalRef,
}

static CONTEXT: OnceLock<AndroidContext> = OnceLock::new();

/// Callbacks of the live session. There is at most one.
static CALLBACKS: RwLock<Option<TransportCallbacks>> = RwLock::new(None);

impl From<jni::errors::Error> for RemoteError {
    fn from(err: jni::errors::Error) -> Self {
        Self::UpdateFailed(err.to_string())
    }
}

fn init_err(step: &str) -> impl FnOnce(jni::errors::Error) -> RemoteError + '_ {
    move |e| RemoteError::InitializationFailed(format!("{step}: {e}"))
}

/// Capture the application context. Must be called once before
/// [`MediaSessionHost`] can create sessions.
///
/// # Errors
/// Returns [`RemoteError::InitializationFailed`] if the VM or a global
/// reference cannot be obtained.
pub fn init_with_context(env: &mut JNIEnv, context: &JObject) -> Result<(), RemoteError> {
    if CONTEXT.get().is_some() {
        return Ok(());
    }

    let app_context = env
        .call_method(
            context,
            "getApplicationContext",
            "()Landroid/content/Context;",
            &[],
        )
        .and_then(|value| value.l())
        .map_err(init_err("getApplicationContext"))?;

    let vm = env.get_java_vm().map_err(init_err("get_java_vm"))?;
    let context = env
        .new_global_ref(app_context)
        .map_err(init_err("new_global_ref"))?;

    let _ = CONTEXT.set(AndroidContext { vm, context });
    Ok(())
}

fn dispatch(forward: impl FnOnce(&TransportCallbacks)) {
    if let Ok(guard) = CALLBACKS.read() {
        if let Some(callbacks) = guard.as_ref() {
            forward(callbacks);
        }
    }
}

/// Creates framework `MediaSession`s.
#[derive(Debug, Default)]
pub struct MediaSessionHost;

impl SessionHost for MediaSessionHost {
    fn create_session(
        &self,
        config: &RemoteConfig,
        callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError> {
        let ctx = CONTEXT.get().ok_or_else(|| {
            RemoteError::InitializationFailed("Android: call init_with_context() first".into())
        })?;
        let mut env = ctx
            .vm
            .attach_current_thread()
            .map_err(init_err("attach_current_thread"))?;

        let tag = env
            .new_string(&config.identity)
            .map_err(init_err("new_string tag"))?;
        let session = env
            .new_object(
                "android/media/session/MediaSession",
                "(Landroid/content/Context;Ljava/lang/String;)V",
                &[JValue::Object(ctx.context.as_obj()), JValue::Object(&tag)],
            )
            .map_err(init_err("new MediaSession"))?;

        let callback = new_callback(&mut env, ctx.context.as_obj())?;
        env.call_method(
            &session,
            "setCallback",
            "(Landroid/media/session/MediaSession$Callback;)V",
            &[JValue::Object(&callback)],
        )
        .map_err(init_err("setCallback"))?;

        let session = env
            .new_global_ref(session)
            .map_err(init_err("new_global_ref session"))?;

        let mut guard = CALLBACKS
            .write()
            .map_err(|e| RemoteError::InitializationFailed(format!("lock poisoned: {e}")))?;
        *guard = Some(callbacks);

        Ok(Box::new(AndroidSession {
            session,
            config: config.clone(),
        }))
    }
}

fn new_callback<'local>(
    env: &mut JNIEnv<'local>,
    context: &JObject,
) -> Result<JObject<'local>, RemoteError> {
    let loader = env
        .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|value| value.l())
        .map_err(init_err("getClassLoader"))?;
    let name = env
        .new_string(CALLBACK_CLASS)
        .map_err(init_err("new_string callback class"))?;
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&name)],
        )
        .and_then(|value| value.l())
        .map_err(init_err("loadClass RemoteSessionCallback"))?;

    env.new_object(JClass::from(class), "()V", &[])
        .map_err(init_err("new RemoteSessionCallback"))
}

struct AndroidSession {
    session: GlobalRef,
    config: RemoteConfig,
}

impl AndroidSession {
    fn with_env<T>(
        &self,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let ctx = CONTEXT.get().ok_or_else(|| {
            RemoteError::UpdateFailed("Android: context not initialized".into())
        })?;
        let mut env = ctx.vm.attach_current_thread()?;
        env.with_local_frame(16, |env| f(env, self.session.as_obj()))
    }
}

impl SessionHandle for AndroidSession {
    fn set_flags(&mut self, flags: SessionFlags) -> Result<(), RemoteError> {
        #[allow(clippy::cast_possible_wrap)]
        let flags = flags.0 as i32;
        self.with_env(|env, session| {
            env.call_method(session, "setFlags", "(I)V", &[JValue::Int(flags)])
                .map_err(init_err("setFlags"))?;
            Ok(())
        })
    }

    fn attach_button_receiver(&mut self) -> Result<(), RemoteError> {
        let ctx = CONTEXT.get().ok_or_else(|| {
            RemoteError::InitializationFailed("Android: context not initialized".into())
        })?;

        self.with_env(|env, session| {
            let context = ctx.context.as_obj();
            let package = env
                .call_method(context, "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            let package = read_string(env, &JString::from(package)).ok_or_else(|| {
                RemoteError::InitializationFailed("Android: no package name".into())
            })?;
            let receiver = self.config.button_receiver_class(&package);
            log::debug!("routing media buttons to {receiver}");

            let class_name = env.new_string(&receiver)?;
            let component = env.new_object(
                "android/content/ComponentName",
                "(Landroid/content/Context;Ljava/lang/String;)V",
                &[JValue::Object(context), JValue::Object(&class_name)],
            )?;
            let action = env.new_string(ACTION_MEDIA_BUTTON)?;
            let intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&action)],
            )?;
            env.call_method(
                &intent,
                "setComponent",
                "(Landroid/content/ComponentName;)Landroid/content/Intent;",
                &[JValue::Object(&component)],
            )?;
            let pending = env
                .call_static_method(
                    "android/app/PendingIntent",
                    "getBroadcast",
                    "(Landroid/content/Context;ILandroid/content/Intent;I)Landroid/app/PendingIntent;",
                    &[
                        JValue::Object(context),
                        JValue::Int(0),
                        JValue::Object(&intent),
                        JValue::Int(PENDING_INTENT_FLAG_IMMUTABLE),
                    ],
                )?
                .l()?;
            env.call_method(
                session,
                "setMediaButtonReceiver",
                "(Landroid/app/PendingIntent;)V",
                &[JValue::Object(&pending)],
            )
            .map_err(init_err("setMediaButtonReceiver"))?;
            Ok(())
        })
    }

    fn set_metadata(&mut self, metadata: &TrackMetadata) -> Result<(), RemoteError> {
        self.with_env(|env, session| {
            let builder = env.new_object("android/media/MediaMetadata$Builder", "()V", &[])?;

            put_string(env, &builder, METADATA_TITLE, &metadata.title)?;
            put_string(env, &builder, METADATA_ARTIST, &metadata.artist)?;
            put_string(env, &builder, METADATA_ALBUM, &metadata.album)?;

            let key = env.new_string(METADATA_DURATION)?;
            let duration_ms = i64::try_from(metadata.duration.as_millis()).unwrap_or(i64::MAX);
            env.call_method(
                &builder,
                "putLong",
                "(Ljava/lang/String;J)Landroid/media/MediaMetadata$Builder;",
                &[JValue::Object(&key), JValue::Long(duration_ms)],
            )?;

            match &metadata.artwork {
                Some(Artwork::File(path)) => {
                    let path = env.new_string(path.to_string_lossy())?;
                    let bitmap = env
                        .call_static_method(
                            "android/graphics/BitmapFactory",
                            "decodeFile",
                            "(Ljava/lang/String;)Landroid/graphics/Bitmap;",
                            &[JValue::Object(&path)],
                        )?
                        .l()?;
                    if !bitmap.is_null() {
                        let key = env.new_string(METADATA_ALBUM_ART)?;
                        env.call_method(
                            &builder,
                            "putBitmap",
                            "(Ljava/lang/String;Landroid/graphics/Bitmap;)Landroid/media/MediaMetadata$Builder;",
                            &[JValue::Object(&key), JValue::Object(&bitmap)],
                        )?;
                    }
                }
                Some(Artwork::Url(url)) => {
                    put_string(env, &builder, METADATA_ALBUM_ART_URI, url)?;
                }
                None => {}
            }

            let built = env
                .call_method(&builder, "build", "()Landroid/media/MediaMetadata;", &[])?
                .l()?;
            env.call_method(
                session,
                "setMetadata",
                "(Landroid/media/MediaMetadata;)V",
                &[JValue::Object(&built)],
            )?;
            Ok(())
        })
    }

    fn set_playback_state(&mut self, state: &PlaybackSnapshot) -> Result<(), RemoteError> {
        let code = match state.status {
            PlaybackStatus::Playing => STATE_PLAYING,
            PlaybackStatus::Paused => STATE_PAUSED,
            PlaybackStatus::Stopped => STATE_STOPPED,
        };
        let position_ms = i64::try_from(state.position.as_millis()).unwrap_or(i64::MAX);
        #[allow(clippy::cast_possible_wrap)]
        let actions = state.actions.0 as i64;
        let rate = state.rate;
        let update_time_ms = state
            .update_time
            .map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX));

        self.with_env(|env, session| {
            let builder = env.new_object("android/media/session/PlaybackState$Builder", "()V", &[])?;
            match update_time_ms {
                Some(update_time_ms) => env.call_method(
                    &builder,
                    "setState",
                    "(IJFJ)Landroid/media/session/PlaybackState$Builder;",
                    &[
                        JValue::Int(code),
                        JValue::Long(position_ms),
                        JValue::Float(rate),
                        JValue::Long(update_time_ms),
                    ],
                )?,
                None => env.call_method(
                    &builder,
                    "setState",
                    "(IJF)Landroid/media/session/PlaybackState$Builder;",
                    &[JValue::Int(code), JValue::Long(position_ms), JValue::Float(rate)],
                )?,
            };
            env.call_method(
                &builder,
                "setActions",
                "(J)Landroid/media/session/PlaybackState$Builder;",
                &[JValue::Long(actions)],
            )?;
            let built = env
                .call_method(&builder, "build", "()Landroid/media/session/PlaybackState;", &[])?
                .l()?;
            env.call_method(
                session,
                "setPlaybackState",
                "(Landroid/media/session/PlaybackState;)V",
                &[JValue::Object(&built)],
            )?;
            Ok(())
        })
    }

    fn set_active(&mut self, active: bool) -> Result<(), RemoteError> {
        self.with_env(|env, session| {
            env.call_method(session, "setActive", "(Z)V", &[JValue::Bool(u8::from(active))])?;
            Ok(())
        })
    }

    fn release(self: Box<Self>) {
        if let Err(e) = self.with_env(|env, session| {
            env.call_method(session, "release", "()V", &[])?;
            Ok(())
        }) {
            log::warn!("MediaSession.release failed: {e}");
        }
        if let Ok(mut guard) = CALLBACKS.write() {
            *guard = None;
        }
    }
}

fn put_string(
    env: &mut JNIEnv,
    builder: &JObject,
    key: &str,
    value: &str,
) -> Result<(), RemoteError> {
    let key = env.new_string(key)?;
    let value = env.new_string(value)?;
    env.call_method(
        builder,
        "putString",
        "(Ljava/lang/String;Ljava/lang/String;)Landroid/media/MediaMetadata$Builder;",
        &[JValue::Object(&key), JValue::Object(&value)],
    )?;
    Ok(())
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        return None;
    }
    env.get_string(value).ok().map(String::from)
}

// ============================================================================
// Native methods of waterkit.remote.RemoteSessionCallback
// ============================================================================

/// `action`: 0 play, 1 pause, 2 next, 3 previous, 4 stop.
#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnTransport(
    _env: JNIEnv,
    _this: JObject,
    action: jint,
) {
    let action = match action {
        0 => TransportAction::Play,
        1 => TransportAction::Pause,
        2 => TransportAction::Next,
        3 => TransportAction::Previous,
        4 => TransportAction::Stop,
        other => {
            log::debug!("unknown transport action {other}");
            return;
        }
    };
    dispatch(|callbacks| callbacks.on_transport(action));
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnMediaButton(
    _env: JNIEnv,
    _this: JObject,
    action: jint,
    key_code: jint,
) {
    let event = KeyEvent::new(KeyAction::from_raw(action), KeyCode(key_code));
    dispatch(|callbacks| callbacks.on_media_button(event));
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnCommand(
    mut env: JNIEnv,
    _this: JObject,
    command: JString,
) {
    if let Some(command) = read_string(&mut env, &command) {
        dispatch(|callbacks| callbacks.on_command(command));
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnCustomAction(
    mut env: JNIEnv,
    _this: JObject,
    action: JString,
) {
    if let Some(action) = read_string(&mut env, &action) {
        dispatch(|callbacks| callbacks.on_custom_action(action));
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnSetRepeatMode(
    _env: JNIEnv,
    _this: JObject,
    mode: jint,
) {
    dispatch(|callbacks| callbacks.on_set_repeat_mode(RepeatMode::from_raw(mode)));
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_waterkit_remote_RemoteSessionCallback_nativeOnSetShuffleMode(
    _env: JNIEnv,
    _this: JObject,
    mode: jint,
) {
    dispatch(|callbacks| callbacks.on_set_shuffle(mode != 0));
}
