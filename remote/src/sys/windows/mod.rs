//! Windows remote session using SystemMediaTransportControls.

use crate::{
    Actions, PlaybackSnapshot, PlaybackStatus, RemoteConfig, RemoteError, SessionFlags,
    SessionHandle, SessionHost, TrackMetadata, TransportCallbacks,
};
use std::time::Duration;
use windows::Foundation::{TimeSpan, TypedEventHandler, Uri};
use windows::Media::Playback::MediaPlayer;
use windows::Media::{
    MediaPlaybackStatus, MediaPlaybackType, SystemMediaTransportControls,
    SystemMediaTransportControlsButton, SystemMediaTransportControlsButtonPressedEventArgs,
    SystemMediaTransportControlsTimelineProperties,
};
use windows::Storage::Streams::RandomAccessStreamReference;
use windows::core::{HSTRING, Ref};

fn init_err(e: &windows::core::Error) -> RemoteError {
    RemoteError::InitializationFailed(e.message().to_string())
}

fn update_err(e: &windows::core::Error) -> RemoteError {
    RemoteError::UpdateFailed(e.message().to_string())
}

/// 100-nanosecond ticks.
fn time_span(duration: Duration) -> TimeSpan {
    TimeSpan {
        Duration: i64::try_from(duration.as_nanos() / 100).unwrap_or(i64::MAX),
    }
}

/// Hosts sessions on the system media transport controls.
#[derive(Debug, Default)]
pub struct SmtcHost;

impl SessionHost for SmtcHost {
    fn create_session(
        &self,
        _config: &RemoteConfig,
        callbacks: TransportCallbacks,
    ) -> Result<Box<dyn SessionHandle>, RemoteError> {
        // The player is never used for playback; it only owns the controls.
        let media_player = MediaPlayer::new().map_err(|e| init_err(&e))?;
        media_player
            .CommandManager()
            .and_then(|manager| manager.SetIsEnabled(false))
            .map_err(|e| init_err(&e))?;

        let controls = media_player
            .SystemMediaTransportControls()
            .map_err(|e| init_err(&e))?;

        let handler = TypedEventHandler::new(
            move |_sender: Ref<SystemMediaTransportControls>,
                  args: Ref<SystemMediaTransportControlsButtonPressedEventArgs>| {
                if let Ok(args) = args.ok() {
                    match args.Button()? {
                        SystemMediaTransportControlsButton::Play => callbacks.on_play(),
                        SystemMediaTransportControlsButton::Pause => callbacks.on_pause(),
                        SystemMediaTransportControlsButton::Stop => callbacks.on_stop(),
                        SystemMediaTransportControlsButton::Next => callbacks.on_next(),
                        SystemMediaTransportControlsButton::Previous => callbacks.on_previous(),
                        other => log::debug!("ignoring SMTC button {other:?}"),
                    }
                }
                Ok(())
            },
        );

        let token = controls.ButtonPressed(&handler).map_err(|e| init_err(&e))?;

        Ok(Box::new(SmtcSession {
            _media_player: media_player,
            controls,
            token,
            duration: Duration::ZERO,
        }))
    }
}

/// The end must not precede the position, even before any metadata.
fn timeline_end(duration: Duration, position: Duration) -> Duration {
    duration.max(position)
}

struct SmtcSession {
    _media_player: MediaPlayer,
    controls: SystemMediaTransportControls,
    token: i64,
    /// Length of the current track, for the timeline end.
    duration: Duration,
}

impl SmtcSession {
    fn set_actions(&self, actions: Actions) -> windows::core::Result<()> {
        self.controls.SetIsPlayEnabled(actions.contains(Actions::PLAY))?;
        self.controls.SetIsPauseEnabled(actions.contains(Actions::PAUSE))?;
        self.controls.SetIsStopEnabled(actions.contains(Actions::STOP))?;
        self.controls
            .SetIsNextEnabled(actions.contains(Actions::SKIP_TO_NEXT))?;
        self.controls
            .SetIsPreviousEnabled(actions.contains(Actions::SKIP_TO_PREVIOUS))?;
        Ok(())
    }

    fn push_timeline(&self, position: Duration) -> windows::core::Result<()> {
        let end = timeline_end(self.duration, position);
        let timeline = SystemMediaTransportControlsTimelineProperties::new()?;
        timeline.SetStartTime(time_span(Duration::ZERO))?;
        timeline.SetEndTime(time_span(end))?;
        timeline.SetMinSeekTime(time_span(Duration::ZERO))?;
        timeline.SetMaxSeekTime(time_span(end))?;
        timeline.SetPosition(time_span(position))?;
        self.controls.UpdateTimelineProperties(&timeline)
    }
}

impl SessionHandle for SmtcSession {
    fn set_flags(&mut self, flags: SessionFlags) -> Result<(), RemoteError> {
        if !flags.contains(SessionFlags::HANDLES_TRANSPORT_CONTROLS) {
            return Ok(());
        }
        self.set_actions(Actions::TRANSPORT).map_err(|e| init_err(&e))
    }

    fn set_metadata(&mut self, metadata: &TrackMetadata) -> Result<(), RemoteError> {
        let updater = self.controls.DisplayUpdater().map_err(|e| update_err(&e))?;
        updater
            .SetType(MediaPlaybackType::Music)
            .map_err(|e| update_err(&e))?;

        let music = updater.MusicProperties().map_err(|e| update_err(&e))?;
        music
            .SetTitle(&HSTRING::from(metadata.title.as_str()))
            .map_err(|e| update_err(&e))?;
        music
            .SetArtist(&HSTRING::from(metadata.artist.as_str()))
            .map_err(|e| update_err(&e))?;
        music
            .SetAlbumTitle(&HSTRING::from(metadata.album.as_str()))
            .map_err(|e| update_err(&e))?;

        let thumbnail = metadata
            .artwork
            .as_ref()
            .and_then(crate::Artwork::to_uri)
            .and_then(|uri| Uri::CreateUri(&HSTRING::from(uri.as_str())).ok())
            .and_then(|uri| RandomAccessStreamReference::CreateFromUri(&uri).ok());
        if let Some(stream) = thumbnail {
            updater.SetThumbnail(&stream).map_err(|e| update_err(&e))?;
        }

        updater.Update().map_err(|e| update_err(&e))?;

        self.duration = metadata.duration;
        Ok(())
    }

    fn set_playback_state(&mut self, state: &PlaybackSnapshot) -> Result<(), RemoteError> {
        let status = match state.status {
            PlaybackStatus::Playing => MediaPlaybackStatus::Playing,
            PlaybackStatus::Paused => MediaPlaybackStatus::Paused,
            PlaybackStatus::Stopped => MediaPlaybackStatus::Stopped,
        };

        self.controls
            .SetPlaybackStatus(status)
            .map_err(|e| update_err(&e))?;
        self.set_actions(state.actions).map_err(|e| update_err(&e))?;
        self.push_timeline(state.position)
            .map_err(|e| update_err(&e))
    }

    fn set_active(&mut self, active: bool) -> Result<(), RemoteError> {
        self.controls.SetIsEnabled(active).map_err(|e| update_err(&e))
    }

    fn release(self: Box<Self>) {
        if let Err(e) = self.controls.RemoveButtonPressed(self.token) {
            log::debug!("failed to remove SMTC button handler: {}", e.message());
        }
        if let Ok(updater) = self.controls.DisplayUpdater() {
            let _ = updater.ClearAll();
        }
        let _ = self.controls.SetPlaybackStatus(MediaPlaybackStatus::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_ends_at_track_length() {
        let end = timeline_end(Duration::from_secs(240), Duration::from_secs(30));
        assert_eq!(end, Duration::from_secs(240));
    }

    #[test]
    fn timeline_covers_position_before_metadata() {
        let end = timeline_end(Duration::ZERO, Duration::from_secs(30));
        assert_eq!(end, Duration::from_secs(30));
    }

    #[test]
    fn time_span_counts_hundred_nanosecond_ticks() {
        assert_eq!(time_span(Duration::from_millis(1)).Duration, 10_000);
    }
}
