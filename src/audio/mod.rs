// Audio side of tapedeck: the decoder/sink seam the play loop talks to,
// plus the shared paused/position state that sits next to the sink

#[cfg(feature = "audio")]
pub mod player;
pub mod shuffle;

#[cfg(feature = "audio")]
pub use player::RodioBackend;
pub use shuffle::Playlist;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::PlayResult;

/// Opens song files for playback
pub trait AudioBackend {
    /// Decode `path` and queue it on a fresh, playing sink
    fn open(&mut self, path: &Path) -> PlayResult<Box<dyn TrackOutput>>;
}

/// One decoded song attached to the output device
pub trait TrackOutput: Send {
    fn total_duration(&self) -> Duration;

    fn set_paused(&self, paused: bool);

    /// Stop output and drop the decoder. Safe to call more than once.
    fn stop(&mut self);
}

/// State shared between the controller (writer) and the progress reporter (reader)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackInfo {
    pub paused: bool,
    /// Whole seconds played so far
    pub elapsed: u64,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;

/// Lock the shared playback state. A poisoned lock still holds valid flags.
pub fn lock_info(handle: &PlaybackHandle) -> MutexGuard<'_, PlaybackInfo> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Round a duration to the nearest whole second
pub fn whole_seconds(duration: Duration) -> u64 {
    ((duration.as_millis() + 500) / 1000) as u64
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "ogg" | "oga" => AudioFormat::Ogg,
            "mp4" | "m4a" | "aac" => AudioFormat::Mp4,
            "wav" => AudioFormat::Wav,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Unknown)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}
