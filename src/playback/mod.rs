// Playback - the interactive play loop
// One controller drives one track at a time; a progress reporter and a key
// listener run beside it and talk to it through a single command inbox

pub mod controller;
pub mod input;
pub mod progress;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{play_library, Controller, SessionOutcome};
pub use input::{command_for_key, InputListener, KeyInput, KeyStream, TerminalInput};
pub use progress::ProgressReporter;
pub use render::TerminalRenderer;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::library::Song;

/// Signals consumed by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Skip,
    Back,
    Restart,
    CycleLoop,
    Quit,
    TrackFinished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Play the playlist through once
    #[default]
    Off,
    /// Repeat the current track
    Song,
    /// Wrap around to the start of the playlist
    Library,
}

impl LoopMode {
    /// OFF -> SONG -> LIBRARY -> OFF
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::Song,
            LoopMode::Song => LoopMode::Library,
            LoopMode::Library => LoopMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoopMode::Off => "OFF",
            LoopMode::Song => "SONG",
            LoopMode::Library => "LIB",
        }
    }
}

/// Why a track stopped playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    Finished,
    Skipped,
    Back,
    Restarted,
}

/// Index of the next track, or `None` when the session is done
pub fn next_index(mode: LoopMode, index: usize, len: usize, end: TrackEnd) -> Option<usize> {
    if len == 0 {
        return None;
    }

    match (end, mode) {
        (TrackEnd::Restarted, _) => Some(index),
        (TrackEnd::Back, _) => Some(index.saturating_sub(1)),
        (TrackEnd::Finished, LoopMode::Song) => Some(index),
        (TrackEnd::Finished | TrackEnd::Skipped, LoopMode::Library) => Some((index + 1) % len),
        (TrackEnd::Finished | TrackEnd::Skipped, _) => Some(index + 1).filter(|&next| next < len),
    }
}

/// What the play loop reports while it runs. Rendering and tests listen; nothing depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    SessionStarted { tracks: usize, loop_mode: LoopMode },
    TrackStarted { index: usize, song: Song, total_secs: u64 },
    Tick { elapsed: u64, total: u64 },
    TrackPaused,
    TrackResumed,
    LoopModeChanged(LoopMode),
    TrackEnded { index: usize, reason: TrackEnd },
    SessionFinished,
    SessionQuit,
}

/// Optional event channel; sending never fails the caller
#[derive(Debug, Clone, Default)]
pub struct EventSender(Option<mpsc::UnboundedSender<PlayerEvent>>);

impl EventSender {
    pub fn new(sender: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self(Some(sender))
    }

    pub fn send(&self, event: PlayerEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }
}
