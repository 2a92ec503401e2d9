// tapedeck - terminal music library manager and player
// The library side keeps a JSON song list; the playback side drives one track at a time

pub mod audio;     // decoder/sink seam, shared playback state, shuffling
pub mod commands;  // list / add / rename / delete / play
pub mod config;    // settings file
pub mod error;
pub mod library;   // song list and ingestion
pub mod playback;  // controller, progress reporter, key listener, renderer

pub use audio::{AudioBackend, AudioFormat, PlaybackHandle, PlaybackInfo, Playlist, TrackOutput};
pub use config::Config;
pub use error::{LibraryError, PlayError};
pub use library::{Library, Song};
pub use playback::{play_library, Controller, LoopMode, PlayerEvent, SessionOutcome};
