// Song library - the persisted list of songs tapedeck knows about
// Stored as a small JSON file; the play loop only ever reads it

pub mod ingest;

pub use ingest::{is_remote, Ingest};

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};

/// A single song: where the audio lives and what to call it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub path: String,
    #[serde(rename = "song_name")]
    pub display_name: String,
}

impl Song {
    pub fn new(path: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub songs: Vec<Song>,
}

impl Library {
    /// Read the library file
    pub fn load(path: &Path) -> LibraryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LibraryError::NotFound(path.to_path_buf()),
            _ => LibraryError::Io(e),
        })?;

        let library: Library =
            serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Loaded {} songs from {}", library.songs.len(), path.display());
        Ok(library)
    }

    /// Load the library, creating an empty one on disk if it doesn't exist yet
    pub fn load_or_create(path: &Path) -> LibraryResult<Self> {
        match Self::load(path) {
            Err(LibraryError::NotFound(_)) => {
                info!("No library at {}, creating a new one", path.display());
                let library = Library::default();
                library.save(path)?;
                Ok(library)
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> LibraryResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(self).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json)?;

        info!("Saved {} songs to {}", self.songs.len(), path.display());
        Ok(())
    }

    pub fn add(&mut self, song: Song) {
        info!("Added '{}' ({})", song.display_name, song.path);
        self.songs.push(song);
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.songs.iter().any(|s| s.display_name == display_name)
    }

    /// Rename every song called `from`. Returns how many were renamed.
    pub fn rename(&mut self, from: &str, to: &str) -> LibraryResult<usize> {
        let mut renamed = 0;
        for song in self.songs.iter_mut().filter(|s| s.display_name == from) {
            song.display_name = to.to_string();
            renamed += 1;
        }

        if renamed == 0 {
            return Err(LibraryError::SongNotFound(from.to_string()));
        }
        info!("Renamed {} song(s) '{}' -> '{}'", renamed, from, to);
        Ok(renamed)
    }

    /// Remove every song called `display_name`. The audio file stays on disk.
    pub fn delete(&mut self, display_name: &str) -> LibraryResult<usize> {
        let before = self.songs.len();
        self.songs.retain(|s| s.display_name != display_name);
        let removed = before - self.songs.len();

        if removed == 0 {
            return Err(LibraryError::SongNotFound(display_name.to_string()));
        }
        info!("Deleted {} song(s) named '{}'", removed, display_name);
        Ok(removed)
    }
}
