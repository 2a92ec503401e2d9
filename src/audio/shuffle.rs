// Session playlist: the library's songs in one random order
// Drawn once per play session and kept in memory; the library file keeps its own order

use rand::seq::SliceRandom;
use rand::Rng;

use crate::library::Song;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    songs: Vec<Song>,
}

impl Playlist {
    /// Fisher-Yates over a copy of `songs`: every ordering equally likely
    pub fn shuffled<R: Rng + ?Sized>(songs: &[Song], rng: &mut R) -> Self {
        let mut songs = songs.to_vec();
        songs.shuffle(rng);
        Self { songs }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }
}

/// Keeps the given order; play sessions shuffle, tests and callers with their own order don't
impl From<Vec<Song>> for Playlist {
    fn from(songs: Vec<Song>) -> Self {
        Self { songs }
    }
}
