// Test doubles for the play loop: an in-memory audio backend and scripted keys

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use super::input::{KeyInput, KeyStream};
use crate::audio::{AudioBackend, TrackOutput};
use crate::error::{PlayError, PlayResult};
use crate::library::Song;

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Keys arriving after the given delays (each relative to the previous), then silence
pub fn scripted_keys(script: Vec<(Duration, KeyEvent)>) -> KeyStream {
    stream::iter(script)
        .then(|(delay, key)| async move {
            sleep(delay).await;
            Ok::<_, io::Error>(Event::Key(key))
        })
        .chain(stream::pending())
        .boxed()
}

/// Hands out one script per attach (per track); runs out into silent streams
pub struct ScriptedInput {
    scripts: VecDeque<Vec<(Duration, KeyEvent)>>,
    attached: Arc<AtomicUsize>,
    fail: bool,
    read_error: bool,
}

impl ScriptedInput {
    pub fn new(scripts: Vec<Vec<(Duration, KeyEvent)>>) -> Self {
        Self {
            scripts: scripts.into(),
            attached: Arc::new(AtomicUsize::new(0)),
            fail: false,
            read_error: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Behaves like a stdin that isn't a terminal
    pub fn not_a_terminal() -> Self {
        Self {
            fail: true,
            ..Self::silent()
        }
    }

    /// Attaches fine, but every key stream fails on its first read
    pub fn broken_keyboard() -> Self {
        Self {
            read_error: true,
            ..Self::silent()
        }
    }

    /// How many key streams are currently alive
    pub fn attached_streams(&self) -> Arc<AtomicUsize> {
        self.attached.clone()
    }
}

struct Attached(Arc<AtomicUsize>);

impl Drop for Attached {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl KeyInput for ScriptedInput {
    fn attach(&mut self) -> PlayResult<KeyStream> {
        if self.fail {
            return Err(PlayError::TerminalMode(io::Error::new(
                io::ErrorKind::Unsupported,
                "not a terminal",
            )));
        }

        self.attached.fetch_add(1, Ordering::SeqCst);
        let guard = Attached(self.attached.clone());
        let script = self.scripts.pop_front().unwrap_or_default();
        let keys = if self.read_error {
            stream::once(async { Err::<Event, _>(io::Error::other("keyboard unplugged")) })
                .chain(stream::pending())
                .boxed()
        } else {
            scripted_keys(script)
        };

        Ok(keys
            .map(move |event| {
                let _guard = &guard;
                event
            })
            .boxed())
    }
}

/// Shared view of what the fake backend did
#[derive(Default)]
pub struct BackendLog {
    pub opened: Mutex<Vec<String>>,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub pause_calls: Mutex<Vec<bool>>,
}

impl BackendLog {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

/// Songs are known by path with a fixed length in seconds; anything else fails to decode
pub struct FakeBackend {
    lengths: HashMap<String, u64>,
    log: Arc<BackendLog>,
}

impl FakeBackend {
    pub fn new(songs: &[(Song, u64)]) -> Self {
        Self {
            lengths: songs
                .iter()
                .map(|(song, secs)| (song.path.clone(), *secs))
                .collect(),
            log: Arc::new(BackendLog::default()),
        }
    }

    pub fn log(&self) -> Arc<BackendLog> {
        self.log.clone()
    }
}

impl AudioBackend for FakeBackend {
    fn open(&mut self, path: &Path) -> PlayResult<Box<dyn TrackOutput>> {
        let key = path.to_string_lossy().into_owned();
        let secs = *self.lengths.get(&key).ok_or_else(|| PlayError::Decode {
            path: path.to_path_buf(),
            reason: "unknown test file".to_string(),
        })?;

        self.log.opened.lock().unwrap().push(key);
        let live = self.log.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(FakeTrack {
            length: Duration::from_secs(secs),
            log: self.log.clone(),
            stopped: false,
        }))
    }
}

struct FakeTrack {
    length: Duration,
    log: Arc<BackendLog>,
    stopped: bool,
}

impl TrackOutput for FakeTrack {
    fn total_duration(&self) -> Duration {
        self.length
    }

    fn set_paused(&self, paused: bool) {
        self.log.pause_calls.lock().unwrap().push(paused);
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.log.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn song(name: &str) -> Song {
    Song::new(format!("/music/{name}.mp3"), name)
}
