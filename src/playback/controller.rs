// Play loop state machine: load a track, run its reporter and key listener, advance
// Helpers are stopped and joined before the next track opens, so only one track is ever live

use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, watch};
use tokio::task;
use tracing::{debug, error, info};

use super::input::{InputListener, KeyInput};
use super::progress::ProgressReporter;
use super::{next_index, Command, EventSender, LoopMode, PlayerEvent, TrackEnd};
use crate::audio::{lock_info, whole_seconds, AudioBackend, PlaybackHandle, PlaybackInfo, Playlist, TrackOutput};
use crate::error::PlayResult;
use crate::library::Song;

// Room for a burst of keypresses; senders wait rather than drop when it fills
const INBOX_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Ran off the end of the playlist
    Completed,
    /// User quit
    Quit,
}

/// How the dispatch loop left a track
enum Ended {
    Track(TrackEnd),
    Quit,
}

/// Live output for the current track
struct TrackHandle {
    output: Box<dyn TrackOutput>,
    info: PlaybackHandle,
    total_secs: u64,
}

impl TrackHandle {
    /// Flip pause on the shared state and the sink under one lock
    fn toggle_pause(&self) -> bool {
        let mut info = lock_info(&self.info);
        info.paused = !info.paused;
        self.output.set_paused(info.paused);
        info.paused
    }

    fn release(mut self) {
        self.output.stop();
    }
}

impl Drop for TrackHandle {
    fn drop(&mut self) {
        // Covers early returns; stop() is idempotent
        self.output.stop();
    }
}

pub struct Controller<B, I> {
    backend: B,
    input: I,
    events: EventSender,
    loop_mode: LoopMode,
}

impl<B: AudioBackend, I: KeyInput> Controller<B, I> {
    pub fn new(backend: B, input: I) -> Self {
        Self {
            backend,
            input,
            events: EventSender::default(),
            loop_mode: LoopMode::Off,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Play `playlist` in order until it runs out (per loop mode) or the user quits
    pub async fn run(&mut self, playlist: &Playlist) -> PlayResult<SessionOutcome> {
        info!(
            "Starting session: {} tracks, loop {}",
            playlist.len(),
            self.loop_mode.label()
        );
        self.events.send(PlayerEvent::SessionStarted {
            tracks: playlist.len(),
            loop_mode: self.loop_mode,
        });

        let mut index = 0;
        while let Some(song) = playlist.get(index) {
            let track = self.load(index, song)?;

            let ended = self.play_track(index, &track).await?;
            track.release();

            let reason = match ended {
                Ended::Quit => {
                    info!("Quit during '{}'", song.display_name);
                    self.events.send(PlayerEvent::SessionQuit);
                    return Ok(SessionOutcome::Quit);
                }
                Ended::Track(reason) => reason,
            };

            debug!("track {} ended: {:?}", index, reason);
            self.events.send(PlayerEvent::TrackEnded { index, reason });

            match next_index(self.loop_mode, index, playlist.len(), reason) {
                Some(next) => index = next,
                None => break,
            }
        }

        info!("Session finished");
        self.events.send(PlayerEvent::SessionFinished);
        Ok(SessionOutcome::Completed)
    }

    fn load(&mut self, index: usize, song: &Song) -> PlayResult<TrackHandle> {
        let backend = &mut self.backend;
        let output = off_the_reactor(|| backend.open(Path::new(&song.path))).map_err(|e| {
            error!("Can't play '{}': {}", song.display_name, e);
            e
        })?;

        let total_secs = whole_seconds(output.total_duration());
        info!("Playing [{}] '{}' ({}s)", index, song.display_name, total_secs);
        self.events.send(PlayerEvent::TrackStarted {
            index,
            song: song.clone(),
            total_secs,
        });

        Ok(TrackHandle {
            output,
            info: Arc::new(Mutex::new(PlaybackInfo::default())),
            total_secs,
        })
    }

    async fn play_track(&mut self, index: usize, track: &TrackHandle) -> PlayResult<Ended> {
        // Attach first: if the terminal can't go raw, nothing has been spawned yet
        let keys = self.input.attach()?;

        let (commands, mut inbox) = mpsc::channel(INBOX_CAPACITY);
        let (stop, stop_rx) = watch::channel(false);

        let reporter = ProgressReporter::spawn(
            track.total_secs,
            track.info.clone(),
            commands.clone(),
            self.events.clone(),
            stop_rx.clone(),
        );
        let listener = InputListener::spawn(keys, commands, stop_rx);

        let ended = self.dispatch(index, track, &mut inbox).await;

        // Whatever is still queued belongs to this track and is dropped with the inbox
        let _ = stop.send(true);
        drop(inbox);
        reporter.join().await;
        listener.join().await;

        Ok(ended)
    }

    async fn dispatch(
        &mut self,
        index: usize,
        track: &TrackHandle,
        inbox: &mut mpsc::Receiver<Command>,
    ) -> Ended {
        while let Some(command) = inbox.recv().await {
            match command {
                Command::Pause => {
                    if track.toggle_pause() {
                        debug!("paused");
                        self.events.send(PlayerEvent::TrackPaused);
                    } else {
                        debug!("resumed");
                        self.events.send(PlayerEvent::TrackResumed);
                    }
                }
                Command::CycleLoop => {
                    self.loop_mode = self.loop_mode.cycle();
                    info!("Loop type: {}", self.loop_mode.label());
                    self.events.send(PlayerEvent::LoopModeChanged(self.loop_mode));
                }
                Command::Back if index == 0 => {
                    debug!("back on the first track, ignoring");
                }
                Command::Back => return Ended::Track(TrackEnd::Back),
                Command::Skip => return Ended::Track(TrackEnd::Skipped),
                Command::Restart => return Ended::Track(TrackEnd::Restarted),
                Command::TrackFinished => return Ended::Track(TrackEnd::Finished),
                Command::Quit => return Ended::Quit,
            }
        }

        // Every sender is gone, so the reporter has already run out the clock
        Ended::Track(TrackEnd::Finished)
    }
}

/// Run a blocking call (opening can decode a whole file to learn its length)
/// without stalling the other tasks on a multi-threaded runtime
fn off_the_reactor<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => task::block_in_place(f),
        _ => f(),
    }
}

/// Shuffle `songs` once and play them interactively
pub async fn play_library<B: AudioBackend, I: KeyInput>(
    songs: &[Song],
    backend: B,
    input: I,
    loop_mode: LoopMode,
    events: EventSender,
) -> PlayResult<SessionOutcome> {
    let playlist = Playlist::shuffled(songs, &mut rand::thread_rng());

    Controller::new(backend, input)
        .with_loop_mode(loop_mode)
        .with_events(events)
        .run(&playlist)
        .await
}
