// Progress reporter - one tick per second of unpaused playback, then TrackFinished
// A stop signal always wins: nothing is reported once teardown has started

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use super::{Command, EventSender, PlayerEvent};
use crate::audio::{lock_info, PlaybackHandle};

pub const TICK: Duration = Duration::from_secs(1);

pub struct ProgressReporter {
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn spawn(
        total_secs: u64,
        info: PlaybackHandle,
        commands: mpsc::Sender<Command>,
        events: EventSender,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let handle = tokio::spawn(run(total_secs, info, commands, events, stop));
        Self { handle }
    }

    /// Wait for the task to exit. Call after signalling stop.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("progress reporter ended abnormally: {}", e);
        }
    }
}

async fn run(
    total_secs: u64,
    info: PlaybackHandle,
    commands: mpsc::Sender<Command>,
    events: EventSender,
    mut stop: watch::Receiver<bool>,
) {
    // Fixed schedule from the start of the track: jitter doesn't accumulate
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => return,
            _ = ticker.tick() => {}
        }

        let (elapsed, advanced) = {
            let mut info = lock_info(&info);
            if info.paused {
                continue;
            }
            let advanced = info.elapsed < total_secs;
            if advanced {
                info.elapsed += 1;
            }
            (info.elapsed, advanced)
        };

        if advanced {
            events.send(PlayerEvent::Tick {
                elapsed,
                total: total_secs,
            });
        }

        if elapsed >= total_secs {
            if *stop.borrow() {
                return;
            }
            debug!("track reached {}s, reporting finished", total_secs);
            tokio::select! {
                biased;
                _ = stop.changed() => {}
                _ = commands.send(Command::TrackFinished) => {}
            }
            return;
        }
    }
}
