// Keyboard input for the play loop: raw mode, key mapping, per-track listener
// Keys arrive on crossterm's async event stream so a listener can be stopped mid-wait

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::io;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Command;
use crate::error::{PlayError, PlayResult};

pub type KeyStream = BoxStream<'static, io::Result<Event>>;

/// Source of keyboard events for one track
pub trait KeyInput {
    /// Start delivering keys. Raw mode (if any) lasts until the stream is dropped.
    fn attach(&mut self) -> PlayResult<KeyStream>;
}

/// The real terminal: raw mode plus crossterm's async event stream
#[derive(Debug, Default)]
pub struct TerminalInput;

impl KeyInput for TerminalInput {
    fn attach(&mut self) -> PlayResult<KeyStream> {
        let raw = RawModeGuard::engage()?;
        let events = EventStream::new();

        // The guard rides along with the stream so raw mode ends with it
        Ok(events
            .map(move |event| {
                let _raw = &raw;
                event
            })
            .boxed())
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn engage() -> PlayResult<Self> {
        enable_raw_mode().map_err(PlayError::TerminalMode)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Command::Quit), // Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => Some(Command::Quit),

        (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => Some(Command::Pause),
        (KeyCode::Right, _) => Some(Command::Skip),
        (KeyCode::Left, _) => Some(Command::Back),
        (KeyCode::Up, _) => Some(Command::Restart),
        (KeyCode::Char('l'), _) | (KeyCode::Char('L'), _) => Some(Command::CycleLoop),

        _ => None,
    }
}

/// Per-track key listener. Stops as soon as the stop signal flips.
pub struct InputListener {
    handle: JoinHandle<()>,
}

impl InputListener {
    pub fn spawn(
        keys: KeyStream,
        commands: mpsc::Sender<Command>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let handle = tokio::spawn(listen(keys, commands, stop));
        Self { handle }
    }

    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("input listener ended abnormally: {}", e);
        }
    }
}

async fn listen(
    mut keys: KeyStream,
    commands: mpsc::Sender<Command>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = stop.changed() => break,
            event = keys.next() => event,
        };

        let key = match event {
            Some(Ok(Event::Key(key))) => key,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("keyboard read failed, controls disabled for this track: {}", e);
                break;
            }
            None => break,
        };

        let Some(command) = command_for_key(&key) else {
            continue;
        };
        debug!("key {:?} -> {:?}", key.code, command);

        let sent = tokio::select! {
            biased;
            _ = stop.changed() => break,
            sent = commands.send(command) => sent,
        };
        if sent.is_err() {
            break;
        }
    }
    // `keys` drops here, which restores the terminal mode
}
