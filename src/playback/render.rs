// Terminal rendering for a play session: one progress bar per track plus status lines
// The terminal is in raw mode while keys are attached, so every line ends in "\r\n"

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use tokio::sync::mpsc;

use super::{PlayerEvent, TrackEnd};

const CONTROLS: &[&str] = &[
    "Controls:",
    "\t-<enter or spacebar> to pause/play",
    "\t-<right arrow> to skip",
    "\t-<left arrow> to go back",
    "\t-<up arrow> to restart song",
    "\t-<L key> to switch loop modes: OFF for no loop, SONG to loop song, and LIB to loop all songs",
    "\t-<q or ctrl+c> to quit",
];

const BAR_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {pos}/{len}s";

pub struct TerminalRenderer<W: Write> {
    out: W,
    show_controls: bool,
    draw_bars: bool,
    bar: Option<ProgressBar>,
    title: String,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(show_controls: bool) -> Self {
        Self::new(io::stdout(), show_controls, true)
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// `draw_bars: false` keeps the bars off the terminal (they still track position)
    pub fn new(out: W, show_controls: bool, draw_bars: bool) -> Self {
        Self {
            out,
            show_controls,
            draw_bars,
            bar: None,
            title: String::new(),
        }
    }

    /// Render until the controller drops its sender, then hand the writer back
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<PlayerEvent>) -> io::Result<W> {
        while let Some(event) = events.recv().await {
            self.handle(event)?;
        }
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
        Ok(self.out)
    }

    pub fn handle(&mut self, event: PlayerEvent) -> io::Result<()> {
        match event {
            PlayerEvent::SessionStarted { .. } => {
                if self.show_controls {
                    for line in CONTROLS {
                        self.line(line)?;
                    }
                }
            }
            PlayerEvent::TrackStarted { song, total_secs, .. } => {
                if let Some(old) = self.bar.take() {
                    old.abandon();
                }
                self.title = song.display_name;
                self.bar = Some(self.new_bar(total_secs));
            }
            PlayerEvent::Tick { elapsed, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(elapsed);
                }
            }
            PlayerEvent::TrackPaused => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("{} (paused)", self.title));
                }
            }
            PlayerEvent::TrackResumed => {
                if let Some(bar) = &self.bar {
                    bar.set_message(self.title.clone());
                }
            }
            PlayerEvent::LoopModeChanged(mode) => {
                self.line(&format!("Loop type: {}", mode.label()))?;
            }
            PlayerEvent::TrackEnded { reason, .. } => {
                if let Some(bar) = self.bar.take() {
                    match reason {
                        TrackEnd::Finished => bar.finish(),
                        _ => bar.abandon(),
                    }
                }
            }
            PlayerEvent::SessionFinished => self.line("Done")?,
            PlayerEvent::SessionQuit => {
                if let Some(bar) = self.bar.take() {
                    bar.abandon();
                }
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn new_bar(&self, total_secs: u64) -> ProgressBar {
        let target = if self.draw_bars {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        let bar = ProgressBar::with_draw_target(Some(total_secs), target);
        bar.set_style(style);
        bar.set_message(self.title.clone());
        bar
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        let out = &mut self.out;
        let mut write = || {
            write!(out, "{}\r\n", text)?;
            out.flush()
        };
        match &self.bar {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}
