// CLI command handlers: list, add, rename, delete, play
// Each one loads the library, does its thing, and saves if anything changed

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::config::Config;
use crate::error::LibraryError;
use crate::library::{Ingest, Library};

fn open_library(config: &Config) -> Result<Library> {
    let path = config.library_file();
    Library::load_or_create(&path)
        .with_context(|| format!("Couldn't open library {}", path.display()))
}

fn save_library(config: &Config, library: &Library) -> Result<()> {
    let path = config.library_file();
    library
        .save(&path)
        .with_context(|| format!("Couldn't save library {}", path.display()))
}

pub fn list(config: &Config, out: &mut impl Write) -> Result<()> {
    let library = open_library(config)?;
    for song in &library.songs {
        writeln!(out, "\t-{}", song.display_name)?;
    }
    Ok(())
}

pub async fn add(config: &Config, name: &str, location: &str, out: &mut impl Write) -> Result<()> {
    let mut library = open_library(config)?;

    let ingest = Ingest::new(config.library_dir.clone(), config.downloader.clone());
    let song = ingest
        .add(name, location)
        .await
        .with_context(|| format!("Couldn't add '{}' from {}", name, location))?;

    let path = song.path.clone();
    library.add(song);
    save_library(config, &library)?;

    writeln!(out, "Added `{}` to library at file: {}", name, path)?;
    Ok(())
}

pub fn rename(
    config: &Config,
    name: &str,
    to: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut library = open_library(config)?;
    if !library.contains(name) {
        return Err(LibraryError::SongNotFound(name.to_string()).into());
    }

    let question = format!("Are you sure you want to rename `{}` to `{}`?", name, to);
    if !ask_for_permission(&question, input, out)? {
        writeln!(out, "Cancelled operation")?;
        return Ok(());
    }

    library.rename(name, to)?;
    save_library(config, &library)
}

pub fn delete(
    config: &Config,
    name: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut library = open_library(config)?;
    if !library.contains(name) {
        return Err(LibraryError::SongNotFound(name.to_string()).into());
    }

    let question = format!("Are you sure you want to delete `{}` ?", name);
    if !ask_for_permission(&question, input, out)? {
        writeln!(out, "Cancelled operation")?;
        return Ok(());
    }

    library.delete(name)?;
    save_library(config, &library)
}

/// Print `message` and read one line; anything starting with y/Y is a yes
pub fn ask_for_permission(
    message: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool> {
    writeln!(out, "{}", message)?;
    out.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Couldn't read an answer")?;

    Ok(answer
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y')))
}

#[cfg(feature = "audio")]
pub async fn play(config: &Config) -> Result<()> {
    use crate::audio::RodioBackend;
    use crate::playback::{play_library, EventSender, TerminalInput, TerminalRenderer};
    use tokio::sync::mpsc;
    use tracing::info;

    let library = open_library(config)?;
    let backend = RodioBackend::new().context("Couldn't open the audio output")?;

    let (events, rx) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(TerminalRenderer::stdout(config.playback.show_controls).run(rx));

    let outcome = play_library(
        &library.songs,
        backend,
        TerminalInput,
        config.playback.loop_mode,
        EventSender::new(events),
    )
    .await;

    // The controller's sender is gone, so the renderer drains and exits
    renderer
        .await
        .context("Renderer task failed")?
        .context("Couldn't write to the terminal")?;

    let outcome = outcome.context("Playback stopped")?;
    info!("Play session ended: {:?}", outcome);
    Ok(())
}

#[cfg(not(feature = "audio"))]
pub async fn play(_config: &Config) -> Result<()> {
    anyhow::bail!("This build has no audio output (enable the `audio` feature)")
}
