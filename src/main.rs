// tapedeck - manage a small music library and play it from the terminal

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use tapedeck::{commands, Config};

#[derive(Parser)]
#[command(name = "tapedeck")]
#[command(about = "A terminal music library manager and player")]
struct Args {
    /// Enable developer logging (stderr + file)
    #[arg(long, global = true)]
    dev: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the songs in the library
    List,
    /// Add a song from a local file or a URL
    Add {
        #[arg(long)]
        name: String,
        /// File path, or an http(s) URL for the downloader
        #[arg(long)]
        location: String,
    },
    /// Rename a song
    Rename {
        #[arg(long)]
        name: String,
        #[arg(long)]
        to: String,
    },
    /// Remove a song from the library (the file stays on disk)
    Delete {
        #[arg(long)]
        name: String,
    },
    /// Shuffle the library and play it, with keyboard controls
    Play,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "tapedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tapedeck=debug"));

    let builder = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter);

    // Never stdout: the player owns it while the terminal is raw
    if dev {
        builder
            .with_writer(file_writer.and(io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        eprintln!("Dev mode: logging to stderr + {}", log_dir.display());
    } else {
        builder
            .with_writer(file_writer)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    // Held until exit so buffered log lines get flushed
    let _guard = init_logging(&config.log_dir, args.dev)?;
    info!("tapedeck starting");

    let stdin = io::stdin();
    let stdout = io::stdout();

    match args.command {
        Cmd::List => commands::list(&config, &mut stdout.lock())?,
        Cmd::Add { name, location } => {
            commands::add(&config, &name, &location, &mut stdout.lock()).await?
        }
        Cmd::Rename { name, to } => {
            commands::rename(&config, &name, &to, &mut stdin.lock(), &mut stdout.lock())?
        }
        Cmd::Delete { name } => {
            commands::delete(&config, &name, &mut stdin.lock(), &mut stdout.lock())?
        }
        Cmd::Play => commands::play(&config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from(["tapedeck", "--dev", "add", "--name", "A Song", "--location", "a.mp3"]).unwrap();
        assert!(args.dev);
        assert!(matches!(
            args.command,
            Cmd::Add { ref name, ref location } if name == "A Song" && location == "a.mp3"
        ));

        let args = Args::try_parse_from(["tapedeck", "rename", "--name", "A", "--to", "B", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_cli_requires_arguments() {
        assert!(Args::try_parse_from(["tapedeck", "add", "--name", "A"]).is_err());
        assert!(Args::try_parse_from(["tapedeck", "delete"]).is_err());
        assert!(Args::try_parse_from(["tapedeck"]).is_err());
    }
}
