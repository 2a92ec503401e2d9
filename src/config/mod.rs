// Configuration management for tapedeck
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::playback::LoopMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where added songs are moved or downloaded to
    pub library_dir: PathBuf,
    /// The JSON song list; `<library_dir>/library.json` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_file: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub downloader: DownloaderConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub program: String,
    pub audio_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub loop_mode: LoopMode,
    pub show_controls: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = data_dir()
            .map(|dir| dir.join("tapedeck"))
            .unwrap_or_else(|| PathBuf::from("."));
        let library_dir = data_dir.join("library");

        Self {
            library_dir,
            library_file: None,
            log_dir: data_dir.join("logs"),
            downloader: DownloaderConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::Off,
            show_controls: true,
        }
    }
}

impl Config {
    /// Where the song list lives, following `library_dir` unless set explicitly
    pub fn library_file(&self) -> PathBuf {
        self.library_file
            .clone()
            .unwrap_or_else(|| self.library_dir.join("library.json"))
    }

    /// Load from `path` (or the default location), writing defaults on first run
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tapedeck");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.downloader.program, "yt-dlp");
        assert_eq!(config.downloader.audio_format, "mp3");
        assert_eq!(config.playback.loop_mode, LoopMode::Off);
        assert!(config.playback.show_controls);
        assert_eq!(config.library_file(), config.library_dir.join("library.json"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            library_dir = "/music/managed"

            [playback]
            loop_mode = "library"
            "#,
        )
        .unwrap();

        assert_eq!(config.library_dir, PathBuf::from("/music/managed"));
        assert_eq!(config.library_file(), PathBuf::from("/music/managed/library.json"));
        assert_eq!(config.playback.loop_mode, LoopMode::Library);
        assert!(config.playback.show_controls);
        assert_eq!(config.downloader.program, "yt-dlp");
    }

    #[test]
    fn test_explicit_library_file_wins() {
        let config: Config = toml::from_str(
            r#"
            library_dir = "/music/managed"
            library_file = "/elsewhere/songs.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.library_file(), PathBuf::from("/elsewhere/songs.json"));
    }

    #[test]
    fn test_load_writes_defaults_on_first_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.library_file(), config.library_file());
        assert_eq!(reloaded.playback.loop_mode, config.playback.loop_mode);
    }
}
