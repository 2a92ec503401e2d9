// Getting songs into managed storage: move a local file or download a URL

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::Song;
use crate::audio::AudioFormat;
use crate::config::DownloaderConfig;
use crate::error::{LibraryError, LibraryResult};

/// True for locations the downloader should fetch instead of the filesystem
pub fn is_remote(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

pub struct Ingest {
    library_dir: PathBuf,
    downloader: DownloaderConfig,
}

impl Ingest {
    pub fn new(library_dir: PathBuf, downloader: DownloaderConfig) -> Self {
        Self {
            library_dir,
            downloader,
        }
    }

    /// Bring `location` into the library directory and describe it as a `Song`
    pub async fn add(&self, name: &str, location: &str) -> LibraryResult<Song> {
        fs::create_dir_all(&self.library_dir)?;

        let path = if is_remote(location) {
            self.download(name, location).await?
        } else {
            self.move_local(Path::new(location))?
        };

        Ok(Song::new(path.to_string_lossy(), name))
    }

    /// Where a downloaded song ends up: spaces become underscores
    pub fn download_target(&self, name: &str) -> PathBuf {
        let file_stem: String = name
            .chars()
            .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.library_dir
            .join(format!("{}.{}", file_stem, self.downloader.audio_format))
    }

    pub fn downloader_args(&self, url: &str, target: &Path) -> Vec<String> {
        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.downloader.audio_format.clone(),
            url.to_string(),
            "-o".to_string(),
            target.to_string_lossy().into_owned(),
        ]
    }

    async fn download(&self, name: &str, url: &str) -> LibraryResult<PathBuf> {
        let target = self.download_target(name);
        let program = self.downloader.program.clone();
        info!("Downloading {} with {} -> {}", url, program, target.display());

        let output = Command::new(&program)
            .args(self.downloader_args(url, &target))
            .output()
            .await
            .map_err(|e| LibraryError::Download {
                program: program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LibraryError::Download {
                program,
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        Ok(target)
    }

    fn move_local(&self, source: &Path) -> LibraryResult<PathBuf> {
        if !AudioFormat::from_path(source).is_supported() {
            return Err(LibraryError::UnsupportedFormat(source.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| LibraryError::UnsupportedFormat(source.to_path_buf()))?;
        let target = self.library_dir.join(file_name);
        debug!("Moving {} -> {}", source.display(), target.display());

        move_file(source, &target, |from, to| fs::rename(from, to))?;

        Ok(fs::canonicalize(&target)?)
    }
}

/// Rename `source` to `target`; when that fails (e.g. another filesystem) copy and remove
fn move_file(
    source: &Path,
    target: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> io::Result<()> {
    if let Err(e) = rename(source, target) {
        warn!("rename failed ({}), falling back to copy", e);
        fs::copy(source, target)?;
        fs::remove_file(source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ingest(library_dir: PathBuf) -> Ingest {
        Ingest::new(library_dir, DownloaderConfig::default())
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://example.com/watch?v=1"));
        assert!(is_remote("http://example.com/song.mp3"));
        assert!(!is_remote("/home/me/Music/song.mp3"));
        assert!(!is_remote("song_https.mp3"));
    }

    #[test]
    fn test_download_target_and_args() {
        let ingest = ingest(PathBuf::from("/lib"));
        let target = ingest.download_target("My Fav Song");
        assert_eq!(target, PathBuf::from("/lib/My_Fav_Song.mp3"));

        assert_eq!(
            ingest.downloader_args("https://x.test/v", &target),
            vec![
                "--extract-audio",
                "--audio-format",
                "mp3",
                "https://x.test/v",
                "-o",
                "/lib/My_Fav_Song.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn test_local_file_is_moved_into_library() {
        let outside = tempdir().unwrap();
        let library_dir = tempdir().unwrap();
        let source = outside.path().join("tune.mp3");
        fs::write(&source, b"not really audio").unwrap();

        let song = ingest(library_dir.path().join("library"))
            .add("Tune", source.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(song.display_name, "Tune");
        assert!(!source.exists());
        assert!(Path::new(&song.path).exists());
        assert!(song.path.ends_with("tune.mp3"));
    }

    #[test]
    fn test_move_falls_back_to_copy_when_rename_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("tune.mp3");
        let target = dir.path().join("moved.mp3");
        fs::write(&source, b"ID3 bytes").unwrap();

        move_file(&source, &target, |_, _| {
            Err(io::Error::other("different filesystem"))
        })
        .unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"ID3 bytes");
    }

    #[test]
    fn test_failed_copy_keeps_the_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("tune.mp3");
        let target = dir.path().join("no_such_dir").join("moved.mp3");
        fs::write(&source, b"ID3 bytes").unwrap();

        let err = move_file(&source, &target, |_, _| {
            Err(io::Error::other("different filesystem"))
        });

        assert!(err.is_err());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_rejects_non_audio_files() {
        let outside = tempdir().unwrap();
        let source = outside.path().join("notes.txt");
        fs::write(&source, b"hello").unwrap();

        let err = ingest(outside.path().join("library"))
            .add("Notes", source.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::UnsupportedFormat(_)));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("ghost.mp3");

        let err = ingest(dir.path().join("library"))
            .add("Ghost", missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Io(_)));
    }

    #[tokio::test]
    async fn test_missing_downloader_is_reported() {
        let dir = tempdir().unwrap();
        let ingest = Ingest::new(
            dir.path().to_path_buf(),
            DownloaderConfig {
                program: "tapedeck-no-such-downloader".to_string(),
                audio_format: "mp3".to_string(),
            },
        );

        let err = ingest.add("Song", "https://x.test/v").await.unwrap_err();
        assert!(matches!(err, LibraryError::Download { .. }));
    }
}
