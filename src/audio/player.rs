// rodio backend - the real decoder and output device behind AudioBackend
// One output stream for the session, one sink per track

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AudioBackend, TrackOutput};
use crate::error::{PlayError, PlayResult};

/// rodio-backed output: one default output stream, one sink per track
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    pub fn new() -> PlayResult<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlayError::Output(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn open(&mut self, path: &Path) -> PlayResult<Box<dyn TrackOutput>> {
        let source = open_decoder(path)?;

        let duration = match source.total_duration() {
            Some(duration) => duration,
            None => {
                // No length up front: decode the whole file once to count samples
                debug!("No duration header for {}, counting samples (slow)", path.display());
                count_duration(path)?
            }
        };

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| PlayError::Output(e.to_string()))?;
        sink.append(source);

        Ok(Box::new(RodioTrack {
            sink: Some(sink),
            duration,
        }))
    }
}

struct RodioTrack {
    sink: Option<Sink>,
    duration: Duration,
}

impl TrackOutput for RodioTrack {
    fn total_duration(&self) -> Duration {
        self.duration
    }

    fn set_paused(&self, paused: bool) {
        if let Some(sink) = &self.sink {
            if paused {
                sink.pause();
            } else {
                sink.play();
            }
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

fn open_decoder(path: &Path) -> PlayResult<Decoder<BufReader<File>>> {
    let file = File::open(path).map_err(|source| PlayError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| PlayError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn count_duration(path: &Path) -> PlayResult<Duration> {
    let decoder = open_decoder(path)?;
    let per_second = decoder.sample_rate() as u64 * decoder.channels() as u64;
    if per_second == 0 {
        warn!("{} reports no samples per second", path.display());
        return Err(PlayError::Decode {
            path: path.to_path_buf(),
            reason: "stream has no sample rate".to_string(),
        });
    }

    let samples = decoder.count() as u64;
    Ok(Duration::from_secs_f64(samples as f64 / per_second as f64))
}
