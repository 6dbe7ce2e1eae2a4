use anyhow::{Context, Result};
use rodio::Source;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// The one audio output handle. The playback controller is the only owner;
/// nothing else in the app touches source, transport, volume, or mute.
pub trait AudioDevice {
    /// Replaces the loaded source and starts playback from zero. An error
    /// leaves the device with no loaded source.
    fn play(&mut self, source: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// Periodic poll from the event loop; drives native looping.
    fn tick(&mut self);
    fn is_paused(&self) -> bool;
    fn current_source(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    /// Native repeat-one flag: when set, end-of-track restarts the same
    /// source instead of reporting finished.
    fn set_looping(&mut self, looping: bool);
    fn is_finished(&self) -> bool;
}

pub struct RodioDevice {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    volume: f32,
    muted: bool,
    looping: bool,
}

impl RodioDevice {
    pub fn new() -> Result<Self> {
        let (stream, sink) = Self::open_output_stream()?;
        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
            volume: 1.0,
            muted: false,
            looping: false,
        })
    }

    fn open_output_stream() -> Result<(OutputStream, Sink)> {
        let mut stream = OutputStreamBuilder::from_default_device()
            .context("failed to open default system output stream")?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .context("failed to start output stream")?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok((stream, sink))
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }
}

impl AudioDevice for RodioDevice {
    fn play(&mut self, source: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.current = None;
        self.track_duration = None;

        let file = File::open(source)
            .with_context(|| format!("failed to open track {}", source.display()))?;
        let decoded = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", source.display()))?;
        self.track_duration = decoded.total_duration();
        self.sink.append(decoded);
        self.sink.set_volume(self.effective_volume());
        self.current = Some(source.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
    }

    fn tick(&mut self) {
        if !self.looping || self.sink.is_paused() || !self.sink.empty() {
            return;
        }
        if let Some(source) = self.current.clone() {
            let _ = self.play(&source);
        }
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_source(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))?;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.effective_volume());
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_volume(self.effective_volume());
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_finished(&self) -> bool {
        // A looping device never reports finished; tick() restarts it.
        !self.looping && self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

/// Wall-clock simulated playback for headless runs and tests.
pub struct NullDevice {
    paused: bool,
    current: Option<PathBuf>,
    volume: f32,
    muted: bool,
    looping: bool,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

impl NullDevice {
    pub fn new() -> Self {
        Self {
            paused: false,
            current: None,
            volume: 1.0,
            muted: false,
            looping: false,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    fn estimate_duration(source: &Path) -> Option<Duration> {
        let file = File::open(source).ok()?;
        let decoded = Decoder::try_from(file).ok()?;
        decoded
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }

    fn at_end(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for NullDevice {
    fn play(&mut self, source: &Path) -> Result<()> {
        self.paused = false;
        self.current = Some(source.to_path_buf());
        self.started_at = Some(Instant::now());
        self.position_offset = Duration::ZERO;
        self.track_duration = Self::estimate_duration(source);
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn resume(&mut self) {
        if self.current.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = false;
    }

    fn stop(&mut self) {
        self.current = None;
        self.paused = false;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = None;
    }

    fn tick(&mut self) {
        if self.looping && self.at_end() {
            self.position_offset = Duration::ZERO;
            self.started_at = Some(Instant::now());
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_source(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.at_end()
    }
}
