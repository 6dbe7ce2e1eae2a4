use crate::device::AudioDevice;
use crate::model::{RepeatMode, Track};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use std::time::Duration;

/// Volume restored when unmuting while the level sits at zero.
const UNMUTE_FALLBACK_VOLUME: f32 = 0.5;

/// The playback controller: one audio device, one immutable playlist, and
/// the mode flags. Every user intent and device notification goes through
/// here; the device itself is never handed out.
pub struct Player {
    playlist: Vec<Track>,
    device: Box<dyn AudioDevice>,
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    ended: bool,
    pub status: String,
    pub dirty: bool,
    rng: SmallRng,
}

/// Everything the rendering surface needs, recomputed after each intent
/// and on every timer tick. The device is the source of truth for the
/// playing flag and the time values.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub playing: bool,
    pub current: Option<usize>,
    pub title: String,
    pub subtitle: String,
    pub cover: Option<PathBuf>,
    pub elapsed_label: String,
    pub duration_label: String,
    pub seek_percent: u8,
    pub volume_percent: u8,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub ended: bool,
}

impl DisplayState {
    /// Per-track trigger glyph: only the active track ever shows the pause
    /// glyph, every other row keeps the idle play glyph.
    pub fn track_glyph(&self, index: usize) -> &'static str {
        if self.current == Some(index) && self.playing {
            "⏸"
        } else {
            "▶"
        }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.current == Some(index)
    }
}

impl Player {
    pub fn new(playlist: Vec<Track>, device: Box<dyn AudioDevice>) -> Self {
        Self {
            playlist,
            device,
            current: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            ended: false,
            status: String::from("Ready"),
            dirty: true,
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn is_playing(&self) -> bool {
        self.device.current_source().is_some() && !self.device.is_paused()
    }

    /// Underlying volume as 0..=100, regardless of mute. The display value
    /// in the snapshot is pinned to 0 while muted.
    pub fn volume_percent(&self) -> u8 {
        (self.device.volume() * 100.0).round() as u8
    }

    /// Periodic poll from the event loop: advances native looping and
    /// auto-advances when the device reports end-of-track.
    pub fn poll(&mut self) {
        self.device.tick();
        if self.device.is_finished() {
            self.on_track_ended();
        }
    }

    /// Trigger-button intent. Selecting the loaded track toggles play and
    /// pause; anything else loads that track and starts it. An unknown id
    /// is a no-op.
    pub fn select_track(&mut self, id: &str) {
        let Some(index) = self.playlist.iter().position(|track| track.id == id) else {
            return;
        };
        if self.current == Some(index) {
            self.toggle_play_pause();
        } else {
            self.load_and_play(index);
        }
    }

    pub fn select_index(&mut self, index: usize) {
        let Some(id) = self.playlist.get(index).map(|track| track.id.clone()) else {
            return;
        };
        self.select_track(&id);
    }

    pub fn toggle_play_pause(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let Some(current) = self.current else {
            self.load_and_play(0);
            return;
        };

        if self.device.current_source().is_none() {
            // Start was rejected or playback already stopped; reload.
            self.load_and_play(current);
        } else if self.device.is_paused() {
            self.device.resume();
            self.set_status("Resumed");
        } else {
            self.device.pause();
            self.set_status("Paused");
        }
    }

    pub fn next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        if let Some(index) = self.next_index(true) {
            self.load_and_play(index);
        }
    }

    pub fn previous(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        if let Some(index) = self.next_index(false) {
            self.load_and_play(index);
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.set_status(if self.shuffle {
            "Shuffle on"
        } else {
            "Shuffle off"
        });
    }

    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.next();
        self.device.set_looping(self.repeat == RepeatMode::One);
        self.set_status(self.repeat.label());
    }

    /// Device notification: the loaded track played to its end.
    pub fn on_track_ended(&mut self) {
        let Some(current) = self.current else {
            return;
        };

        if self.repeat == RepeatMode::One {
            self.load_and_play(current);
            return;
        }

        match self.next_index(true) {
            Some(index) => self.load_and_play(index),
            None => {
                self.device.stop();
                self.ended = true;
                self.set_status("Playlist ended");
            }
        }
    }

    /// Moves playback to `fraction` of the track duration. Unknown
    /// duration makes this a no-op.
    pub fn seek(&mut self, fraction: f64) {
        let Some(duration) = self.device.duration() else {
            return;
        };
        let target = duration.mul_f64(fraction.clamp(0.0, 1.0));
        let _ = self.device.seek_to(target);
        self.dirty = true;
    }

    pub fn seek_percent(&self) -> u8 {
        let Some(duration) = self.device.duration() else {
            return 0;
        };
        let total = duration.as_secs_f64();
        if total <= 0.0 {
            return 0;
        }
        let elapsed = self
            .device
            .position()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        ((elapsed / total) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn set_volume(&mut self, level: u8) {
        let volume = f32::from(level.min(100)) / 100.0;
        self.device.set_volume(volume);
        if volume > 0.0 {
            self.device.set_muted(false);
        }
        self.set_status("Volume changed");
    }

    pub fn toggle_mute(&mut self) {
        if self.device.muted() {
            self.device.set_muted(false);
            if self.device.volume() <= 0.0 {
                self.device.set_volume(UNMUTE_FALLBACK_VOLUME);
            }
            self.set_status("Unmuted");
        } else {
            self.device.set_muted(true);
            self.set_status("Muted");
        }
    }

    pub fn snapshot(&self) -> DisplayState {
        let track = self.current.and_then(|index| self.playlist.get(index));
        let elapsed = self
            .device
            .position()
            .map_or(0.0, |position| position.as_secs_f64());
        let total = self
            .device
            .duration()
            .map_or(f64::NAN, |duration| duration.as_secs_f64());

        DisplayState {
            playing: self.is_playing(),
            current: self.current,
            title: track.map_or_else(String::new, |track| track.title.clone()),
            subtitle: track.map_or_else(String::new, Track::subtitle),
            cover: track.and_then(|track| track.cover.clone()),
            elapsed_label: format_time(elapsed),
            duration_label: format_time(total),
            seek_percent: self.seek_percent(),
            volume_percent: if self.device.muted() {
                0
            } else {
                self.volume_percent()
            },
            muted: self.device.muted(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            ended: self.ended,
        }
    }

    /// Loads a track and starts it. A rejected start (unreadable or
    /// undecodable source) is swallowed: the track stays current, state
    /// reads as paused.
    fn load_and_play(&mut self, index: usize) {
        let Some(track) = self.playlist.get(index) else {
            return;
        };
        let source = track.source.clone();
        let title = track.title.clone();
        self.current = Some(index);
        self.ended = false;
        match self.device.play(&source) {
            Ok(()) => self.set_status(&format!("Playing {title}")),
            Err(_) => self.set_status(&format!("Ready {title}")),
        }
    }

    /// Successor (or predecessor) index for manual navigation and
    /// auto-advance. Returns None when playback should stop.
    fn next_index(&mut self, forward: bool) -> Option<usize> {
        let len = self.playlist.len();
        let Some(current) = self.current else {
            return (len > 0).then_some(0);
        };

        if self.shuffle {
            if len == 1 {
                return Some(current);
            }
            // Uniform pick over the other len-1 indices.
            let mut pick = self.rng.random_range(0..len - 1);
            if pick >= current {
                pick += 1;
            }
            return Some(pick);
        }

        if forward {
            let next = current + 1;
            if next < len {
                Some(next)
            } else if self.repeat == RepeatMode::All {
                Some(0)
            } else {
                None
            }
        } else if current > 0 {
            Some(current - 1)
        } else if self.repeat == RepeatMode::All {
            Some(len - 1)
        } else {
            None
        }
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

/// Formats a second count as `minutes:seconds` with zero-padded seconds.
/// Non-finite input (metadata not loaded yet) renders as "0:00".
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return String::from("0:00");
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use proptest::prop_assert;
    use std::path::Path;

    #[derive(Default)]
    struct MockDevice {
        current: Option<PathBuf>,
        paused: bool,
        volume: f32,
        muted: bool,
        looping: bool,
        position: Duration,
        duration: Option<Duration>,
        fail_play: bool,
    }

    impl MockDevice {
        fn new() -> Self {
            Self {
                volume: 1.0,
                ..Self::default()
            }
        }
    }

    impl AudioDevice for MockDevice {
        fn play(&mut self, source: &Path) -> Result<()> {
            if self.fail_play {
                self.current = None;
                anyhow::bail!("start rejected");
            }
            self.current = Some(source.to_path_buf());
            self.paused = false;
            self.position = Duration::ZERO;
            Ok(())
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn stop(&mut self) {
            self.current = None;
            self.paused = false;
            self.position = Duration::ZERO;
            self.duration = None;
        }

        fn tick(&mut self) {}

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn current_source(&self) -> Option<&Path> {
            self.current.as_deref()
        }

        fn position(&self) -> Option<Duration> {
            self.current.as_ref()?;
            Some(self.position)
        }

        fn duration(&self) -> Option<Duration> {
            self.duration
        }

        fn seek_to(&mut self, position: Duration) -> Result<()> {
            if self.current.is_none() {
                anyhow::bail!("no active track");
            }
            self.position = position;
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
            false
        }
    }

    fn playlist(n: usize) -> Vec<Track> {
        (0..n)
            .map(|index| Track {
                id: format!("track-{index}"),
                title: format!("Track {index}"),
                composer: None,
                performer: None,
                source: PathBuf::from(format!("track_{index}.mp3")),
                cover: None,
                index,
            })
            .collect()
    }

    fn player(n: usize) -> Player {
        Player::new(playlist(n), Box::new(MockDevice::new()))
    }

    #[test]
    fn next_at_last_index_without_repeat_is_a_no_op() {
        let mut player = player(3);
        player.select_index(2);
        player.next();
        assert_eq!(player.current_index(), Some(2));
        assert!(player.is_playing(), "manual next never stops playback");
    }

    #[test]
    fn previous_at_first_index_without_repeat_is_a_no_op() {
        let mut player = player(3);
        player.select_index(0);
        player.previous();
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn repeat_all_wraps_both_directions() {
        let mut player = player(3);
        player.cycle_repeat();
        assert_eq!(player.repeat(), RepeatMode::All);

        player.select_index(2);
        player.next();
        assert_eq!(player.current_index(), Some(0));

        player.previous();
        assert_eq!(player.current_index(), Some(2));
    }

    #[test]
    fn repeat_one_restarts_same_track_on_ended() {
        let mut player = player(3);
        player.cycle_repeat();
        player.cycle_repeat();
        assert_eq!(player.repeat(), RepeatMode::One);

        player.select_index(1);
        player.on_track_ended();
        assert_eq!(player.current_index(), Some(1));
        assert!(player.is_playing());
        assert_eq!(player.snapshot().elapsed_label, "0:00");
    }

    #[test]
    fn shuffle_never_returns_current_for_longer_playlists() {
        let mut player = player(5);
        player.select_index(2);
        player.toggle_shuffle();

        for _ in 0..200 {
            let next = player.next_index(true).expect("shuffle always advances");
            assert_ne!(next, 2);
            assert!(next < 5);
        }
    }

    #[test]
    fn shuffle_repeats_the_only_track_of_a_singleton_playlist() {
        let mut player = player(1);
        player.select_index(0);
        player.toggle_shuffle();
        assert_eq!(player.next_index(true), Some(0));
    }

    #[test]
    fn selecting_same_track_toggles_play_pause() {
        let mut player = player(3);
        player.select_track("track-1");
        assert!(player.is_playing());

        player.select_track("track-1");
        assert!(!player.is_playing(), "second select pauses");
        assert_eq!(player.current_index(), Some(1));

        player.select_track("track-1");
        assert!(player.is_playing(), "third select resumes");
    }

    #[test]
    fn selecting_other_track_loads_and_plays_it() {
        let mut player = player(3);
        player.select_track("track-0");
        player.select_track("track-2");
        assert_eq!(player.current_index(), Some(2));
        assert!(player.is_playing());
    }

    #[test]
    fn unknown_track_id_is_a_no_op() {
        let mut player = player(3);
        player.select_track("no-such-id");
        assert_eq!(player.current_index(), None);
        assert!(!player.is_playing());
    }

    #[test]
    fn toggle_with_nothing_loaded_starts_track_zero() {
        let mut player = player(3);
        player.toggle_play_pause();
        assert_eq!(player.current_index(), Some(0));
        assert!(player.is_playing());
    }

    #[test]
    fn toggle_on_empty_playlist_does_nothing() {
        let mut player = player(0);
        player.toggle_play_pause();
        player.next();
        player.previous();
        assert_eq!(player.current_index(), None);
    }

    #[test]
    fn rejected_start_leaves_track_loaded_but_paused() {
        let mut player = Player::new(
            playlist(2),
            Box::new(MockDevice {
                fail_play: true,
                volume: 1.0,
                ..MockDevice::default()
            }),
        );
        player.select_track("track-0");
        assert_eq!(player.current_index(), Some(0));
        assert!(!player.is_playing());
    }

    #[test]
    fn sequential_walk_ends_in_no_op() {
        let mut player = player(3);
        player.select_index(0);
        player.next();
        assert_eq!(player.current_index(), Some(1));
        player.next();
        assert_eq!(player.current_index(), Some(2));
        player.next();
        assert_eq!(player.current_index(), Some(2));
        assert!(player.is_playing(), "manual next at the end keeps playing");
    }

    #[test]
    fn ended_without_repeat_stops_at_last_track() {
        let mut player = player(2);
        player.select_index(1);
        player.on_track_ended();
        assert_eq!(player.current_index(), Some(1));
        assert!(!player.is_playing());
        assert!(player.snapshot().ended);
    }

    #[test]
    fn ended_with_repeat_all_replays_singleton_playlist() {
        let mut player = player(1);
        player.cycle_repeat();
        player.select_index(0);
        player.on_track_ended();
        assert_eq!(player.current_index(), Some(0));
        assert!(player.is_playing());
    }

    #[test]
    fn ended_advances_to_next_track() {
        let mut player = player(3);
        player.select_index(0);
        player.on_track_ended();
        assert_eq!(player.current_index(), Some(1));
        assert!(player.is_playing());
    }

    #[test]
    fn time_formatting_matches_display_rules() {
        assert_eq!(format_time(125.7), "2:05");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn unmuting_at_zero_volume_restores_half_level() {
        let mut player = player(2);
        player.set_volume(0);
        player.toggle_mute();
        assert!(player.snapshot().muted);
        assert_eq!(player.snapshot().volume_percent, 0);

        player.toggle_mute();
        let snapshot = player.snapshot();
        assert!(!snapshot.muted);
        assert_eq!(snapshot.volume_percent, 50);
    }

    #[test]
    fn muting_pins_displayed_volume_without_losing_level() {
        let mut player = player(2);
        player.set_volume(80);
        player.toggle_mute();

        let snapshot = player.snapshot();
        assert!(snapshot.muted);
        assert_eq!(snapshot.volume_percent, 0, "display pinned to zero");
        assert_eq!(player.volume_percent(), 80, "underlying level untouched");

        player.toggle_mute();
        assert_eq!(player.snapshot().volume_percent, 80);
    }

    #[test]
    fn setting_audible_volume_unmutes() {
        let mut player = player(2);
        player.toggle_mute();
        player.set_volume(40);
        let snapshot = player.snapshot();
        assert!(!snapshot.muted);
        assert_eq!(snapshot.volume_percent, 40);
    }

    #[test]
    fn seek_is_a_no_op_without_duration() {
        let mut player = player(2);
        player.select_index(0);
        player.seek(0.5);
        assert_eq!(player.seek_percent(), 0);
    }

    #[test]
    fn seek_moves_to_fraction_of_duration() {
        let mut device = MockDevice::new();
        device.duration = Some(Duration::from_secs(200));
        let mut player = Player::new(playlist(2), Box::new(device));
        player.select_index(0);
        player.seek(0.25);

        let snapshot = player.snapshot();
        assert_eq!(snapshot.seek_percent, 25);
        assert_eq!(snapshot.elapsed_label, "0:50");
        assert_eq!(snapshot.duration_label, "3:20");
    }

    #[test]
    fn snapshot_marks_only_current_track_active() {
        let mut player = player(3);
        player.select_index(1);
        let snapshot = player.snapshot();

        assert!(snapshot.is_active(1));
        assert!(!snapshot.is_active(0));
        assert_eq!(snapshot.track_glyph(1), "⏸");
        assert_eq!(snapshot.track_glyph(0), "▶");
        assert_eq!(snapshot.track_glyph(2), "▶");

        player.toggle_play_pause();
        assert_eq!(player.snapshot().track_glyph(1), "▶");
    }

    #[test]
    fn toggle_shuffle_does_not_move_current() {
        let mut player = player(4);
        player.select_index(2);
        player.toggle_shuffle();
        assert_eq!(player.current_index(), Some(2));
        player.toggle_shuffle();
        assert_eq!(player.current_index(), Some(2));
    }

    proptest::proptest! {
        #[test]
        fn next_index_stays_in_bounds(len in 1usize..40, start in 0usize..40, forward: bool) {
            let mut player = player(len);
            player.select_index(start.min(len - 1));

            for mode in 0..3 {
                if mode > 0 {
                    player.cycle_repeat();
                }
                for shuffle in [false, true] {
                    if player.shuffle() != shuffle {
                        player.toggle_shuffle();
                    }
                    if let Some(next) = player.next_index(forward) {
                        prop_assert!(next < len);
                    }
                }
            }
        }

        #[test]
        fn invariants_hold_under_random_intents(ops in proptest::collection::vec(0u8..10, 1..200)) {
            let mut player = player(5);

            for op in ops {
                match op {
                    0 => player.toggle_play_pause(),
                    1 => player.next(),
                    2 => player.previous(),
                    3 => player.toggle_shuffle(),
                    4 => player.cycle_repeat(),
                    5 => player.on_track_ended(),
                    6 => player.seek(0.5),
                    7 => player.set_volume(30),
                    8 => player.toggle_mute(),
                    _ => player.select_index(usize::from(op) % 5),
                }

                if let Some(index) = player.current_index() {
                    prop_assert!(index < 5);
                }
                let snapshot = player.snapshot();
                prop_assert!(snapshot.seek_percent <= 100);
                prop_assert!(snapshot.volume_percent <= 100);
                if snapshot.muted {
                    prop_assert!(snapshot.volume_percent == 0);
                }
            }
        }
    }
}
