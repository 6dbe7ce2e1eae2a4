#![no_main]

use jukebox::controller::Player;
use jukebox::device::NullDevice;
use jukebox::model::Track;
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;

fuzz_target!(|data: &[u8]| {
    let len = (data.len() % 16).max(1);
    let playlist = (0..len)
        .map(|index| Track {
            id: format!("track-{index}"),
            title: format!("Track {index}"),
            composer: None,
            performer: None,
            source: PathBuf::from(format!("track_{index}.mp3")),
            cover: None,
            index,
        })
        .collect();
    let mut player = Player::new(playlist, Box::new(NullDevice::new()));

    for byte in data {
        match byte % 10 {
            0 => player.toggle_play_pause(),
            1 => player.next(),
            2 => player.previous(),
            3 => player.toggle_shuffle(),
            4 => player.cycle_repeat(),
            5 => player.on_track_ended(),
            6 => player.seek(f64::from(*byte) / 255.0),
            7 => player.set_volume(*byte % 101),
            8 => player.toggle_mute(),
            _ => player.select_index(usize::from(*byte) % len),
        }

        if let Some(index) = player.current_index() {
            assert!(index < len);
        }
    }
});
