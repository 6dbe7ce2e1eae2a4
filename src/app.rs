use crate::controller::Player;
use crate::device::{AudioDevice, NullDevice, RodioDevice};
use crate::registry;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const SEEK_STEP_PERCENT: u8 = 5;
const VOLUME_STEP_PERCENT: u8 = 5;

#[derive(Debug, Default)]
pub struct AppOptions {
    pub tracks_path: Option<PathBuf>,
    pub no_audio: bool,
}

pub fn run(options: AppOptions) -> Result<()> {
    let path = match options.tracks_path {
        Some(path) => path,
        None => registry::registry_path()?,
    };
    let entries = registry::load_registry(&path)?;
    let playlist = registry::build_playlist(entries);

    if playlist.is_empty() {
        // No playable track means no player at all, per the registry rules.
        println!("No playable tracks in {}", path.display());
        return Ok(());
    }

    let device: Box<dyn AudioDevice> = if options.no_audio {
        Box::new(NullDevice::new())
    } else {
        match RodioDevice::new() {
            Ok(device) => Box::new(device),
            Err(_) => Box::new(NullDevice::new()),
        }
    };
    let mut player = Player::new(playlist, device);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut selected = 0_usize;
    let mut last_tick = Instant::now();
    let mut playlist_rect = ratatui::prelude::Rect::default();

    let result: Result<()> = loop {
        player.poll();

        if player.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                playlist_rect = crate::ui::playlist_rect(frame.area());
                crate::ui::draw(frame, &player, selected);
            })?;
            player.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(&mut player, mouse, playlist_rect, &mut selected);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Down => {
                selected = (selected + 1).min(player.tracks().len() - 1);
                player.dirty = true;
            }
            KeyCode::Up => {
                selected = selected.saturating_sub(1);
                player.dirty = true;
            }
            KeyCode::Enter => player.select_index(selected),
            KeyCode::Char(' ') => player.toggle_play_pause(),
            KeyCode::Char('n') => player.next(),
            KeyCode::Char('b') => player.previous(),
            KeyCode::Char('s') => player.toggle_shuffle(),
            KeyCode::Char('r') => player.cycle_repeat(),
            KeyCode::Char('m') => player.toggle_mute(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let level = player.volume_percent().saturating_add(VOLUME_STEP_PERCENT);
                player.set_volume(level.min(100));
            }
            KeyCode::Char('-') => {
                let level = player.volume_percent().saturating_sub(VOLUME_STEP_PERCENT);
                player.set_volume(level);
            }
            KeyCode::Right => {
                let percent = player.seek_percent().saturating_add(SEEK_STEP_PERCENT).min(100);
                player.seek(f64::from(percent) / 100.0);
            }
            KeyCode::Left => {
                let percent = player.seek_percent().saturating_sub(SEEK_STEP_PERCENT);
                player.seek(f64::from(percent) / 100.0);
            }
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                if index < player.tracks().len() {
                    selected = index;
                    player.select_index(index);
                }
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn handle_mouse(
    player: &mut Player,
    mouse: MouseEvent,
    playlist_rect: ratatui::prelude::Rect,
    selected: &mut usize,
) {
    if mouse.kind != MouseEventKind::Down(crossterm::event::MouseButton::Left) {
        return;
    }
    if !point_in_rect(mouse.column, mouse.row, playlist_rect) {
        return;
    }

    // First playlist row sits one line below the panel border.
    let row = usize::from(mouse.row.saturating_sub(playlist_rect.y.saturating_add(1)));
    if row < player.tracks().len() {
        *selected = row;
        player.select_index(row);
    }
}

fn point_in_rect(x: u16, y: u16, rect: ratatui::prelude::Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}
