use crate::controller::{DisplayState, Player};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE: &str = "Jukebox v0.1.0  ";

const BG: Color = Color::Rgb(16, 12, 8);
const PANEL_BG: Color = Color::Rgb(31, 24, 16);
const PANEL_ALT_BG: Color = Color::Rgb(41, 32, 22);
const BORDER: Color = Color::Rgb(176, 121, 69);
const TEXT: Color = Color::Rgb(248, 234, 214);
const MUTED_TEXT: Color = Color::Rgb(204, 178, 149);
const ACCENT: Color = Color::Rgb(234, 174, 100);
const ALERT: Color = Color::Rgb(249, 138, 88);
const SELECTED_BG: Color = Color::Rgb(82, 55, 34);

pub fn playlist_rect(area: Rect) -> Rect {
    let vertical = layout_rows(area);
    let body = layout_body(vertical[1]);
    body[0]
}

pub fn draw(frame: &mut Frame, player: &Player, selected: usize) {
    let snapshot = player.snapshot();

    frame.render_widget(Block::default().style(Style::default().bg(BG)), frame.area());

    let vertical = layout_rows(frame.area());

    frame.render_widget(panel_block("Status"), vertical[0]);
    let header_inner = vertical[0].inner(Margin {
        vertical: 0,
        horizontal: 1,
    });
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", player.tracks().len()),
            Style::default().fg(TEXT),
        ),
        Span::styled("  |  ", Style::default().fg(MUTED_TEXT)),
        Span::styled(mode_line(&snapshot), Style::default().fg(ALERT)),
    ]));
    frame.render_widget(header, header_inner);

    let body = layout_body(vertical[1]);

    let items: Vec<ListItem> = player
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if snapshot.is_active(index) {
                "  > "
            } else {
                "    "
            };
            let style = if snapshot.is_active(index) {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(MUTED_TEXT)),
                Span::styled(format!("{} ", snapshot.track_glyph(index)), style),
                Span::styled(track.title.as_str(), style),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!player.tracks().is_empty()).then_some(selected));

    let list = List::new(items)
        .block(panel_block("Playlist"))
        .highlight_style(
            Style::default()
                .bg(SELECTED_BG)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, body[0], &mut state);

    frame.render_widget(now_playing_panel(&snapshot), body[1]);

    let timeline = Paragraph::new(Span::styled(
        timeline_line(&snapshot, 26, 14),
        Style::default().fg(TEXT),
    ))
    .block(panel_block("Timeline"))
    .wrap(Wrap { trim: true });
    frame.render_widget(timeline, vertical[2]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Enter play, Space pause, n next, b previous, s shuffle, r repeat, m mute, +/- volume, Left/Right seek, Ctrl+C quit",
            Style::default().fg(MUTED_TEXT),
        ),
        Span::styled("  |  ", Style::default().fg(MUTED_TEXT)),
        Span::styled(player.status.as_str(), Style::default().fg(TEXT)),
    ]))
    .block(panel_block("Message"));
    frame.render_widget(footer, vertical[3]);
}

fn layout_rows(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area)
}

fn layout_body(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area)
}

fn now_playing_panel(snapshot: &DisplayState) -> Paragraph<'static> {
    let title = if snapshot.title.is_empty() {
        String::from("-")
    } else {
        snapshot.title.clone()
    };
    let subtitle = if snapshot.subtitle.is_empty() {
        String::from("-")
    } else {
        snapshot.subtitle.clone()
    };
    let cover = snapshot
        .cover
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| String::from("-"));
    let state = if snapshot.ended {
        "Ended"
    } else if snapshot.playing {
        "Playing"
    } else {
        "Paused"
    };

    Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {title}"), Style::default().fg(TEXT)),
        ]),
        Line::from(Span::styled(
            format!("By      {subtitle}"),
            Style::default().fg(MUTED_TEXT),
        )),
        Line::from(Span::styled(
            format!("Cover   {cover}"),
            Style::default().fg(MUTED_TEXT),
        )),
        Line::from(Span::styled(
            format!("State   {state}"),
            Style::default().fg(ALERT),
        )),
        Line::from(""),
        Line::from(Span::styled(
            snapshot.repeat.label().to_string(),
            Style::default().fg(MUTED_TEXT),
        )),
        Line::from(Span::styled(
            if snapshot.shuffle {
                "Shuffle on"
            } else {
                "Shuffle off"
            },
            Style::default().fg(MUTED_TEXT),
        )),
    ])
    .block(alt_panel_block("Now Playing"))
    .wrap(Wrap { trim: true })
}

fn mode_line(snapshot: &DisplayState) -> String {
    let mut parts = vec![snapshot.repeat.label().to_string()];
    if snapshot.shuffle {
        parts.push(String::from("Shuffle"));
    }
    if snapshot.muted {
        parts.push(String::from("Muted"));
    }
    parts.join(" | ")
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(PANEL_BG))
}

fn alt_panel_block(title: &str) -> Block<'_> {
    panel_block(title).style(Style::default().bg(PANEL_ALT_BG))
}

fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width).div_ceil(100).min(width);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width - filled));
    bar.push(']');
    bar
}

fn timeline_line(snapshot: &DisplayState, seek_bar_width: usize, volume_bar_width: usize) -> String {
    let mute_marker = if snapshot.muted { "  [muted]" } else { "" };
    format!(
        "{} / {} {}  |  Vol {} {:>3}%{}",
        snapshot.elapsed_label,
        snapshot.duration_label,
        progress_bar(snapshot.seek_percent, seek_bar_width),
        progress_bar(snapshot.volume_percent, volume_bar_width),
        snapshot.volume_percent,
        mute_marker
    )
}
