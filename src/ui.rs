use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputMode, Screen};
use crate::pattern::AccentPattern;
use crate::scheduler::{BPM_MAX, BPM_MIN};
use crate::tone::ClickStyle;

// ── Top-level routing ─────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title bar    chunks[0]
            Constraint::Min(12),    // screen body  chunks[1]
            Constraint::Length(3),  // status       chunks[2]
            Constraint::Length(4),  // help         chunks[3]
        ])
        .split(area);

    draw_title(f, chunks[0], app);
    match app.screen {
        Screen::Metronome   => draw_metronome(f, chunks[1], app),
        Screen::Setlists    => draw_setlists(f, chunks[1], app),
        Screen::EditSetlist => draw_edit_setlist(f, chunks[1], app),
        Screen::Settings    => draw_settings(f, chunks[1], app),
    }
    draw_status(f, chunks[2], app);
    draw_help(f, chunks[3], app);
}

// ── Title bar ─────────────────────────────────────────────────────────────────

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let screen_label = match app.screen {
        Screen::Metronome   => "Metronome",
        Screen::Setlists    => "Setlists",
        Screen::EditSetlist => "Edit Setlist",
        Screen::Settings    => "Settings",
    };
    let mute_ind = if app.muted() { "  ♪ muted" } else { "  ♪ sound on" };
    let active = app
        .active_setlist
        .and_then(|id| app.library.setlist(id))
        .map(|s| format!("  ─  Setlist: {}", s.name))
        .unwrap_or_default();

    let text = format!("  TuiPulse  ─  {screen_label}{mute_ind}{active}  ─  Tab: next screen");
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

// ── Metronome screen ──────────────────────────────────────────────────────────

fn draw_metronome(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // pulse
            Constraint::Length(3), // bpm wheel
            Constraint::Min(4),    // tempo list
        ])
        .split(area);

    draw_pulse(f, chunks[0], app);
    draw_bpm_wheel(f, chunks[1], app);
    draw_tempo_list(f, chunks[2], app);
}

fn draw_pulse(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(" {} ", app.selected_tempo_name.as_deref().unwrap_or("Tempo"));
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let color = if !app.pulsing {
        Color::DarkGray
    } else if app.accent_beat {
        Color::Red
    } else {
        Color::Blue
    };
    // The disc grows slightly while the pulse is on.
    let widths: &[usize] = if app.pulsing { &[8, 14, 16, 16, 14, 8] } else { &[6, 10, 12, 10, 6] };

    let mut lines: Vec<Line> = Vec::new();
    let pad_rows = (inner.height as usize).saturating_sub(widths.len()) / 2;
    for _ in 0..pad_rows {
        lines.push(Line::raw(""));
    }
    for &w in widths {
        lines.push(Line::from(Span::styled(
            "█".repeat(w),
            Style::default().fg(color),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}

fn draw_bpm_wheel(f: &mut Frame, area: Rect, app: &App) {
    let bpm = app.bpm;
    let prev = if bpm > BPM_MIN { format!("{}", bpm - 1) } else { " ".into() };
    let next = if bpm < BPM_MAX { format!("{}", bpm + 1) } else { " ".into() };
    let line = Line::from(vec![
        Span::styled(format!("  {prev} "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("◂ {bpm} BPM ▸"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {next}  "), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .block(Block::default().title(" BPM ").borders(Borders::ALL)),
        area,
    );
}

fn draw_tempo_list(f: &mut Frame, area: Rect, app: &App) {
    let source = app
        .active_setlist
        .and_then(|id| app.library.setlist(id))
        .map(|s| s.name.clone());
    let title = match source {
        Some(name) => format!(" Tempos — {name} "),
        None => " Tempos — unattached ".to_string(),
    };

    let tempos = app.library.tempos_in(app.active_setlist);
    let mut lines: Vec<Line> = Vec::new();
    if tempos.is_empty() {
        lines.push(Line::styled(
            "  (no saved tempos)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for (i, t) in tempos.iter().enumerate() {
        let marker = if i == app.tempo_cursor { "► " } else { "  " };
        let style = if i == app.tempo_cursor {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::styled(
            format!("{marker}{}  —  {} BPM", t.name, t.bpm),
            style,
        ));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

// ── Setlists screen ───────────────────────────────────────────────────────────

fn draw_setlists(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();
    if app.library.setlists().is_empty() {
        lines.push(Line::styled(
            "  (no setlists — press n to add one)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for (i, s) in app.library.setlists().iter().enumerate() {
        let marker = if i == app.setlist_cursor { "► " } else { "  " };
        let active = if app.active_setlist == Some(s.id) { "  ● active" } else { "" };
        let style = if i == app.setlist_cursor {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::styled(
            format!("{marker}{}  ({} tempos){active}", s.name, s.tempos.len()),
            style,
        ));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Setlists ").borders(Borders::ALL)),
        area,
    );
}

// ── Edit-setlist screen ───────────────────────────────────────────────────────

fn draw_edit_setlist(f: &mut Frame, area: Rect, app: &App) {
    let Some(sid) = app.editing_setlist else {
        f.render_widget(
            Paragraph::new("  (no setlist selected)")
                .block(Block::default().title(" Edit Setlist ").borders(Borders::ALL)),
            area,
        );
        return;
    };
    let name = app.library.setlist(sid).map(|s| s.name.clone()).unwrap_or_default();

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("  New tempo BPM: ", Style::default().fg(Color::White)),
            Span::styled(
                format!("◂ {} ▸", app.edit_bpm),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   (n: add with name)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::raw(""),
    ];

    let tempos = app.library.tempos_in(Some(sid));
    if tempos.is_empty() {
        lines.push(Line::styled(
            "  (no tempos in this setlist)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for (i, t) in tempos.iter().enumerate() {
        let marker = if i == app.edit_cursor { "► " } else { "  " };
        let style = if i == app.edit_cursor {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::styled(
            format!("{marker}{}.  {}  —  {} BPM", i + 1, t.name, t.bpm),
            style,
        ));
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().title(format!(" Edit Setlist — {name} ")).borders(Borders::ALL)),
        area,
    );
}

// ── Settings screen ───────────────────────────────────────────────────────────

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled(
        "  Accent Pattern",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    for (i, p) in AccentPattern::ALL.iter().enumerate() {
        lines.push(settings_row(
            i == app.settings_cursor,
            app.pattern == *p,
            p.name(),
        ));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  Click Sound",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    for (i, s) in ClickStyle::ALL.iter().enumerate() {
        lines.push(settings_row(
            AccentPattern::ALL.len() + i == app.settings_cursor,
            app.style == *s,
            s.name(),
        ));
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Settings ").borders(Borders::ALL)),
        area,
    );
}

fn settings_row(under_cursor: bool, selected: bool, label: &str) -> Line<'static> {
    let marker = if under_cursor { "► " } else { "  " };
    let check = if selected { " ✓" } else { "" };
    let style = if under_cursor {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };
    Line::styled(format!("  {marker}{label}{check}"), style)
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let (text, color) = if app.input_mode != InputMode::None {
        let prompt = match app.input_mode {
            InputMode::NewSetlist    => "New setlist name",
            InputMode::RenameSetlist => "Rename setlist",
            InputMode::NewTempo      => "New tempo name",
            InputMode::None          => "",
        };
        (format!("{prompt}: {}▏  (Enter: ok, Esc: cancel)", app.input_buf), Color::Cyan)
    } else {
        (format!("  {}", app.status_msg), Color::White)
    };
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(Block::default().title(" Status ").borders(Borders::ALL)),
        area,
    );
}

// ── Help panel ────────────────────────────────────────────────────────────────

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let w = Style::default().fg(Color::White);

    let global = Line::from(vec![
        Span::styled("[Tab] ",    w), Span::raw("Next screen  │  "),
        Span::styled("[m] ",      w), Span::raw("Mute  │  "),
        Span::styled("[Ctrl-S] ", w), Span::raw("Save  │  "),
        Span::styled("[Esc] ",    w), Span::raw("Quit"),
    ]);

    let screen_line = match app.screen {
        Screen::Metronome => Line::from(vec![
            Span::styled("[↑↓] ",       w), Span::raw("BPM ±1  │  "),
            Span::styled("[PgUp/Dn] ",  w), Span::raw("BPM ±5  │  "),
            Span::styled("[j/k] ",      w), Span::raw("Tempo list  │  "),
            Span::styled("[Enter] ",    w), Span::raw("Use tempo  │  "),
            Span::styled("[Del] ",      w), Span::raw("Delete tempo"),
        ]),
        Screen::Setlists => Line::from(vec![
            Span::styled("[↑↓] ",    w), Span::raw("Select  │  "),
            Span::styled("[Enter] ", w), Span::raw("Activate/clear  │  "),
            Span::styled("[n] ",     w), Span::raw("New  │  "),
            Span::styled("[e] ",     w), Span::raw("Edit  │  "),
            Span::styled("[Del] ",   w), Span::raw("Delete"),
        ]),
        Screen::EditSetlist => Line::from(vec![
            Span::styled("[↑↓] ",  w), Span::raw("Select tempo  │  "),
            Span::styled("[←→] ",  w), Span::raw("New BPM ±1  │  "),
            Span::styled("[n] ",   w), Span::raw("Add tempo  │  "),
            Span::styled("[r] ",   w), Span::raw("Rename  │  "),
            Span::styled("[J/K] ", w), Span::raw("Reorder  │  "),
            Span::styled("[Del] ", w), Span::raw("Remove  │  "),
            Span::styled("[Esc] ", w), Span::raw("Back"),
        ]),
        Screen::Settings => Line::from(vec![
            Span::styled("[↑↓] ",    w), Span::raw("Select row  │  "),
            Span::styled("[Enter] ", w), Span::raw("Apply"),
        ]),
    };

    f.render_widget(
        Paragraph::new(vec![global, screen_line])
            .block(Block::default().title(" Help ").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
