mod app;
mod audio;
mod pattern;
mod scheduler;
mod store;
mod tone;
mod ui;

use anyhow::Result;
use app::{App, InputMode, Screen};
use audio::{AudioEngine, ClickPlayer, FALLBACK_SAMPLE_RATE};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use store::Library;

fn main() -> Result<()> {
    env_logger::init();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let result = run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = result { eprintln!("Error: {:?}", e); }
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    let player = Arc::new(Mutex::new(ClickPlayer::new(FALLBACK_SAMPLE_RATE)));
    // Audio is an enhancement to the visual pulse: no device means we run
    // silent, not that we crash.
    let _audio = match AudioEngine::new(Arc::clone(&player)) {
        Ok(engine) => Some(engine),
        Err(e) => {
            log::warn!("audio disabled: {e:#}");
            None
        }
    };

    let save_path = store::default_path();
    let library = match save_path.as_deref() {
        Some(path) if path.exists() => match Library::load(path) {
            Ok(lib) => lib,
            Err(e) => {
                log::error!("loading library: {e:#}");
                Library::default()
            }
        },
        _ => Library::default(),
    };

    let mut app = App::new(player, library, save_path);
    app.start_pulse(Instant::now());

    loop {
        app.advance(Instant::now());
        terminal.draw(|f| ui::draw(f, &app))?;

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
                    continue;
                }
                let now = Instant::now();

                // ── Input mode: the prompt captures everything ────────────
                if app.input_mode != InputMode::None {
                    match key.code {
                        KeyCode::Esc       => app.cancel_input(),
                        KeyCode::Enter     => app.commit_input(),
                        KeyCode::Backspace => { app.input_buf.pop(); }
                        KeyCode::Char(c)   => app.input_buf.push(c),
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    // Global
                    KeyCode::Esc if app.screen == Screen::EditSetlist => {
                        app.set_screen(Screen::Setlists, now);
                    }
                    KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.save(),
                    KeyCode::Tab       => app.cycle_screen(now),
                    KeyCode::Char('m') => app.toggle_mute(),

                    // ── Metronome screen ──────────────────────────────────
                    KeyCode::Up       if app.screen == Screen::Metronome => app.bpm_up(1, now),
                    KeyCode::Down     if app.screen == Screen::Metronome => app.bpm_down(1, now),
                    KeyCode::PageUp   if app.screen == Screen::Metronome => app.bpm_up(5, now),
                    KeyCode::PageDown if app.screen == Screen::Metronome => app.bpm_down(5, now),
                    KeyCode::Char('k') if app.screen == Screen::Metronome => app.tempo_cursor_up(),
                    KeyCode::Char('j') if app.screen == Screen::Metronome => app.tempo_cursor_down(),
                    KeyCode::Enter     if app.screen == Screen::Metronome => app.select_tempo(now),
                    KeyCode::Backspace | KeyCode::Delete if app.screen == Screen::Metronome => {
                        app.delete_tempo_under_cursor();
                    }

                    // ── Setlists screen ───────────────────────────────────
                    KeyCode::Up   if app.screen == Screen::Setlists => app.setlist_cursor_up(),
                    KeyCode::Down if app.screen == Screen::Setlists => app.setlist_cursor_down(),
                    KeyCode::Enter if app.screen == Screen::Setlists => {
                        app.activate_setlist_under_cursor();
                    }
                    KeyCode::Char('n') if app.screen == Screen::Setlists => {
                        app.open_input(InputMode::NewSetlist);
                    }
                    KeyCode::Char('e') if app.screen == Screen::Setlists => {
                        app.edit_setlist_under_cursor(now);
                    }
                    KeyCode::Backspace | KeyCode::Delete if app.screen == Screen::Setlists => {
                        app.delete_setlist_under_cursor();
                    }

                    // ── Edit-setlist screen ───────────────────────────────
                    KeyCode::Up   if app.screen == Screen::EditSetlist => app.edit_cursor_up(),
                    KeyCode::Down if app.screen == Screen::EditSetlist => app.edit_cursor_down(),
                    KeyCode::Right    if app.screen == Screen::EditSetlist => app.edit_bpm_up(1),
                    KeyCode::Left     if app.screen == Screen::EditSetlist => app.edit_bpm_down(1),
                    KeyCode::PageUp   if app.screen == Screen::EditSetlist => app.edit_bpm_up(5),
                    KeyCode::PageDown if app.screen == Screen::EditSetlist => app.edit_bpm_down(5),
                    KeyCode::Char('n') if app.screen == Screen::EditSetlist => {
                        app.open_input(InputMode::NewTempo);
                    }
                    KeyCode::Char('r') if app.screen == Screen::EditSetlist => {
                        app.open_input(InputMode::RenameSetlist);
                    }
                    KeyCode::Char('K') if app.screen == Screen::EditSetlist => {
                        app.move_edit_tempo(true);
                    }
                    KeyCode::Char('J') if app.screen == Screen::EditSetlist => {
                        app.move_edit_tempo(false);
                    }
                    KeyCode::Backspace | KeyCode::Delete if app.screen == Screen::EditSetlist => {
                        app.delete_edit_tempo_under_cursor();
                    }

                    // ── Settings screen ───────────────────────────────────
                    KeyCode::Up    if app.screen == Screen::Settings => app.settings_cursor_up(),
                    KeyCode::Down  if app.screen == Screen::Settings => app.settings_cursor_down(),
                    KeyCode::Enter if app.screen == Screen::Settings => app.apply_settings_row(now),

                    _ => {}
                }
            }
        }
        if app.should_quit { break; }
    }

    app.save();
    Ok(())
}
