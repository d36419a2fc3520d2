use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::audio::ClickPlayer;
use crate::pattern::AccentPattern;
use crate::scheduler::{BeatScheduler, PulseEvent, BPM_MAX, BPM_MIN};
use crate::store::{Library, SetlistId};
use crate::tone::ClickStyle;

// ── Screens ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Pulse, BPM wheel, mute, saved-tempo list.
    Metronome,
    /// Manage setlists; pick the active one.
    Setlists,
    /// Rename one setlist and edit its tempos.
    EditSetlist,
    /// Accent pattern and click style selection.
    Settings,
}

/// Text prompt currently capturing keyboard input, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    None,
    NewSetlist,
    RenameSetlist,
    NewTempo,
}

// ── App state ─────────────────────────────────────────────────────────────────

/// Single owner of all mutable state.  The UI reads it by reference and key
/// handlers mutate it through methods; no global singletons.
pub struct App {
    pub library:   Library,
    pub save_path: Option<PathBuf>,
    pub player:    Arc<Mutex<ClickPlayer>>,
    pub scheduler: BeatScheduler,

    pub screen:      Screen,
    pub input_mode:  InputMode,
    pub input_buf:   String,
    pub status_msg:  String,
    pub should_quit: bool,

    // Metronome screen
    pub bpm: u32,
    pub selected_tempo_name: Option<String>,
    pub pulsing:     bool,
    pub accent_beat: bool,
    pub tempo_cursor: usize,

    // Setlists screen
    pub setlist_cursor: usize,
    pub active_setlist: Option<SetlistId>,

    // Edit-setlist screen
    pub editing_setlist: Option<SetlistId>,
    pub edit_cursor: usize,
    pub edit_bpm: u32,

    // Settings screen: rows 0..7 are patterns, 7..10 click styles.
    pub settings_cursor: usize,
    pub pattern: AccentPattern,
    pub style:   ClickStyle,
}

impl App {
    pub fn new(player: Arc<Mutex<ClickPlayer>>, library: Library, save_path: Option<PathBuf>) -> Self {
        Self {
            library,
            save_path,
            player,
            scheduler: BeatScheduler::new(),

            screen:      Screen::Metronome,
            input_mode:  InputMode::None,
            input_buf:   String::new(),
            status_msg:  String::new(),
            should_quit: false,

            bpm: 120,
            selected_tempo_name: None,
            pulsing:     false,
            accent_beat: false,
            tempo_cursor: 0,

            setlist_cursor: 0,
            active_setlist: None,

            editing_setlist: None,
            edit_cursor: 0,
            edit_bpm: 120,

            settings_cursor: 0,
            pattern: AccentPattern::Four,
            style:   ClickStyle::Classic,
        }
    }

    // ── Pulse loop ────────────────────────────────────────────────────────

    pub fn start_pulse(&mut self, now: Instant) {
        self.scheduler.start(self.bpm, self.pattern, now);
    }

    /// Drain due scheduler events: flip the pulse state and trigger clicks.
    pub fn advance(&mut self, now: Instant) {
        for ev in self.scheduler.poll(now) {
            match ev {
                PulseEvent::Beat(tick) => {
                    if tick.generation != self.scheduler.generation() {
                        continue;
                    }
                    self.pulsing = true;
                    self.accent_beat = tick.accented;
                    if let Some(kind) = tick.click {
                        self.player.lock().unwrap().play(kind);
                    }
                }
                PulseEvent::PulseOff => self.pulsing = false,
            }
        }
    }

    // ── Global controls ───────────────────────────────────────────────────

    pub fn bpm_up(&mut self, step: u32, now: Instant) {
        self.set_bpm(self.bpm.saturating_add(step), now);
    }

    pub fn bpm_down(&mut self, step: u32, now: Instant) {
        self.set_bpm(self.bpm.saturating_sub(step), now);
    }

    fn set_bpm(&mut self, bpm: u32, now: Instant) {
        self.bpm = bpm.clamp(BPM_MIN, BPM_MAX);
        if self.scheduler.is_running() {
            self.scheduler.restart(self.bpm, now);
        }
        self.status_msg = format!("BPM: {}", self.bpm);
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.scheduler.muted();
        self.scheduler.set_muted(muted);
        self.status_msg = if muted { "Muted".to_string() } else { "Unmuted".to_string() };
    }

    pub fn muted(&self) -> bool {
        self.scheduler.muted()
    }

    /// Metronome ⇄ Setlists ⇄ Settings.  The pulse only runs while the
    /// metronome screen is showing.
    pub fn cycle_screen(&mut self, now: Instant) {
        let next = match self.screen {
            Screen::Metronome => Screen::Setlists,
            Screen::Setlists | Screen::EditSetlist => Screen::Settings,
            Screen::Settings => Screen::Metronome,
        };
        self.set_screen(next, now);
    }

    pub fn set_screen(&mut self, screen: Screen, now: Instant) {
        if self.screen == Screen::Metronome && screen != Screen::Metronome {
            self.scheduler.stop();
            self.pulsing = false;
        }
        if screen == Screen::Metronome && !self.scheduler.is_running() {
            self.start_pulse(now);
        }
        self.screen = screen;
    }

    // ── Metronome screen ──────────────────────────────────────────────────

    /// Tempos shown on the metronome screen: the active setlist's, or every
    /// unattached tempo when no setlist is active.
    pub fn visible_tempo_count(&self) -> usize {
        self.library.tempos_in(self.active_setlist).len()
    }

    pub fn tempo_cursor_up(&mut self) {
        let n = self.visible_tempo_count();
        if n > 0 {
            self.tempo_cursor = if self.tempo_cursor == 0 { n - 1 } else { self.tempo_cursor - 1 };
        }
    }

    pub fn tempo_cursor_down(&mut self) {
        let n = self.visible_tempo_count();
        if n > 0 {
            self.tempo_cursor = (self.tempo_cursor + 1) % n;
        }
    }

    /// Adopt the tempo under the cursor: take its BPM and name, realign to
    /// beat 1.
    pub fn select_tempo(&mut self, now: Instant) {
        let Some(&t) = self.library.tempos_in(self.active_setlist).get(self.tempo_cursor)
        else { return };
        let (name, bpm) = (t.name.clone(), t.bpm);
        self.selected_tempo_name = Some(name.clone());
        self.set_bpm(bpm, now);
        self.status_msg = format!("{} — {} BPM", name, bpm);
    }

    pub fn delete_tempo_under_cursor(&mut self) {
        let Some(&t) = self.library.tempos_in(self.active_setlist).get(self.tempo_cursor)
        else { return };
        let (id, name) = (t.id, t.name.clone());
        if self.selected_tempo_name.as_deref() == Some(name.as_str()) {
            self.selected_tempo_name = None;
        }
        self.library.delete_tempo(id);
        let n = self.visible_tempo_count();
        if self.tempo_cursor >= n && n > 0 {
            self.tempo_cursor = n - 1;
        }
        self.status_msg = format!("Deleted {name}");
    }

    // ── Setlists screen ───────────────────────────────────────────────────

    pub fn setlist_cursor_up(&mut self) {
        let n = self.library.setlists().len();
        if n > 0 {
            self.setlist_cursor =
                if self.setlist_cursor == 0 { n - 1 } else { self.setlist_cursor - 1 };
        }
    }

    pub fn setlist_cursor_down(&mut self) {
        let n = self.library.setlists().len();
        if n > 0 {
            self.setlist_cursor = (self.setlist_cursor + 1) % n;
        }
    }

    fn setlist_under_cursor(&self) -> Option<SetlistId> {
        self.library.setlists().get(self.setlist_cursor).map(|s| s.id)
    }

    pub fn activate_setlist_under_cursor(&mut self) {
        let Some(id) = self.setlist_under_cursor() else { return };
        if self.active_setlist == Some(id) {
            self.active_setlist = None;
            self.status_msg = "Active setlist cleared".to_string();
        } else {
            self.active_setlist = Some(id);
            let name = self.library.setlist(id).map(|s| s.name.clone()).unwrap_or_default();
            self.status_msg = format!("Active setlist: {name}");
        }
        self.tempo_cursor = 0;
    }

    pub fn edit_setlist_under_cursor(&mut self, now: Instant) {
        let Some(id) = self.setlist_under_cursor() else { return };
        self.editing_setlist = Some(id);
        self.edit_cursor = 0;
        self.edit_bpm = self.bpm;
        self.set_screen(Screen::EditSetlist, now);
    }

    /// Cascade delete; the active-setlist reference is cleared so the tempo
    /// list falls back to unattached tempos.
    pub fn delete_setlist_under_cursor(&mut self) {
        let Some(id) = self.setlist_under_cursor() else { return };
        let name = self.library.setlist(id).map(|s| s.name.clone()).unwrap_or_default();
        if self.active_setlist == Some(id) {
            self.active_setlist = None;
            self.tempo_cursor = 0;
        }
        if self.editing_setlist == Some(id) {
            self.editing_setlist = None;
        }
        self.library.delete_setlist(id);
        let n = self.library.setlists().len();
        if self.setlist_cursor >= n && n > 0 {
            self.setlist_cursor = n - 1;
        }
        self.status_msg = format!("Deleted setlist {name}");
    }

    // ── Edit-setlist screen ───────────────────────────────────────────────

    pub fn edit_tempo_count(&self) -> usize {
        self.editing_setlist
            .map(|id| self.library.tempos_in(Some(id)).len())
            .unwrap_or(0)
    }

    pub fn edit_cursor_up(&mut self) {
        let n = self.edit_tempo_count();
        if n > 0 {
            self.edit_cursor = if self.edit_cursor == 0 { n - 1 } else { self.edit_cursor - 1 };
        }
    }

    pub fn edit_cursor_down(&mut self) {
        let n = self.edit_tempo_count();
        if n > 0 {
            self.edit_cursor = (self.edit_cursor + 1) % n;
        }
    }

    pub fn edit_bpm_up(&mut self, step: u32) {
        self.edit_bpm = self.edit_bpm.saturating_add(step).clamp(BPM_MIN, BPM_MAX);
    }

    pub fn edit_bpm_down(&mut self, step: u32) {
        self.edit_bpm = self.edit_bpm.saturating_sub(step).clamp(BPM_MIN, BPM_MAX);
    }

    pub fn delete_edit_tempo_under_cursor(&mut self) {
        let Some(sid) = self.editing_setlist else { return };
        let Some(&t) = self.library.tempos_in(Some(sid)).get(self.edit_cursor)
        else { return };
        let (id, name) = (t.id, t.name.clone());
        if self.selected_tempo_name.as_deref() == Some(name.as_str()) {
            self.selected_tempo_name = None;
        }
        self.library.delete_tempo(id);
        let n = self.edit_tempo_count();
        if self.edit_cursor >= n && n > 0 {
            self.edit_cursor = n - 1;
        }
        self.status_msg = format!("Removed {name}");
    }

    pub fn move_edit_tempo(&mut self, up: bool) {
        let Some(sid) = self.editing_setlist else { return };
        let Some(&t) = self.library.tempos_in(Some(sid)).get(self.edit_cursor)
        else { return };
        let id = t.id;
        let target = if up {
            self.edit_cursor.saturating_sub(1)
        } else {
            self.edit_cursor + 1
        };
        self.library.move_tempo(id, target);
        self.edit_cursor = target.min(self.edit_tempo_count().saturating_sub(1));
    }

    // ── Settings screen ───────────────────────────────────────────────────

    pub const SETTINGS_ROWS: usize = AccentPattern::ALL.len() + ClickStyle::ALL.len();

    pub fn settings_cursor_up(&mut self) {
        self.settings_cursor = if self.settings_cursor == 0 {
            Self::SETTINGS_ROWS - 1
        } else {
            self.settings_cursor - 1
        };
    }

    pub fn settings_cursor_down(&mut self) {
        self.settings_cursor = (self.settings_cursor + 1) % Self::SETTINGS_ROWS;
    }

    /// Apply the row under the cursor: an accent pattern or a click style.
    /// A pattern change realigns a running pulse to beat 1.
    pub fn apply_settings_row(&mut self, now: Instant) {
        if let Some(&pattern) = AccentPattern::ALL.get(self.settings_cursor) {
            self.pattern = pattern;
            if self.scheduler.is_running() {
                self.scheduler.start(self.bpm, pattern, now);
            }
            self.status_msg = format!("Accent pattern: {}", pattern.name());
        } else {
            let style = ClickStyle::ALL[self.settings_cursor - AccentPattern::ALL.len()];
            self.style = style;
            self.player.lock().unwrap().set_style(style);
            self.status_msg = format!("Click sound: {}", style.name());
        }
    }

    // ── Text input ────────────────────────────────────────────────────────

    pub fn open_input(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.input_buf.clear();
        if mode == InputMode::RenameSetlist {
            if let Some(name) = self
                .editing_setlist
                .and_then(|id| self.library.setlist(id))
                .map(|s| s.name.clone())
            {
                self.input_buf = name;
            }
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::None;
        self.input_buf.clear();
        self.status_msg = "Cancelled".to_string();
    }

    /// Commit the prompt.  Empty and whitespace-only names are rejected and
    /// the prompt stays open.
    pub fn commit_input(&mut self) {
        let name = self.input_buf.trim().to_string();
        if name.is_empty() {
            self.status_msg = "Name cannot be empty".to_string();
            return;
        }
        match self.input_mode {
            InputMode::None => {}
            InputMode::NewSetlist => {
                self.library.add_setlist(&name);
                self.status_msg = format!("Added setlist {name}");
            }
            InputMode::RenameSetlist => {
                if let Some(id) = self.editing_setlist {
                    self.library.rename_setlist(id, &name);
                    self.status_msg = format!("Renamed to {name}");
                }
            }
            InputMode::NewTempo => {
                if let Some(sid) = self.editing_setlist {
                    self.library.add_tempo(&name, self.edit_bpm, Some(sid));
                    self.status_msg = format!("Added {} — {} BPM", name, self.edit_bpm);
                }
            }
        }
        self.input_mode = InputMode::None;
        self.input_buf.clear();
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn save(&mut self) {
        let Some(path) = self.save_path.clone() else {
            self.status_msg = "No data directory — not saved".to_string();
            return;
        };
        match self.library.save(&path) {
            Ok(()) => self.status_msg = format!("Saved to {}", path.display()),
            Err(e) => {
                log::error!("saving library: {e:#}");
                self.status_msg = format!("Save failed: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::FALLBACK_SAMPLE_RATE;
    use std::time::Duration;

    fn app() -> App {
        let player = Arc::new(Mutex::new(ClickPlayer::new(FALLBACK_SAMPLE_RATE)));
        App::new(player, Library::default(), None)
    }

    #[test]
    fn beat_sets_pulse_and_pulse_off_clears_it() {
        let mut app = app();
        let t0 = Instant::now();
        app.start_pulse(t0);

        app.advance(t0 + Duration::from_millis(500));
        assert!(app.pulsing);
        assert!(app.accent_beat);

        app.advance(t0 + Duration::from_millis(750));
        assert!(!app.pulsing);

        // Second beat of 4/4 is unaccented.
        app.advance(t0 + Duration::from_millis(1000));
        assert!(app.pulsing);
        assert!(!app.accent_beat);
    }

    #[test]
    fn leaving_the_metronome_screen_stops_the_pulse() {
        let mut app = app();
        let t0 = Instant::now();
        app.start_pulse(t0);
        app.advance(t0 + Duration::from_millis(500));
        assert!(app.pulsing);

        app.cycle_screen(t0 + Duration::from_millis(600));
        assert_eq!(app.screen, Screen::Setlists);
        assert!(!app.scheduler.is_running());
        assert!(!app.pulsing);

        app.set_screen(Screen::Metronome, t0 + Duration::from_millis(700));
        assert!(app.scheduler.is_running());
    }

    #[test]
    fn selecting_a_tempo_adopts_bpm_and_restarts() {
        let mut app = app();
        let t0 = Instant::now();
        app.library.add_tempo("Ballad", 72, None);
        app.start_pulse(t0);
        app.advance(t0 + Duration::from_millis(500));

        app.select_tempo(t0 + Duration::from_millis(600));
        assert_eq!(app.bpm, 72);
        assert_eq!(app.selected_tempo_name.as_deref(), Some("Ballad"));
        assert_eq!(app.scheduler.beat_index(), 0);
        assert_eq!(app.scheduler.period(), Duration::from_secs_f64(60.0 / 72.0));
    }

    #[test]
    fn deleting_the_selected_tempo_clears_the_title() {
        let mut app = app();
        app.library.add_tempo("Ballad", 72, None);
        app.select_tempo(Instant::now());
        assert!(app.selected_tempo_name.is_some());
        app.delete_tempo_under_cursor();
        assert!(app.selected_tempo_name.is_none());
        assert_eq!(app.visible_tempo_count(), 0);
    }

    #[test]
    fn deleting_the_active_setlist_falls_back_to_unattached_tempos() {
        let mut app = app();
        let sid = app.library.add_setlist("Gig");
        app.library.add_tempo("Owned", 120, Some(sid));
        app.library.add_tempo("Free", 100, None);

        app.active_setlist = Some(sid);
        assert_eq!(app.visible_tempo_count(), 1);

        app.delete_setlist_under_cursor();
        assert!(app.active_setlist.is_none());
        let visible = app.library.tempos_in(None);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Free");
    }

    #[test]
    fn bpm_steps_clamp_to_range() {
        let mut app = app();
        let t0 = Instant::now();
        app.bpm_down(200, t0);
        assert_eq!(app.bpm, BPM_MIN);
        app.bpm_up(1000, t0);
        assert_eq!(app.bpm, BPM_MAX);
    }

    #[test]
    fn unmuted_beat_triggers_a_live_voice() {
        let mut app = app();
        let t0 = Instant::now();
        assert!(app.muted());
        app.toggle_mute();
        assert!(!app.muted());

        app.start_pulse(t0);
        app.advance(t0 + Duration::from_millis(500));
        // 4/4 beat 1 is accented; the accent buffer starts at sin(0) = 0,
        // so probe the second sample.
        let mut player = app.player.lock().unwrap();
        player.next_sample();
        assert_ne!(player.next_sample(), 0.0);
    }

    #[test]
    fn muted_beat_leaves_the_player_idle() {
        let mut app = app();
        let t0 = Instant::now();
        app.start_pulse(t0);
        app.advance(t0 + Duration::from_millis(500));
        assert!(app.pulsing);
        assert_eq!(app.player.lock().unwrap().next_sample(), 0.0);
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut app = app();
        app.open_input(InputMode::NewSetlist);
        app.input_buf = "   ".to_string();
        app.commit_input();
        assert!(app.library.setlists().is_empty());
        assert_eq!(app.input_mode, InputMode::NewSetlist);

        app.input_buf = "Gig".to_string();
        app.commit_input();
        assert_eq!(app.library.setlists().len(), 1);
        assert_eq!(app.input_mode, InputMode::None);
    }

    #[test]
    fn settings_rows_cover_patterns_then_styles() {
        let mut app = app();
        let t0 = Instant::now();
        app.settings_cursor = 3;
        app.apply_settings_row(t0);
        assert_eq!(app.pattern, AccentPattern::Four);

        app.settings_cursor = AccentPattern::ALL.len() + 2;
        app.apply_settings_row(t0);
        assert_eq!(app.style, ClickStyle::Sharp);
        assert_eq!(app.player.lock().unwrap().style(), ClickStyle::Sharp);
    }

    #[test]
    fn pattern_change_realigns_a_running_pulse() {
        let mut app = app();
        let t0 = Instant::now();
        app.start_pulse(t0);
        app.advance(t0 + Duration::from_millis(500));
        assert_eq!(app.scheduler.beat_index(), 1);

        app.settings_cursor = 6; // 7/4
        app.apply_settings_row(t0 + Duration::from_millis(600));
        assert_eq!(app.scheduler.beat_index(), 0);
        assert_eq!(app.scheduler.pattern(), AccentPattern::Seven);
    }
}
