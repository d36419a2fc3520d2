use std::time::{Duration, Instant};

use crate::pattern::AccentPattern;
use crate::tone::ClickKind;

pub const BPM_MIN: u32 = 40;
pub const BPM_MAX: u32 = 240;

// ── Events ────────────────────────────────────────────────────────────────────

/// One beat fired by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Scheduler arming generation this tick belongs to.  Consumers drop
    /// ticks whose generation no longer matches the scheduler's.
    pub generation: u64,
    pub beat_index: usize,
    pub accented:   bool,
    /// Sound to trigger, or `None` when muted.  Mute gates sound only; the
    /// beat index and accent flag above advance regardless.
    pub click: Option<ClickKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseEvent {
    Beat(Tick),
    /// Clears the visual pulse half a period after its beat.  Pulse state is
    /// idempotent, so a pulse-off armed before a restart still clears safely.
    PulseOff,
}

// ── Beat scheduler ────────────────────────────────────────────────────────────

/// Idle/Running state machine around a single repeating beat deadline plus a
/// one-shot pulse-off deadline.  Driven by `poll()` with an explicit `now`,
/// so all transitions happen on the caller's thread and tests can replay any
/// timeline without sleeping.
pub struct BeatScheduler {
    period:     Duration,
    pattern:    AccentPattern,
    beat_index: usize,
    muted:      bool,
    generation: u64,
    next_tick:  Option<Instant>,
    pulse_off:  Option<Instant>,
}

impl BeatScheduler {
    pub fn new() -> Self {
        Self {
            period:     Duration::from_millis(500),
            pattern:    AccentPattern::Four,
            beat_index: 0,
            muted:      true,
            generation: 0,
            next_tick:  None,
            pulse_off:  None,
        }
    }

    pub fn is_running(&self) -> bool { self.next_tick.is_some() }
    pub fn generation(&self) -> u64  { self.generation }
    pub fn period(&self) -> Duration { self.period }
    pub fn beat_index(&self) -> usize { self.beat_index }
    pub fn pattern(&self) -> AccentPattern { self.pattern }

    pub fn muted(&self) -> bool { self.muted }

    /// Mute is checked at tick time; it never suppresses the visual pulse or
    /// the beat-index progression.
    pub fn set_muted(&mut self, muted: bool) { self.muted = muted; }

    /// Idle → Running.  The first tick fires one full period after `now`;
    /// the beat index realigns to beat 1.
    pub fn start(&mut self, bpm: u32, pattern: AccentPattern, now: Instant) {
        self.period     = period_for(bpm);
        self.pattern    = pattern;
        self.beat_index = 0;
        self.generation += 1;
        self.next_tick  = Some(now + self.period);
        log::debug!("scheduler armed: {} bpm, {} (gen {})", bpm, pattern.name(), self.generation);
    }

    /// Running → Running at a new tempo.  Cancels the armed tick, resets the
    /// beat index to 0 and re-arms at the new period: changing tempo realigns
    /// to beat 1 rather than preserving phase.
    pub fn restart(&mut self, bpm: u32, now: Instant) {
        self.start(bpm, self.pattern, now);
    }

    /// Running → Idle.  No further ticks or pulse events fire.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.next_tick = None;
        self.pulse_off = None;
        log::debug!("scheduler stopped (gen {})", self.generation);
    }

    /// Fire every deadline that has elapsed by `now`, in time order.  A
    /// stalled caller catches up one beat per elapsed period.
    pub fn poll(&mut self, now: Instant) -> Vec<PulseEvent> {
        let mut events = Vec::new();
        loop {
            let due_off  = self.pulse_off.filter(|&t| t <= now);
            let due_tick = self.next_tick.filter(|&t| t <= now);
            match (due_off, due_tick) {
                (Some(off), tick) if tick.map_or(true, |t| off <= t) => {
                    self.pulse_off = None;
                    events.push(PulseEvent::PulseOff);
                }
                (_, Some(t)) => {
                    let beats = self.pattern.beats();
                    let accented = beats[self.beat_index];
                    let click = if self.muted {
                        None
                    } else if accented {
                        Some(ClickKind::Accent)
                    } else {
                        Some(ClickKind::Tap)
                    };
                    events.push(PulseEvent::Beat(Tick {
                        generation: self.generation,
                        beat_index: self.beat_index,
                        accented,
                        click,
                    }));
                    self.beat_index = (self.beat_index + 1) % beats.len();
                    self.pulse_off  = Some(t + self.period / 2);
                    self.next_tick  = Some(t + self.period);
                }
                // Unreachable: the first arm's guard is always true when
                // `due_tick` is `None`, but the compiler can't see that.
                (Some(_), None) => unreachable!(),
                (None, None) => break,
            }
        }
        events
    }
}

fn period_for(bpm: u32) -> Duration {
    let bpm = bpm.clamp(BPM_MIN, BPM_MAX);
    Duration::from_secs_f64(60.0 / bpm as f64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn beats_only(events: &[PulseEvent]) -> Vec<Tick> {
        events
            .iter()
            .filter_map(|e| match e {
                PulseEvent::Beat(t) => Some(*t),
                PulseEvent::PulseOff => None,
            })
            .collect()
    }

    /// Collect the beats fired over `n` whole periods after `t0`.
    fn run_ticks(s: &mut BeatScheduler, t0: Instant, n: u32) -> Vec<Tick> {
        let mut ticks = Vec::new();
        for k in 1..=n {
            ticks.extend(beats_only(&s.poll(t0 + s.period() * k)));
        }
        ticks
    }

    #[test]
    fn stop_before_first_period_fires_nothing() {
        for bpm in [BPM_MIN, 120, BPM_MAX] {
            let t0 = Instant::now();
            let mut s = BeatScheduler::new();
            s.start(bpm, AccentPattern::Four, t0);
            assert!(s.is_running());
            s.stop();
            assert!(!s.is_running());
            assert!(s.poll(t0 + Duration::from_secs(10)).is_empty());
        }
    }

    #[test]
    fn beat_index_is_k_mod_pattern_len() {
        for pattern in AccentPattern::ALL {
            let n = pattern.beats().len();
            let t0 = Instant::now();
            let mut s = BeatScheduler::new();
            s.start(120, pattern, t0);
            let ticks = run_ticks(&mut s, t0, 17);
            assert_eq!(ticks.len(), 17);
            for (k, tick) in ticks.iter().enumerate() {
                assert_eq!(tick.beat_index, k % n);
                assert_eq!(tick.accented, pattern.beats()[k % n]);
            }
        }
    }

    #[test]
    fn four_four_at_120_over_eight_ticks() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.set_muted(false);
        s.start(120, AccentPattern::Four, t0);
        assert_eq!(s.period(), Duration::from_millis(500));

        let ticks = run_ticks(&mut s, t0, 8);
        let accents: Vec<bool>  = ticks.iter().map(|t| t.accented).collect();
        let indices: Vec<usize> = ticks.iter().map(|t| t.beat_index).collect();
        assert_eq!(accents, [true, false, false, false, true, false, false, false]);
        assert_eq!(indices, [0, 1, 2, 3, 0, 1, 2, 3]);
        assert_eq!(ticks[0].click, Some(ClickKind::Accent));
        assert_eq!(ticks[1].click, Some(ClickKind::Tap));
    }

    #[test]
    fn mute_changes_click_but_not_progression() {
        let t0 = Instant::now();
        let mut open = BeatScheduler::new();
        let mut muted = BeatScheduler::new();
        open.set_muted(false);
        muted.set_muted(true);
        open.start(180, AccentPattern::Three, t0);
        muted.start(180, AccentPattern::Three, t0);

        let a = run_ticks(&mut open, t0, 20);
        let b = run_ticks(&mut muted, t0, 20);
        assert_eq!(a.len(), 20);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.beat_index, y.beat_index);
            assert_eq!(x.accented, y.accented);
            assert!(x.click.is_some());
            assert!(y.click.is_none());
        }
    }

    #[test]
    fn restart_resets_index_and_changes_period() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);
        let ticks = run_ticks(&mut s, t0, 3);
        assert_eq!(ticks.last().unwrap().beat_index, 2);

        let t1 = t0 + Duration::from_millis(1700);
        s.restart(90, t1);
        assert_eq!(s.period(), Duration::from_secs_f64(60.0 / 90.0));

        // Nothing fires at the old half-second spacing …
        assert!(beats_only(&s.poll(t1 + Duration::from_millis(500))).is_empty());
        // … and the first tick at the new period restarts from beat 1.
        let ticks = beats_only(&s.poll(t1 + Duration::from_millis(667)));
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].beat_index, 0);
    }

    #[test]
    fn restart_resets_index_from_any_prior_value() {
        for pre_ticks in [0u32, 1, 2, 3, 5, 9] {
            let t0 = Instant::now();
            let mut s = BeatScheduler::new();
            s.start(200, AccentPattern::Seven, t0);
            run_ticks(&mut s, t0, pre_ticks);
            let t1 = t0 + Duration::from_secs(60);
            s.restart(200, t1);
            assert_eq!(s.beat_index(), 0);
            let ticks = beats_only(&s.poll(t1 + s.period()));
            assert_eq!(ticks[0].beat_index, 0);
        }
    }

    #[test]
    fn pulse_off_fires_half_a_period_after_its_beat() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);

        let ev = s.poll(t0 + Duration::from_millis(500));
        assert!(matches!(ev[..], [PulseEvent::Beat(_)]));

        // Not yet due just before the half period …
        assert!(s.poll(t0 + Duration::from_millis(749)).is_empty());
        // … due at it.
        let ev = s.poll(t0 + Duration::from_millis(750));
        assert_eq!(ev, [PulseEvent::PulseOff]);
    }

    #[test]
    fn stale_pulse_off_still_clears_after_restart() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);
        let ev = s.poll(t0 + Duration::from_millis(500));
        assert_eq!(beats_only(&ev).len(), 1);

        // Restart before the pulse-off fires; the pending clear survives.
        s.restart(60, t0 + Duration::from_millis(600));
        let ev = s.poll(t0 + Duration::from_millis(800));
        assert_eq!(ev, [PulseEvent::PulseOff]);
    }

    #[test]
    fn stop_cancels_pending_pulse_off() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);
        s.poll(t0 + Duration::from_millis(500));
        s.stop();
        assert!(s.poll(t0 + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn every_arming_transition_bumps_the_generation() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        let g0 = s.generation();
        s.start(120, AccentPattern::Four, t0);
        let g1 = s.generation();
        s.restart(90, t0);
        let g2 = s.generation();
        s.stop();
        let g3 = s.generation();
        assert!(g0 < g1 && g1 < g2 && g2 < g3);
    }

    #[test]
    fn ticks_carry_the_current_generation() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);
        let ticks = run_ticks(&mut s, t0, 2);
        assert!(ticks.iter().all(|t| t.generation == s.generation()));
    }

    #[test]
    fn stalled_poll_catches_up_one_beat_per_period() {
        let t0 = Instant::now();
        let mut s = BeatScheduler::new();
        s.start(120, AccentPattern::Four, t0);
        // Wake up 2.1 s late: beats at 0.5/1.0/1.5/2.0 are all due.
        let ticks = beats_only(&s.poll(t0 + Duration::from_millis(2100)));
        assert_eq!(ticks.len(), 4);
        let indices: Vec<usize> = ticks.iter().map(|t| t.beat_index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn bpm_is_clamped_to_the_valid_range() {
        assert_eq!(period_for(0), period_for(BPM_MIN));
        assert_eq!(period_for(10_000), period_for(BPM_MAX));
        assert_eq!(period_for(60), Duration::from_secs(1));
    }
}
