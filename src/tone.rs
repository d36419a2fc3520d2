use std::f32::consts::PI;

// ── Click kind ────────────────────────────────────────────────────────────────

/// Which of the two pre-rendered sounds a beat triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickKind { Tap, Accent }

// ── Click style ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickStyle { Classic, Soft, Sharp }

impl ClickStyle {
    pub const ALL: [ClickStyle; 3] = [ClickStyle::Classic, ClickStyle::Soft, ClickStyle::Sharp];

    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Soft    => "Soft",
            Self::Sharp   => "Sharp",
        }
    }

    pub fn index(self) -> usize { self as usize }

    /// Fixed synthesis parameters for this style.  Classic is the plain
    /// 1 kHz / 50 ms beep; Soft is duller and quieter, Sharp brighter and
    /// shorter.  The accent variant of each style is higher and louder.
    pub fn params(self) -> StyleParams {
        match self {
            Self::Classic => StyleParams {
                tap_freq: 1000.0, tap_amp: 0.50, tap_dur: 0.050,
                accent_freq: 1500.0, accent_amp: 0.60, accent_dur: 0.050,
            },
            Self::Soft => StyleParams {
                tap_freq: 800.0, tap_amp: 0.35, tap_dur: 0.040,
                accent_freq: 1100.0, accent_amp: 0.45, accent_dur: 0.050,
            },
            Self::Sharp => StyleParams {
                tap_freq: 2000.0, tap_amp: 0.60, tap_dur: 0.030,
                accent_freq: 2600.0, accent_amp: 0.70, accent_dur: 0.030,
            },
        }
    }
}

/// Per-style synthesis parameters: frequency (Hz), amplitude (0–1) and
/// duration (seconds) for the tap and accent sounds.
#[derive(Clone, Copy, Debug)]
pub struct StyleParams {
    pub tap_freq: f32,
    pub tap_amp:  f32,
    pub tap_dur:  f32,
    pub accent_freq: f32,
    pub accent_amp:  f32,
    pub accent_dur:  f32,
}

// ── Tone rendering ────────────────────────────────────────────────────────────

/// Render a mono sine click: `sample[i] = amp * sin(2π f i / sr)`.
/// No envelope is applied; the bare edges are part of the click.  A duration
/// that rounds to zero samples yields an empty (silent) buffer, not an error.
pub fn render_click(frequency: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let frames = (duration_secs * sample_rate as f32) as usize;
    let sr = sample_rate as f32;
    (0..frames)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sr).sin())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic() {
        let a = render_click(1000.0, 0.5, 0.05, 44_100);
        let b = render_click(1000.0, 0.5, 0.05, 44_100);
        assert_eq!(a.len(), 2205);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn render_matches_formula() {
        let buf = render_click(440.0, 0.8, 0.01, 48_000);
        assert_eq!(buf.len(), 480);
        assert_eq!(buf[0], 0.0);
        let expected = 0.8 * (2.0 * PI * 440.0 * 7.0 / 48_000.0).sin();
        assert_eq!(buf[7], expected);
    }

    #[test]
    fn zero_length_duration_yields_empty_buffer() {
        assert!(render_click(1000.0, 0.5, 0.0, 44_100).is_empty());
        assert!(render_click(1000.0, 0.5, 0.00001, 44_100).is_empty());
    }

    #[test]
    fn amplitude_bounds_hold() {
        let buf = render_click(1234.0, 0.6, 0.1, 44_100);
        assert!(buf.iter().all(|s| s.abs() <= 0.6 + f32::EPSILON));
    }

    #[test]
    fn every_style_has_positive_params() {
        for style in ClickStyle::ALL {
            let p = style.params();
            assert!(p.tap_freq > 0.0 && p.accent_freq > 0.0);
            assert!((0.0..=1.0).contains(&p.tap_amp) && (0.0..=1.0).contains(&p.accent_amp));
            assert!(p.tap_dur > 0.0 && p.accent_dur > 0.0);
        }
    }
}
