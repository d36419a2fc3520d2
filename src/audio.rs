use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::tone::{render_click, ClickKind, ClickStyle};

/// Rate the click buffers are rendered at before the output device reports
/// its real rate.
pub const FALLBACK_SAMPLE_RATE: u32 = 44_100;

// ── Click player ──────────────────────────────────────────────────────────────

struct StyleBank {
    tap:    Arc<[f32]>,
    accent: Arc<[f32]>,
}

struct Voice {
    buffer: Arc<[f32]>,
    pos:    usize,
}

/// Pre-rendered tap/accent buffers per style, and a single playback voice.
/// `play` retriggers immediately, cutting off any sound in flight; the voice
/// keeps its own handle on the buffer, so a style swap never touches a sound
/// already playing.
pub struct ClickPlayer {
    banks: Vec<StyleBank>, // parallel to ClickStyle::ALL
    style: ClickStyle,
    voice: Option<Voice>,
}

impl ClickPlayer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            banks: render_banks(sample_rate),
            style: ClickStyle::Classic,
            voice: None,
        }
    }

    /// Re-render every bank at the device's actual rate.  Called once, before
    /// the stream starts pulling samples.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.banks = render_banks(sample_rate);
    }

    pub fn style(&self) -> ClickStyle { self.style }

    /// Swaps which buffers later `play` calls use.  A sound already in flight
    /// finishes from the buffer it started with.
    pub fn set_style(&mut self, style: ClickStyle) {
        self.style = style;
    }

    /// Fire-and-forget trigger: restarts the voice at sample 0, interrupting
    /// whatever was playing.  An empty buffer plays as silence.
    pub fn play(&mut self, kind: ClickKind) {
        let bank = &self.banks[self.style.index()];
        let buffer = match kind {
            ClickKind::Tap    => Arc::clone(&bank.tap),
            ClickKind::Accent => Arc::clone(&bank.accent),
        };
        self.voice = Some(Voice { buffer, pos: 0 });
    }

    /// Next mono output sample; 0.0 while idle.
    pub fn next_sample(&mut self) -> f32 {
        let Some(v) = self.voice.as_mut() else { return 0.0 };
        let Some(&sample) = v.buffer.get(v.pos) else {
            self.voice = None;
            return 0.0;
        };
        v.pos += 1;
        if v.pos >= v.buffer.len() {
            self.voice = None;
        }
        sample
    }
}

fn render_banks(sample_rate: u32) -> Vec<StyleBank> {
    ClickStyle::ALL
        .iter()
        .map(|style| {
            let p = style.params();
            StyleBank {
                tap:    render_click(p.tap_freq, p.tap_amp, p.tap_dur, sample_rate).into(),
                accent: render_click(p.accent_freq, p.accent_amp, p.accent_dur, sample_rate).into(),
            }
        })
        .collect()
}

// ── Audio engine ──────────────────────────────────────────────────────────────

/// Owns the cpal output stream for the lifetime of the app.  The stream
/// callback pulls mono samples from the shared `ClickPlayer` and fans them
/// out to every channel.
pub struct AudioEngine {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl AudioEngine {
    pub fn new(player: Arc<Mutex<ClickPlayer>>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no default output device"))?;
        let config = device
            .default_output_config()
            .context("querying default output config")?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(anyhow!("unsupported sample format {:?}", config.sample_format()));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        player.lock().unwrap().set_sample_rate(sample_rate);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let mut player = player.lock().unwrap();
                    for frame in data.chunks_mut(channels) {
                        let s = player.next_sample();
                        for out in frame.iter_mut() {
                            *out = s;
                        }
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .context("building output stream")?;
        stream.play().context("starting output stream")?;

        log::debug!("audio engine up: {sample_rate} Hz, {channels} ch");
        Ok(Self { _stream: stream, sample_rate })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
