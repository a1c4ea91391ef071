/// Sound engine: procedural 8-bit style cues via rodio.
///
/// Four cues, generated as in-memory WAV buffers at start-up:
///   jump      rising chirp
///   pickup    coin arpeggio (coins, keys and doors share it)
///   game over descending tones (death)
///   clear     fanfare (level finished, game finished)
///
/// Playback is fire-and-forget via a detached rodio Sink.
/// Without the "sound" feature the engine is a no-op stub.

use std::f32::consts::TAU;

const SAMPLE_RATE: u32 = 22050;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{gen_clear, gen_game_over, gen_jump, gen_pickup, make_wav};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_pickup: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, running silent: {}", e);
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_pickup: Arc::new(make_wav(&gen_pickup())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::debug!("sink unavailable: {}", e);
                    return;
                }
            };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_pickup(&self) { self.play(&self.sfx_pickup); }
        pub fn play_game_over(&self) { self.play(&self.sfx_game_over); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: mono f32 samples in [-1, 1]
// ════════════════════════════════════════════════════════════

/// One note: sine plus a touch of the given harmonic, decaying envelope.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn note(samples: &mut Vec<f32>, freq: f32, duration: f32, harmonic: f32, volume: f32) {
    let n = (SAMPLE_RATE as f32 * duration) as usize;
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let env = 1.0 - (i as f32 / n as f32).powf(0.5);
        let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * harmonic * TAU).sin() * 0.3;
        samples.push(wave * env * volume);
    }
}

/// Jump: quick upward sweep, 300Hz → 900Hz
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_jump() -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * 0.12) as usize;
    let mut phase = 0.0_f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let freq = 300.0 + t * 600.0;
            phase += freq * TAU / SAMPLE_RATE as f32;
            // Square wave for the chirp
            let wave = if phase.sin() >= 0.0 { 1.0 } else { -1.0 };
            wave * (1.0 - t) * 0.15
        })
        .collect()
}

/// Pickup: B5 → E6, the classic coin
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_pickup() -> Vec<f32> {
    let mut samples = Vec::new();
    note(&mut samples, 988.0, 0.05, 3.0, 0.25);
    note(&mut samples, 1319.0, 0.14, 3.0, 0.25);
    samples
}

/// Game over: A4 → F#4 → Eb4 → C4 with a final fade
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_game_over() -> Vec<f32> {
    let mut samples = Vec::new();
    for freq in [440.0_f32, 370.0, 311.0, 261.0] {
        note(&mut samples, freq, 0.12, 2.0, 0.3);
    }
    let total = samples.len();
    let fade_len = total / 4;
    for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
        *s *= (fade_len - k) as f32 / fade_len as f32;
    }
    samples
}

/// Clear: C5 → E5 → G5 → C6, last note held
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_clear() -> Vec<f32> {
    let mut samples = Vec::new();
    for freq in [523.0_f32, 659.0, 784.0] {
        note(&mut samples, freq, 0.1, 2.0, 0.3);
    }
    note(&mut samples, 1047.0, 0.35, 2.0, 0.3);
    samples
}

// ════════════════════════════════════════════════════════════
//  WAV encoder: 16-bit mono PCM
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * num_channels as u32 * bits_per_sample as u32 / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self) {}
    pub fn play_pickup(&self) {}
    pub fn play_game_over(&self) {}
    pub fn play_clear(&self) {}
}
