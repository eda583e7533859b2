//! Test helpers and fixtures for Aeolus integration tests
//!
//! [`TestOrgan`] wires a context to a manually clocked audio side: every
//! [`TestOrgan::cycle`] renders one buffer and then drains notifications into
//! a [`Recorder`], the same order a host's audio callback and UI timer would
//! interleave them.
//!
//! ## Tolerance Levels
//!
//! - `FLOAT_EPSILON` (1e-6): Exact values (stored gains)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)
//! - `AUDIBLE_RMS` (0.001): A sounding division

pub mod tolerances;
pub use tolerances::*;

use aeolus::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

pub const TEST_CHANNELS: usize = 2;

/// Upper bound on waiting for the retune worker.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Three-division instrument used by most tests.
///
/// | division | label | tremulant | stops | channel |
/// |----------|-------|-----------|-------|---------|
/// | 0        | Great | no        | 3     | 0       |
/// | 1        | Swell | yes       | 2     | 1       |
/// | 2        | Pedal | no        | 1     | 2       |
pub fn test_definition() -> OrganDefinition {
    OrganDefinition::new("Test organ")
        .division(
            DivisionDefinition::new("Great")
                .stop(StopDefinition::new("Principal 8").rank(0))
                .stop(StopDefinition::new("Octave 4").rank(1))
                .stop(
                    StopDefinition::new("Mixture III")
                        .rank(2)
                        .rank(3)
                        .rank(4),
                ),
        )
        .division(
            DivisionDefinition::new("Swell")
                .with_tremulant()
                .stop(StopDefinition::new("Gedackt 8").rank(5))
                .stop(StopDefinition::new("Oboe 8").rank(6)),
        )
        .division(DivisionDefinition::new("Pedal").stop(StopDefinition::new("Subbass 16").rank(7)))
        .route(0, route(&[0]))
        .route(1, route(&[1]))
        .route(2, route(&[2]))
}

/// Mask routing to each listed division.
pub fn route(divisions: &[u8]) -> DivisionMask {
    divisions
        .iter()
        .try_fold(DivisionMask::EMPTY, |mask, &d| mask.with(d))
        .expect("division outside the routable range")
}

/// Plain wavetable oscillator bank, one phase accumulator per division and key.
pub struct WavetableRenderer {
    phases: Vec<[f32; 128]>,
}

impl WavetableRenderer {
    pub fn new(divisions: usize) -> Self {
        Self {
            phases: vec![[0.0; 128]; divisions],
        }
    }
}

impl Renderer for WavetableRenderer {
    fn render(&mut self, view: &RenderView<'_>, output: &mut [f32]) {
        let Some(set) = view.wavetables else {
            return;
        };
        let frames = view.frames(output.len());
        let sample_rate = view.sample_rate as f32;

        for (voice, phases) in view.divisions.iter().zip(self.phases.iter_mut()) {
            let level = voice.registration_level() * voice.gain();
            if level <= 0.0 {
                continue;
            }
            for key in voice.keys().iter() {
                let Some(table) = set.note(key) else {
                    continue;
                };
                let phase = &mut phases[key as usize];
                let step = table.frequency / sample_rate;
                for frame in output.chunks_mut(view.channels).take(frames) {
                    let sample = table.sample_at(*phase) * level * 0.1;
                    frame.iter_mut().for_each(|out| *out += sample);
                    *phase = (*phase + step).fract();
                }
            }
        }
    }
}

/// Records every notification delivered to the registered listener.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Notification>>>,
}

struct RecordingListener {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl OrganListener for RecordingListener {
    fn on_active_stops_changed(&mut self) {
        self.events.lock().push(Notification::StopsUpdated);
    }

    fn on_load_complete(&mut self) {
        self.events.lock().push(Notification::LoadComplete);
    }

    fn on_retuned(&mut self) {
        self.events.lock().push(Notification::Retuned);
    }
}

impl Recorder {
    pub fn listener(&self) -> Box<dyn OrganListener> {
        Box::new(RecordingListener {
            events: Arc::clone(&self.events),
        })
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: Notification) -> usize {
        self.events.lock().iter().filter(|&&n| n == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Context plus a manually clocked audio side.
pub struct TestOrgan {
    pub organ: OrganContext,
    pub audio: OrganAudio,
    pub notes: NoteInput,
    pub recorder: Recorder,
    buffer: Vec<f32>,
}

impl TestOrgan {
    pub fn new() -> Self {
        Self::with_definition(test_definition())
    }

    pub fn with_definition(definition: OrganDefinition) -> Self {
        Self::with_config(
            definition,
            OrganConfig::default().with_sample_rate(TEST_SAMPLE_RATE),
        )
    }

    pub fn with_config(definition: OrganDefinition, config: OrganConfig) -> Self {
        init_tracing();
        let mut organ = OrganContext::builder()
            .definition(definition)
            .config(config)
            .build()
            .expect("Failed to create test organ");
        let renderer = WavetableRenderer::new(organ.division_count());
        let audio = organ.take_audio(renderer).expect("audio half already taken");
        let notes = organ.take_note_input().expect("note input already taken");
        let recorder = Recorder::default();
        organ.set_updater(Some(recorder.listener()));

        Self {
            organ,
            audio,
            notes,
            recorder,
            buffer: vec![0.0; TEST_BUFFER_SIZE * TEST_CHANNELS],
        }
    }

    /// Built and loaded: the initial wavetables are published and announced.
    pub fn loaded() -> Self {
        let mut organ = Self::new();
        organ.wait_loaded();
        organ
    }

    /// One audio cycle followed by one notification poll.
    pub fn cycle(&mut self) -> CycleReport {
        let report = self.audio.fill_buffer(&mut self.buffer, TEST_CHANNELS);
        self.organ.poll_notifications();
        report
    }

    pub fn cycles(&mut self, count: usize) {
        for _ in 0..count {
            self.cycle();
        }
    }

    /// Cycle until `done` holds. Returns false on timeout.
    pub fn wait_until(&mut self, mut done: impl FnMut(&Self) -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < WAIT_TIMEOUT {
            self.cycle();
            if done(&*self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    pub fn wait_loaded(&mut self) {
        assert!(
            self.wait_until(|t| t.recorder.count(Notification::LoadComplete) == 1),
            "initial wavetables were never published"
        );
    }

    /// Interleaved output of the last cycle.
    pub fn output(&self) -> &[f32] {
        &self.buffer
    }
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}
