//! Audio callback boundary.
//!
//! The host's buffer-driven loop calls [`OrganAudio::fill_buffer`] once per
//! cycle. The wavetable handle is loaded exactly once at the top of the cycle,
//! so a retune published mid-cycle is only picked up by the next one.

use crate::dispatch::{AudioDispatcher, CycleReport, DivisionVoice};
use crate::retune::WavetableSet;

/// Everything a synthesis engine may read while rendering one cycle.
pub struct RenderView<'a> {
    pub sample_rate: f64,
    pub channels: usize,
    /// `None` until the initial wavetables have been published.
    pub wavetables: Option<&'a WavetableSet>,
    pub divisions: &'a [DivisionVoice],
}

impl RenderView<'_> {
    /// Frames in an interleaved buffer of `len` samples.
    #[inline]
    pub fn frames(&self, len: usize) -> usize {
        len / self.channels.max(1)
    }
}

/// Synthesis engine plugged into the callback boundary.
///
/// `output` is interleaved and zeroed before the call. Implementations run on
/// the audio thread and must not block or allocate.
pub trait Renderer: Send {
    fn render(&mut self, view: &RenderView<'_>, output: &mut [f32]);
}

impl<F> Renderer for F
where
    F: FnMut(&RenderView<'_>, &mut [f32]) + Send,
{
    fn render(&mut self, view: &RenderView<'_>, output: &mut [f32]) {
        self(view, output)
    }
}

/// Dispatcher and renderer paired for one audio callback.
pub struct OrganAudio {
    dispatcher: AudioDispatcher,
    renderer: Box<dyn Renderer>,
}

impl OrganAudio {
    pub fn new(dispatcher: AudioDispatcher, renderer: impl Renderer + 'static) -> Self {
        Self {
            dispatcher,
            renderer: Box::new(renderer),
        }
    }

    #[inline]
    pub fn dispatcher(&self) -> &AudioDispatcher {
        &self.dispatcher
    }

    /// Run one render cycle into an interleaved buffer.
    pub fn fill_buffer(&mut self, output: &mut [f32], channels: usize) -> CycleReport {
        let channels = channels.max(1);
        let frames = output.len() / channels;

        let model = std::sync::Arc::clone(self.dispatcher.model());
        let tables = model.wavetables.load();
        let report = self.dispatcher.run_cycle(frames, tables.is_some());

        output.fill(0.0);
        if report.halted {
            return report;
        }

        let view = RenderView {
            sample_rate: self.dispatcher.sample_rate(),
            channels,
            wavetables: tables.as_deref(),
            divisions: self.dispatcher.voices(),
        };
        self.renderer.render(&view, output);
        report
    }
}
