//! Control-side context owning the organ model, both channels and the retune worker.
//!
//! # Example
//!
//! ```ignore
//! use aeolus_core::prelude::*;
//!
//! let mut organ = OrganContext::builder()
//!     .definition(definition)
//!     .build()?;
//! let audio = organ.take_audio(my_renderer).unwrap();
//! // hand `audio` to the audio callback, then from the UI thread:
//! organ.activate_stop(0, 1)?;
//! organ.poll_notifications();
//! ```

use crate::channel::{command_channel, notification_channel, Command, CommandProducer, NotificationInbox};
use crate::config::OrganConfig;
use crate::dispatch::AudioDispatcher;
use crate::listener::{ListenerRegistry, OrganListener};
use crate::model::{OrganDefinition, OrganModel, StopPhase, MAX_RANKS_PER_STOP};
use crate::render::{OrganAudio, Renderer};
use crate::retune::{RetuneCoordinator, RetuneRequest};
use crate::{Error, Result};
use aeolus_midi::{note_queue_with_capacity, NoteInput, RouteToggle, MIDI_CHANNELS};
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`OrganContext`].
#[derive(Debug, Default)]
pub struct OrganContextBuilder {
    definition: Option<OrganDefinition>,
    config: OrganConfig,
}

impl OrganContextBuilder {
    pub fn definition(mut self, definition: OrganDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn config(mut self, config: OrganConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Validate everything, then start the retune worker and queue the initial
    /// wavetable computation. No command is accepted before this succeeds.
    pub fn build(self) -> Result<OrganContext> {
        let definition = self
            .definition
            .ok_or_else(|| Error::InvalidDefinition("no organ definition provided".into()))?;
        let config = self.config;
        config.validate()?;

        let model = Arc::new(OrganModel::new(definition)?);
        let (commands, command_rx) = command_channel(config.command_capacity);
        let (engine_tx, engine_rx) = notification_channel(config.notification_capacity);
        let (retune_tx, retune_rx) = notification_channel(config.notification_capacity);
        let (note_input, note_rx) = note_queue_with_capacity(config.note_capacity);

        let coordinator = RetuneCoordinator::spawn(
            Arc::clone(&model),
            retune_tx,
            config.command_capacity,
            config.sample_rate,
            config.wavetable_length,
        )?;
        let dispatcher =
            AudioDispatcher::new(Arc::clone(&model), command_rx, note_rx, engine_tx, &config);

        let initial = model.definition();
        let last_retune = (initial.initial_temperament, initial.base_frequency);
        info!(
            organ = model.name(),
            divisions = model.division_count(),
            sample_rate = config.sample_rate,
            "Organ context ready"
        );

        Ok(OrganContext {
            model,
            commands,
            inbox: NotificationInbox::new(engine_rx, retune_rx),
            listeners: ListenerRegistry::new(),
            coordinator,
            dispatcher: Some(dispatcher),
            note_input: Some(note_input),
            last_retune,
            shutdown_requested: false,
        })
    }
}

/// Explicit context for one organ instance.
///
/// Lives on the control thread. Every mutating operation is fire-and-forget:
/// it validates, enqueues and returns; confirmation arrives later through
/// [`OrganContext::poll_notifications`].
pub struct OrganContext {
    model: Arc<OrganModel>,
    commands: CommandProducer,
    inbox: NotificationInbox,
    listeners: ListenerRegistry,
    coordinator: RetuneCoordinator,
    dispatcher: Option<AudioDispatcher>,
    note_input: Option<NoteInput>,
    /// Most recently accepted (temperament, base frequency).
    last_retune: (usize, f32),
    shutdown_requested: bool,
}

impl OrganContext {
    pub fn builder() -> OrganContextBuilder {
        OrganContextBuilder::default()
    }

    #[inline]
    pub fn model(&self) -> &Arc<OrganModel> {
        &self.model
    }

    /// Take the audio-thread half. Returns `None` after the first call.
    pub fn take_dispatcher(&mut self) -> Option<AudioDispatcher> {
        self.dispatcher.take()
    }

    /// Take the audio-thread half paired with a renderer.
    pub fn take_audio(&mut self, renderer: impl Renderer + 'static) -> Option<OrganAudio> {
        self.take_dispatcher()
            .map(|dispatcher| OrganAudio::new(dispatcher, renderer))
    }

    /// Take the MIDI ingestion half. Returns `None` after the first call.
    pub fn take_note_input(&mut self) -> Option<NoteInput> {
        self.note_input.take()
    }

    // Topology and state queries.

    pub fn organ_name(&self) -> &str {
        self.model.name()
    }

    pub fn is_initializing(&self) -> bool {
        !self.model.is_loaded()
    }

    pub fn division_count(&self) -> usize {
        self.model.division_count()
    }

    pub fn division_label(&self, division: usize) -> Option<&str> {
        self.model.division_label(division)
    }

    pub fn stop_count(&self, division: usize) -> usize {
        self.model.stop_count(division)
    }

    pub fn stop_label(&self, division: usize, stop: usize) -> Option<&str> {
        self.model.stop_label(division, stop)
    }

    pub fn stop_activated(&self, division: usize, stop: usize) -> bool {
        self.model.stop_activated(division, stop)
    }

    pub fn stop_phase(&self, division: usize, stop: usize) -> Option<StopPhase> {
        self.model.stop_phase(division, stop)
    }

    pub fn max_ranks_per_stop(&self) -> usize {
        MAX_RANKS_PER_STOP
    }

    pub fn has_tremulant(&self, division: usize) -> bool {
        self.model.has_tremulant(division)
    }

    pub fn tremulant_is_active(&self, division: usize) -> bool {
        self.model.tremulant_is_active(division)
    }

    pub fn division_volume(&self, division: usize) -> Option<f32> {
        self.model.division_volume(division)
    }

    pub fn midi_channel_count(&self) -> usize {
        MIDI_CHANNELS
    }

    /// Routing mask bits for `channel`; 0 for channels out of range.
    pub fn query_midi_map(&self, channel: u8) -> u8 {
        self.model.query_midi_map(channel).bits()
    }

    pub fn tuning_count(&self) -> usize {
        self.model.definition().tunings.len()
    }

    pub fn tuning_label(&self, index: usize) -> Option<&str> {
        self.model.definition().tunings.label(index)
    }

    /// Temperament of the published wavetables.
    pub fn current_tuning(&self) -> usize {
        self.published_tuning().0
    }

    /// Base frequency of the published wavetables.
    pub fn base_frequency(&self) -> f32 {
        self.published_tuning().1
    }

    fn published_tuning(&self) -> (usize, f32) {
        match self.model.wavetables() {
            Some(set) => (set.temperament(), set.base_frequency()),
            None => {
                let def = self.model.definition();
                (def.initial_temperament, def.base_frequency)
            }
        }
    }

    pub fn is_retuning(&self) -> bool {
        self.model.is_retuning()
    }

    // Commands.

    pub fn activate_stop(&mut self, division: usize, stop: usize) -> Result<()> {
        self.ensure_running()?;
        let id = self.model.check_stop(division, stop)?;
        self.submit(Command::ActivateStop(id))?;
        self.model.divisions[division].stops[stop].target.set(true);
        Ok(())
    }

    pub fn deactivate_stop(&mut self, division: usize, stop: usize) -> Result<()> {
        self.ensure_running()?;
        let id = self.model.check_stop(division, stop)?;
        self.submit(Command::DeactivateStop(id))?;
        self.model.divisions[division].stops[stop].target.set(false);
        Ok(())
    }

    /// Flip a division's tremulant. A division without one is left alone.
    pub fn toggle_tremulant(&mut self, division: usize) -> Result<()> {
        self.ensure_running()?;
        let division = self.model.check_division(division)?;
        if !self.model.has_tremulant(division as usize) {
            debug!(division, "Division has no tremulant; toggle ignored");
            return Ok(());
        }
        self.submit(Command::ToggleTremulant { division })
    }

    pub fn set_division_volume(&mut self, division: usize, gain: f32) -> Result<()> {
        self.ensure_running()?;
        let division = self.model.check_division(division)?;
        if !gain.is_finite() || gain < 0.0 {
            return Err(Error::InvalidGain(gain));
        }
        self.submit(Command::SetDivisionVolume { division, gain })
    }

    /// Route (or unroute) `channel` to `division`.
    ///
    /// Divisions outside the 4-bit mask are rejected before anything is queued,
    /// as are divisions the instrument does not have.
    pub fn set_midi_mapping(&mut self, division: u8, channel: u8, enabled: bool) -> Result<()> {
        self.ensure_running()?;
        let toggle = RouteToggle::new(division, channel, enabled)?;
        self.model.check_division(division as usize)?;
        self.submit(Command::SetMidiMapping(toggle))
    }

    /// Retune to `temperament` at `base_frequency` Hz.
    ///
    /// Repeating the most recently accepted parameters is a no-op. A newer
    /// request supersedes any that are still pending.
    pub fn retune(&mut self, temperament: usize, base_frequency: f32) -> Result<()> {
        self.ensure_running()?;
        if temperament >= self.tuning_count() {
            return Err(Error::InvalidTemperament(temperament));
        }
        if !base_frequency.is_finite() || base_frequency <= 0.0 {
            return Err(Error::InvalidFrequency(base_frequency));
        }
        if self.last_retune == (temperament, base_frequency) {
            debug!(temperament, base_frequency, "Retune matches latest request");
            return Ok(());
        }

        let id = self.model.retune.next_id();
        self.model.retune.accept(id);
        let request = RetuneRequest {
            id,
            temperament,
            base_frequency,
        };
        if let Err(err) = self.coordinator.submit(request) {
            self.model.retune.withdraw(id);
            debug!(?request, %err, "Retune rejected");
            return Err(err);
        }
        self.last_retune = (temperament, base_frequency);
        debug!(id, temperament, base_frequency, "Retune accepted");
        Ok(())
    }

    /// Retune keeping the most recently requested base frequency.
    pub fn retune_to(&mut self, temperament: usize) -> Result<()> {
        self.retune(temperament, self.last_retune.1)
    }

    /// Hold retune computation. Requests keep coalescing while paused.
    pub fn pause_retuning(&mut self) -> Result<()> {
        self.coordinator.pause()
    }

    pub fn resume_retuning(&mut self) -> Result<()> {
        self.coordinator.resume()
    }

    pub fn retuning_paused(&self) -> bool {
        self.coordinator.is_paused()
    }

    // Notifications.

    pub fn set_updater(&mut self, updater: Option<Box<dyn OrganListener>>) {
        self.listeners.set_updater(updater);
    }

    /// Drain every queued notification into the registered listener.
    /// Returns the number drained.
    pub fn poll_notifications(&mut self) -> usize {
        let listeners = &mut self.listeners;
        self.inbox.drain(|notification| listeners.dispatch(notification))
    }

    pub fn has_pending_notifications(&self) -> bool {
        self.inbox.has_pending()
    }

    // Shutdown.

    /// Ask the audio thread to halt. Acknowledged through [`Self::is_shut_down`].
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shutdown_requested {
            return Ok(());
        }
        self.commands.push(Command::Shutdown)?;
        self.shutdown_requested = true;
        info!(organ = self.model.name(), "Shutdown requested");
        Ok(())
    }

    /// True once the audio thread has drained `Shutdown`.
    pub fn is_shut_down(&self) -> bool {
        self.model.is_halted()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shutdown_requested {
            return Err(Error::ShutDown);
        }
        Ok(())
    }

    fn submit(&mut self, command: Command) -> Result<()> {
        let result = self.commands.push(command);
        if let Err(err) = &result {
            debug!(?command, %err, "Command rejected");
        }
        result
    }
}

impl std::fmt::Debug for OrganContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganContext")
            .field("model", &self.model)
            .field("listeners", &self.listeners)
            .field("shutdown_requested", &self.shutdown_requested)
            .finish()
    }
}
