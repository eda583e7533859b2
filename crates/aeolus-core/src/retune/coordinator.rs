//! Retune worker thread.
//!
//! Recomputes wavetables off the audio thread and publishes each finished set
//! through the model's single `ArcSwapOption` handle. Requests coalesce
//! newest-wins: a request that has been overtaken by a newer accepted one is
//! skipped before computing and discarded after computing.

use super::wavetable::WavetableSet;
use crate::channel::{Notification, NotificationProducer};
use crate::lockfree::AtomicFlag;
use crate::model::OrganModel;
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A retune accepted by the control thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetuneRequest {
    /// Monotonic id; 0 is reserved for the initial load.
    pub id: u64,
    pub temperament: usize,
    pub base_frequency: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CoordinatorCommand {
    Retune(RetuneRequest),
    /// Hold computation; requests keep coalescing.
    Pause,
    Resume,
    Shutdown,
}

/// Handle to the retune worker. Dropping it stops and joins the thread.
pub struct RetuneCoordinator {
    command_tx: Sender<CoordinatorCommand>,
    thread_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicFlag>,
    paused: Arc<AtomicFlag>,
}

struct Worker {
    rx: Receiver<CoordinatorCommand>,
    model: Arc<OrganModel>,
    notifier: NotificationProducer,
    shutdown: Arc<AtomicFlag>,
    paused: Arc<AtomicFlag>,
    sample_rate: f64,
    table_length: usize,
}

impl RetuneCoordinator {
    /// Start the worker and queue the initial wavetable computation.
    pub(crate) fn spawn(
        model: Arc<OrganModel>,
        notifier: NotificationProducer,
        inbox_capacity: usize,
        sample_rate: f64,
        table_length: usize,
    ) -> Result<Self> {
        let (tx, rx) = bounded(inbox_capacity);
        let shutdown = Arc::new(AtomicFlag::new(false));
        let paused = Arc::new(AtomicFlag::new(false));

        let definition = model.definition();
        let initial = RetuneRequest {
            id: 0,
            temperament: definition.initial_temperament,
            base_frequency: definition.base_frequency,
        };
        tx.try_send(CoordinatorCommand::Retune(initial))
            .map_err(|e| Error::Worker(format!("failed to queue initial load: {e}")))?;

        let worker = Worker {
            rx,
            model,
            notifier,
            shutdown: Arc::clone(&shutdown),
            paused: Arc::clone(&paused),
            sample_rate,
            table_length,
        };
        let handle = thread::Builder::new()
            .name("aeolus-retune".into())
            .spawn(move || worker.run())
            .map_err(|e| Error::Worker(format!("failed to spawn retune thread: {e}")))?;

        Ok(Self {
            command_tx: tx,
            thread_handle: Some(handle),
            shutdown,
            paused,
        })
    }

    pub fn submit(&self, request: RetuneRequest) -> Result<()> {
        self.send(CoordinatorCommand::Retune(request))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(CoordinatorCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(CoordinatorCommand::Resume)
    }

    /// Whether the worker has processed a pause and not yet a resume.
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn send(&self, command: CoordinatorCommand) -> Result<()> {
        self.command_tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => Error::ChannelFull,
            TrySendError::Disconnected(_) => Error::ShutDown,
        })
    }

    pub fn stop(&mut self) {
        self.shutdown.set(true);
        let _ = self.command_tx.try_send(CoordinatorCommand::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Retune thread panicked");
            }
        }
    }
}

impl Drop for RetuneCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Worker {
    fn run(mut self) {
        let mut pending: Option<RetuneRequest> = None;
        let mut paused = false;

        loop {
            if self.shutdown.get() {
                break;
            }

            // Drain without blocking while there is work to do; otherwise wait.
            let next = if pending.is_some() && !paused {
                match self.rx.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match self.rx.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            };

            if let Some(command) = next {
                match command {
                    CoordinatorCommand::Retune(request) => {
                        if let Some(superseded) = pending.replace(request) {
                            debug!(
                                superseded = superseded.id,
                                by = request.id,
                                "Retune request coalesced"
                            );
                        }
                    }
                    CoordinatorCommand::Pause => {
                        paused = true;
                        self.paused.set(true);
                    }
                    CoordinatorCommand::Resume => {
                        paused = false;
                        self.paused.set(false);
                    }
                    CoordinatorCommand::Shutdown => break,
                }
                continue;
            }

            if let Some(request) = pending.take() {
                self.process(request);
            }
        }
        debug!("Retune thread exiting");
    }

    fn process(&mut self, request: RetuneRequest) {
        if self.is_stale(&request) {
            debug!(id = request.id, "Skipping stale retune request");
            return;
        }
        let Some(temperament) = self.model.definition().tunings.get(request.temperament) else {
            warn!(
                temperament = request.temperament,
                "Retune request names unknown temperament"
            );
            return;
        };

        let set = WavetableSet::compute(
            request.id,
            request.temperament,
            temperament,
            request.base_frequency,
            self.sample_rate,
            self.table_length,
        );

        // A newer request arrived while computing; its result is the one to publish.
        if self.is_stale(&request) {
            debug!(id = request.id, "Discarding superseded wavetables");
            return;
        }

        self.model.wavetables.store(Some(Arc::new(set)));
        info!(
            id = request.id,
            temperament = request.temperament,
            base_frequency = request.base_frequency,
            "Published wavetables"
        );

        // The initial load is not a retune. A retune overtaken after publication
        // leaves the announcement to its successor. `Retuned` is queued before
        // the request reads as complete.
        if request.id != 0 && request.id >= self.model.retune.latest() {
            self.announce(Notification::Retuned);
        }
        self.model.retune.complete(request.id);
    }

    fn is_stale(&self, request: &RetuneRequest) -> bool {
        request.id < self.model.retune.latest()
    }

    fn announce(&mut self, notification: Notification) {
        while !self.notifier.push(notification) {
            if self.shutdown.get() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
