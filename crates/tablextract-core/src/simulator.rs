//! Scripted processing runs.
//!
//! A [`SimulationRun`] walks a [`PipelineScript`] one step per tick and
//! reports to a [`ProgressSink`]. It does no real work and cannot fail.
//! [`spawn`] drives a run on a worker thread at a fixed interval and hands
//! back a [`SimulationHandle`] for cancellation.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::fixtures::schema::PipelineScript;
use crate::model::{ProcessingState, StageStatus};

/// Receives the progress of a run.
pub trait ProgressSink {
    /// Called once per applied step with a copy of the full state.
    fn on_update(&mut self, state: &ProcessingState);

    /// Called exactly once, after the last step has been delivered.
    fn on_complete(&mut self);
}

/// Adapts a pair of closures to [`ProgressSink`].
pub struct Callbacks<U, C> {
    on_update: U,
    on_complete: C,
}

impl<U, C> Callbacks<U, C>
where
    U: FnMut(&ProcessingState),
    C: FnMut(),
{
    pub fn new(on_update: U, on_complete: C) -> Self {
        Callbacks {
            on_update,
            on_complete,
        }
    }
}

impl<U, C> ProgressSink for Callbacks<U, C>
where
    U: FnMut(&ProcessingState),
    C: FnMut(),
{
    fn on_update(&mut self, state: &ProcessingState) {
        (self.on_update)(state)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Running,
    Completed,
    Cancelled,
}

/// One pass over a pipeline script. `phase` is the only done flag.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    script: PipelineScript,
    state: ProcessingState,
    next_step: usize,
    phase: RunPhase,
}

impl SimulationRun {
    pub fn new(script: PipelineScript) -> Self {
        let state = script.initial_state();
        SimulationRun {
            script,
            state,
            next_step: 0,
            phase: RunPhase::Running,
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Apply the next step. The completion is delivered in the same tick as
    /// the final step. Returns whether the run is still going afterwards.
    pub fn tick(&mut self, sink: &mut dyn ProgressSink) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }

        let Some(step) = self.script.steps.get(self.next_step) else {
            self.finish(sink);
            return false;
        };

        self.state.progress = step.progress;
        self.state.pages_scanned = step.pages_scanned;
        self.state.tables_found = step.tables_found;
        self.state.estimated_remaining = step.estimated_remaining.clone();

        let active = step.stage_index;
        for (i, (stage, def)) in self
            .state
            .stages
            .iter_mut()
            .zip(&self.script.stages)
            .enumerate()
        {
            stage.status = StageStatus::for_index(i, active);
            if i == active {
                if let Some(detail) = &def.active_detail {
                    stage.detail = Some(detail.clone());
                }
            }
        }

        self.next_step += 1;
        log::debug!(
            "tick {}/{}: {}% stage {} pages {} tables {}",
            self.next_step,
            self.script.steps.len(),
            self.state.progress,
            active,
            self.state.pages_scanned,
            self.state.tables_found
        );
        sink.on_update(&self.state);

        if self.next_step >= self.script.steps.len() {
            self.finish(sink);
            return false;
        }
        true
    }

    /// Stop the run. Updates already delivered stay delivered. Returns
    /// whether the run was still going.
    pub fn cancel(&mut self) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        self.phase = RunPhase::Cancelled;
        log::info!(
            "processing run cancelled after {} of {} steps",
            self.next_step,
            self.script.steps.len()
        );
        true
    }

    fn finish(&mut self, sink: &mut dyn ProgressSink) {
        self.phase = RunPhase::Completed;
        log::info!("processing run completed");
        sink.on_complete();
    }
}

/// Handle to a run on a worker thread.
///
/// Dropping the handle detaches the run; it keeps ticking to completion.
pub struct SimulationHandle {
    run: Arc<Mutex<SimulationRun>>,
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    /// Stop future ticks and suppress the completion. A tick that already
    /// holds the run finishes first. Returns whether the run was stopped.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        // The worker may have exited already; nothing to wake then.
        let _ = self.stop.send(());
        cancelled
    }

    pub fn phase(&self) -> RunPhase {
        self.run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .phase()
    }

    pub fn state(&self) -> ProcessingState {
        self.run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
            .clone()
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) -> RunPhase {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("simulation worker panicked");
            }
        }
        self.phase()
    }
}

/// Start a run on a worker thread that ticks every `interval`.
pub fn spawn<S>(script: PipelineScript, interval: Duration, mut sink: S) -> SimulationHandle
where
    S: ProgressSink + Send + 'static,
{
    let run = Arc::new(Mutex::new(SimulationRun::new(script)));
    let (stop, stopped) = mpsc::channel::<()>();

    let worker_run = Arc::clone(&run);
    let thread = std::thread::spawn(move || loop {
        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let mut run = worker_run.lock().unwrap_or_else(PoisonError::into_inner);
                if !run.tick(&mut sink) {
                    break;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let run = worker_run.lock().unwrap_or_else(PoisonError::into_inner);
                if !run.is_running() {
                    break;
                }
                // Handle dropped without cancelling: keep ticking unattended.
                drop(run);
                if !tick_detached(&worker_run, &mut sink, interval) {
                    break;
                }
            }
        }
    });

    SimulationHandle {
        run,
        stop,
        thread: Some(thread),
    }
}

fn tick_detached<S: ProgressSink>(
    run: &Arc<Mutex<SimulationRun>>,
    sink: &mut S,
    interval: Duration,
) -> bool {
    loop {
        std::thread::sleep(interval);
        let mut run = run.lock().unwrap_or_else(PoisonError::into_inner);
        if !run.tick(sink) {
            return false;
        }
    }
}
