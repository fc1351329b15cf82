//! Mock asynchronous flows
//!
//! A [`FlowMachine`] walks `idle → thinking → building → complete → idle` on
//! timers, standing in for a backend call that never happens. The login and
//! register flow uses the same machine without the `building` stage, and a
//! failed outcome returns straight from `thinking` to `idle`.
//!
//! Transitions for one run are scheduled on a single tokio task. Every
//! published state carries the run id it belongs to; a transition is only
//! applied while the current state still belongs to its run, so `reset()`
//! and a new `start()` suppress anything still pending from an older run.
//! The task itself is also aborted on reset, restart and drop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use appforge_core::prelude::*;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::FlowSettings;

// ─────────────────────────────────────────────────────────────────────────────
// States
// ─────────────────────────────────────────────────────────────────────────────

/// Visible stage of a mock flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowStage {
    #[default]
    Idle,
    Thinking,
    Building,
    Complete,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStage::Idle => write!(f, "idle"),
            FlowStage::Thinking => write!(f, "thinking"),
            FlowStage::Building => write!(f, "building"),
            FlowStage::Complete => write!(f, "complete"),
        }
    }
}

/// Result of a run: the payload, or a message for the user
pub type FlowOutcome<T> = std::result::Result<T, String>;

/// State published to observers
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState<T> {
    /// Run this state belongs to; `0` before the first run
    pub run: u64,
    pub stage: FlowStage,

    /// Set once the run reaches `complete` (success) or returns to `idle`
    /// with an error; kept after the final `idle`
    pub outcome: Option<FlowOutcome<T>>,
}

impl<T> FlowState<T> {
    fn idle(run: u64) -> Self {
        Self {
            run,
            stage: FlowStage::Idle,
            outcome: None,
        }
    }

    /// Whether the run has finished and returned to `idle`
    pub fn is_settled(&self) -> bool {
        self.stage == FlowStage::Idle
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Timings
// ─────────────────────────────────────────────────────────────────────────────

/// Delays between stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    pub thinking: Duration,

    /// `None` skips the `building` stage
    pub building: Option<Duration>,

    pub complete_linger: Duration,

    /// Upper bound of the random extra delay added to each stage
    pub jitter: Duration,
}

impl FlowTimings {
    /// Timings of the AI generation flow
    pub fn generation(settings: &FlowSettings) -> Self {
        Self {
            thinking: Duration::from_millis(settings.thinking_ms),
            building: Some(Duration::from_millis(settings.building_ms)),
            complete_linger: Duration::from_millis(settings.complete_linger_ms),
            jitter: Duration::from_millis(settings.jitter_ms),
        }
    }

    /// Timings of the login/register flow
    pub fn auth(settings: &FlowSettings) -> Self {
        Self {
            thinking: Duration::from_millis(settings.auth_ms),
            building: None,
            complete_linger: Duration::from_millis(settings.complete_linger_ms),
            jitter: Duration::from_millis(settings.jitter_ms),
        }
    }

    fn jittered(&self, base: Duration) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// One scheduled transition
#[derive(Debug, Clone, Copy)]
struct Step {
    delay: Duration,
    stage: FlowStage,
    publishes_outcome: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Machine
// ─────────────────────────────────────────────────────────────────────────────

/// Timer-driven state machine for one kind of interaction
pub struct FlowMachine<T> {
    name: &'static str,
    tx: Arc<watch::Sender<FlowState<T>>>,
    timings: FlowTimings,
    run: u64,
    task: Option<JoinHandle<()>>,
}

impl<T> fmt::Debug for FlowMachine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowMachine")
            .field("name", &self.name)
            .field("run", &self.run)
            .field("stage", &self.tx.borrow().stage)
            .finish()
    }
}

impl<T> FlowMachine<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, timings: FlowTimings) -> Self {
        let (tx, _rx) = watch::channel(FlowState::idle(0));
        Self {
            name,
            tx: Arc::new(tx),
            timings,
            run: 0,
            task: None,
        }
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<FlowState<T>> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> FlowState<T> {
        self.tx.borrow().clone()
    }

    pub fn stage(&self) -> FlowStage {
        self.tx.borrow().stage
    }

    /// Whether a run is in flight
    pub fn is_busy(&self) -> bool {
        self.stage() != FlowStage::Idle
    }

    /// Id of the most recent run
    pub fn current_run(&self) -> u64 {
        self.run
    }

    /// Begin a run that will end with `outcome`
    ///
    /// Any run still in flight is cancelled. Publishes `thinking`
    /// immediately and schedules the remaining transitions. Must be called
    /// from within a tokio runtime.
    pub fn start(&mut self, outcome: FlowOutcome<T>) -> u64 {
        self.cancel_task();
        self.run += 1;
        let run = self.run;
        let steps = self.plan(outcome.is_ok());

        self.tx.send_replace(FlowState {
            run,
            stage: FlowStage::Thinking,
            outcome: None,
        });
        debug!("{} flow run {} started", self.name, run);

        let tx = self.tx.clone();
        let name = self.name;
        self.task = Some(tokio::spawn(async move {
            for step in steps {
                tokio::time::sleep(step.delay).await;
                let applied = tx.send_if_modified(|state| {
                    if state.run != run {
                        return false;
                    }
                    state.stage = step.stage;
                    if step.publishes_outcome {
                        state.outcome = Some(outcome.clone());
                    }
                    true
                });
                if !applied {
                    debug!("{} flow run {} superseded, dropping transitions", name, run);
                    return;
                }
                trace!("{} flow run {} -> {}", name, run, step.stage);
            }
        }));
        run
    }

    /// Force the machine back to `idle`, dropping any pending transition
    pub fn reset(&mut self) {
        self.cancel_task();
        self.run += 1;
        let run = self.run;
        self.tx.send_modify(|state| *state = FlowState::idle(run));
        debug!("{} flow reset", self.name);
    }

    /// Wait until the most recent run returns to `idle` or is superseded
    pub async fn settled(&self) -> FlowState<T> {
        let run = self.run;
        let mut rx = self.tx.subscribe();
        let settled = match rx.wait_for(|state| state.run != run || state.is_settled()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    fn plan(&self, success: bool) -> Vec<Step> {
        let timings = &self.timings;
        let thinking = timings.jittered(timings.thinking);

        if !success {
            return vec![Step {
                delay: thinking,
                stage: FlowStage::Idle,
                publishes_outcome: true,
            }];
        }

        let mut steps = Vec::with_capacity(3);
        let mut delay = thinking;
        if let Some(building) = timings.building {
            steps.push(Step {
                delay,
                stage: FlowStage::Building,
                publishes_outcome: false,
            });
            delay = timings.jittered(building);
        }
        steps.push(Step {
            delay,
            stage: FlowStage::Complete,
            publishes_outcome: true,
        });
        steps.push(Step {
            delay: timings.complete_linger,
            stage: FlowStage::Idle,
            publishes_outcome: false,
        });
        steps
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for FlowMachine<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
