//! Confirmation polling for submitted operations.
//!
//! The tracker owns at most one polling task. `track` stops whatever poll is
//! running before it spawns the next one and tells the previous caller its
//! operation was superseded. `cancel` asks the ledger to drop the most
//! recently tracked transaction. A stopped poll never delivers a ledger
//! result: the task checks its stop signal at every suspension point and the
//! final hand-off re-checks the poll generation under the state lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{LedgerError, TrackerError};
use crate::ledger::types::Transaction;
use crate::ledger::Ledger;
use crate::tx::operation::Operation;

pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Polling,
    Cancelling,
    Terminated,
}

/// Terminal result of a poll.
#[derive(Debug)]
pub enum PollOutcome {
    Confirmed(Transaction),
    Failed(LedgerError),
    /// A newer `track` call took over before the ledger settled this one.
    Superseded,
}

struct ActivePoll {
    generation: u64,
    stop: oneshot::Sender<()>,
    outcome: oneshot::Sender<PollOutcome>,
    task: JoinHandle<()>,
}

impl ActivePoll {
    /// Stops the task and drops the outcome sender, so the caller sees `None`.
    fn stop(self) {
        let _ = self.stop.send(());
    }

    fn supersede(self) {
        let _ = self.stop.send(());
        let _ = self.outcome.send(PollOutcome::Superseded);
    }
}

#[derive(Default)]
struct TrackerState {
    phase: Phase,
    current: Option<Operation>,
    active: Option<ActivePoll>,
    /// Bumped on every `track` and on a successful cancel.
    generation: u64,
}

/// Handle on one tracked operation.
pub struct TrackedPoll {
    operation: Operation,
    outcome: oneshot::Receiver<PollOutcome>,
}

impl TrackedPoll {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Waits for the terminal result. `None` once the poll has been
    /// cancelled or the tracker dropped.
    pub async fn outcome(self) -> Option<PollOutcome> {
        self.outcome.await.ok()
    }
}

pub struct OperationTracker {
    ledger: Arc<dyn Ledger>,
    confirmation_delay: Duration,
    state: Arc<Mutex<TrackerState>>,
}

fn lock(state: &Mutex<TrackerState>) -> MutexGuard<'_, TrackerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OperationTracker {
    pub fn new(ledger: Arc<dyn Ledger>, confirmation_delay: Duration) -> Self {
        Self {
            ledger,
            confirmation_delay,
            state: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    /// The most recently tracked operation, finished or not.
    pub fn current(&self) -> Option<Operation> {
        lock(&self.state).current.clone()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.state).active.is_some()
    }

    /// Start polling `operation`, stopping any poll already running.
    pub fn track(&self, operation: Operation) -> TrackedPoll {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let mut state = lock(&self.state);
        if let Some(previous) = state.active.take() {
            info!(
                "🔁 [TRACKER] Superseding poll #{} for {}",
                previous.generation,
                state.current.as_ref().map(|op| op.hash.as_str()).unwrap_or("?")
            );
            previous.supersede();
        }

        state.generation += 1;
        let generation = state.generation;
        state.current = Some(operation.clone());
        state.phase = Phase::Polling;

        info!(
            "🛰️ [TRACKER] Tracking {} ({}) as poll #{}",
            operation.hash, operation.kind, generation
        );

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.ledger),
            Arc::clone(&self.state),
            operation.clone(),
            generation,
            self.confirmation_delay,
            stop_rx,
        ));
        state.active = Some(ActivePoll {
            generation,
            stop: stop_tx,
            outcome: outcome_tx,
            task,
        });

        TrackedPoll {
            operation,
            outcome: outcome_rx,
        }
    }

    /// Ask the ledger to drop the most recently tracked transaction.
    ///
    /// On success the poll for it is stopped and the operation is returned.
    /// A refusal yields [`TrackerError::AlreadyFinalized`] and leaves the
    /// poll running, since the transaction may still confirm.
    pub async fn cancel(&self) -> Result<Operation, TrackerError> {
        let (operation, generation) = {
            let mut state = lock(&self.state);
            let operation = state.current.clone().ok_or(TrackerError::NoActiveOperation)?;
            if state.active.is_some() {
                state.phase = Phase::Cancelling;
            }
            (operation, state.generation)
        };

        info!("🛑 [TRACKER] Cancelling {} ({})", operation.hash, operation.kind);
        let response = self.ledger.cancel_transaction(&operation.hash).await;

        let mut state = lock(&self.state);
        let same_poll = state.generation == generation;

        match response {
            Ok(()) if same_poll => match state.active.take() {
                Some(active) => {
                    active.stop();
                    state.generation += 1;
                    state.phase = Phase::Terminated;
                    info!("✅ [TRACKER] Cancelled {}", operation.hash);
                    Ok(operation)
                }
                // The poll delivered its outcome while the request was out.
                // Reported as too late rather than cancelled, even though the
                // ledger accepted the request, so the caller never gets both
                // a result and a cancellation for one operation.
                None => Err(TrackerError::AlreadyFinalized { operation }),
            },
            Ok(()) => {
                // A newer operation took over meanwhile; its poll is left alone.
                info!("✅ [TRACKER] Cancelled superseded {}", operation.hash);
                Ok(operation)
            }
            Err(e) => {
                warn!("⚠️ [TRACKER] Cancel refused for {}: {}", operation.hash, e);
                if same_poll && state.active.is_some() {
                    state.phase = Phase::Polling;
                }
                Err(TrackerError::AlreadyFinalized { operation })
            }
        }
    }
}

impl Drop for OperationTracker {
    fn drop(&mut self) {
        if let Some(active) = lock(&self.state).active.take() {
            active.task.abort();
        }
    }
}

async fn poll_loop(
    ledger: Arc<dyn Ledger>,
    state: Arc<Mutex<TrackerState>>,
    operation: Operation,
    generation: u64,
    delay: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;

        let response = tokio::select! {
            biased;
            _ = &mut stop => {
                debug!("[TRACKER] Poll #{} stopped during query", generation);
                return;
            }
            res = ledger.get_transaction(&operation.hash) => res,
        };

        let result = match response {
            Ok(tx) => PollOutcome::Confirmed(tx),
            Err(e) if e.is_pending() => {
                debug!(
                    "⏳ [TRACKER] {} still pending (attempt {}), next check in {:?}",
                    operation.hash, attempt, delay
                );
                tokio::select! {
                    biased;
                    _ = &mut stop => {
                        debug!("[TRACKER] Poll #{} stopped while waiting", generation);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => continue,
                }
            }
            Err(e) => PollOutcome::Failed(e),
        };

        let mut st = lock(&state);
        if st.generation != generation {
            debug!("[TRACKER] Dropping late result of poll #{}", generation);
            return;
        }
        let Some(active) = st.active.take() else {
            return;
        };
        st.phase = Phase::Terminated;
        match &result {
            PollOutcome::Confirmed(tx) => info!(
                "🎯 [TRACKER] {} confirmed after {} attempt(s), {} event(s)",
                operation.hash,
                attempt,
                tx.events.len()
            ),
            PollOutcome::Failed(e) => warn!("❌ [TRACKER] {} failed: {}", operation.hash, e),
            PollOutcome::Superseded => {}
        }
        let _ = active.outcome.send(result);
        return;
    }
}
