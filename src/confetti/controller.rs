use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use super::batch::{generate_batch, Particle, RandomSource, RngSource, DEFAULT_BATCH_SIZE};

/// How long a celebration stays on screen before it clears itself.
pub const AUTO_CLEAR_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfettiPhase {
    Idle,
    Active,
}

/// What the page should currently draw.
#[derive(Debug, Clone, Serialize)]
pub struct ConfettiView {
    pub phase: ConfettiPhase,
    pub particles: Vec<Particle>,
}

struct Shared {
    phase: ConfettiPhase,
    particles: Vec<Particle>,
    // bumped on every transition so a late timer can tell its batch is gone
    epoch: u64,
}

/// Idle/Active confetti state with a single auto-clear timer.
///
/// The timer task is owned here: re-activating restarts it, deactivating
/// cancels it, and dropping the controller aborts it so nothing touches the
/// state after its owner is gone. Without a tokio runtime the batch is still
/// shown but must be cleared by hand.
pub struct ConfettiController {
    shared: Arc<Mutex<Shared>>,
    timer: Option<JoinHandle<()>>,
    auto_clear: Duration,
    batch_size: usize,
}

impl Default for ConfettiController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfettiController {
    pub fn new() -> Self {
        Self::with_auto_clear(AUTO_CLEAR_AFTER)
    }

    pub fn with_auto_clear(auto_clear: Duration) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                phase: ConfettiPhase::Idle,
                particles: Vec::new(),
                epoch: 0,
            })),
            timer: None,
            auto_clear,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn activate(&mut self) {
        self.activate_with(&mut RngSource(rand::thread_rng()));
    }

    /// Show a fresh batch and (re)start the auto-clear timer. Any batch
    /// already on screen is replaced, never queued behind.
    pub fn activate_with(&mut self, random: &mut impl RandomSource) {
        let batch = generate_batch(self.batch_size, random);

        let epoch = {
            let mut shared = lock(&self.shared);
            shared.epoch += 1;
            shared.phase = ConfettiPhase::Active;
            shared.particles = batch;
            shared.epoch
        };

        self.cancel_timer();
        self.timer = self.schedule_clear(epoch);
        debug!("🎉 Confetti activated (epoch {})", epoch);
    }

    /// Clear immediately. A no-op when already idle.
    pub fn deactivate(&mut self) {
        self.cancel_timer();

        let mut shared = lock(&self.shared);
        if shared.phase == ConfettiPhase::Idle {
            return;
        }
        shared.epoch += 1;
        shared.phase = ConfettiPhase::Idle;
        shared.particles.clear();
        debug!("Confetti deactivated");
    }

    #[cfg(test)]
    pub fn phase(&self) -> ConfettiPhase {
        lock(&self.shared).phase
    }

    pub fn view(&self) -> ConfettiView {
        let shared = lock(&self.shared);
        ConfettiView {
            phase: shared.phase,
            particles: shared.particles.clone(),
        }
    }

    #[cfg(test)]
    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    fn schedule_clear(&self, epoch: u64) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime available; confetti will not auto-clear");
                return None;
            }
        };

        let shared = Arc::clone(&self.shared);
        let delay = self.auto_clear;

        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let mut shared = lock(&shared);
            if shared.epoch == epoch && shared.phase == ConfettiPhase::Active {
                shared.epoch += 1;
                shared.phase = ConfettiPhase::Idle;
                shared.particles.clear();
                debug!("Confetti auto-cleared (epoch {})", epoch);
            }
        }))
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ConfettiController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
