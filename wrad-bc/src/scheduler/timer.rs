//! Single-slot wake-up timer
//!
//! At most one wake-up is armed at any instant: `arm` aborts the previous
//! task before spawning the next one. Each arming gets a generation number;
//! the firing task hands its generation back through `take_fired`, which
//! rejects stale generations so a wake-up that lost a race with a re-arm is
//! a no-op.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Upper bound for a single sleep (30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct Armed {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct WakeTimer {
    generation: u64,
    armed: Option<Armed>,
}

impl WakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending wake-up
    ///
    /// `on_fire` runs on its own task after `delay` and receives the
    /// generation of this arming. Returns that generation.
    pub fn arm<F, Fut>(&mut self, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        let now = Instant::now();
        let deadline = now
            .checked_add(delay.min(FAR_FUTURE))
            .unwrap_or(now + FAR_FUTURE);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_fire(generation).await;
        });

        self.armed = Some(Armed {
            generation,
            deadline,
            handle,
        });
        generation
    }

    /// Abort the pending wake-up, if any
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Claim a firing
    ///
    /// Called from inside the firing task, so the slot is cleared without
    /// aborting. Returns false when `generation` has been superseded.
    pub fn take_fired(&mut self, generation: u64) -> bool {
        match &self.armed {
            Some(armed) if armed.generation == generation => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left before the pending wake-up fires
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|armed| armed.deadline.saturating_duration_since(Instant::now()))
    }

    /// Generation of the most recent arming
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for WakeTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn recorder() -> (
        mpsc::UnboundedSender<u64>,
        mpsc::UnboundedReceiver<u64>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = recorder();
        let mut timer = WakeTimer::new();
        let generation = timer.arm(Duration::from_secs(5), move |g| async move {
            let _ = tx.send(g);
        });

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.remaining(), Some(Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, Some(generation));
        assert!(timer.take_fired(generation));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending() {
        let (tx, mut rx) = recorder();
        let mut timer = WakeTimer::new();

        let first_tx = tx.clone();
        let first = timer.arm(Duration::from_secs(5), move |g| async move {
            let _ = first_tx.send(g);
        });
        let second = timer.arm(Duration::from_secs(10), move |g| async move {
            let _ = tx.send(g);
        });
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(rx.recv().await, Some(second));
        // Both senders are gone: the first task was aborted before firing
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (tx, mut rx) = recorder();
        let mut timer = WakeTimer::new();
        timer.arm(Duration::from_secs(1), move |g| async move {
            let _ = tx.send(g);
        });

        assert!(timer.cancel());
        assert!(!timer.cancel());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_rejected() {
        let mut timer = WakeTimer::new();
        let stale = timer.arm(Duration::from_secs(60), |_| async {});
        let current = timer.arm(Duration::from_secs(60), |_| async {});

        assert!(!timer.take_fired(stale));
        assert!(timer.is_armed());
        assert!(timer.take_fired(current));
        assert_eq!(timer.generation(), current);
    }
}
