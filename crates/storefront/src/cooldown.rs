//! Add-to-cart button cooldown.
//!
//! A click disables the product's add button until a deadline fixed at the
//! click. Each product has at most one pending timer: a tokio task that
//! drops the entry when the deadline passes. The timers are independent of
//! the cart state, so a redraw during the delay still renders the button
//! disabled, with only the time left until the original deadline.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use kirana_core::{Cooldown, ProductId};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Pending {
    generation: u64,
    deadline: Instant,
    handle: AbortHandle,
}

impl Pending {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let left = self.deadline.saturating_duration_since(now);
        (!left.is_zero()).then_some(left)
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_generation: u64,
    pending: HashMap<ProductId, Pending>,
}

/// Per-product cooldown timers.
///
/// Cheaply cloneable; clones share the same timers.
#[derive(Debug, Clone)]
pub struct Cooldowns {
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl Cooldowns {
    /// Create a tracker with the given cooldown delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Disable `id` for the configured delay unless it is already cooling.
    ///
    /// Returns `false` without touching the running timer when `id` is
    /// still cooling down. The check and the start happen under one lock,
    /// so of two concurrent clicks only one wins.
    ///
    /// Must be called from within a tokio runtime.
    pub fn try_start(&self, id: ProductId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if inner
            .pending
            .get(&id)
            .is_some_and(|p| p.remaining(now).is_some())
        {
            return false;
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let deadline = now + self.delay;

        let timers = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut inner = timers.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer click may have replaced this timer while it was waking up
            if inner
                .pending
                .get(&id)
                .is_some_and(|p| p.generation == generation)
            {
                inner.pending.remove(&id);
                debug!(product_id = %id, "Add-to-cart cooldown elapsed");
            }
        });

        let replaced = inner.pending.insert(
            id,
            Pending {
                generation,
                deadline,
                handle: task.abort_handle(),
            },
        );
        if let Some(previous) = replaced {
            previous.handle.abort();
        }
        true
    }

    /// Re-enable `id` immediately. Returns whether a timer was cancelled.
    pub fn cancel(&self, id: ProductId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.pending.remove(&id).is_some_and(|p| {
            p.handle.abort();
            true
        })
    }
}

impl Cooldown for Cooldowns {
    fn remaining(&self, id: ProductId) -> Option<Duration> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .get(&id)
            .and_then(|p| p.remaining(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_start_disables_until_delay_elapses() {
        let cooldowns = Cooldowns::new(SHORT);
        let id = ProductId::new(1);

        assert!(cooldowns.try_start(id));
        assert!(cooldowns.is_cooling(id));
        assert!(!cooldowns.is_cooling(ProductId::new(2)));

        tokio::time::sleep(SHORT * 4).await;
        assert!(!cooldowns.is_cooling(id));
        assert_eq!(cooldowns.remaining(id), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_down_from_the_click() {
        let cooldowns = Cooldowns::new(Duration::from_millis(400));
        let id = ProductId::new(1);

        assert!(cooldowns.try_start(id));
        tokio::time::advance(Duration::from_millis(300)).await;

        assert_eq!(cooldowns.remaining(id), Some(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_second_start_while_cooling_is_refused() {
        let cooldowns = Cooldowns::new(Duration::from_millis(200));
        let id = ProductId::new(1);

        assert!(cooldowns.try_start(id));
        let before = cooldowns.remaining(id).unwrap_or_default();
        assert!(!cooldowns.try_start(id));

        // The original deadline still holds
        assert!(cooldowns.remaining(id).unwrap_or_default() <= before);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(cooldowns.try_start(id));
    }

    #[tokio::test]
    async fn test_cancel() {
        let cooldowns = Cooldowns::new(Duration::from_secs(60));
        let id = ProductId::new(3);

        cooldowns.try_start(id);
        assert!(cooldowns.cancel(id));
        assert!(!cooldowns.is_cooling(id));
        assert!(!cooldowns.cancel(id));
    }

    #[tokio::test]
    async fn test_clones_share_timers() {
        let cooldowns = Cooldowns::new(Duration::from_secs(60));
        let other = cooldowns.clone();

        cooldowns.try_start(ProductId::new(4));
        assert!(other.is_cooling(ProductId::new(4)));
    }
}
