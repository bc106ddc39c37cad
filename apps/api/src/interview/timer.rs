//! Per-question countdown.
//!
//! One tick per second on the tokio clock. When the count reaches zero the
//! expiry callback is spawned as its own task, so it may drop (and abort) the
//! timer that fired it. Dropping a `QuestionTimer` cancels the countdown.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

pub struct QuestionTimer {
    remaining: Arc<AtomicU32>,
    handle: JoinHandle<()>,
}

impl QuestionTimer {
    pub fn start<F, Fut>(time_limit: u32, on_expired: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let remaining = Arc::new(AtomicU32::new(time_limit));
        let counter = Arc::clone(&remaining);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            while counter.load(Ordering::SeqCst) > 0 {
                ticker.tick().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }

            tokio::spawn(on_expired());
        });

        Self { remaining, handle }
    }

    /// Seconds left on the countdown.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use tokio::time::sleep;

    use super::*;

    fn flag_setter(flag: &Arc<AtomicBool>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let flag = Arc::clone(flag);
        move || {
            flag.store(true, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_once_per_second() {
        let fired = Arc::new(AtomicBool::new(false));
        let timer = QuestionTimer::start(5, flag_setter(&fired));

        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(timer.remaining(), 3);
        assert!(!fired.load(Ordering::SeqCst));

        sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.remaining(), 0);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_expiry() {
        let fired = Arc::new(AtomicBool::new(false));
        let timer = QuestionTimer::start(2, flag_setter(&fired));
        sleep(Duration::from_millis(1_500)).await;
        drop(timer);

        sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_expires_immediately() {
        let fired = Arc::new(AtomicBool::new(false));
        let _timer = QuestionTimer::start(0, flag_setter(&fired));
        sleep(Duration::from_millis(10)).await;
        assert!(fired.load(Ordering::SeqCst));
    }
}
