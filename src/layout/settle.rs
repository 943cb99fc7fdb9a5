use futures::channel::mpsc;
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::{Future, StreamExt};
use futures::lock::Mutex;
use std::time::Duration;

/// Suspension point between collecting a node set and reading its sizes, so
/// the render layer can finish a pass first.
pub trait RenderSettle {
    fn wait(&self, budget: Duration) -> LocalBoxFuture<'_, ()>;
}

/// Headless hosts and tests: sizes are ready immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSettle;

impl RenderSettle for ImmediateSettle {
    fn wait(&self, _budget: Duration) -> LocalBoxFuture<'_, ()> {
        Box::pin(future::ready(()))
    }
}

/// Host timer future, e.g. a runtime sleep or a UI `setTimeout` bridge.
pub type TimerFn = Box<dyn Fn(Duration) -> LocalBoxFuture<'static, ()>>;

pub fn host_timer<F, Fut>(timer: F) -> TimerFn
where
    F: Fn(Duration) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Box::new(move |budget| timer(budget).boxed_local())
}

/// Waits out the whole budget on the host timer.
pub struct TimeoutSettle {
    timer: TimerFn,
}

impl TimeoutSettle {
    pub fn new(timer: TimerFn) -> Self {
        Self { timer }
    }
}

impl RenderSettle for TimeoutSettle {
    fn wait(&self, budget: Duration) -> LocalBoxFuture<'_, ()> {
        (self.timer)(budget)
    }
}

/// Handle the render layer uses to announce that footprints are current.
#[derive(Debug, Clone)]
pub struct SettleNotifier {
    tx: mpsc::UnboundedSender<()>,
}

impl SettleNotifier {
    /// Returns `false` once the waiting side has been dropped.
    pub fn sizes_ready(&self) -> bool {
        self.tx.unbounded_send(()).is_ok()
    }
}

/// Resumes on the first "sizes ready" notification sent after the wait
/// started, or when the host timer fires, whichever comes first.
pub struct SignalSettle {
    ready: Mutex<mpsc::UnboundedReceiver<()>>,
    fallback: TimerFn,
}

impl SignalSettle {
    pub fn channel(fallback: TimerFn) -> (SettleNotifier, SignalSettle) {
        let (tx, rx) = mpsc::unbounded();
        (
            SettleNotifier { tx },
            SignalSettle {
                ready: Mutex::new(rx),
                fallback,
            },
        )
    }
}

impl RenderSettle for SignalSettle {
    fn wait(&self, budget: Duration) -> LocalBoxFuture<'_, ()> {
        Box::pin(async move {
            let mut rx = self.ready.lock().await;
            // only notifications sent during this wait count
            let mut stale = 0usize;
            while rx.try_recv().is_ok() {
                stale += 1;
            }
            if stale > 0 {
                tracing::trace!(stale, "discarded stale sizes-ready notifications");
            }
            let timer = (self.fallback)(budget);
            match future::select(rx.next(), timer).await {
                future::Either::Left((Some(()), _)) => {
                    tracing::trace!("render layer reported sizes ready");
                }
                future::Either::Left((None, timer)) => {
                    // notifier dropped: only the timer is left
                    timer.await;
                }
                future::Either::Right(((), _)) => {
                    tracing::debug!(?budget, "settle wait timed out before sizes were reported");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    fn never() -> TimerFn {
        host_timer(|_| future::pending())
    }

    #[test]
    fn immediate_settle_resolves() {
        block_on(ImmediateSettle.wait(Duration::from_millis(50)));
    }

    #[test]
    fn timeout_settle_uses_host_timer() {
        let seen = Rc::new(Cell::new(Duration::ZERO));
        let record = seen.clone();
        let settle = TimeoutSettle::new(host_timer(move |budget| {
            record.set(budget);
            future::ready(())
        }));
        block_on(settle.wait(Duration::from_millis(75)));
        assert_eq!(seen.get(), Duration::from_millis(75));
    }

    #[test]
    fn signal_wins_over_timer() {
        let (notifier, settle) = SignalSettle::channel(never());
        let mut wait = settle.wait(Duration::from_secs(3600));
        assert!((&mut wait).now_or_never().is_none());
        assert!(notifier.sizes_ready());
        assert!((&mut wait).now_or_never().is_some());
    }

    #[test]
    fn notifications_before_the_wait_are_ignored() {
        let (notifier, settle) = SignalSettle::channel(never());
        for _ in 0..3 {
            assert!(notifier.sizes_ready());
        }
        let mut wait = settle.wait(Duration::from_secs(3600));
        assert!((&mut wait).now_or_never().is_none());
        drop(wait);

        // a leftover signal from the first run must not release the second
        let mut second = settle.wait(Duration::from_secs(3600));
        assert!((&mut second).now_or_never().is_none());
        assert!(notifier.sizes_ready());
        assert!((&mut second).now_or_never().is_some());
    }

    #[test]
    fn timer_wins_without_signal() {
        let (_notifier, settle) =
            SignalSettle::channel(host_timer(|_| future::ready(())));
        block_on(settle.wait(Duration::from_millis(10)));
    }

    #[test]
    fn dropped_notifier_is_reported() {
        let (notifier, settle) = SignalSettle::channel(never());
        drop(settle);
        assert!(!notifier.sizes_ready());
    }
}
