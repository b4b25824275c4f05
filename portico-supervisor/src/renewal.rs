//! Periodic certificate renewal.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::{join_err, SupervisorError};

/// A background task that calls a renewal closure on a fixed interval.
///
/// The first tick fires one full interval after [`RenewalTask::start`]. Ticks
/// run one after another in a single loop, so a slow renewal delays the next
/// tick instead of overlapping it. A failing tick is logged and the loop
/// carries on.
pub struct RenewalTask {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RenewalTask {
    pub fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), SupervisorError>> + Send + 'static,
    {
        let interval = if interval.is_zero() {
            Duration::from_secs(1)
        } else {
            interval
        };
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log_next_run(interval);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        tracing::info!("renewing certificates");
                        match tick().await {
                            Ok(()) => tracing::info!("certificate renewal complete"),
                            Err(err) => tracing::error!(
                                error = %err,
                                "certificate renewal failed, retrying at next tick"
                            ),
                        }
                        log_next_run(interval);
                    }
                }
            }
            tracing::debug!("renewal task stopped");
        });

        Self { stop_tx, handle }
    }

    /// Signal the task to stop and wait for it to finish.
    ///
    /// A tick that is already running completes first.
    pub async fn stop(self) -> Result<(), SupervisorError> {
        let _ = self.stop_tx.send(());
        self.handle.await.map_err(|e| join_err("renewal", e))
    }
}

fn log_next_run(interval: Duration) {
    if let Ok(delta) = chrono::Duration::from_std(interval) {
        let next = chrono::Local::now() + delta;
        tracing::info!(next = %next.format("%Y-%m-%d %H:%M:%S"), "next certificate renewal");
    }
}
