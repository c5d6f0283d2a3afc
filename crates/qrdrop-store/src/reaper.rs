use std::sync::Arc;

use qrdrop_types::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::ReaperConfig;
use crate::error::StoreResult;
use crate::traits::ImageStore;

/// Background task that sweeps expired records on a fixed interval.
///
/// A failing or panicking sweep is logged and the next tick runs as usual.
/// Dropping the handle without calling [`Reaper::shutdown`] also stops the
/// task, at its next wake-up.
pub struct Reaper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Reaper {
    /// Start sweeping `store` every `config.interval`.
    ///
    /// The first sweep happens one full interval after spawning. Must be
    /// called from inside a Tokio runtime.
    pub fn spawn(
        store: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
        config: ReaperConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let interval = config.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval() fires immediately; nothing can have expired yet.
            ticker.tick().await;
            info!(interval_secs = interval.as_secs_f64(), "reaper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reap_once(&store, &clock).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("reaper stopped");
        });

        Ok(Self { shutdown, handle })
    }

    /// Signal the task to stop and wait for it to finish.
    ///
    /// A sweep already in progress completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "reaper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Run a single sweep on the blocking pool.
///
/// Returns the number of records removed, or `None` if the sweep failed or
/// panicked. Either way the failure is logged and contained here.
pub async fn reap_once(store: &Arc<dyn ImageStore>, clock: &Arc<dyn Clock>) -> Option<usize> {
    let store = Arc::clone(store);
    let now = clock.now();
    match tokio::task::spawn_blocking(move || store.sweep(now)).await {
        Ok(Ok(0)) => {
            debug!("reaper found nothing to remove");
            Some(0)
        }
        Ok(Ok(removed)) => {
            info!(removed, "reaper removed expired images");
            Some(removed)
        }
        Ok(Err(e)) => {
            error!(error = %e, "reaper sweep failed");
            None
        }
        Err(e) => {
            error!(error = %e, "reaper sweep panicked");
            None
        }
    }
}
