use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::models::QueueSnapshot;
use crate::services::queue::QueueService;

/// Background poller keeping the latest queue snapshot.
///
/// The first poll runs immediately. A failed poll is logged and the previous
/// snapshot stays published.
pub struct QueueMonitor {
    receiver: watch::Receiver<Option<QueueSnapshot>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl QueueMonitor {
    pub fn spawn(service: Arc<QueueService>, every: Duration, cancel: CancellationToken) -> Self {
        let (sender, receiver) = watch::channel(None);
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Queue monitor started, polling every {:?}", every);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match service.snapshot().await {
                    Ok(snapshot) => {
                        sender.send_replace(Some(snapshot));
                    }
                    Err(err) => error!("Failed to load queue: {}", err),
                }
            }

            info!("Queue monitor stopped");
        });

        Self {
            receiver,
            cancel,
            handle,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<QueueSnapshot>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Option<QueueSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Stops polling and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            error!("Queue monitor task failed: {}", err);
        }
    }
}
