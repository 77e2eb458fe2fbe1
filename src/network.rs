//! Network reachability observers. The store only republishes the signal;
//! deciding what "offline" means is left to consumers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Source of online/offline transitions.
pub trait Reachability: Send + Sync {
    /// Receiver whose current value is the latest known reachability.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Reachability set explicitly by the host (platform callback, tests).
pub struct ManualReachability {
    tx: watch::Sender<bool>,
}

impl ManualReachability {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(online, "reachability changed");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Reachability for ManualReachability {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Polls a URL and reports online while requests get any HTTP response.
pub struct HttpProbe {
    state: Arc<ManualReachability>,
    stop: CancellationToken,
}

impl HttpProbe {
    /// Start probing in a background task. Assumes online until the first probe completes.
    pub fn start(url: String, interval: Duration, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let state = Arc::new(ManualReachability::new(true));
        let stop = CancellationToken::new();

        let task_state = Arc::clone(&state);
        let task_stop = stop.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_stop.cancelled() => {
                        debug!("reachability probe stopped");
                        return;
                    }
                }
                let online = match http.head(&url).send().await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(error = %e, url = %url, "reachability probe failed");
                        false
                    }
                };
                task_state.set_online(online);
            }
        });

        Ok(Self { state, stop })
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }
}

impl Reachability for HttpProbe {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Drop for HttpProbe {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
