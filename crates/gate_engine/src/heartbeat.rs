use std::time::Duration;

use gate_logging::gate_debug;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Cancellable fixed-period ticker. The first tick fires one period after start.
#[derive(Debug)]
pub struct HeartbeatTimer {
    cancel_token: CancellationToken,
}

impl HeartbeatTimer {
    /// Spawns the ticker on `handle`. `on_tick` runs on every period until cancelled.
    pub fn spawn_on<F>(handle: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => on_tick(),
                    _ = token.cancelled() => {
                        gate_debug!("heartbeat timer cancelled");
                        break;
                    }
                }
            }
        });

        Self { cancel_token }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
