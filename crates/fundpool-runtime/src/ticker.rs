//! Periodic phase sampling

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use fundpool_time::{derive_phase, Clock, PhaseState};

/// Background task publishing a campaign's phase on a watch channel.
///
/// The task stops on its own after publishing `ended`. Dropping the ticker
/// aborts it.
pub struct PhaseTicker {
    receiver: watch::Receiver<PhaseState>,
    handle: JoinHandle<()>,
}

impl PhaseTicker {
    /// Spawn on the current tokio runtime
    pub fn spawn(
        clock: Arc<dyn Clock>,
        start_time: Option<u64>,
        end_time: Option<u64>,
        period: Duration,
    ) -> Self {
        let initial = derive_phase(start_time, end_time, clock.now_unix());
        let (sender, receiver) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            if initial.is_terminal() {
                return;
            }
            tracing::debug!(phase = %initial.phase, ?period, "phase ticker started");
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let state = derive_phase(start_time, end_time, clock.now_unix());
                if sender.send(state).is_err() {
                    break;
                }
                if state.is_terminal() {
                    tracing::debug!("campaign ended; phase ticker stopping");
                    break;
                }
            }
        });

        PhaseTicker { receiver, handle }
    }

    /// Latest published state
    pub fn current(&self) -> PhaseState {
        *self.receiver.borrow()
    }

    /// Wait for the next published state. Returns false once the ticker
    /// has stopped.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Independent receiver for another consumer
    pub fn subscribe(&self) -> watch::Receiver<PhaseState> {
        self.receiver.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PhaseTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundpool_time::{CampaignPhase, ManualClock};

    #[tokio::test(start_paused = true)]
    async fn test_ticker_follows_clock_to_end() {
        let clock = ManualClock::new(50);
        let mut ticker = PhaseTicker::spawn(
            Arc::new(clock.clone()),
            Some(100),
            Some(200),
            Duration::from_secs(1),
        );
        assert_eq!(ticker.current().phase, CampaignPhase::Preparing);

        clock.set(150);
        assert!(ticker.changed().await);
        assert_eq!(ticker.current().phase, CampaignPhase::Active);

        clock.set(300);
        while ticker.current().phase != CampaignPhase::Ended {
            if !ticker.changed().await {
                break;
            }
        }
        assert_eq!(ticker.current().phase, CampaignPhase::Ended);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_ended_publishes_once() {
        let clock = ManualClock::new(500);
        let ticker = PhaseTicker::spawn(Arc::new(clock), Some(100), Some(200), Duration::from_secs(1));

        assert!(ticker.current().is_terminal());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_updates() {
        let clock = ManualClock::new(150);
        let ticker = PhaseTicker::spawn(
            Arc::new(clock.clone()),
            Some(100),
            Some(200),
            Duration::from_secs(1),
        );
        let mut rx = ticker.subscribe();

        clock.set(160);
        rx.changed().await.unwrap();
        let remaining = rx.borrow().remaining.map(|c| c.as_secs());
        assert_eq!(remaining, Some(40));
    }
}
