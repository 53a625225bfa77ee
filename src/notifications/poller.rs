//! Background poll loop.
//!
//! Runs one aggregation immediately, then one per interval, publishing every
//! result on a watch channel. A [`PollerHandle`] can request an extra cycle
//! on demand. The loop exits when its cancellation token fires; a cycle in
//! flight at that moment is dropped and never published.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::aggregator::Aggregator;
use super::models::AggregateNotificationState;

/// Command sent to the poller.
pub enum PollerCommand {
    PollNow {
        response: oneshot::Sender<AggregateNotificationState>,
    },
}

pub struct NotificationPoller {
    aggregator: Arc<Aggregator>,
    interval: Duration,
    command_receiver: mpsc::Receiver<PollerCommand>,
    state_sender: watch::Sender<Option<AggregateNotificationState>>,
    shutdown_token: CancellationToken,
}

/// Handle to interact with a running poller.
#[derive(Clone)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    state_rx: watch::Receiver<Option<AggregateNotificationState>>,
}

/// Builds a poller and the handle that talks to it. Nothing runs until
/// [`NotificationPoller::run`] is awaited.
pub fn create_poller(
    aggregator: Arc<Aggregator>,
    interval: Duration,
    shutdown_token: CancellationToken,
) -> (NotificationPoller, PollerHandle) {
    let (command_tx, command_receiver) = mpsc::channel(8);
    let (state_sender, state_rx) = watch::channel(None);

    let poller = NotificationPoller {
        aggregator,
        interval,
        command_receiver,
        state_sender,
        shutdown_token,
    };
    let handle = PollerHandle {
        command_tx,
        state_rx,
    };
    (poller, handle)
}

impl NotificationPoller {
    pub async fn run(mut self) {
        info!("Notification poller started, interval {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Notification poller received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(state) = self.poll_once().await {
                        self.state_sender.send_replace(Some(state));
                    }
                }
                Some(cmd) = self.command_receiver.recv() => {
                    self.handle_command(cmd).await;
                }
            }
        }

        info!("Notification poller stopped");
    }

    async fn handle_command(&mut self, cmd: PollerCommand) {
        match cmd {
            PollerCommand::PollNow { response } => {
                debug!("Poll requested on demand");
                if let Some(state) = self.poll_once().await {
                    self.state_sender.send_replace(Some(state.clone()));
                    let _ = response.send(state);
                }
            }
        }
    }

    /// Runs one cycle, abandoning it if shutdown fires first.
    async fn poll_once(&self) -> Option<AggregateNotificationState> {
        tokio::select! {
            biased;
            _ = self.shutdown_token.cancelled() => None,
            state = self.aggregator.poll() => Some(state),
        }
    }
}

impl PollerHandle {
    /// Runs a cycle right away and waits for its result.
    pub async fn refresh(&self) -> Result<AggregateNotificationState> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(PollerCommand::PollNow {
                response: response_tx,
            })
            .await
            .map_err(|_| anyhow!("Notification poller not running"))?;

        response_rx
            .await
            .map_err(|_| anyhow!("Notification poller stopped before answering"))
    }

    /// Receiver notified after every published cycle.
    pub fn subscribe(&self) -> watch::Receiver<Option<AggregateNotificationState>> {
        self.state_rx.clone()
    }

    /// Result of the most recent cycle, if one finished yet.
    pub fn latest(&self) -> Option<AggregateNotificationState> {
        self.state_rx.borrow().clone()
    }
}
