use std::time::Duration;

use game_core::RoundTimer;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::actor::Input;

/// Countdown that posts `Input::Tick` into the controller's queue once per period.
///
/// Every start and cancel moves to a new epoch. The queue consumer drops ticks
/// whose epoch is not current, which covers ticks already queued when `cancel`
/// ran.
pub struct TokioRoundTimer {
    inbox: mpsc::Sender<Input>,
    period: Duration,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl TokioRoundTimer {
    pub(crate) fn new(inbox: mpsc::Sender<Input>, period: Duration) -> Self {
        Self {
            inbox,
            period,
            epoch: 0,
            task: None,
        }
    }

    pub fn accepts(&self, epoch: u64) -> bool {
        self.task.is_some() && epoch == self.epoch
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl RoundTimer for TokioRoundTimer {
    fn start(&mut self) {
        self.stop_task();
        self.epoch += 1;

        let epoch = self.epoch;
        let inbox = self.inbox.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if inbox.send(Input::Tick { epoch }).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        self.stop_task();
        self.epoch += 1;
    }

    fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TokioRoundTimer {
    fn drop(&mut self) {
        self.stop_task();
    }
}
