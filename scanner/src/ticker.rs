use log::debug;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{ScanTask, Tick};

/// Emits a tick for the task every period until its token is cancelled or the receiver is gone.
///
/// The first tick is emitted one full period after the call.
///
/// # Args
/// * `task` - The scan task to drive.
/// * `tx` - Where to send the ticks.
pub async fn run(task: ScanTask, tx: mpsc::Sender<Tick>) {
    let generation = task.generation();
    let period = task.period();
    let token = task.token().clone();

    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        // a full channel must not delay the cancellation
        tokio::select! {
            biased;

            _ = token.cancelled() => break,
            sent = tx.send(Tick { generation }) => {
                if sent.is_err() {
                    debug!(generation = generation; "tick receiver dropped");
                    return;
                }
            }
        }
    }

    debug!(generation = generation; "ticker cancelled");
}

/// Spawns [`run`] on the current runtime.
pub fn spawn(task: ScanTask, tx: mpsc::Sender<Tick>) -> JoinHandle<()> {
    tokio::spawn(run(task, tx))
}
