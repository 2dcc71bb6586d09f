// Draft room event loop: multiplexes the poll interval, spawned-call
// completions, push signals and interface commands onto one controller.

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use leaguedraft_core::protocol::PushSignal;

use crate::protocol::{SessionCommand, ViewUpdate};
use crate::session::DraftSessionController;
use crate::task::Completion;

async fn forward(view_tx: &mpsc::Sender<ViewUpdate>, updates: Vec<ViewUpdate>) {
    for update in updates {
        let _ = view_tx.send(update).await;
    }
}

/// Run the draft room until the interface sends `Leave` or drops its
/// command sender.
pub async fn run(
    mut controller: DraftSessionController,
    mut completions: mpsc::Receiver<Completion>,
    mut push_rx: mpsc::Receiver<PushSignal>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    view_tx: mpsc::Sender<ViewUpdate>,
) -> anyhow::Result<()> {
    info!("Draft room event loop started");

    // Push is optional; once its channel closes, stop polling it.
    let mut push_open = true;

    controller.begin();
    let _ = view_tx
        .send(ViewUpdate::Push(controller.push_status()))
        .await;

    let mut poll_interval = tokio::time::interval(controller.settings().poll_interval);
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and begin() already fetched.
    poll_interval.tick().await;

    loop {
        tokio::select! {
            Some(completion) = completions.recv() => {
                let updates = controller.handle_completion(completion);
                forward(&view_tx, updates).await;
            }

            signal = push_rx.recv(), if push_open => {
                match signal {
                    Some(signal) => {
                        let updates = controller.handle_push(signal);
                        forward(&view_tx, updates).await;
                    }
                    None => {
                        info!("Push channel closed");
                        push_open = false;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Leave) => {
                        info!("Leave requested, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        let updates = controller.handle_command(cmd);
                        forward(&view_tx, updates).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = poll_interval.tick() => {
                controller.on_tick();
            }
        }
    }

    controller.shutdown();
    info!("Draft room event loop exiting");
    Ok(())
}
