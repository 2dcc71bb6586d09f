// Console front end: reads command lines, prints view updates.
//
// Runs until the session loop drops its view sender, which happens after a
// `Leave` is processed. End of input counts as `Leave`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use leaguedraft_app::{SessionCommand, ViewUpdate};

use crate::commands::{parse_line, Input, HELP};
use crate::render::render_update;

pub async fn run(view_rx: mpsc::Receiver<ViewUpdate>, cmd_tx: mpsc::Sender<SessionCommand>) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_with(stdin, tokio::io::stdout(), view_rx, cmd_tx).await
}

pub async fn run_with<R, W>(
    input: R,
    mut output: W,
    mut view_rx: mpsc::Receiver<ViewUpdate>,
    cmd_tx: mpsc::Sender<SessionCommand>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut input_open = true;

    output.write_all(b"Type 'help' for commands.\n").await?;
    output.flush().await?;

    loop {
        tokio::select! {
            update = view_rx.recv() => {
                match update {
                    Some(update) => {
                        output.write_all(render_update(&update).as_bytes()).await?;
                        output.flush().await?;
                    }
                    None => {
                        debug!("View channel closed");
                        break;
                    }
                }
            }

            line = lines.next_line(), if input_open => {
                let command = match line? {
                    Some(line) => match parse_line(&line) {
                        Input::Command(command) => Some(command),
                        Input::Help => {
                            output.write_all(HELP.as_bytes()).await?;
                            output.write_all(b"\n").await?;
                            None
                        }
                        Input::Invalid(message) => {
                            output.write_all(format!("{message}\n").as_bytes()).await?;
                            None
                        }
                        Input::Empty => None,
                    },
                    None => {
                        info!("Input closed, leaving draft room");
                        input_open = false;
                        Some(SessionCommand::Leave)
                    }
                };
                output.flush().await?;
                if let Some(command) = command {
                    if command == SessionCommand::Leave {
                        input_open = false;
                    }
                    if cmd_tx.send(command).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}
