use kanal::AsyncSender;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;

use crate::events::AppEvent;

/// Map one input line to an event; None for blank lines
pub fn parse_line(line: &str) -> Option<AppEvent> {
    let line = line.trim();
    match line {
        "" => None,
        ":q" | ":quit" => Some(AppEvent::Shutdown),
        ":stats" => Some(AppEvent::ShowStats),
        _ => Some(AppEvent::Query(line.to_string())),
    }
}

/// Stdin watcher: feeds query lines into the event channel until EOF,
/// a quit command, or cancellation
pub async fn watcher_io(
    cancel: CancellationToken,
    event_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            // EOF
            event_tx.send(AppEvent::Shutdown).await?;
            break;
        };

        if let Some(event) = parse_line(&line) {
            let quit = event == AppEvent::Shutdown;
            event_tx.send(event).await?;
            if quit {
                break;
            }
        }
    }

    tracing::info!("input watcher stopped");
    Ok(())
}
