use std::time::Duration;

use tokio::time::timeout;

use crate::events::AppEvent;
use crate::io::parse_line;

#[test]
fn lines_parse_to_events() {
    assert_eq!(parse_line("   "), None);
    assert_eq!(parse_line(":q"), Some(AppEvent::Shutdown));
    assert_eq!(parse_line(":quit"), Some(AppEvent::Shutdown));
    assert_eq!(parse_line(":stats"), Some(AppEvent::ShowStats));
    assert_eq!(
        parse_line("  hello world "),
        Some(AppEvent::Query("hello world".to_string()))
    );
}

#[tokio::test]
async fn queries_flow_through_the_channel() {
    let (tx, rx) = kanal::bounded_async::<AppEvent>(64);

    tokio::spawn(async move {
        for line in ["hello", ":stats", ":q"] {
            if let Some(event) = parse_line(line) {
                tx.send(event).await.expect("send failed");
            }
        }
    });

    let mut received = Vec::new();
    let result = timeout(Duration::from_secs(2), async {
        loop {
            let event = rx.recv().await.expect("recv failed");
            let done = event == AppEvent::Shutdown;
            received.push(event);
            if done {
                break;
            }
        }
    })
    .await;

    assert!(result.is_ok(), "Timeout waiting for events!");
    assert_eq!(
        received,
        vec![
            AppEvent::Query("hello".to_string()),
            AppEvent::ShowStats,
            AppEvent::Shutdown,
        ]
    );
}
