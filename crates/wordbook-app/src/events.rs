use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;
use wordbook_core::QueryKind;
use wordbook_engine::DictionaryEngine;
use wordbook_store::{SqliteWordStore, WordStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Query(String),
    ShowStats,
    Shutdown,
}

/// App's main loop: one logical worker owns the engine and processes one
/// request to completion before the next
pub async fn event_loop(
    mut engine: DictionaryEngine<SqliteWordStore>,
    rx: AsyncReceiver<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("event loop started, waiting for queries");

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => event?,
        };

        match event {
            AppEvent::Shutdown => break,
            AppEvent::ShowStats => {
                let stats = engine.stats();
                println!(
                    "hits: {}  misses: {}  hit rate: {:.2}%  avg: {:.2}ms  \
                     cache: {} words (loaded: {})",
                    stats.hits,
                    stats.misses,
                    stats.hit_rate,
                    stats.avg_lookup_ms,
                    stats.cache_size,
                    stats.cache_loaded,
                );
            }
            AppEvent::Query(text) => handle_query(&mut engine, &text).await?,
        }
    }

    engine.store().close().await;
    tracing::info!("event loop stopped");
    Ok(())
}

async fn handle_query(
    engine: &mut DictionaryEngine<SqliteWordStore>,
    text: &str,
) -> anyhow::Result<()> {
    match engine.classify(text) {
        QueryKind::SingleWord => {
            let result = engine.lookup(text).await?;
            match result.entry {
                Some(entry) => println!("{}\n", entry.format()),
                None => report_miss(engine, text).await?,
            }
        }
        QueryKind::Phrase => match engine.lookup_phrase(text).await? {
            Some(results) => {
                for result in results {
                    if let Some(entry) = result.entry {
                        println!("{}\n", entry.format());
                    }
                }
            }
            None => report_miss(engine, text).await?,
        },
        QueryKind::Sentence => {
            // word-level engine only; sentences go to the translator
            println!("\"{text}\" is sentence-level input, not a dictionary query");
        }
    }
    Ok(())
}

/// A miss against an empty store means "nothing installed", not "no such
/// word" — surface the difference
async fn report_miss(
    engine: &DictionaryEngine<SqliteWordStore>,
    text: &str,
) -> anyhow::Result<()> {
    if engine.store().count_all().await? == 0 {
        println!("no dictionary installed yet; ingest a corpus first");
    } else {
        println!("\"{text}\" not found");
    }
    Ok(())
}
