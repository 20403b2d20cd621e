//! Fanout notification dispatcher demo.
//!
//! Wires the dispatch engine with the simulated channel senders and the
//! seeded recipient directory, sends one sample message per category,
//! and logs the aggregate results and recent delivery records.

use std::sync::Arc;

use anyhow::Result;
use fanout_core::{Category, RealClock};
use fanout_dispatch::{
    DispatchConfig, DispatchEngine, EmailSender, InMemoryDirectory, InMemoryMessageStore,
    InMemoryOutcomeStore, MessageStore, OutcomeStore, PushSender, RecipientDirectory,
    SenderRegistry, SmsSender,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting fanout notification dispatcher demo");

    let registry = SenderRegistry::new(vec![
        Arc::new(EmailSender::new()),
        Arc::new(SmsSender::new()),
        Arc::new(PushSender::new()),
    ]);

    let directory: Arc<dyn RecipientDirectory> =
        Arc::new(InMemoryDirectory::with_sample_recipients());
    let messages: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let outcomes: Arc<dyn OutcomeStore> = Arc::new(InMemoryOutcomeStore::new());

    let engine = DispatchEngine::new(
        directory,
        Arc::new(registry),
        messages,
        outcomes,
        DispatchConfig::default(),
        Arc::new(RealClock::new()),
    );

    let samples = [
        (Category::Sports, "Championship final tonight at 8pm - Lions vs Tigers"),
        (Category::Finance, "Markets closed up 2.3% today, tech leading gains"),
        (Category::Movies, "New sci-fi blockbuster opens this weekend"),
    ];

    for (category, content) in samples {
        let summary = engine.dispatch(category, content).await?;
        info!(
            message_id = %summary.message_id,
            %category,
            total_recipients = summary.total_recipients,
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "dispatch finished"
        );
    }

    let recent = engine.all_outcomes().await?;
    info!(records = recent.len(), "delivery history");
    for outcome in recent.iter().take(10) {
        info!(
            recipient = %outcome.recipient_name,
            channel = %outcome.channel,
            status = %outcome.status,
            error = outcome.error.as_deref().unwrap_or("-"),
            "recent outcome"
        );
    }

    info!("Demo complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,fanout=debug,fanout_dispatch=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
