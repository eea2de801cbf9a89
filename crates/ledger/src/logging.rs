use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Noisy transport crates are capped at warn unless RUST_LOG says otherwise
const QUIET_TARGETS: &str = "hyper=warn,reqwest=warn,solana_client=warn,solana_rpc_client=warn";

fn ledger_filter(ledger_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,ledger={lvl},blockchain={lvl},shared={lvl},{}",
            QUIET_TARGETS,
            lvl = ledger_level
        ))
    })
}

/// JSON logs for long-running hosts of the ledger client
pub fn init_logging() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json();

    tracing_subscriber::registry()
        .with(ledger_filter("info"))
        .with(fmt_layer)
        .init();

    tracing::info!("Ledger logging initialized");
}

/// Human-readable logs with ledger crates at debug
pub fn init_logging_pretty() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(ledger_filter("debug"))
        .with(fmt_layer)
        .init();

    tracing::info!("Ledger logging initialized (pretty mode)");
}
