use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ecf_sequence::core::EventSink;
use ecf_sequence::store::{DbfStore, FileEventSink};
use ecf_sequence::{http, init_tracing, ApiServer, Cli, SequenceService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve()?;
    config.validate().context(
        "usage: ecf-sequence --dbf <FAC_PF_M.DBF> --key <api key> [--port 8080] [--config <file>]",
    )?;

    init_tracing(&config)?;

    let events: Arc<dyn EventSink> = Arc::new(
        FileEventSink::open(&config.event_log)
            .with_context(|| format!("opening event log {}", config.event_log.display()))?,
    );
    let store = DbfStore::open(&config.table_path)
        .with_context(|| format!("opening table {}", config.table_path.display()))?
        .with_columns(config.columns.clone())
        .with_event_sink(Arc::clone(&events));
    info!(table = %config.table_path.display(), "sequence table opened");

    let server = Arc::new(ApiServer::new(
        SequenceService::new(store),
        &config.api_key,
        Arc::clone(&events),
    ));
    let incoming = http::bind(config.listen_addr())?;
    events.record(&format!("Server started on port {}", config.port));

    http::serve(server, incoming, shutdown_signal()).await?;
    events.record("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested");
}
