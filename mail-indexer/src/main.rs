use std::error::Error;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mail_indexer::{Dependencies, IndexerSettings, IndexingError, LogFormat};

#[derive(Parser)]
#[command(name = "mail-indexer")]
#[command(about = "Index Gmail messages into OpenSearch", long_about = None)]
struct Cli {
    /// Page token to start listing from; empty starts at the beginning
    #[arg(short = 't', long, default_value = "")]
    page_token: String,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let log_format = LogFormat::from_env();
    init_tracing(log_format.as_ref().copied().unwrap_or_default());
    if let Err(e) = &log_format {
        warn!(error = %e, "Falling back to text logs");
    }

    if let Err(e) = run(cli).await {
        error!(error = %e, "Mail indexer failed");

        let mut source = e.source();
        while let Some(err) = source {
            error!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn run(cli: Cli) -> Result<(), IndexingError> {
    let settings = IndexerSettings::from_env()?;
    let dependencies = Dependencies::new(settings).await?;

    let start_cursor = Some(cli.page_token).filter(|token| !token.is_empty());
    let report = dependencies.orchestrator.run(start_cursor).await?;

    info!(
        outcome = ?report.outcome,
        pages = report.stats.pages,
        messages = report.stats.messages_seen,
        enqueued = report.stats.enqueued,
        rejected = report.stats.rejected,
        queue_full = report.stats.queue_full,
        fetch_failed = report.stats.fetch_failed,
        total_flushed = report.flush.total_flushed,
        documents_lost = report.flush.documents_lost,
        "Ingest finished"
    );

    if let Some(cursor) = report.resume_cursor {
        info!(page_token = %cursor, "Resume with --page-token to continue");
    }

    Ok(())
}
