use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::application::orchestrator::PaymentOrchestrator;
use paygate::application::retention::spawn_retention_sweep;
use paygate::config::AppConfig;
use paygate::domain::ports::{PaymentGatewayBox, RequestCacheRef};
use paygate::infrastructure::http_gateway::HttpGatewayClient;
use paygate::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryRequestCache};
use paygate::infrastructure::simulated_bank::SimulatedBank;
use paygate::interfaces::csv::outcome_writer::{OutcomeRecord, OutcomeWriter};
use paygate::interfaces::csv::submission_reader::SubmissionReader;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment submissions CSV file
    input: PathBuf,

    /// Base URL of the acquiring bank. Overrides GATEWAY_URL.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Upper bound on each bank call in milliseconds. Overrides GATEWAY_TIMEOUT_MS.
    #[arg(long)]
    gateway_timeout_ms: Option<u64>,

    /// How long idempotency keys are remembered. Overrides IDEMPOTENCY_RETENTION_SECS.
    #[arg(long)]
    retention_secs: Option<u64>,

    /// Authorize against an in-process simulated bank instead of the HTTP gateway
    #[arg(long)]
    simulate: bool,
}

impl Cli {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(url) = &self.gateway_url {
            config.gateway_url = url.clone();
        }
        if let Some(timeout_ms) = self.gateway_timeout_ms {
            config.gateway_timeout_ms = timeout_ms;
        }
        if let Some(retention_secs) = self.retention_secs {
            config.idempotency_retention_secs = retention_secs;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let gateway: PaymentGatewayBox = if cli.simulate {
        Box::new(SimulatedBank::new())
    } else {
        Box::new(HttpGatewayClient::new(config.gateway_url.as_str()).into_diagnostic()?)
    };

    let cache: RequestCacheRef =
        Arc::new(InMemoryRequestCache::with_retention(config.retention()));
    let sweep = spawn_retention_sweep(cache.clone(), config.sweep_interval());

    let orchestrator = Arc::new(PaymentOrchestrator::new(
        cache,
        gateway,
        Box::new(InMemoryPaymentStore::new()),
        config.orchestrator(),
    ));

    // Submit every readable row concurrently
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = SubmissionReader::new(file);
    let mut pending = Vec::new();
    for record_result in reader.submissions() {
        match record_result {
            Ok(record) => {
                let orchestrator = orchestrator.clone();
                pending.push(tokio::spawn(async move {
                    let (key, submission) = record.into_parts();
                    let outcome = orchestrator
                        .submit(submission, key.as_deref(), None)
                        .await;
                    OutcomeRecord::new(key.as_deref(), &outcome)
                }));
            }
            Err(e) => {
                eprintln!("Error reading submission: {}", e);
            }
        }
    }

    // Collect outcomes in input order
    let mut records = Vec::with_capacity(pending.len());
    for handle in pending {
        records.push(handle.await.into_diagnostic()?);
    }

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    writer.write_all(&records).into_diagnostic()?;

    sweep.abort();
    Ok(())
}
