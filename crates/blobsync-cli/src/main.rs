use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use blobsync_core::{
    ClientSecretCredential, CsvCodec, Environment, StorageConnection, SyncConfig, SyncPipeline,
};

const SECRET_VAR: &str = "CLIENT_SECRET_COSTS";

/// Mirror Azure cost-export blobs into local CSV files.
///
/// Blobs already present in the raw directory are skipped, so repeated runs
/// only fetch what is new.
#[derive(Debug, Parser)]
#[command(name = "blobsync", version, about)]
struct Cli {
    /// Directory checked for already-synced files
    #[arg(long, env = "BLOBSYNC_RAW_DIR", default_value = "data/raw/")]
    raw_dir: PathBuf,

    /// Directory converted files are written to
    #[arg(long, env = "BLOBSYNC_PROCESSED_DIR", default_value = "data/processed/")]
    processed_dir: PathBuf,

    #[arg(long, env = "BLOBSYNC_CONTAINER", default_value = "azure-costs")]
    container: String,

    /// dev, tst, acc or prd
    #[arg(long, env = "BLOBSYNC_ENVIRONMENT", default_value = "prd")]
    environment: Environment,

    /// Account endpoint with `{}` standing in for the environment
    #[arg(
        long,
        env = "BLOBSYNC_ENDPOINT_TEMPLATE",
        default_value = "https://stbillingcosts{}we.blob.core.windows.net/"
    )]
    endpoint_template: String,

    #[arg(
        long,
        env = "BLOBSYNC_TENANT_ID",
        default_value = "b5c47f42-c22c-453e-9984-c09cc131b040"
    )]
    tenant_id: String,

    #[arg(
        long,
        env = "BLOBSYNC_CLIENT_ID",
        default_value = "f4b8c6c6-b66d-4c23-aa62-0a95ff7d6665"
    )]
    client_id: String,

    /// Use a storage connection string instead of the client secret
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Only sync blobs whose names start with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Skip blobs whose names start with this prefix
    #[arg(long)]
    exclude_prefix: Option<String>,

    /// Write converted files without the leading row-number column
    #[arg(long)]
    no_index: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn,blobsync=info,blobsync_core=info",
            1 => "warn,blobsync=debug,blobsync_core=debug",
            _ => "info,blobsync=trace,blobsync_core=trace",
        }
    }

    /// Progress and skip lines share stdout with the plain summary; with
    /// `--json` they move to stderr so stdout stays parseable.
    fn progress_on_stdout(&self) -> bool {
        !self.json
    }

    fn init_logging(&self) {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_filter()));
        let writer = if self.progress_on_stdout() {
            BoxMakeWriter::new(std::io::stdout)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init()
            .ok();
    }

    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(&self.raw_dir, &self.processed_dir);
        if let Some(prefix) = &self.prefix {
            config = config.with_name_prefix(prefix);
        }
        if let Some(prefix) = &self.exclude_prefix {
            config = config.with_exclude_prefix(prefix);
        }
        config
    }

    fn connection(&self) -> Result<StorageConnection> {
        let builder =
            StorageConnection::builder(&self.endpoint_template, self.environment, &self.container);

        let builder = match &self.connection_string {
            Some(connection_string) => builder.connection_string(connection_string),
            None => {
                let credential =
                    ClientSecretCredential::from_env(&self.tenant_id, &self.client_id, SECRET_VAR)
                        .with_context(|| format!("{SECRET_VAR} must hold the client secret"))?;
                builder.credential(credential)
            }
        };
        builder.build().context("invalid storage connection settings")
    }

    fn codec(&self) -> CsvCodec {
        if self.no_index {
            CsvCodec::without_index()
        } else {
            CsvCodec::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    let connection = cli.connection()?;
    tracing::debug!(
        environment = %connection.environment(),
        container = connection.container(),
        "storage connection ready"
    );

    let pipeline = SyncPipeline::new(Arc::new(connection), Arc::new(cli.codec()), cli.sync_config());
    let report = pipeline.sync().await.with_context(|| {
        format!(
            "sync of container '{}' into {} failed",
            cli.container,
            cli.processed_dir.display()
        )
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "discovered={} skipped={} converted={}",
            report.discovered, report.skipped, report.converted
        );
    }
    Ok(())
}
