use std::{io, path::PathBuf};

use clap::Parser;
use database::Driver;
use harness::{
    config::{BenchConfig, ConfigFile},
    runner::Runner,
};
use tracing_subscriber::EnvFilter;
use workload::WorkloadKind;

/// Drives a mixed create/read/update/delete/query load against a database
/// backend and reports throughput and latency.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with optional `database` and `workload` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of concurrent workers [default: 1]
    #[arg(long)]
    workers: Option<usize>,

    /// Total number of operations to attempt [default: 1000]
    #[arg(long)]
    docs: Option<u64>,

    /// Document size in bytes [default: 512]
    #[arg(long)]
    size: Option<usize>,

    /// Indexable fields per document [default: 3]
    #[arg(long)]
    fields: Option<usize>,

    #[arg(long)]
    create: Option<u32>,

    #[arg(long)]
    read: Option<u32>,

    #[arg(long)]
    update: Option<u32>,

    #[arg(long)]
    delete: Option<u32>,

    #[arg(long)]
    query: Option<u32>,

    /// Records created before the clock starts
    #[arg(long)]
    initial_records: Option<u64>,

    /// Key selection
    #[arg(long, value_enum, ignore_case = true)]
    workload: Option<WorkloadKind>,

    /// Share of live records the hotspot workload treats as hot [default: 20]
    #[arg(long)]
    hot_percentage: Option<u32>,

    /// Database backend
    #[arg(long, value_enum, ignore_case = true)]
    backend: Option<Driver>,
}

impl Cli {
    /// Flags win over the config file, which wins over the defaults.
    fn merge(&self, mut file: ConfigFile) -> ConfigFile {
        let workload: &mut BenchConfig = &mut file.workload;
        override_with(&mut workload.workers, self.workers);
        override_with(&mut workload.operations, self.docs);
        override_with(&mut workload.value_size, self.size);
        override_with(&mut workload.indexable_fields, self.fields);
        override_with(&mut workload.create_percentage, self.create);
        override_with(&mut workload.read_percentage, self.read);
        override_with(&mut workload.update_percentage, self.update);
        override_with(&mut workload.delete_percentage, self.delete);
        override_with(&mut workload.query_percentage, self.query);
        override_with(&mut workload.initial_records, self.initial_records);
        override_with(&mut workload.workload, self.workload);
        override_with(&mut workload.hot_percentage, self.hot_percentage);
        override_with(&mut file.database.driver, self.backend);
        file
    }
}

fn override_with<T>(slot: &mut T, flag: Option<T>) {
    if let Some(value) = flag {
        *slot = value;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("loadmix=info,harness=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path).inspect_err(|e| {
            tracing::error!("Failed to load config {}: {}", path.display(), e);
        })?,
        None => ConfigFile::default(),
    };
    let ConfigFile {
        database: database_config,
        workload: config,
    } = cli.merge(file);

    let database = database::open(&database_config).await.inspect_err(|e| {
        tracing::error!("Failed to open database: {}", e);
    })?;
    let workload = workload::open(config.workload, config.hot_percentage)?;
    let runner = Runner::builder().build(config, database, workload)?;
    let state = runner.state();

    tokio::spawn({
        let state = state.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping workers");
                state.stop();
            }
        }
    });

    let mut stdout = runner.run(io::stdout()).await?;
    state.report_summary(&mut stdout)?;

    Ok(())
}
