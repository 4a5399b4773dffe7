use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use resolv_data::acquire::AcquireOptions;
use resolv_data::config::{ConfigLoader, DEFAULT_MODE, ImportRequest};
use resolv_data::error::ResolvError;
use resolv_data::fetch::HttpFetcher;
use resolv_data::index::DatasetIndex;
use resolv_data::output::{
    ImportItemResult, ImportResult, InfoResult, JsonOutput, ListEntry, ListResult,
};
use resolv_data::registry;

#[derive(Parser)]
#[command(name = "resolv-data")]
#[command(about = "Reproducible research-dataset acquisition and indexing")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download, verify and index a dataset")]
    Import(ImportArgs),
    #[command(about = "List the datasets known to the registry")]
    List,
    #[command(about = "Show dataset info")]
    Info(InfoArgs),
}

#[derive(Args)]
struct ImportArgs {
    dataset: Option<String>,

    #[arg(long, default_value = DEFAULT_MODE)]
    mode: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    output_path: Option<Utf8PathBuf>,

    #[arg(long)]
    ephemeral: bool,

    #[arg(long)]
    overwrite: bool,

    #[arg(long)]
    keep_archives: bool,

    #[arg(long)]
    allow_invalid_checksum: bool,

    #[arg(long)]
    path_prefix: Option<String>,
}

#[derive(Args)]
struct InfoArgs {
    dataset: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(resolv) = report.downcast_ref::<ResolvError>() {
            return ExitCode::from(map_exit_code(resolv));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ResolvError) -> u8 {
    match error {
        ResolvError::DatasetNotFound(_)
        | ResolvError::MissingConfig
        | ResolvError::ConfigRead(_)
        | ResolvError::ConfigParse(_) => 2,
        ResolvError::Transfer(_) | ResolvError::TransferStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => run_import(args),
        Commands::List => run_list(),
        Commands::Info(args) => run_info(args),
    }
}

fn run_import(args: ImportArgs) -> miette::Result<()> {
    let requests = match &args.dataset {
        Some(name) => vec![ImportRequest {
            name: name.clone(),
            mode: args.mode.clone(),
        }],
        None => ConfigLoader::resolve(args.config.as_deref())
            .into_diagnostic()?
            .datasets,
    };

    let options = AcquireOptions {
        output_path: args.output_path.clone(),
        ephemeral_root: args.ephemeral,
        overwrite: args.overwrite,
        cleanup_archives: !args.keep_archives,
        allow_invalid_checksum: args.allow_invalid_checksum,
    };
    let fetcher = HttpFetcher::new().into_diagnostic()?;

    let mut items = Vec::new();
    for request in requests {
        let (root_dir, index) = registry::import_dataset(
            &request.name,
            &request.mode,
            &fetcher,
            &options,
            args.path_prefix.as_deref(),
        )
        .into_diagnostic()?;
        items.push(ImportItemResult {
            dataset: request.name,
            mode: request.mode,
            index_path: DatasetIndex::index_path(&root_dir).to_string(),
            root_dir: root_dir.to_string(),
            entries: index.entries.len(),
        });
    }

    JsonOutput::print_import(&ImportResult { items }).into_diagnostic()
}

fn run_list() -> miette::Result<()> {
    let mut datasets = Vec::new();
    for name in registry::DATASET_NAMES {
        let descriptor = registry::lookup(name).into_diagnostic()?;
        datasets.push(ListEntry {
            name: name.to_string(),
            version: descriptor.version().to_string(),
            modes: descriptor.remote_sources().into_keys().collect(),
        });
    }
    JsonOutput::print_list(&ListResult { datasets }).into_diagnostic()
}

fn run_info(args: InfoArgs) -> miette::Result<()> {
    let descriptor = registry::lookup(&args.dataset).into_diagnostic()?;
    let info = descriptor.info();
    JsonOutput::print_info(&InfoResult {
        name: info.name,
        version: info.version,
        description: info.description,
        homepage: info.homepage,
        license: info.license_info,
        citation: info.citation,
        modes: descriptor.remote_sources().into_keys().collect(),
    })
    .into_diagnostic()
}
