use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hijri_sync::config::{AppConfig, FetchMode, load_config};
use hijri_sync::fetch::{FileFetcher, PageFetcher};
use hijri_sync::model::{FAILURE_STATUS, SyncOutcome};
use hijri_sync::parser::extract_from_document;
use hijri_sync::pipeline::{SyncOptions, sync_hijri};
use hijri_sync::store::load_store;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hijri-sync", about = "Scrapes the published Hijri date into a JSON store")]
struct Cli {
    /// Optional TOML config; built-in defaults apply without it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    state_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Sync {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    Extract {
        #[arg(long)]
        file: PathBuf,
    },
    Show,
    Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Http,
    Browser,
    File,
}

impl From<ModeArg> for FetchMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Http => FetchMode::Http,
            ModeArg::Browser => FetchMode::Browser,
            ModeArg::File => FetchMode::File,
        }
    }
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            mode,
            url,
            file,
            dry_run,
        } => {
            let config = match sync_config(cli.config, cli.state_path, mode, url, file) {
                Ok(config) => config,
                Err(err) => {
                    error!(error = %format!("{err:#}"), "invalid configuration");
                    println!("{FAILURE_STATUS}");
                    return Ok(());
                }
            };

            match sync_hijri(&SyncOptions { config, dry_run }) {
                Ok(report) => {
                    if let SyncOutcome::Updated {
                        method,
                        merge,
                        history_len,
                        ..
                    } = &report.outcome
                    {
                        info!(
                            url = %report.source_url,
                            method = method.as_str(),
                            appended = merge.appended,
                            history = history_len,
                            dry_run = report.dry_run,
                            "sync summary"
                        );
                    } else {
                        warn!(url = %report.source_url, "no hijri date extracted");
                    }
                    println!("{}", report.status_line());
                }
                Err(err) => {
                    error!(error = %format!("{err:#}"), "sync failed");
                    println!("{FAILURE_STATUS}");
                }
            }
        }
        Commands::Extract { file } => {
            let url = format!("file://{}", file.display());
            let doc = FileFetcher::new(file).fetch(&url)?;
            match extract_from_document(&doc) {
                Some(date) => println!("{}", serde_json::to_string_pretty(&date)?),
                None => println!("No Hijri date found"),
            }
        }
        Commands::Show => {
            let config = with_state_path(load_config(cli.config.as_deref())?, cli.state_path);
            let store = load_store(
                &config.store.path,
                config.store.on_corrupt,
                &config.source.label,
            )?;
            match &store.current {
                Some(current) => println!("{}", serde_json::to_string_pretty(current)?),
                None => println!("No current date"),
            }
        }
        Commands::Validate => {
            let config = with_state_path(load_config(cli.config.as_deref())?, cli.state_path);
            config.validate()?;
            println!("OK: {} ({})", config.source.label, config.source.url);
        }
    }

    Ok(())
}

fn sync_config(
    config_path: Option<PathBuf>,
    state_path: Option<PathBuf>,
    mode: Option<ModeArg>,
    url: Option<String>,
    file: Option<PathBuf>,
) -> Result<AppConfig> {
    let mut config = with_state_path(load_config(config_path.as_deref())?, state_path);
    if let Some(mode) = mode {
        config.fetch.mode = mode.into();
    }
    if let Some(url) = url {
        config.source.url = url;
    }
    if let Some(file) = file {
        config.fetch.file_path = Some(file);
        if mode.is_none() {
            config.fetch.mode = FetchMode::File;
        }
    }
    config.validate().context("invalid sync options")?;
    Ok(config)
}

fn with_state_path(mut config: AppConfig, state_path: Option<PathBuf>) -> AppConfig {
    if let Some(path) = state_path {
        config.store.path = path;
    }
    config
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
