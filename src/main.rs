use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use routewl::{
    CheckPathUseCase, FilePredicateStore, FsLocalCatalog, HttpRemoteListingClient,
    ListStatusUseCase, PredicateStore, RepositoryId, WhitelistConfig, WhitelistService,
    load_topology,
};

#[derive(Parser)]
#[command(name = "routewl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.routewl")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whitelist manager against a repository topology file.
    Serve {
        /// JSON topology file (repositories, kinds, group members).
        #[arg(short, long)]
        config: String,

        /// Root directory holding hosted repository storage.
        #[arg(long, default_value = "storage")]
        storage_root: String,

        /// Periodic full-refresh interval in seconds (0 disables it).
        #[arg(long, default_value = "1200")]
        refresh_interval: u64,

        /// Remote listing probe timeout in seconds.
        #[arg(long, default_value = "10")]
        remote_timeout: u64,

        /// Maximum parallel compute jobs.
        #[arg(short, long, default_value = "8")]
        jobs: usize,
    },

    /// Print the stored whitelist state of every repository.
    Status,

    /// Existence pre-check for one path in one repository.
    Check {
        repository: String,
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let store_dir = PathBuf::from(&data_dir).join("predicates");

    match cli.command {
        Commands::Serve {
            config,
            storage_root,
            refresh_interval,
            remote_timeout,
            jobs,
        } => {
            let registry = Arc::new(load_topology(&PathBuf::from(&config))?);
            let store = Arc::new(FilePredicateStore::new(&store_dir)?);
            let remote = Arc::new(HttpRemoteListingClient::new(Duration::from_secs(
                remote_timeout,
            ))?);
            let catalog = Arc::new(FsLocalCatalog::new(&storage_root));

            let wl_config = WhitelistConfig {
                max_concurrent_jobs: jobs,
                refresh_interval: (refresh_interval > 0)
                    .then(|| Duration::from_secs(refresh_interval)),
                ..WhitelistConfig::default()
            };

            let mut service =
                WhitelistService::new(store, registry, remote, catalog, wl_config);
            service.start().await?;
            info!("Whitelist manager running, press Ctrl-C to stop");

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            service.shutdown().await;
        }

        Commands::Status => {
            let store: Arc<dyn PredicateStore> = Arc::new(FilePredicateStore::new(&store_dir)?);
            let use_case = ListStatusUseCase::new(store);
            let entries = use_case.execute().await?;

            if entries.is_empty() {
                println!("No whitelist state stored.");
            } else {
                for (id, predicate) in entries {
                    println!("  {} [{:?}]", id, predicate.status());
                    println!(
                        "    Prefixes: {}, Computed at: {}",
                        predicate.entries().len(),
                        predicate.computed_at()
                    );
                    for entry in predicate.entries().iter() {
                        println!("      {}", entry);
                    }
                    println!();
                }
            }
        }

        Commands::Check { repository, path } => {
            let store: Arc<dyn PredicateStore> = Arc::new(FilePredicateStore::new(&store_dir)?);
            let use_case = CheckPathUseCase::new(store);
            let verdict = use_case
                .execute(&RepositoryId::new(repository), &path)
                .await?;
            println!("{:?}", verdict);
        }
    }

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn serve_requires_config() {
        let res = Cli::try_parse_from(["routewl", "serve"]);
        assert!(res.is_err(), "serve without --config should not parse");
    }

    #[test]
    fn check_takes_repository_and_path() {
        let res = Cli::try_parse_from(["routewl", "check", "central", "/org/example/widget"]);
        assert!(res.is_ok());
    }
}
