use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use corpus_sanity::{
    bag, checks, listing, report, stats, sync, LocalStore, Location, ObjectStore, PoolConfig,
    WorkerPool,
};

/// Sanity checks for a partitioned newspaper-archive corpus
#[derive(Parser)]
#[command(name = "corpus-sanity")]
#[command(about = "List, fetch, parse and count newspaper corpus data", long_about = None)]
struct Cli {
    /// Root directory of the local corpus mirror (one subdirectory per bucket)
    #[arg(long, global = true, default_value = ".")]
    store_root: PathBuf,

    /// Number of workers for the aggregation pool (default: all cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Advisory memory limit per worker, e.g. "1G" or "512M"
    #[arg(long, global = true)]
    memory: Option<String>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the newspaper partitions under a storage location
    ListNewspapers {
        /// Storage location, e.g. "s3://canonical-data" or "canonical-data/prefix"
        location: String,
    },
    /// Count the issue records under a storage location
    CountIssues {
        /// Storage location holding `<newspaper>/issues/*` record files
        location: String,

        /// Restrict to these newspapers instead of discovering them
        #[arg(long)]
        newspaper: Vec<String>,

        /// Force the count twice and fail on any drift
        #[arg(long)]
        checked: bool,
    },
    /// Count the topic records in a flat storage location
    CountTopics {
        /// Storage location holding topic record files directly under it
        location: String,
    },
    /// Run the canonical-data integrity checks and print a summary
    CheckCanonical {
        /// Canonical storage location
        location: String,

        /// Restrict to these newspapers instead of discovering them
        #[arg(long)]
        newspaper: Vec<String>,

        /// Write per-newspaper issue and page counts to this CSV file
        #[arg(long)]
        stats_csv: Option<PathBuf>,

        /// Write duplicated content-item ids to this CSV file
        #[arg(long)]
        duplicates_csv: Option<PathBuf>,
    },
    /// Compare canonical and rebuilt issue id sets
    SyncRebuilt {
        /// Canonical storage location
        canonical: String,

        /// Rebuilt storage location
        rebuilt: String,

        /// Write issues missing from the rebuilt bucket to this CSV file
        #[arg(long)]
        missing_csv: Option<PathBuf>,
    },
    /// Render the newspaper titles list as markdown with metadata links
    TitlesReport {
        /// CSV file of newspaper titles (id, title, start_year, end_year)
        titles_csv: PathBuf,

        /// Host serving the per-newspaper metadata pages
        #[arg(long, default_value = "impresso-project.ch")]
        host: String,

        /// Write the markdown here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli) {
        error!("fatal: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(&cli.store_root));
    debug!(root = %cli.store_root.display(), "using local store");

    let mut config = match cli.workers {
        Some(n) => PoolConfig::with_workers(n),
        None => PoolConfig::default(),
    };
    if let Some(limit) = &cli.memory {
        config = config.with_memory_limit(limit)?;
    }

    match cli.command {
        Commands::ListNewspapers { location } => {
            let location = Location::parse(&location)?;
            for np in listing::list_newspapers(store.as_ref(), &location)? {
                println!("{np}");
            }
        }
        Commands::CountIssues {
            location,
            newspaper,
            checked,
        } => {
            let location = Location::parse(&location)?;
            let newspapers = listing::resolve_newspapers(
                store.as_ref(),
                &location,
                (!newspaper.is_empty()).then_some(&newspaper[..]),
            )?;
            let files = listing::list_issue_files(store.as_ref(), &location, &newspapers)?;
            let records = bag::read_records(Arc::clone(&store), &files);
            let total = WorkerPool::scoped(config, |pool| {
                if checked {
                    records.count_checked(pool)
                } else {
                    records.count(pool)
                }
            })?;
            println!("{total}");
        }
        Commands::CountTopics { location } => {
            let location = Location::parse(&location)?;
            let files = listing::list_topic_files(store.as_ref(), &location)?;
            let records = bag::read_records(Arc::clone(&store), &files);
            let total = WorkerPool::scoped(config, |pool| records.count(pool))?;
            println!("{total}");
        }
        Commands::CheckCanonical {
            location,
            newspaper,
            stats_csv,
            duplicates_csv,
        } => {
            let location = Location::parse(&location)?;
            let newspapers = listing::resolve_newspapers(
                store.as_ref(),
                &location,
                (!newspaper.is_empty()).then_some(&newspaper[..]),
            )?;
            let issue_files = listing::list_issue_files(store.as_ref(), &location, &newspapers)?;
            let page_files = listing::list_page_files(store.as_ref(), &location, &newspapers)?;

            WorkerPool::scoped(config, |pool| {
                let issues = bag::read_jsonl(Arc::clone(&store), &issue_files);
                let pages = bag::read_jsonl(Arc::clone(&store), &page_files);

                let duplicate_items =
                    checks::check_duplicate_content_items(issues.clone(), pool)?;
                let duplicate_issues = checks::check_duplicate_issue_ids(issues.clone(), pool)?;
                let page_report = checks::check_page_id_consistency(issues.clone(), pages, pool)?;
                let rights = stats::access_rights_breakdown(issues.clone(), pool)?;
                let by_newspaper = stats::newspaper_stats(issues, pool)?;

                println!("duplicated content-item ids: {}", duplicate_items.len());
                println!("duplicated issue ids:        {}", duplicate_issues.len());
                println!(
                    "page ids only in issues:     {}",
                    page_report.only_in_issues.len()
                );
                println!(
                    "page ids only in pages:      {}",
                    page_report.only_in_pages.len()
                );
                for (np, s) in &by_newspaper {
                    println!("{np}: {} issues, {} pages", s.n_issues, s.n_pages);
                }
                for ((np, ar), n) in &rights {
                    println!("{np} [{ar}]: {n} issues");
                }

                if let Some(path) = stats_csv {
                    let rows: Vec<_> = by_newspaper.into_values().collect();
                    let written = report::write_csv(&path, &rows)?;
                    println!("wrote {written} rows to {}", path.display());
                }
                if let Some(path) = duplicates_csv {
                    let written = report::write_csv(&path, &duplicate_items)?;
                    println!("wrote {written} rows to {}", path.display());
                }
                Ok(())
            })?;
        }
        Commands::SyncRebuilt {
            canonical,
            rebuilt,
            missing_csv,
        } => {
            let canonical = Location::parse(&canonical)?;
            let rebuilt = Location::parse(&rebuilt)?;
            let sync_report = WorkerPool::scoped(config, |pool| {
                sync::sync_rebuilt(Arc::clone(&store), &canonical, &rebuilt, pool)
            })?;
            println!(
                "missing from rebuilt:   {}",
                sync_report.missing_from_rebuilt.len()
            );
            println!(
                "missing from canonical: {}",
                sync_report.missing_from_canonical.len()
            );
            if let Some(path) = missing_csv {
                let written = report::write_csv(&path, &sync_report.missing_from_rebuilt)?;
                println!("wrote {written} rows to {}", path.display());
            }
        }
        Commands::TitlesReport {
            titles_csv,
            host,
            out,
        } => {
            let titles: Vec<report::NewspaperTitle> = report::read_csv(&titles_csv)?;
            let markdown = report::titles_markdown(&host, &titles);
            match out {
                Some(path) => std::fs::write(&path, markdown)?,
                None => print!("{markdown}"),
            }
        }
    }
    Ok(())
}
