//! paperlink CLI
//!
//! Loads a dataset from JSON/CSV inputs and resolves, samples, or
//! featurizes its pairs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use paperlink_core::{
    featurize, DatasetConfig, FeatureBatch, FeaturizationInfo, FeaturizeOptions, Featurized,
    InputSource, PaperDataset, Resolution, ResolveOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paperlink")]
#[command(about = "Constraint-aware pairwise feature pipeline for paper deduplication")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Settle a single pair by seeds and shared identifiers
    Resolve {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// First paper id
        paper_id_1: String,
        /// Second paper id
        paper_id_2: String,
        /// Seeds from different groups do not force a split
        #[arg(long)]
        allow_conflicting_seeds: bool,
        /// Ignore same-group seeds
        #[arg(long)]
        ignore_seeds: bool,
    },

    /// Print the split and pair counts
    Pairs {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Featurize the dataset and report matrix shapes
    Featurize {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Feature cache root (default: $PAPERLINK_CACHE or ~/.paperlink)
        #[arg(long)]
        cache_root: Option<PathBuf>,
        /// Skip the feature cache
        #[arg(long)]
        no_cache: bool,
        /// Also build the nameless matrices
        #[arg(long)]
        nameless: bool,
        /// Drop Different training rows with near-identical coauthors
        #[arg(long)]
        delete_training_data: bool,
        /// Comma-separated feature groups to emit
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset name (also names the cache directory)
    #[arg(long)]
    name: String,
    /// Papers JSON
    #[arg(long)]
    papers: PathBuf,
    /// Clusters JSON
    #[arg(long)]
    clusters: Option<PathBuf>,
    /// Cluster seeds JSON
    #[arg(long)]
    seeds: Option<PathBuf>,
    /// Dataset config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Worker threads
    #[arg(short = 'j', long)]
    n_jobs: Option<usize>,
}

impl DatasetArgs {
    fn load(&self) -> paperlink_core::Result<PaperDataset> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    paperlink_core::InputError::Io {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                })?;
                DatasetConfig::from_toml(&text)?
            }
            None => DatasetConfig::default(),
        };
        if let Some(n_jobs) = self.n_jobs {
            config.n_jobs = n_jobs;
        }

        let mut builder = PaperDataset::builder(&self.name, InputSource::path(&self.papers))
            .config(config);
        if let Some(path) = &self.clusters {
            builder = builder.clusters(InputSource::path(path));
        }
        if let Some(path) = &self.seeds {
            builder = builder.cluster_seeds(InputSource::path(path));
        }
        builder.build()
    }
}

fn describe(label: &str, batch: &FeatureBatch) {
    let (rows, cols) = batch.features.dim();
    match &batch.nameless_features {
        Some(nameless) => println!("{label}: {rows} x {cols} (nameless {} cols)", nameless.ncols()),
        None => println!("{label}: {rows} x {cols}"),
    }
}

fn run(cli: Cli) -> paperlink_core::Result<()> {
    match cli.command {
        Commands::Resolve {
            dataset,
            paper_id_1,
            paper_id_2,
            allow_conflicting_seeds,
            ignore_seeds,
        } => {
            let dataset = dataset.load()?;
            let resolution = dataset.resolve(
                &paper_id_1,
                &paper_id_2,
                ResolveOptions {
                    dont_merge_on_conflicting_seeds: !allow_conflicting_seeds,
                    ignore_seeds,
                },
            )?;
            let text = match resolution {
                Resolution::Require => "require",
                Resolution::Disallow => "disallow",
                Resolution::Unknown => "unknown",
            };
            println!("{text}");
        }

        Commands::Pairs { dataset } => {
            let dataset = dataset.load()?;
            println!(
                "{} papers in {} blocks",
                dataset.store().len(),
                dataset.blocks().len()
            );
            if dataset.mode() == paperlink_core::Mode::Inference {
                println!("all pairs: {}", dataset.all_pairs()?.len());
            } else {
                let split = dataset.split_cluster_papers()?;
                let pairs = dataset.split_pairs(&split)?;
                println!(
                    "train: {} pairs, val: {} pairs, test: {} pairs",
                    pairs.train.len(),
                    pairs.val.len(),
                    pairs.test.len()
                );
            }
        }

        Commands::Featurize {
            dataset,
            cache_root,
            no_cache,
            nameless,
            delete_training_data,
            features,
        } => {
            let dataset = dataset.load()?;
            let info = match features {
                Some(names) => FeaturizationInfo::from_names(
                    &names[..],
                    &["title_similarity".to_string(), "abstract_similarity".to_string()],
                    paperlink_core::config::FEATURIZER_VERSION,
                )?,
                None => FeaturizationInfo::default(),
            };
            let options = FeaturizeOptions {
                n_jobs: dataset.config().workers(),
                use_cache: !no_cache,
                nameless,
                delete_training_data,
                cache_root,
                ..FeaturizeOptions::default()
            };
            match featurize(&dataset, &info, &options)? {
                Featurized::Inference(batch) => describe("all", &batch),
                Featurized::Train { train, val, test } => {
                    describe("train", &train);
                    describe("val", &val);
                    describe("test", &test);
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
