//! drugclf - Drug Classification pipeline CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use drugclf_core::logic::dataset::{self, summarize};
use drugclf_core::logic::model::{self, evaluate_on_dataset, train_labeled, Hyperparameters};
use drugclf_core::{ModelInfo, PipelineConfig, RawPatient, UnknownCategoryPolicy};

#[derive(Parser)]
#[command(name = "drugclf")]
#[command(about = "Train, evaluate and query the drug classification model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print dataset shape and distributions
    Explore {
        /// Dataset CSV (defaults to DRUGCLF_DATA_PATH or drug200.csv)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Full pipeline: load, prepare, train, evaluate, save
    Train {
        #[arg(long)]
        data: Option<PathBuf>,

        /// Where to write the model bundle
        #[arg(long)]
        model_path: Option<PathBuf>,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.3)]
        held_out_fraction: f64,

        /// Disable SMOTE oversampling
        #[arg(long)]
        no_smote: bool,

        /// Seed for the split and oversampling
        #[arg(long)]
        random_state: Option<u64>,

        #[arg(long, default_value_t = 100)]
        tree_count: usize,

        #[arg(long, default_value_t = 30)]
        max_leaf_nodes: usize,

        /// What encoding does with unseen categories (reject, zero_row)
        #[arg(long)]
        unknown_category: Option<UnknownCategoryPolicy>,
    },

    /// Score a saved model on the held-out rows it was evaluated on
    Evaluate {
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        model_path: Option<PathBuf>,
    },

    /// Classify one patient with a saved model
    Predict {
        #[arg(long)]
        model_path: Option<PathBuf>,

        #[arg(long)]
        age: i64,

        /// F or M
        #[arg(long)]
        sex: String,

        /// HIGH, NORMAL or LOW
        #[arg(long)]
        bp: String,

        /// HIGH or NORMAL
        #[arg(long)]
        cholesterol: String,

        #[arg(long)]
        na_to_k: f64,
    },

    /// Display model information
    Info {
        #[arg(long)]
        model_path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command {
        Commands::Explore { data } => cmd_explore(&data.unwrap_or(config.data_path)),
        Commands::Train {
            data,
            model_path,
            held_out_fraction,
            no_smote,
            random_state,
            tree_count,
            max_leaf_nodes,
            unknown_category,
        } => {
            let params = Hyperparameters {
                tree_count,
                max_leaf_nodes,
                held_out_fraction,
                apply_rebalancing: !no_smote,
                random_state: random_state.unwrap_or(config.random_state),
                unknown_category: unknown_category.unwrap_or(config.unknown_category),
                ..Default::default()
            };
            cmd_train(
                &data.unwrap_or(config.data_path),
                &model_path.unwrap_or(config.model_path),
                &params,
            )
        }
        Commands::Evaluate { data, model_path } => cmd_evaluate(
            &data.unwrap_or(config.data_path),
            &model_path.unwrap_or(config.model_path),
        ),
        Commands::Predict {
            model_path,
            age,
            sex,
            bp,
            cholesterol,
            na_to_k,
        } => {
            let raw = RawPatient {
                age,
                sex,
                bp,
                cholesterol,
                na_to_k,
            };
            cmd_predict(&model_path.unwrap_or(config.model_path), &raw)
        }
        Commands::Info { model_path } => cmd_info(&model_path.unwrap_or(config.model_path)),
    }
}

fn cmd_explore(data: &Path) -> Result<()> {
    let rows = dataset::load_csv(data).with_context(|| format!("loading {}", data.display()))?;
    println!("{}", summarize(&rows));
    Ok(())
}

fn cmd_train(data: &Path, model_path: &Path, params: &Hyperparameters) -> Result<()> {
    let rows = dataset::load_csv(data).with_context(|| format!("loading {}", data.display()))?;

    let (trained, evaluation) = train_labeled(&rows, params).context("training failed")?;
    println!("{}", evaluation);

    model::persist(&trained, model_path)
        .with_context(|| format!("saving model to {}", model_path.display()))?;
    println!("Model {} saved to {}", trained.run_id, model_path.display());
    Ok(())
}

fn cmd_evaluate(data: &Path, model_path: &Path) -> Result<()> {
    let trained = model::load(model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;
    let rows = dataset::load_csv(data).with_context(|| format!("loading {}", data.display()))?;

    let evaluation = evaluate_on_dataset(&trained, &rows).context("evaluation failed")?;
    println!("{}", evaluation);
    Ok(())
}

fn cmd_predict(model_path: &Path, raw: &RawPatient) -> Result<()> {
    let trained = model::load(model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;
    let record = raw.validate().context("invalid patient")?;
    let label = trained.predict(&record).context("prediction failed")?;
    println!("{}", label);
    Ok(())
}

fn cmd_info(model_path: &Path) -> Result<()> {
    let trained = model::load(model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;
    let info = ModelInfo::from(&trained);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
