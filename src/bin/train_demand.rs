use clap::Parser;
use smartshelf::application::ml::{DataPreprocessor, EvaluationReport, ModelTrainer};
use smartshelf::config::Config;
use smartshelf::infrastructure::ArtifactStore;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the demand forecasting model", long_about = None)]
struct Args {
    /// Path to historical sales CSV (defaults to DEMAND_DATA_PATH)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Path to output model artifact (defaults to DEMAND_MODEL_PATH)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of trees in the ensemble
    #[arg(long)]
    n_trees: Option<usize>,

    /// Maximum depth of trees
    #[arg(long)]
    max_depth: Option<u16>,

    /// Seed for the train/test split and tree sampling
    #[arg(long)]
    seed: Option<u64>,
}

/// Prints held-out metrics and a text bar chart of feature importances.
fn print_report(report: &EvaluationReport) {
    println!("\n══════════════════════════════════════════════════════");
    println!(
        "  MODEL EVALUATION (train n={}, test n={})",
        report.n_train, report.n_test
    );
    println!("══════════════════════════════════════════════════════");
    println!("    MAE:  {:.4}", report.mae);
    println!("    RMSE: {:.4}", report.rmse);
    println!("    R²:   {:.4}", report.r2);

    println!("\n  Top {} Feature Importances:", report.top_features.len());
    let max_score = report
        .top_features
        .iter()
        .map(|f| f.importance)
        .fold(0.0_f64, f64::max);
    let width = report
        .top_features
        .iter()
        .map(|f| f.feature.len())
        .max()
        .unwrap_or(0);
    for entry in &report.top_features {
        let bar_len = if max_score > 0.0 {
            (entry.importance.max(0.0) / max_score * 40.0).ceil() as usize
        } else {
            0
        };
        println!(
            "    {:<width$} {:>12.4} {}",
            entry.feature,
            entry.importance,
            "█".repeat(bar_len),
            width = width
        );
    }
    println!("══════════════════════════════════════════════════════\n");
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(n_trees) = args.n_trees {
        config.training.n_trees = n_trees;
    }
    if let Some(max_depth) = args.max_depth {
        config.training.max_depth = max_depth;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    let input = args.input.unwrap_or(config.data_path);
    let output = args.output.unwrap_or(config.model_path);

    info!("Loading sales data from {:?}", input);
    let preprocessor = DataPreprocessor::new();
    let records = preprocessor.load(&input)?;
    let data = preprocessor.clean(&records)?;

    let trainer = ModelTrainer::new(config.training.training_params());
    let store = ArtifactStore::new(&output);
    let (artifact, report) = trainer.train_and_persist(&data, &store)?;

    print_report(&report);
    println!(
        "Model saved to {:?} (schema {}, {} features).",
        store.path(),
        artifact.schema.version,
        artifact.schema.len()
    );
    Ok(())
}
