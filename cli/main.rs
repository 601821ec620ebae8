#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::PathBuf;
use std::process;

use sparsepath::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, FitConfig, SparsityWeight};
use sparsepath::fit::fit_sparse_model;
use sparsepath::model::artifact::TrainedModel;
use sparsepath::model::data::{load_prediction_data, load_training_data};

#[derive(Args)]
pub struct FitArgs {
    /// Path to training TSV file with a header row: the response column plus one column per feature
    pub training_data: PathBuf,

    /// Name of the response column
    #[arg(long, default_value = "y")]
    pub response: String,

    /// Sparsity weight. A single value builds a continuation path automatically;
    /// several values are traversed in the order given, the last being the target
    #[arg(long, required = true, num_args = 1..)]
    pub tau: Vec<f64>,

    /// Strength of the L2 term relative to the datafit Lipschitz constant
    #[arg(long, default_value_t = 0.0)]
    pub smoothing: f64,

    /// Maximum number of FISTA iterations per stage of the path
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Relative-change tolerance of the final stage
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Fit without an intercept; the data is not centered
    #[arg(long)]
    pub no_offset: bool,

    /// Refit the selected features by least squares with this ridge weight (0 for ordinary least squares)
    #[arg(long, value_name = "WEIGHT")]
    pub debias: Option<f64>,

    /// Where to write the fitted model
    #[arg(long, default_value = "model.toml")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct PredictArgs {
    /// Path to TSV file containing the feature columns named in the model
    pub data: PathBuf,

    /// Path to a fitted model file (.toml)
    #[arg(long)]
    pub model: PathBuf,

    /// Where to write the predictions
    #[arg(long, default_value = "predictions.tsv")]
    pub output: PathBuf,
}

#[derive(Parser)]
#[command(
    name = "sparsepath",
    about = "Sparse linear regression by FISTA with warm-started continuation",
    long_about = "Fits L1 (optionally L1 + L2) penalized least-squares models along a \
                 decreasing path of sparsity weights, with an optional least-squares \
                 refit on the selected features."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a sparse model and save it as TOML
    Fit(FitArgs),
    /// Predict responses with a saved model
    Predict(PredictArgs),
}

fn fit(args: FitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = load_training_data(&args.training_data, &args.response)?;

    let weight = match args.tau.as_slice() {
        [single] => SparsityWeight::Single(*single),
        many => SparsityWeight::Sequence(many.to_vec()),
    };
    let config = FitConfig {
        debias_weight: args.debias,
        smoothing: args.smoothing,
        max_iterations: args.max_iterations,
        tolerance: args.tolerance,
        fit_offset: !args.no_offset,
    };

    let fit = fit_sparse_model(data.x.view(), data.y.view(), &weight, &config)?;

    let mut summary = String::new();
    for (idx, stage) in fit.stages.iter().enumerate() {
        writeln!(
            summary,
            "  stage {:>2}: tau={:.4e} iterations={:>6} selected={:>4} {:?}",
            idx + 1,
            stage.tau,
            stage.iterations,
            stage.selected,
            stage.status
        )?;
    }
    println!("Continuation path:\n{summary}");
    println!(
        "Selected {} of {} features, intercept {:.6}, {} iterations in total",
        fit.selected(),
        data.feature_names.len(),
        fit.intercept,
        fit.iterations
    );

    let model = TrainedModel::from_fit(&fit, data.feature_names, config);
    for coefficient in model.selected_features() {
        println!("  {:<24} {:>14.6}", coefficient.feature, coefficient.value);
    }
    model.save(&args.output)?;
    println!("Model saved to: {}", args.output.display());
    Ok(())
}

fn predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let model = TrainedModel::load(&args.model)?;
    let data = load_prediction_data(&args.data, &model.feature_names)?;
    let predictions = model.predict(data.x.view())?;

    let mut out = String::from("sample\tprediction\n");
    for (idx, value) in predictions.iter().enumerate() {
        writeln!(out, "{}\t{value}", idx + 1)?;
    }
    fs::write(&args.output, out)?;
    println!(
        "Wrote {} predictions to: {}",
        predictions.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Fit(args)) => fit(args),
        Some(Commands::Predict(args)) => predict(args),
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
            }
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
