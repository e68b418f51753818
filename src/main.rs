//! clevreval - evaluate vision-language models on CLEVR-X style datasets

mod answer;
mod core;
mod dataset;
mod error;
mod eval;
mod prompt;
mod tasks;

use crate::core::{APIConfig, ApiClient, GenKwargs};
use crate::dataset::compute_dataset_hash;
use crate::error::Result;
use crate::eval::{run_eval, EvalOptions, EvalRecord};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Evaluate a vision-language model on CLEVR-X style datasets
#[derive(Parser, Debug)]
#[command(name = "clevreval")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate VLMs on CLEVR-X style datasets through OpenAI-compatible APIs")]
struct Args {
    /// Dataset root holding the image directories (train, test, train_non_labels)
    #[arg(long, required = true)]
    dataset_root: PathBuf,

    /// CSV file with questions (e.g. train_labels.csv, test_non_labels.csv)
    #[arg(long, required = true)]
    csv: PathBuf,

    /// Model configuration: model=name,base_url=url[,seed=N,timeout=N,max_retries=N,api_key=key]
    #[arg(long, required = true)]
    model_args: String,

    /// Generation kwargs: temperature=N,max_tokens=N,top_p=N,...
    #[arg(long, default_value = "")]
    gen_kwargs: String,

    /// Few-shot mode: zero, 1shot or 3shot
    #[arg(long, default_value = "zero")]
    shots: String,

    /// Include demonstration images in few-shot turns (text-only otherwise)
    #[arg(long, default_value = "false")]
    fewshot_images: bool,

    /// Treat the CSV as unlabeled (no ground-truth answers)
    #[arg(long, default_value = "false")]
    unlabeled: bool,

    /// Maximum samples to evaluate
    #[arg(long)]
    max_samples: Option<usize>,

    /// Token budget for each generation call
    #[arg(long, default_value = "128")]
    max_new_tokens: u32,

    /// Random seed passed to the API
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output directory for results
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Log individual records to a JSONL file
    #[arg(long, default_value = "false")]
    log_samples: bool,
}

/// Overall evaluation results
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvalResults {
    accuracy: Option<f64>,
    num_samples: usize,
    num_scored: usize,
    dataset_hash: String,
    total_seconds: f64,
    config: ConfigOutput,
}

/// Configuration output
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigOutput {
    model: String,
    dataset_root: String,
    csv: String,
    shots: usize,
    fewshot_images: bool,
    max_samples: Option<usize>,
    max_new_tokens: u32,
    seed: u64,
}

/// Write results to JSON file
fn write_results_json(output_path: &PathBuf, results: &EvalResults) -> Result<()> {
    fs::create_dir_all(output_path)?;
    let file_path = output_path.join("results.json");
    let file = File::create(&file_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

/// Write per-sample records to JSONL file
fn write_samples_jsonl(output_path: &PathBuf, records: &[EvalRecord]) -> Result<()> {
    fs::create_dir_all(output_path)?;
    let file_path = output_path.join("samples_clevrx.jsonl");
    let file = File::create(&file_path)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let start = Instant::now();

    // Parse model config
    let mut config = APIConfig::from_model_args(&args.model_args)?;
    config.seed = args.seed;

    // Parse generation kwargs
    let gen_kwargs = if args.gen_kwargs.is_empty() {
        GenKwargs::default()
    } else {
        GenKwargs::from_str(&args.gen_kwargs)?
    };

    // Load dataset
    let mut examples = dataset::load_dataset(&args.dataset_root, &args.csv, !args.unlabeled)?;
    if let Some(n) = args.max_samples {
        examples.truncate(n);
    }
    let dataset_hash = compute_dataset_hash(&examples);

    let opts = EvalOptions {
        shots: prompt::resolve_shot_count(&args.shots),
        demo_images: args.fewshot_images,
        max_new_tokens: args.max_new_tokens,
    };

    // Run evaluation
    let client = ApiClient::new(config.clone(), gen_kwargs);
    let report = run_eval(&client, &examples, &opts).await?;

    let results = EvalResults {
        accuracy: report.accuracy,
        num_samples: report.num_samples,
        num_scored: report.num_scored,
        dataset_hash,
        total_seconds: start.elapsed().as_secs_f64(),
        config: ConfigOutput {
            model: config.model,
            dataset_root: args.dataset_root.to_string_lossy().into_owned(),
            csv: args.csv.to_string_lossy().into_owned(),
            shots: opts.shots,
            fewshot_images: args.fewshot_images,
            max_samples: args.max_samples,
            max_new_tokens: args.max_new_tokens,
            seed: args.seed,
        },
    };

    if let Some(ref path) = args.output_path {
        write_results_json(path, &results)?;
        if args.log_samples {
            write_samples_jsonl(path, &report.records)?;
        }
    }

    // Output results to stdout
    let json = serde_json::to_string_pretty(&results)?;
    println!("{}", json);

    Ok(())
}
