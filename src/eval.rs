//! Sequential evaluation loop: classify, prompt, generate, parse, score

use crate::answer::split_explanation_answer;
use crate::core::{PromptImage, VlmBackend};
use crate::dataset::Example;
use crate::error::{ClevrEvalError, Result};
use crate::tasks;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const PROGRESS_INTERVAL: usize = 200;

/// Loop configuration
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Few-shot demonstration count (clamped to the available pool)
    pub shots: usize,
    /// Include demonstration images in few-shot turns
    pub demo_images: bool,
    /// Token budget for each generation call
    pub max_new_tokens: u32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            shots: 0,
            demo_images: false,
            max_new_tokens: 128,
        }
    }
}

/// Per-example result record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub idx: usize,
    pub question: String,
    /// Normalized predicted answer label
    pub label: String,
    pub ground_truth: Option<String>,
    /// Ground-truth explanation sentences from the dataset
    pub explanation: Vec<String>,
    /// Full raw prediction, trimmed
    pub pred_full: String,
    /// None when no ground truth exists or the sample could not be evaluated
    pub correct: Option<bool>,
    pub image: String,
    pub num_shots: usize,
    pub qtype: tasks::QuestionType,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Accuracy over the scored subset; None when nothing had ground truth
    pub accuracy: Option<f64>,
    pub num_samples: usize,
    pub num_scored: usize,
    pub records: Vec<EvalRecord>,
}

/// Run the evaluation over all examples in order.
///
/// One example is fully processed before the next begins. Per-example
/// conditions (unreadable image, separator-free output) never abort the
/// loop; only prompt-assembly and backend failures propagate.
pub async fn run_eval(
    backend: &dyn VlmBackend,
    examples: &[Example],
    opts: &EvalOptions,
) -> Result<EvalReport> {
    info!(
        samples = examples.len(),
        shots = opts.shots,
        "running CLEVR-X evaluation"
    );

    let mut records = Vec::with_capacity(examples.len());
    for (idx, example) in examples.iter().enumerate() {
        if idx % PROGRESS_INTERVAL == 0 {
            info!("processed {}/{}", idx, examples.len());
        }

        let generated = match open_example_image(example) {
            Ok(image) => {
                let conversation = tasks::build_prompt(
                    example.qtype,
                    image,
                    &example.question,
                    opts.shots,
                    opts.demo_images,
                )?;
                let raw = backend.generate(&conversation, opts.max_new_tokens).await?;
                let pred_full = raw.trim().to_string();
                let (_, answer) = split_explanation_answer(&pred_full);
                let label = tasks::normalize_answer(example.qtype, &answer);
                Some((pred_full, label))
            }
            Err(e) => {
                warn!(
                    sample = %example.sample_id,
                    error = %e,
                    "skipping sample with unreadable image"
                );
                None
            }
        };

        let (pred_full, label) = generated.clone().unwrap_or_default();
        let correct = match (&example.answer, generated.is_some()) {
            (Some(gt), true) if !gt.is_empty() => Some(label == gt.trim()),
            _ => None,
        };

        records.push(EvalRecord {
            idx,
            question: example.question.clone(),
            label,
            ground_truth: example.answer.clone(),
            explanation: example.explanation.clone(),
            pred_full,
            correct,
            image: example.image_path.clone(),
            num_shots: opts.shots,
            qtype: example.qtype,
        });
    }

    let scored: Vec<bool> = records.iter().filter_map(|r| r.correct).collect();
    let accuracy = if scored.is_empty() {
        None
    } else {
        let hits = scored.iter().filter(|&&hit| hit).count();
        Some(hits as f64 / scored.len() as f64)
    };

    match accuracy {
        Some(acc) => info!("CLEVR-X accuracy: {:.3}", acc),
        None => info!("no ground-truth answers available for evaluation"),
    }

    Ok(EvalReport {
        accuracy,
        num_samples: records.len(),
        num_scored: scored.len(),
        records,
    })
}

fn open_example_image(example: &Example) -> Result<PromptImage> {
    if example.image_path.is_empty() {
        return Err(ClevrEvalError::DatasetError(format!(
            "no image resolved for sample {}",
            example.sample_id
        )));
    }
    Ok(PromptImage::Image(image::open(&example.image_path)?))
}
