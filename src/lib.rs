//! clevreval - a harness for evaluating vision-language models on CLEVR-X
//! style datasets through OpenAI-compatible APIs
//!
//! This crate provides:
//! - A question classifier (binary / counting / attribute)
//! - Task-specific prompt builders with few-shot demonstrations
//! - CSV dataset loading with image path resolution
//! - An answer parser for the "<explanation> -> <answer>" grammar
//! - A sequential evaluation loop scoring predictions against ground truth

pub mod answer;
pub mod core;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod prompt;
pub mod tasks;

pub use crate::answer::{format_explanation_answer, split_explanation_answer};
pub use crate::core::{
    APIConfig, ApiClient, ChatMessage, ContentPart, Conversation, GenKwargs, PromptImage, Role,
    Turn, VlmBackend,
};
pub use crate::dataset::{compute_dataset_hash, load_dataset, Example};
pub use crate::error::{ClevrEvalError, Result};
pub use crate::eval::{run_eval, EvalOptions, EvalRecord, EvalReport};
pub use crate::prompt::{resolve_shot_count, Demo};
pub use crate::tasks::{classify_question, QuestionType};
