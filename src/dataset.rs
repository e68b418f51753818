//! CLEVR-X dataset loading: CSV rows, image path resolution and
//! explanation-literal parsing

use crate::error::{ClevrEvalError, Result};
use crate::tasks::{classify_question, QuestionType};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Candidate image directories probed under the dataset root, in order
const IMAGE_SUBDIRS: &[&str] = &["train", "test", "train_non_labels"];

/// Accepted column names for the image file field; first non-empty wins
const FILE_COLUMNS: &[&str] = &["file", "image", "filename"];

/// One dataset row, immutable after load
#[derive(Debug, Clone)]
pub struct Example {
    pub sample_id: String,
    pub question: String,
    /// None for unlabeled / test splits
    pub answer: Option<String>,
    /// Ground-truth explanation sentences
    pub explanation: Vec<String>,
    /// Empty string when no candidate directory holds the file
    pub image_path: String,
    pub qtype: QuestionType,
}

/// Load a CLEVR-X CSV into examples, preserving row order.
///
/// Fails only when the CSV itself cannot be opened; missing images and
/// malformed explanation fields degrade silently.
pub fn load_dataset(root: &Path, csv_path: &Path, labeled: bool) -> Result<Vec<Example>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .map_err(|e| {
            ClevrEvalError::DatasetError(format!("failed to open {}: {}", csv_path.display(), e))
        })?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let id_col = column("id");
    let question_col = column("question");
    let answer_col = column("answer");
    let explanation_col = column("explanation");
    let file_cols: Vec<usize> = FILE_COLUMNS.iter().filter_map(|c| column(c)).collect();

    let mut examples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("");

        let question = field(question_col).to_string();
        let answer = if labeled {
            answer_col.and_then(|i| record.get(i)).map(str::to_string)
        } else {
            None
        };
        let explanation = if labeled {
            parse_explanation_field(field(explanation_col))
        } else {
            Vec::new()
        };

        let file_name = file_cols
            .iter()
            .filter_map(|&i| record.get(i))
            .find(|value| !value.is_empty());
        let image_path = file_name
            .map(|name| resolve_image_path(root, name))
            .unwrap_or_default();

        let qtype = classify_question(&question);

        examples.push(Example {
            sample_id: field(id_col).to_string(),
            question,
            answer,
            explanation,
            image_path,
            qtype,
        });
    }

    Ok(examples)
}

/// Probe the candidate subdirectories for the file; empty string when absent
fn resolve_image_path(root: &Path, file_name: &str) -> String {
    for dir in IMAGE_SUBDIRS {
        let candidate = root.join(dir).join(file_name);
        if candidate.exists() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    String::new()
}

/// Parse the explanation column, stored as a serialized list literal like
/// `['first sentence', 'second sentence']`. Unparseable text falls back to a
/// one-element list; an empty field yields an empty list.
pub(crate) fn parse_explanation_field(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    parse_list_literal(raw).unwrap_or_else(|| vec![raw.to_string()])
}

fn parse_list_literal(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(c @ ('\'' | '"')) => c,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    Some(items)
}

/// Compute SHA256 hash of the loaded examples for reproducibility
pub fn compute_dataset_hash(examples: &[Example]) -> String {
    let mut hasher = Sha256::new();
    for example in examples {
        hasher.update(example.sample_id.as_bytes());
        hasher.update(example.question.as_bytes());
        if let Some(ref answer) = example.answer {
            hasher.update(answer.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_labeled_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "labels.csv",
            "id,question,answer,file,explanation\n\
             q1,Is the sphere red?,yes,a.png,\"['there is a red sphere']\"\n\
             q2,How many cubes are there?,3,b.png,\"['there are three cubes']\"\n",
        );

        let examples = load_dataset(dir.path(), &csv_path, true).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].sample_id, "q1");
        assert_eq!(examples[0].answer.as_deref(), Some("yes"));
        assert_eq!(examples[0].qtype, QuestionType::Binary);
        assert_eq!(examples[1].qtype, QuestionType::Counting);
        assert_eq!(examples[1].explanation, vec!["there are three cubes"]);
    }

    #[test]
    fn test_missing_image_yields_empty_path() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "labels.csv",
            "id,question,answer,file,explanation\nq1,Is the sphere red?,yes,nowhere.png,\n",
        );

        let examples = load_dataset(dir.path(), &csv_path, true).unwrap();
        assert_eq!(examples[0].image_path, "");
        assert!(examples[0].explanation.is_empty());
    }

    #[test]
    fn test_image_resolved_across_candidate_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("test")).unwrap();
        fs::write(dir.path().join("test").join("scene.png"), b"png").unwrap();
        let csv_path = write_csv(
            dir.path(),
            "labels.csv",
            "id,question,answer,file,explanation\nq1,Is the sphere red?,yes,scene.png,\n",
        );

        let examples = load_dataset(dir.path(), &csv_path, true).unwrap();
        assert!(examples[0].image_path.ends_with("scene.png"));
        assert!(examples[0].image_path.contains("test"));
    }

    #[test]
    fn test_alternate_file_column_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("train")).unwrap();
        fs::write(dir.path().join("train").join("scene.png"), b"png").unwrap();
        let csv_path = write_csv(
            dir.path(),
            "labels.csv",
            "id,question,answer,filename\nq1,Is the sphere red?,yes,scene.png\n",
        );

        let examples = load_dataset(dir.path(), &csv_path, true).unwrap();
        assert!(examples[0].image_path.ends_with("scene.png"));
    }

    #[test]
    fn test_unlabeled_mode_skips_answer_and_explanation() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "test.csv",
            "id,question,answer,file,explanation\nq1,Is the sphere red?,yes,a.png,\"['x']\"\n",
        );

        let examples = load_dataset(dir.path(), &csv_path, false).unwrap();
        assert_eq!(examples[0].answer, None);
        assert!(examples[0].explanation.is_empty());
    }

    #[test]
    fn test_missing_csv_is_dataset_error() {
        let dir = TempDir::new().unwrap();
        let result = load_dataset(dir.path(), &dir.path().join("absent.csv"), true);
        assert!(matches!(result, Err(ClevrEvalError::DatasetError(_))));
    }

    #[test]
    fn test_parse_explanation_list() {
        assert_eq!(
            parse_explanation_field("['one', 'two']"),
            vec!["one", "two"]
        );
        assert_eq!(
            parse_explanation_field("[\"double quoted\"]"),
            vec!["double quoted"]
        );
        assert_eq!(
            parse_explanation_field(r"['it\'s small']"),
            vec!["it's small"]
        );
    }

    #[test]
    fn test_parse_explanation_fallback_and_empty() {
        assert_eq!(
            parse_explanation_field("not a list"),
            vec!["not a list"]
        );
        assert_eq!(
            parse_explanation_field("[broken"),
            vec!["[broken"]
        );
        assert!(parse_explanation_field("").is_empty());
        assert!(parse_explanation_field("[]").is_empty());
    }

    #[test]
    fn test_dataset_hash_deterministic_and_content_sensitive() {
        let a = Example {
            sample_id: "q1".to_string(),
            question: "Is the sphere red?".to_string(),
            answer: Some("yes".to_string()),
            explanation: vec![],
            image_path: String::new(),
            qtype: QuestionType::Binary,
        };
        let mut b = a.clone();

        assert_eq!(
            compute_dataset_hash(std::slice::from_ref(&a)),
            compute_dataset_hash(std::slice::from_ref(&a))
        );

        b.answer = Some("no".to_string());
        assert_ne!(
            compute_dataset_hash(std::slice::from_ref(&a)),
            compute_dataset_hash(std::slice::from_ref(&b))
        );
    }
}
