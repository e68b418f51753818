//! Question types: classification and per-type dispatch

pub mod attribute;
pub mod binary;
pub mod counting;

use crate::core::{Conversation, PromptImage};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task type of a CLEVR-X question, fixed at dataset load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Binary,
    Counting,
    Attribute,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Binary => "binary",
            QuestionType::Counting => "counting",
            QuestionType::Attribute => "attribute",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered attribute patterns checked after the fast first-token paths.
/// Evaluation order is part of the classifier contract.
static ATTRIBUTE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "what color is", "the cube is what color?", "has what color?"
        r"\bwhat\b.*\b(color|colour|shape|size|material)\b",
        // "is what color/size/shape/material?"
        r"\b(color|colour|shape|size|material)\b.*\bis what\b",
        // "has what color/shape/size/material?"
        r"\bhas what\b.*\b(color|colour|shape|size|material)\b",
        // "how big is it?", "how small is it?"
        r"\bhow (big|small)\b",
        // "what is its color?", "what is the size/material/shape?"
        r"what is (its|the) (color|colour|shape|size|material)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Classify a CLEVR-X question into binary, counting or attribute.
///
/// Pure and total: blank input defaults to attribute, anything unmatched
/// falls back to binary. First match wins:
/// 1. counting keywords anywhere in the question;
/// 2. sentence-initial interrogative words (is/are/does/do vs. what);
/// 3. attribute-noun co-occurrence patterns, in order;
/// 4. binary fallback (yes/no questions have the most varied phrasing).
pub fn classify_question(question: &str) -> QuestionType {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return QuestionType::Attribute;
    }

    if q.contains("how many") || q.contains("what number") {
        return QuestionType::Counting;
    }

    if let Some(first) = q.split_whitespace().next() {
        match first {
            "is" | "are" | "does" | "do" => return QuestionType::Binary,
            "what" => return QuestionType::Attribute,
            _ => {}
        }
    }

    if ATTRIBUTE_PATTERNS.iter().any(|pattern| pattern.is_match(&q)) {
        return QuestionType::Attribute;
    }
    // "what is the cube made of?"
    if q.contains("what is") && q.contains("made of") {
        return QuestionType::Attribute;
    }

    QuestionType::Binary
}

/// Build the conversation for a question using the built-in demonstration
/// table of its task type
pub fn build_prompt(
    qtype: QuestionType,
    image: PromptImage,
    question: &str,
    shots: usize,
    demo_images: bool,
) -> Result<Conversation> {
    match qtype {
        QuestionType::Binary => {
            binary::build_prompt(image, question, shots, demo_images, binary::FEWSHOT)
        }
        QuestionType::Counting => {
            counting::build_prompt(image, question, shots, demo_images, counting::FEWSHOT)
        }
        QuestionType::Attribute => {
            attribute::build_prompt(image, question, shots, demo_images, attribute::FEWSHOT)
        }
    }
}

/// Normalize a parsed answer into the task type's value domain
pub fn normalize_answer(qtype: QuestionType, raw: &str) -> String {
    match qtype {
        QuestionType::Binary => binary::normalize(raw),
        QuestionType::Counting => counting::normalize(raw),
        QuestionType::Attribute => attribute::normalize(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_keywords_dominate() {
        assert_eq!(
            classify_question("How many cubes are there?"),
            QuestionType::Counting
        );
        assert_eq!(
            classify_question("There is a gray metal cylinder; what number of red metallic things are right of it?"),
            QuestionType::Counting
        );
        // counting keyword wins even with a binary-looking start
        assert_eq!(
            classify_question("Is it true how many spheres there are?"),
            QuestionType::Counting
        );
    }

    #[test]
    fn test_binary_first_tokens() {
        assert_eq!(classify_question("Is the sphere red?"), QuestionType::Binary);
        assert_eq!(classify_question("Does the cube exist?"), QuestionType::Binary);
        assert_eq!(
            classify_question("Are there any small red metal cubes?"),
            QuestionType::Binary
        );
        assert_eq!(
            classify_question("Do the two spheres share a color?"),
            QuestionType::Binary
        );
    }

    #[test]
    fn test_what_initial_is_attribute() {
        assert_eq!(
            classify_question("What color is the cube?"),
            QuestionType::Attribute
        );
        assert_eq!(
            classify_question("What is the shape of the big thing?"),
            QuestionType::Attribute
        );
    }

    #[test]
    fn test_embedded_attribute_patterns() {
        assert_eq!(
            classify_question("The cylinder in front of the ball has what material?"),
            QuestionType::Attribute
        );
        assert_eq!(
            classify_question("There is a matte thing; how big is it?"),
            QuestionType::Attribute
        );
        assert_eq!(
            classify_question("The small cube; what is the cube made of?"),
            QuestionType::Attribute
        );
    }

    #[test]
    fn test_binary_fallback() {
        assert_eq!(
            classify_question("There is a sphere behind the cube; is its color the same as the cylinder?"),
            QuestionType::Binary
        );
    }

    #[test]
    fn test_blank_defaults_to_attribute() {
        assert_eq!(classify_question(""), QuestionType::Attribute);
        assert_eq!(classify_question("   "), QuestionType::Attribute);
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let question = "What size is the green thing?";
        assert_eq!(classify_question(question), classify_question(question));
    }

    #[test]
    fn test_question_type_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&QuestionType::Counting).unwrap(),
            "\"counting\""
        );
    }
}
