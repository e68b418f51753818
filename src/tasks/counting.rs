//! Counting questions: integer answers between 0 and 10

use crate::core::{Conversation, PromptImage};
use crate::error::Result;
use crate::prompt::{assemble, Demo};
use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const SYSTEM_PROMPT: &str = "\
You are a visual reasoning assistant for synthetic 3D scenes. Think step-by-step but return only the final answer and a short explanation.
Each image contains objects with four attributes (shape, color, size, material).
Given an IMAGE and a QUESTION, your task is to answer a counting problem strictly based on the image.
Your final answer must always follow this format:
<explanation> -> <answer>
Rules:
- <answer> is exactly an integer between 0 and 10.
- <explanation> is concise and directly supports the final answer.
";

/// Bundled demonstration corpus for counting questions
pub const FEWSHOT: &[Demo] = &[
    Demo {
        file: "custom_dataset/custom_dataset/train/12d593afbf4ae5d7168ad633336f09e3.png",
        question: "What number of things are matte things that are in front of the ball or tiny cylinders that are in front of the large shiny ball?",
        explanation: "There is a matte cylinder that is in front of the ball and there is a tiny cylinder which is in front of the large shiny ball.",
        answer: "1",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/706fbab80d45831c18457e84141d217c.png",
        question: "How many rubber spheres are to the right of the big metal object that is behind the large brown cylinder to the right of the metal ball?",
        explanation: "There are two rubber spheres which are to the right of the big metal sphere that is behind the large brown cylinder that is right of the metal ball.",
        answer: "2",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/3137a885651ca8d6728a3dcc7d49e628.png",
        question: "What number of objects are big gray cubes or tiny objects in front of the tiny red rubber block?",
        explanation: "There are two tiny spheres, three tiny cubes and two tiny cylinders which are in front of the tiny red rubber block.",
        answer: "7",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/b62787f3a8029a2f33596355b3ce4b78.png",
        question: "There is a gray metal cylinder; what number of red metallic things are right of it?",
        explanation: "There are no red metallic things that are to the right of the gray metal cylinder.",
        answer: "0",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/8eb1a1a6630c9bce828c06fe55a1ae3d.png",
        question: "How many things are small metallic cubes or cylinders?",
        explanation: "There are three cylinders.",
        answer: "3",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/cd27db34d8bea1af360723898534ed7f.png",
        question: "What number of other objects are there of the same size as the cyan rubber object?",
        explanation: "There are two small cubes and two small cylinders which have the identical size as a cyan rubber cylinder.",
        answer: "4",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/83975892ffe34efc1d35d35e34964980.png",
        question: "How many green objects are matte spheres or big objects?",
        explanation: "There are no green things.",
        answer: "0",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/086dd3133e8a839831161dc84cdca030.png",
        question: "How many other things are there of the same material as the purple ball?",
        explanation: "There are four rubber cubes and a rubber cylinder that have the same material as a purple ball.",
        answer: "5",
    },
];

/// Regex for extracting the first integer substring from an answer
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Build a conversation for a counting question
pub fn build_prompt(
    image: PromptImage,
    question: &str,
    shots: usize,
    demo_images: bool,
    demos: &[Demo],
) -> Result<Conversation> {
    assemble(SYSTEM_PROMPT, image, question, shots, demo_images, demos)
}

/// Extract the first integer substring; answers with no digits pass through
/// trimmed
pub fn normalize(raw: &str) -> String {
    match INT_RE.find(raw) {
        Some(m) => m.as_str().to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extracts_first_integer() {
        assert_eq!(normalize("3"), "3");
        assert_eq!(normalize("there are 4 cubes and 2 spheres"), "4");
        assert_eq!(normalize("10."), "10");
    }

    #[test]
    fn test_normalize_without_digits() {
        assert_eq!(normalize("  none  "), "none");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_system_prompt_states_grammar() {
        assert!(SYSTEM_PROMPT.contains("<explanation> -> <answer>"));
        assert!(SYSTEM_PROMPT.contains("integer between 0 and 10"));
    }

    #[test]
    fn test_fewshot_answers_are_integers() {
        for demo in FEWSHOT {
            assert!(demo.answer.parse::<u32>().is_ok());
        }
    }
}
