//! Attribute questions: shape, color, size and material

use crate::core::{Conversation, PromptImage};
use crate::error::Result;
use crate::prompt::{assemble, Demo};

pub(crate) const SYSTEM_PROMPT: &str = "\
You are a visual reasoning assistant for synthetic 3D scenes. Think step-by-step but return only the final answer and a short explanation.
Each image contains objects with four attributes (shape, color, size, material).
Given an IMAGE and a QUESTION, your task is to answer about one of these attributes strictly based on the image:
- shape: cube, sphere, cylinder
- color: gray, red, blue, green, brown, purple, cyan, yellow
- size: large, small
- material: rubber, metal
Your final answer must always follow this format:
<explanation> -> <answer>
Rules:
- <answer> is exactly one attribute in lowercase.
- <explanation> is concise and directly supports the final answer.
";

/// Bundled demonstration corpus for attribute questions
pub const FEWSHOT: &[Demo] = &[
    Demo {
        file: "custom_dataset/custom_dataset/train/0a0e65fa046fe5162dbb262b30a22c8e.png",
        question: "What is the shape of the big thing that is in front of the cyan metallic object and right of the tiny green shiny object?",
        explanation: "There is a big ball in front of the cyan metallic block and to the right of the tiny green shiny cylinder.",
        answer: "sphere",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/0a048855d4f88e73f3232383aeaeb897.png",
        question: "What material is the cube that is in front of the tiny gray cube and behind the purple rubber block?",
        explanation: "There is a rubber cube in front of the tiny gray cube and behind the purple rubber block.",
        answer: "rubber",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/0a87898dfcd26c0ae4b7af4fbdd011bc.png",
        question: "What material is the large cylinder left of the big cylinder on the right side of the yellow cylinder behind the large yellow cylinder?",
        explanation: "There is a large metal cylinder that is to the left of the big cylinder that is right of the yellow cylinder that is behind the large yellow cylinder.",
        answer: "metal",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/607688ed44196e63390a713a348a832d.png",
        question: "What size is the green thing that is behind the small shiny thing in front of the small blue object?",
        explanation: "There is a tiny green cylinder which is behind the small shiny sphere that is in front of the small blue cylinder.",
        answer: "small",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/6d515b67779707a53931980d2950c496.png",
        question: "There is a large metallic thing that is the same shape as the large green rubber object; what is its color?",
        explanation: "There is the large cyan metallic sphere that has the same shape as a large green rubber sphere.",
        answer: "cyan",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/67b5147608fbc051f32d88222689e185.png",
        question: "What is the color of the big metallic thing that is behind the large metal thing that is on the left side of the metallic cylinder that is to the right of the gray shiny object?",
        explanation: "There is a big red metallic sphere that is behind the large metal cylinder that is left of the metallic cylinder that is right of the gray shiny cylinder.",
        answer: "red",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/478591c5708ce418f6c90b74a7eff8f2.png",
        question: "What is the shape of the small red object that is the same material as the tiny brown thing?",
        explanation: "There is the small red metal cylinder that has the same material as a tiny brown sphere.",
        answer: "cylinder",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/5f29460cbbf82c541e43e88ad2a1c2e9.png",
        question: "There is a matte thing that is the same color as the large matte block; what is its size?",
        explanation: "There is a big brown matte sphere that has the same color as a large matte block.",
        answer: "large",
    },
];

/// Build a conversation for an attribute question
pub fn build_prompt(
    image: PromptImage,
    question: &str,
    shots: usize,
    demo_images: bool,
    demos: &[Demo],
) -> Result<Conversation> {
    assemble(SYSTEM_PROMPT, image, question, shots, demo_images, demos)
}

/// Attribute answers fold to lowercase
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
