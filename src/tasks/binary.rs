//! Binary (yes/no) questions: existence and comparison

use crate::core::{Conversation, PromptImage};
use crate::error::Result;
use crate::prompt::{assemble, Demo};

pub(crate) const SYSTEM_PROMPT: &str = "\
You are a visual reasoning assistant for synthetic 3D scenes. Think step-by-step but return only the final answer and a short explanation.
Each image contains objects with four attributes (shape, color, size, material).
Given an IMAGE and a QUESTION, your task is to answer 'yes' or 'no' strictly based on the image.
Your final answer must always follow this format:
<explanation> -> <answer>
Rules:
- <answer> is exactly 'yes' or 'no' in lowercase.
- <explanation> is concise and directly supports the final answer.
";

/// Bundled demonstration corpus for yes/no questions
pub const FEWSHOT: &[Demo] = &[
    Demo {
        file: "custom_dataset/custom_dataset/train/57698c6eb0068e6fc3aeba20b3a4981a.png",
        question: "Are there the same number of big blue metal spheres that are in front of the big brown thing and red matte objects to the left of the large rubber block?",
        explanation: "There are no big blue metal spheres that are in front of the big brown sphere and there are no red matte things which are on the left side of the large rubber block.",
        answer: "yes",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/1a8979c6c2a8872b8ddeb7cfcc7178c6.png",
        question: "There is a rubber sphere behind the cyan metal object; is its color the same as the large cube?",
        explanation: "There is a green rubber sphere that is behind the cyan metal cylinder and there is a large green cube.",
        answer: "yes",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/adb1df22bac87f8fe56adbae5490e99b.png",
        question: "Is the number of red blocks in front of the tiny cyan metal object greater than the number of big yellow metallic balls that are behind the gray matte cylinder?",
        explanation: "There are no red blocks which are in front of the tiny cyan metal sphere and there are no big yellow metallic balls which are behind the gray matte cylinder.",
        answer: "no",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/06bccea9ecad846ef319103ec32cd7cf.png",
        question: "Are there the same number of small green shiny things that are in front of the green metallic thing and yellow cylinders to the left of the tiny brown rubber cylinder?",
        explanation: "There are no small green shiny things which are in front of the green metallic cylinder and there is a yellow cylinder that is to the left of the tiny brown rubber cylinder.",
        answer: "no",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/01739c509bc055e2da1fc5f4e87ed277.png",
        question: "Are there any other things that are the same size as the green rubber sphere?",
        explanation: "There are two small cubes, a small cylinder and a small sphere that have the same size as a green rubber sphere.",
        answer: "yes",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/50de6007649aea401c9a5bcca8f60da8.png",
        question: "Do the cyan metal object and the rubber cube that is right of the big rubber sphere have the same size?",
        explanation: "There is a small cyan metal cube and there is a big rubber cube which is on the right side of the big rubber sphere.",
        answer: "no",
    },
    Demo {
        file: "custom_dataset/custom_dataset/train/c3ea2c7a10ad3d80cd36d028ab8e29d8.png",
        question: "Is there anything else of the same color as the tiny block?",
        explanation: "There are a small yellow matte sphere and cylinder which have the identical color as a tiny block.",
        answer: "yes",
    },
];

/// Build a conversation for a yes/no question
pub fn build_prompt(
    image: PromptImage,
    question: &str,
    shots: usize,
    demo_images: bool,
    demos: &[Demo],
) -> Result<Conversation> {
    assemble(SYSTEM_PROMPT, image, question, shots, demo_images, demos)
}

/// Fold the answer to the canonical yes/no domain; any value starting with
/// "yes" or "no" counts as that value
pub fn normalize(raw: &str) -> String {
    let folded = raw.trim().to_lowercase();
    if folded.starts_with("yes") {
        "yes".to_string()
    } else if folded.starts_with("no") {
        "no".to_string()
    } else {
        folded
    }
}
