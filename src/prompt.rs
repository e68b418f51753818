//! Shared conversation assembly for the per-type prompt builders

use crate::answer::format_explanation_answer;
use crate::core::{Conversation, PromptImage};
use crate::error::Result;

/// A few-shot demonstration: an on-disk image, a question and the reference
/// explanation/answer pair formatted into the assistant turn.
#[derive(Debug, Clone, Copy)]
pub struct Demo {
    pub file: &'static str,
    pub question: &'static str,
    pub explanation: &'static str,
    pub answer: &'static str,
}

/// Intro turn shown before the demonstration block
pub const FEWSHOT_INTRO: &str =
    "Please respond to the questions based on the given instructions and follow the format from the demonstrations below.\n";

/// Map a prompt-mode string to a shot count ("zero", "1shot", "3shot", ...)
pub fn resolve_shot_count(mode: &str) -> usize {
    let m = mode.trim().to_lowercase();
    if m.starts_with('1') {
        1
    } else if m.starts_with('3') {
        3
    } else {
        0
    }
}

/// Build the full conversation for one query: system instructions, an
/// optional few-shot block, and the live image + question.
///
/// The shot count is clamped to the demonstration pool; the intro turn is
/// emitted only when at least one demonstration follows.
pub(crate) fn assemble(
    system_prompt: &str,
    image: PromptImage,
    question: &str,
    shots: usize,
    demo_images: bool,
    demos: &[Demo],
) -> Result<Conversation> {
    let mut conversation = Conversation::new();
    conversation.push_system(system_prompt);

    let k = shots.min(demos.len());
    if k > 0 {
        conversation.push_user_text(FEWSHOT_INTRO);
        for demo in &demos[..k] {
            let user_text = format!("QUESTION: {}", demo.question);
            if demo_images {
                let demo_image = image::open(demo.file)?;
                conversation.push_user_with_image(PromptImage::Image(demo_image), &user_text);
            } else {
                conversation.push_user_text(&user_text);
            }
            conversation
                .push_assistant_text(&format_explanation_answer(demo.explanation, demo.answer));
        }
    }

    let user_text = format!(
        "Now answer this new QUESTION about the given IMAGE.\nQUESTION: {}",
        question
    );
    conversation.push_user_with_image(image, &user_text);

    Ok(conversation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContentPart, Role};

    const DEMOS: &[Demo] = &[
        Demo {
            file: "unused.png",
            question: "Is the sphere red?",
            explanation: "there is a red sphere",
            answer: "yes",
        },
        Demo {
            file: "unused.png",
            question: "Is the cube small?",
            explanation: "the cube is large",
            answer: "no",
        },
    ];

    fn image() -> PromptImage {
        PromptImage::Base64("abc".to_string())
    }

    #[test]
    fn test_resolve_shot_count() {
        assert_eq!(resolve_shot_count("zero"), 0);
        assert_eq!(resolve_shot_count("1shot"), 1);
        assert_eq!(resolve_shot_count("3shot"), 3);
        assert_eq!(resolve_shot_count("3-shot"), 3);
        assert_eq!(resolve_shot_count(""), 0);
        assert_eq!(resolve_shot_count("anything"), 0);
    }

    #[test]
    fn test_zero_shot_structure() {
        let conversation = assemble("sys", image(), "Is it red?", 0, false, DEMOS).unwrap();
        // system turn + live query only, no intro
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns[0].role, Role::System);
        assert_eq!(conversation.turns[1].role, Role::User);
    }

    #[test]
    fn test_few_shot_pairs_and_intro() {
        let conversation = assemble("sys", image(), "Is it red?", 2, false, DEMOS).unwrap();
        // system + intro + 2 user/assistant pairs + live query
        assert_eq!(conversation.len(), 7);
        assert_eq!(conversation.turns[1].role, Role::User);
        assert_eq!(conversation.turns[2].role, Role::User);
        assert_eq!(conversation.turns[3].role, Role::Assistant);
        assert_eq!(conversation.turns[4].role, Role::User);
        assert_eq!(conversation.turns[5].role, Role::Assistant);
        assert_eq!(conversation.turns[6].role, Role::User);
    }

    #[test]
    fn test_shot_count_clamped_to_pool() {
        let conversation = assemble("sys", image(), "Is it red?", 5, false, DEMOS).unwrap();
        // clamped to the 2 available demonstrations
        assert_eq!(conversation.len(), 7);
    }

    #[test]
    fn test_empty_pool_emits_no_intro() {
        let conversation = assemble("sys", image(), "Is it red?", 3, false, &[]).unwrap();
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_demo_turns_are_text_only_without_images() {
        let conversation = assemble("sys", image(), "Is it red?", 1, false, DEMOS).unwrap();
        let demo_turn = &conversation.turns[2];
        assert_eq!(demo_turn.parts.len(), 1);
        assert!(matches!(demo_turn.parts[0], ContentPart::Text(_)));
    }

    #[test]
    fn test_assistant_turn_uses_canonical_grammar() {
        let conversation = assemble("sys", image(), "Is it red?", 1, false, DEMOS).unwrap();
        match &conversation.turns[3].parts[0] {
            ContentPart::Text(text) => {
                assert_eq!(text, "there is a red sphere -> yes");
            }
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn test_live_query_carries_image_and_prefix() {
        let conversation = assemble("sys", image(), "Is it red?", 0, false, DEMOS).unwrap();
        let last = conversation.turns.last().unwrap();
        assert_eq!(last.parts.len(), 2);
        assert!(matches!(last.parts[0], ContentPart::Image(_)));
        match &last.parts[1] {
            ContentPart::Text(text) => {
                assert!(text.starts_with("Now answer this new QUESTION"));
                assert!(text.contains("QUESTION: Is it red?"));
            }
            _ => panic!("expected text part"),
        }
    }
}
