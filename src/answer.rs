//! Canonical output grammar: "<explanation> -> <answer>"
//!
//! The formatter and the splitter must stay inverses of each other - the
//! system prompts, the few-shot demonstrations and the parser all commit to
//! this separator.

/// Separator between explanation and answer in generated text
pub const ANSWER_SEPARATOR: &str = "->";

/// Format a reference (explanation, answer) pair in the canonical grammar
pub fn format_explanation_answer(explanation: &str, answer: &str) -> String {
    format!("{} {} {}", explanation.trim(), ANSWER_SEPARATOR, answer.trim())
}

/// Split raw generated text into (explanation, answer).
///
/// Splits on the first separator occurrence. Text with no separator becomes
/// the whole explanation with an empty answer; never fails.
pub fn split_explanation_answer(text: &str) -> (String, String) {
    match text.split_once(ANSWER_SEPARATOR) {
        Some((explanation, answer)) => (
            explanation.trim().to_string(),
            answer.trim().to_string(),
        ),
        None => (text.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let (explanation, answer) = split_explanation_answer("the cube is red -> red");
        assert_eq!(explanation, "the cube is red");
        assert_eq!(answer, "red");
    }

    #[test]
    fn test_split_no_separator() {
        let (explanation, answer) = split_explanation_answer("no arrow in sight");
        assert_eq!(explanation, "no arrow in sight");
        assert_eq!(answer, "");
    }

    #[test]
    fn test_split_first_separator_wins() {
        let (explanation, answer) = split_explanation_answer("a -> b -> c");
        assert_eq!(explanation, "a");
        assert_eq!(answer, "b -> c");
    }

    #[test]
    fn test_split_empty() {
        assert_eq!(split_explanation_answer(""), (String::new(), String::new()));
        assert_eq!(split_explanation_answer("   "), (String::new(), String::new()));
    }

    #[test]
    fn test_round_trip() {
        let formatted = format_explanation_answer("there are two rubber spheres", "2");
        let (explanation, answer) = split_explanation_answer(&formatted);
        assert_eq!(explanation, "there are two rubber spheres");
        assert_eq!(answer, "2");
    }

    #[test]
    fn test_format_trims() {
        assert_eq!(
            format_explanation_answer("  it is metal  ", " metal "),
            "it is metal -> metal"
        );
    }
}
