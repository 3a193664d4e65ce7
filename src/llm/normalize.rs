use std::sync::OnceLock;

use regex::Regex;

const FENCE: &str = "```";

/// A fence alone on its line, optionally carrying a language tag:
/// ```json, ```python, ```c++
fn fence_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+\-]*[ \t\r]*$").expect("fence pattern is valid")
    })
}

/// Turns raw model output into plain answer text. Code fences and the
/// language tag of a fence that opens its own line are removed; the result
/// is trimmed. Text glued to an inline or closing fence is kept.
pub fn normalize_output(raw: &str) -> String {
    if !raw.contains(FENCE) {
        return raw.trim().to_string();
    }
    fence_line_pattern()
        .replace_all(raw, "")
        .replace(FENCE, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(
            normalize_output("  Theft carries up to 3 years.\n\n"),
            "Theft carries up to 3 years."
        );
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"answer\": \"3 years\"}\n```\n";
        assert_eq!(normalize_output(raw), "{\"answer\": \"3 years\"}");
    }

    #[test]
    fn fences_inside_prose_are_removed_with_their_tags() {
        let raw = "Here is the rule:\n```python\nprint('theft')\n```\nDone.";
        assert_eq!(
            normalize_output(raw),
            "Here is the rule:\n\nprint('theft')\n\nDone."
        );
    }

    #[test]
    fn language_words_outside_fences_survive() {
        let raw = "```\nUse the json field and the python script.\n```";
        assert_eq!(
            normalize_output(raw),
            "Use the json field and the python script."
        );
    }

    #[test]
    fn inline_fences_keep_their_content() {
        assert_eq!(normalize_output("```3 years```"), "3 years");
        assert_eq!(
            normalize_output("The term is ```3 years``` at most."),
            "The term is 3 years at most."
        );
    }

    #[test]
    fn text_after_a_closing_fence_survives() {
        let raw = "```\nUp to 3 years.\n```Source: Penal Code";
        assert_eq!(normalize_output(raw), "Up to 3 years.\nSource: Penal Code");
    }

    #[test]
    fn crlf_fence_lines_are_removed() {
        let raw = "```json\r\n{\"answer\": 3}\r\n```";
        assert_eq!(normalize_output(raw), "{\"answer\": 3}");
    }

    #[test]
    fn fence_only_output_normalizes_to_empty() {
        assert_eq!(normalize_output("```json\n```"), "");
    }
}
