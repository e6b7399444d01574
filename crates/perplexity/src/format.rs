//! Plain-text rendering of answers and the model list.

use crate::models::ModelEntry;
use crate::types::CompletionResponse;

/// Citations listed under SOURCES; the rest are dropped.
pub const MAX_CITATIONS: usize = 10;

const RULE_WIDTH: usize = 60;

/// Render an answer with its model header and up to [`MAX_CITATIONS`] sources.
///
/// The SOURCES header reports the total citation count even when the list
/// is cut short.
pub fn format_answer(model: &str, response: &CompletionResponse) -> String {
    let mut lines = vec![
        format!("ANSWER ({model}):"),
        "=".repeat(RULE_WIDTH),
        response.answer.clone(),
        String::new(),
    ];

    if !response.citations.is_empty() {
        lines.push(format!("\nSOURCES ({}):", response.citations.len()));
        lines.push("-".repeat(RULE_WIDTH));
        lines.extend(
            response
                .citations
                .iter()
                .take(MAX_CITATIONS)
                .enumerate()
                .map(|(i, citation)| format!("[{}] {citation}", i + 1)),
        );
    }

    lines.join("\n")
}

/// Render the model registry, one block per entry.
pub fn format_model_list(entries: &[ModelEntry]) -> String {
    let mut lines = vec!["AVAILABLE MODELS:".to_string(), "=".repeat(RULE_WIDTH)];
    for entry in entries {
        lines.push(format!("\n{}", entry.id));
        lines.push(format!("  {}", entry.description));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::list_models;

    fn response(answer: &str, citations: usize) -> CompletionResponse {
        CompletionResponse {
            answer: answer.to_string(),
            citations: (1..=citations)
                .map(|i| format!("https://example.com/{i}"))
                .collect(),
        }
    }

    #[test]
    fn answer_without_sources() {
        let out = format_answer("sonar", &response("4", 0));
        assert_eq!(
            out,
            "ANSWER (sonar):\n============================================================\n4\n"
        );
        assert!(!out.contains("SOURCES"));
    }

    #[test]
    fn answer_with_sources() {
        let out = format_answer("sonar-pro", &response("Yes.", 2));
        let rule = "-".repeat(60);
        let expected = format!(
            "ANSWER (sonar-pro):\n{}\nYes.\n\n\nSOURCES (2):\n{rule}\n[1] https://example.com/1\n[2] https://example.com/2",
            "=".repeat(60)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn sources_capped_at_ten() {
        let out = format_answer("sonar", &response("x", 15));
        assert!(out.contains("SOURCES (15):"));
        for i in 1..=10 {
            assert!(out.contains(&format!("[{i}] https://example.com/{i}")));
        }
        for i in 11..=15 {
            assert!(!out.contains(&format!("[{i}]")));
            assert!(!out.contains(&format!("https://example.com/{i}")));
        }
        assert!(out.ends_with("[10] https://example.com/10"));
    }

    #[test]
    fn answer_is_verbatim() {
        let answer = "line one\n  <b>two</b> & \"three\"\n";
        let out = format_answer("sonar", &response(answer, 0));
        assert!(out.contains(answer));
    }

    #[test]
    fn model_list_in_registry_order() {
        let out = format_model_list(list_models());
        assert!(out.starts_with(&format!("AVAILABLE MODELS:\n{}\n", "=".repeat(60))));

        let mut last = 0;
        for entry in list_models() {
            let block = format!("\n{}\n  {}", entry.id, entry.description);
            let at = out.find(&block).expect("block present");
            assert!(at >= last, "{} out of order", entry.id);
            last = at;
        }
    }

    #[test]
    fn model_list_exact_block() {
        let entries = [ModelEntry {
            id: "a",
            description: "first",
        }];
        assert_eq!(
            format_model_list(&entries),
            format!("AVAILABLE MODELS:\n{}\n\na\n  first", "=".repeat(60))
        );
    }
}
