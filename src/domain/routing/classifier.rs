//! Keyword-based task-class inference

/// Task class used when no keyword group matches
pub const GENERAL_TASK: &str = "general";

const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    (
        "strategic_analysis",
        &["strategic", "plan", "long-term", "vision"],
    ),
    ("quick_response", &["quick", "summary", "brief", "tldr"]),
    (
        "deep_analysis",
        &["analyze", "deep", "comprehensive", "detailed"],
    ),
    (
        "code_generation",
        &["code", "implement", "function", "algorithm"],
    ),
    ("cost_optimized", &["cost", "budget", "economical"]),
];

/// Derives a task class from message text when the caller gave no hint.
///
/// Groups are checked in order and the first one with a keyword contained in the
/// lowercased text wins, so the result is a pure function of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskClassifier;

impl TaskClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> &'static str {
        let lowered = text.to_lowercase();

        KEYWORD_GROUPS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(class, _)| *class)
            .unwrap_or(GENERAL_TASK)
    }
}
