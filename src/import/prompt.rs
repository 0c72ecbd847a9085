/// Which column layout the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// `front;back` only.
    Simple,
    /// `front;back;deck;tags;notes`.
    Advanced,
}

/// Instructions to paste into an LLM chat so it produces a CSV the importer
/// accepts without any manual mapping.
pub fn csv_prompt(style: PromptStyle) -> String {
    let lines: &[&str] = match style {
        PromptStyle::Simple => &[
            "Here is the required CSV format (semicolon separator):",
            "front;back",
            "Include the header row as the first line.",
            "If a value contains ; or a line break, wrap that value in quotes.",
            "Return the result as a CSV file that I can download.",
        ],
        PromptStyle::Advanced => &[
            "Here is the required CSV format (semicolon separator):",
            "front;back;deck;tags;notes",
            "Include the header row as the first line.",
            "tags should use | between tags (example: algebra|exam-prep).",
            "notes can be empty if not needed.",
            "If a value contains ; or a line break, wrap that value in quotes.",
            "Return the result as a CSV file that I can download.",
        ],
    };
    lines.join("\n")
}
