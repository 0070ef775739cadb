use crate::{
    pricing::{UsageSummary, format_cost},
    types::{ArticleVerification, TokenCost},
};

/// Format token usage as a human-readable table with a totals line
pub fn format_usage_report(entries: &[TokenCost], summary: &UsageSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<32} {:>9} {:>9} {:>9}\n",
        "Operation", "Input", "Output", "Cost"
    ));
    for entry in entries {
        output.push_str(&format!(
            "{:<32} {:>9} {:>9} {:>9}\n",
            truncate(&entry.operation, 32),
            entry.input_tokens,
            entry.output_tokens,
            format_cost(entry.total_cost)
        ));
    }

    output.push_str(&format!(
        "{:<32} {:>9} {:>9} {:>9}\n",
        format!("Total ({} calls)", entries.len()),
        summary.total_input_tokens,
        summary.total_output_tokens,
        format_cost(summary.total_cost)
    ));

    output
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// Format a verification result as markdown
pub fn format_verification(verification: &ArticleVerification) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "## Quality score: {}/10 ({})\n\n",
        verification.score,
        if verification.passed { "passed" } else { "needs work" }
    ));
    output.push_str(verification.analysis.trim());
    output.push('\n');

    output
}
