use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use colored::*;

use crate::dispatch::ModelResult;
use crate::server::types::ReadinessResponse;

/// Counts whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Renders one row per model: name, summary or error, word count.
pub fn render_summaries(summaries: &[ModelResult]) -> String {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Model").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Summary").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Words").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for result in summaries {
        let row = match &result.error {
            Some(error) => vec![
                Cell::new(&result.model_name).fg(comfy_table::Color::Yellow),
                Cell::new(format!("Error: {}", error)).fg(comfy_table::Color::Red),
                Cell::new("-").set_alignment(CellAlignment::Right),
            ],
            None => vec![
                Cell::new(&result.model_name).fg(comfy_table::Color::Yellow),
                Cell::new(&result.summary).fg(comfy_table::Color::Green),
                Cell::new(word_count(&result.summary).to_string()).set_alignment(CellAlignment::Right),
            ],
        };
        table.add_row(row);
    }

    table.to_string()
}

pub fn display_summaries(summaries: &[ModelResult]) {
    if summaries.is_empty() {
        println!("{}", "No models are loaded on the server".yellow());
        return;
    }

    let failed = summaries.iter().filter(|s| !s.is_success()).count();
    println!("\n{}", render_summaries(summaries));
    println!("{}", "=".repeat(80).bright_black());
    println!(
        "{}",
        format!("{} model(s), {} failed", summaries.len(), failed).bright_green()
    );
}

pub fn display_readiness(readiness: &ReadinessResponse) {
    println!("{}", readiness.message.bright_cyan());
    if readiness.models.is_empty() {
        println!("{}", "No models loaded".yellow());
        return;
    }
    for (i, model) in readiness.models.iter().enumerate() {
        println!("  {}. {}", i + 1, model.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  the quick\tbrown\nfox  "), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_render_shows_errors_and_summaries() {
        let rendered = render_summaries(&[
            ModelResult::success("BART", "a short summary"),
            ModelResult::failure("T5", "out of memory"),
        ]);
        assert!(rendered.contains("BART"));
        assert!(rendered.contains("a short summary"));
        assert!(rendered.contains("Error: out of memory"));
    }
}
