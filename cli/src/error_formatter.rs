use ariadne::{Color, Label, Report, ReportKind, Source};
use numen::NumenError;

/// Source id shown in reports; expressions come from the command line
const SOURCE_ID: &str = "<input>";

/// Format a NumenError with fancy terminal output using Ariadne
pub fn format_error(error: &NumenError) -> String {
    match error {
        NumenError::Parse(details) => {
            let mut output = Vec::new();
            let message = format!(
                "{} error: {} (line {}, column {})",
                details.stage, details.message, details.span.line, details.span.col
            );

            // Ariadne counts characters, the span holds byte offsets
            let text = details.source_text.as_ref();
            let start = char_index(text, details.span.start);
            let end = char_index(text, details.span.end).max(start + 1);

            let mut report = Report::build(ReportKind::Error, SOURCE_ID, start)
                .with_message(message)
                .with_label(
                    Label::new((SOURCE_ID, start..end))
                        .with_message(&details.message)
                        .with_color(Color::Red),
                );
            if !details.remaining.is_empty() {
                report = report.with_note(format!("unparsed input: {}", details.remaining));
            }

            match report
                .finish()
                .write((SOURCE_ID, Source::from(text)), &mut output)
            {
                Ok(_) => String::from_utf8_lossy(&output).to_string(),
                Err(_) => format!("{}", error),
            }
        }
        NumenError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
        } => format!(
            "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}",
            limit_name, limit_value, actual_value
        ),
        other => format!("{}", other),
    }
}

fn char_index(text: &str, byte_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(offset, _)| *offset < byte_offset)
        .count()
}
