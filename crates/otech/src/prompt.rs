//! Prompt composition.

use otech_protocol::ChatMessage;
use serde_json::Value;

use crate::csv_data::StructuredRecord;

/// Introduces the serialized attachment rows.
pub const DATA_INTRO: &str = "Here is the data from the CSV file:";

/// Closes the prompt when no attachment was supplied.
pub const NO_DATA_NOTICE: &str = "Please continue the conversation. No CSV data was provided.";

/// Build the single prompt sent to the generation backend.
///
/// One `"<Role>: <content>"` line per message, a blank line, then either the
/// attachment rows as a compact JSON array or [`NO_DATA_NOTICE`]. `Some` with
/// an empty slice still counts as an attachment. Nothing is truncated.
pub fn compose_prompt(messages: &[ChatMessage], records: Option<&[StructuredRecord]>) -> String {
    let transcript = messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = transcript;
    prompt.push_str("\n\n");

    match records {
        Some(records) => {
            prompt.push_str(DATA_INTRO);
            prompt.push('\n');
            prompt.push_str(&records_json(records));
            prompt.push('\n');
        }
        None => {
            prompt.push_str(NO_DATA_NOTICE);
            prompt.push('\n');
        }
    }

    prompt
}

fn records_json(records: &[StructuredRecord]) -> String {
    Value::Array(records.iter().map(StructuredRecord::to_json).collect()).to_string()
}
