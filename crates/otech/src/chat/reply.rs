//! Reply extraction from backend results.

use crate::gemini::GenerateContentResponse;

/// Reply used when the backend result carries no usable text.
pub const NO_RESPONSE_FALLBACK: &str = "No response generated.";

/// First candidate's first text part, or [`NO_RESPONSE_FALLBACK`].
///
/// Never fails: missing candidates, content, parts or text (and empty text)
/// all degrade to the fallback string.
pub fn extract_reply(response: &GenerateContentResponse) -> String {
    response
        .first_candidate_text()
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_RESPONSE_FALLBACK)
        .to_string()
}
