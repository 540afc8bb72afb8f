use crate::models::{Category, Sensitivity};

pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a file organization assistant. \
You receive metadata and a short content excerpt for each file in a user's cloud drive \
and propose where it belongs and what it should be called. \
Respond only with a JSON array that follows the response schema.";

/// Build the user prompt for one classification batch
///
/// `files_json` is the serialized request list (`id`, `name`, `type`,
/// `lastModifiedIso`, `snippet`).
pub fn build_classification_prompt(files_json: &str) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let sensitivities = Sensitivity::ALL
        .iter()
        .map(|s| format!("\"{}\"", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Classify each file below and return ONE result object per file.

RULES:
- "fileId" must be copied exactly from the input "id".
- "category" must be one of: {categories}
- "suggestedPath" is a slash-separated folder path such as "Work/Projects/2024".
  Use an empty string if the file should stay where it is.
- "suggestedName" keeps the original file extension and reads well to a human,
  e.g. "IMG_001.jpg" -> "Beach Trip 2022.jpg". Include a year or date when the
  content makes one obvious.
- "shouldArchive" is true for stale, superseded or one-off files nobody needs at hand.
- "sensitivity" is one of {sensitivities}. Use "High Risk" for identity documents,
  credentials, bank or medical records.
- "reasoning" is one short sentence. Say "needs manual review" if you are unsure.
- "confidence" is between 0.0 and 1.0.

FILES:
{files_json}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_taxonomy_and_files() {
        let prompt = build_classification_prompt(r#"[{"id":"f1"}]"#);
        assert!(prompt.contains("05_Photos_Videos"));
        assert!(prompt.contains("\"High Risk\""));
        assert!(prompt.ends_with(r#"[{"id":"f1"}]"#));
    }
}
