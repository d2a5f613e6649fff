//! System prompt sent with every review request.

/// Named editorial rules, rendered into the prompt body.
const RULES: &[(&str, &str)] = &[
    (
        "Clarity and Readability",
        "The text should be easy to understand and written in natural, fluent language. \
         Avoid ambiguous phrasing and redundancy; sentences should flow logically.",
    ),
    (
        "Structure",
        "Use short paragraphs with one idea each. Long walls of text or abrupt topic \
         changes should be flagged.",
    ),
    (
        "Tone Consistency",
        "The tone should stay consistent across the whole document. Mixing formal and \
         casual registers, or drifting into generic filler, should be flagged.",
    ),
    (
        "Language Quality",
        "The text should be free of spelling and grammar mistakes, awkward phrasing, and \
         overused cliches.",
    ),
    (
        "Persuasiveness",
        "Where the text is promotional, it should emphasize concrete selling points \
         rather than vague superlatives.",
    ),
];

/// Build the full system prompt, ending with the strict JSON output contract.
///
/// The session parses the assembled completion as exactly this shape; anything
/// else is discarded, so the prompt insists on JSON and nothing else.
pub fn review_prompt() -> String {
    let rules_text: String = RULES
        .iter()
        .map(|(name, description)| format!("{name}: {description}\n"))
        .collect();

    format!(
        "You are an editorial assistant reviewing a document. Read the document and \
report every issue you find, judged against the rules below.\n\
\n\
{rules_text}\n\
Respond in valid JSON format:\n\
{{\n\
    \"issues\": [\n\
        {{\n\
            \"type\": \"<error_type>\",\n\
            \"severity\": \"<high|medium|low>\",\n\
            \"paragraph\": <paragraph_number>,\n\
            \"description\": \"<description_of_error>\",\n\
            \"suggestion\": \"<suggested_correction>\"\n\
        }}\n\
    ]\n\
}}\n\
\n\
If no problems are found, respond with an empty list:\n\
{{ \"issues\": [] }}\n\
\n\
Do not return anything else besides the JSON format above."
    )
}
