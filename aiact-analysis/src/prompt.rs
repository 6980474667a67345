//! Query formulation and prompt construction.

use aiact_core::truncate_chars;
use aiact_rag::RetrievedContext;

pub const SYSTEM_PROMPT: &str = "You are an expert AI compliance analyst. Respond only with valid JSON.";

/// Fixed terms appended to every retrieval query to steer it toward the
/// risk-classification parts of the Act.
pub const QUERY_TERMS: &[&str] = &[
    "AI system",
    "machine learning",
    "high risk AI",
    "prohibited AI practices",
    "artificial intelligence regulation",
];

pub(crate) const STRICT_SUFFIX: &str = "Your previous reply could not be parsed. Reply with exactly \
one JSON object matching the output format above: string fields project_name and description, \
boolean contains_ai, number ai_confidence between 0.0 and 1.0, and an array risks whose items have \
description, category and level (\"high\" or \"low\"). No markdown, no other text.";

/// Deterministic retrieval query: the first `snippet_chars` characters of
/// the document followed by [`QUERY_TERMS`].
pub fn formulate_query(document_text: &str, snippet_chars: usize) -> String {
    let snippet = truncate_chars(document_text.trim(), snippet_chars);
    format!("{snippet} {}", QUERY_TERMS.join(" "))
}

/// Numbered context blocks, each tagged with its article when known.
pub fn format_context(context: &RetrievedContext) -> String {
    context
        .chunks()
        .enumerate()
        .map(|(i, chunk)| match &chunk.metadata.article_ref {
            Some(article) => format!("[Context {} - {article}]\n{}", i + 1, chunk.text),
            None => format!("[Context {}]\n{}", i + 1, chunk.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The grounding prompt for one analysis.
pub fn analysis_prompt(context: &RetrievedContext, document_text: &str, budget_chars: usize) -> String {
    let context = if context.is_empty() {
        "(no legislative context was retrieved; rely on your knowledge of the EU AI Act)".to_string()
    } else {
        format_context(context)
    };
    let document = truncate_chars(document_text, budget_chars);

    format!(
        "You are an AI compliance expert analyzing technical documents against the EU AI Act.\n\n\
         **EU AI Act Context:**\n{context}\n\n\
         **Technical Document to Analyze:**\n{document}\n\n\
         **Task:**\n\
         Analyze the technical document and provide a structured JSON response with the following:\n\n\
         1. **project_name**: Extract or infer the project name\n\
         2. **description**: A brief 2-3 sentence description of the project\n\
         3. **contains_ai**: Boolean indicating if the project contains AI/ML components\n\
         4. **ai_confidence**: Confidence score (0.0-1.0) for AI detection\n\
         5. **risks**: Array of risks based on the EU AI Act. Leave it empty when the project has no AI/ML components.\n\n\
         For each risk, provide:\n\
         - description: What the risk is\n\
         - category: EU AI Act category (e.g., \"Prohibited AI\", \"High-Risk AI\")\n\
         - level: \"high\" or \"low\"\n\
         - eu_act_reference: Relevant article/section from the EU AI Act\n\
         - confidence_score: How confident you are (0.0-1.0)\n\n\
         **Output Format (JSON):**\n\
         {{\n  \"project_name\": \"...\",\n  \"description\": \"...\",\n  \"contains_ai\": true,\n  \
         \"ai_confidence\": 0.0,\n  \"risks\": [\n    {{\"description\": \"...\", \"category\": \"...\", \
         \"level\": \"high\", \"eu_act_reference\": \"Article X\", \"confidence_score\": 0.0}}\n  ]\n}}\n\n\
         Respond ONLY with valid JSON, no additional text."
    )
}

/// The prompt used after an unparseable answer.
pub(crate) fn strict_prompt(prompt: &str, reason: &str) -> String {
    format!("{prompt}\n\nParse error: {reason}\n{STRICT_SUFFIX}")
}
