//! Prompt templates for schema-grounded Cypher generation

use super::TranslationRequest;

pub const SYSTEM_PROMPT: &str = "You are a Neo4j expert who writes Cypher for the user's database.";

const RESPONSE_FORMAT: &str = r#"Provide your response in the following JSON format:
{
    "clarification": "Optional: Any questions or clarifications needed",
    "cypher": "The Cypher code to execute the query",
    "explanation": "A step-by-step explanation of the Cypher code"
}

If you need more information before generating the Cypher code, only include the "clarification" field in your response.
If you need no more information, do not include the "clarification" field in your response.
Respond with the JSON object only."#;

/// Build the prompt for one translation attempt.
///
/// With a prior failed attempt the prompt carries the failing statement and
/// the literal error message and asks for a corrected statement instead.
pub fn build(request: &TranslationRequest<'_>) -> String {
    let snapshot = request.schema_context;
    let grounding = format!(
        "Database: Neo4j version {}\n\nSchema: {}\nStats: {}",
        snapshot.version,
        snapshot.schema_json(),
        snapshot.stats_json()
    );

    match request.prior_error {
        None => format!(
            "Interpret the following query and generate the corresponding Cypher code for our Neo4j database.\n\
             Consider the given database structure and statistics.\n\n\
             {grounding}\n\n\
             User Query: {query}\n\n\
             {format}",
            grounding = grounding,
            query = request.natural_language_query,
            format = RESPONSE_FORMAT,
        ),
        Some(failed) => format!(
            "A Cypher query generated for our Neo4j database failed. Correct it using the given database structure and statistics.\n\n\
             {grounding}\n\n\
             User Query: {query}\n\n\
             The following Cypher query resulted in an error: {cypher}\n\
             Error message: {error}\n\
             Please correct the query.\n\n\
             {format}",
            grounding = grounding,
            query = request.natural_language_query,
            cypher = failed.cypher,
            error = failed.error_message,
            format = RESPONSE_FORMAT,
        ),
    }
}
