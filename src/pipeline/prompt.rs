// src/pipeline/prompt.rs — Prompt builders for the diagnosis stages

use super::types::DiagnosisContext;
use crate::provider::SearchHit;

const JSON_SHAPE: &str = r#"Respond with ONLY a JSON object, no prose, in exactly this shape:
{
  "problem": "<short name of the most likely fault>",
  "explanation": "<what went wrong and why, in plain language>",
  "repairSteps": ["<step 1>", "<step 2>", "..."],
  "toolsNeeded": ["<tool>", "..."],
  "estimatedCost": "<rough cost range or 'unknown'>",
  "difficulty": "<easy|medium|hard or 'varies'>",
  "successRate": "<rough likelihood of a DIY fix or 'unknown'>",
  "timeRequired": "<rough duration or 'varies'>",
  "safetyWarnings": ["<warning>", "..."]
}
Every field must be present. repairSteps must contain at least one step."#;

pub fn system_prompt() -> String {
    "You are an experienced electronics repair technician. You diagnose faults \
     in consumer devices from user descriptions and photos, and you always give \
     practical, safety-conscious repair guidance."
        .to_string()
}

/// Prompt for the direct diagnosis stage: description, category, and any
/// clarifying answers the client already collected.
pub fn direct_diagnosis_prompt(ctx: &DiagnosisContext) -> String {
    let mut prompt = format!(
        "A user reports a problem with their {} (category: {}).\n\nProblem description:\n{}\n",
        ctx.category, ctx.category, ctx.description
    );

    if !ctx.clarifying_answers.is_empty() {
        prompt.push_str("\nClarifying questions already answered:\n");
        for qa in &ctx.clarifying_answers {
            prompt.push_str(&format!("Q: {}\nA: {}\n", qa.question, qa.answer));
        }
    }

    if !ctx.images.is_empty() {
        prompt.push_str("\nPhotos of the device are attached. Use them.\n");
    }

    prompt.push('\n');
    prompt.push_str(JSON_SHAPE);
    prompt
}

/// Prompt for the search-summarization stages: the original context plus
/// the snippets returned by the web search.
pub fn search_summary_prompt(ctx: &DiagnosisContext, hits: &[SearchHit]) -> String {
    let mut prompt = format!(
        "A user reports a problem with their {} :\n{}\n\nWeb search results for this fault:\n",
        ctx.category, ctx.description
    );

    for (i, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!("{}. {}: {}\n", i + 1, hit.title, hit.snippet));
    }

    prompt.push_str(
        "\nSynthesize these results into one concrete diagnosis for this user.\n\n",
    );
    prompt.push_str(JSON_SHAPE);
    prompt
}

/// The query sent to the web search provider.
pub fn search_query(ctx: &DiagnosisContext) -> String {
    format!(
        "{} repair {} troubleshooting fix",
        ctx.category, ctx.description
    )
}
