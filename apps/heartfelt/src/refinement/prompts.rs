// All LLM prompt constants and response schemas for the refinement module.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::{json, Value};

/// Maximum number of AI patterns the scan may return.
pub const MAX_PATTERNS: usize = 5;

/// System instruction for the AI-pattern scan.
pub const PATTERN_SCAN_SYSTEM: &str = "You are an AI detection specialist. \
Analyze the provided text for robotic hallmarks:
1. Overused transitional phrases (In conclusion, Furthermore, Additionally).
2. Perfectly balanced but soulless sentence structures.
3. Repetitive linguistic patterns or safe hedging.
4. Over-explanation of simple concepts.

Identify up to 5 specific phrases that read as AI-generated.
Return a JSON array of objects with \"phrase\" and \"reason\" properties.
Every \"phrase\" MUST be an exact substring of the input text.";

/// System instruction for the three-variation refinement.
/// Replace: {keywords}, {style_sample}, {persona}, {platform}, {intensity},
///          {mood}, {json_only}
pub const REFINE_SYSTEM_TEMPLATE: &str = r#"# HEARTFELT REFINEMENT ENGINE

MISSION: Rewrite the user's text so it reads as unmistakably human while keeping its meaning intact.

SECTION 1: NATURAL VOICE
- Make a meaningful share of word choices surprising but appropriate.
- Swing sentence length widely, from a few words to long, flowing lines.
- Never open two consecutive sentences the same way. Fragments and asides are welcome.
- Avoid stock transitions such as "Furthermore" or "Moreover". Jump directly or use a conversational pivot.

SECTION 2: KEYWORD PRESERVATION (MANDATORY)
User keywords: "{keywords}"
If keywords are provided:
- Preserve each one EXACTLY, matching case, spelling, and formatting.
- Spread them naturally through the text; never force them.
- When keyword preservation conflicts with any other style directive, keyword preservation wins.

SECTION 3: STYLE REPLICATION
User style sample: "{style_sample}"
If a style sample is provided:
- Study its lexical fingerprint: register, word preferences, specialized terms.
- Study its syntactic fingerprint: sentence complexity, opening patterns.
- Study its rhetorical fingerprint: persuasion patterns, emotional markers, rhythm.
- The user's own style overrides persona defaults. Replicate how it feels.

SECTION 4: PARAMETERS
- Persona: {persona} (align register and authority markers).
- Platform: {platform} (optimize format and structure).
- Intensity: {intensity} (Standard = grade 8 clarity, Ultra = sophisticated and soulful).
- Mood: {mood} (modulate energy and linguistic markers).

OUTPUT REQUIREMENTS:
- Generate 3 variations: "essential" (direct), "storyteller" (narrative), "visionary" (inspiring).
- resonance_scores: one integer 0-100 per variation.
- highlights: 2 phrases per variation that best show the human resonance, each with a short insight.
- changes: 4 short statements describing the structural changes you made.
- score: overall resonance, integer 0-100.
- integrity_pass: true if the original meaning is fully preserved.
- Do not use em or en dashes unless the style sample uses them. Prefer commas and natural pauses.

{json_only}"#;

/// Response schema for the pattern scan (Gemini OpenAPI subset).
pub fn pattern_scan_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "phrase": { "type": "STRING" },
                "reason": { "type": "STRING" }
            },
            "required": ["phrase", "reason"]
        }
    })
}

/// Response schema for the refinement call.
pub fn refinement_schema() -> Value {
    let per_variation = |item: Value| {
        json!({
            "type": "OBJECT",
            "properties": {
                "essential": item.clone(),
                "storyteller": item.clone(),
                "visionary": item
            },
            "required": ["essential", "storyteller", "visionary"]
        })
    };
    let highlight_list = json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "phrase": { "type": "STRING" },
                "insight": { "type": "STRING" }
            }
        }
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "variations": per_variation(json!({ "type": "STRING" })),
            "resonance_scores": per_variation(json!({ "type": "INTEGER" })),
            "highlights": per_variation(highlight_list),
            "changes": { "type": "ARRAY", "items": { "type": "STRING" } },
            "score": { "type": "INTEGER" },
            "integrity_pass": { "type": "BOOLEAN" }
        },
        "required": [
            "variations",
            "resonance_scores",
            "highlights",
            "changes",
            "score",
            "integrity_pass"
        ]
    })
}
