//! Refinement: builds the prompt, calls the service for structured JSON, and
//! normalizes the reply into a `RefinementResult`.
//!
//! All-or-nothing: either every variation is present and non-empty after
//! normalization, or the call fails with `RefineError`. Nothing partial leaves
//! this module. No shared state is touched; the session applies the result.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NONE_PROVIDED};
use crate::llm_client::{generate_json, GenerationRequest, LlmError, TextGenerator, REFINE_MODEL};
use crate::refinement::models::{Highlight, PerVariation, RefinementResult, VariationName};
use crate::refinement::params::RefinementParameters;
use crate::refinement::prompts::{refinement_schema, REFINE_SYSTEM_TEMPLATE};

/// The only refinement error text a user ever sees.
pub const REFINEMENT_FAILED_MESSAGE: &str = "Refinement engine unavailable. Please try again.";

/// Substituted when the service omits the overall score.
pub const DEFAULT_SCORE: u8 = 85;

/// Substituted when the service omits the list of structural changes.
pub const DEFAULT_CHANGES: &[&str] = &["Rhythm and phrasing rebalanced for a natural read"];

/// Prompt value for an absent mood.
const DEFAULT_MOOD_LABEL: &str = "Natural";

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("refinement call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("refinement response is missing `{0}`")]
    MissingField(&'static str),

    #[error("refinement response has an empty `{0}` variation")]
    EmptyVariation(&'static str),
}

impl RefineError {
    /// What the user is told, whatever went wrong underneath.
    pub fn user_message(&self) -> &'static str {
        REFINEMENT_FAILED_MESSAGE
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw service reply (every field optional; normalization decides)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawTriple<T> {
    essential: Option<T>,
    storyteller: Option<T>,
    visionary: Option<T>,
}

impl<T> RawTriple<T> {
    fn into_per_variation(self) -> PerVariation<Option<T>> {
        PerVariation {
            essential: self.essential,
            storyteller: self.storyteller,
            visionary: self.visionary,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHighlight {
    #[serde(default)]
    phrase: String,
    #[serde(default)]
    insight: String,
}

#[derive(Debug, Deserialize)]
struct RawRefinement {
    variations: Option<RawTriple<String>>,
    resonance_scores: Option<RawTriple<f64>>,
    highlights: Option<RawTriple<Vec<RawHighlight>>>,
    changes: Option<Vec<String>>,
    score: Option<f64>,
    integrity_pass: Option<bool>,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Refines `text` into three variations.
///
/// `text` must be non-empty; the session checks this before calling.
pub async fn refine(
    text: &str,
    params: &RefinementParameters,
    generator: &dyn TextGenerator,
) -> Result<RefinementResult, RefineError> {
    let system = build_refine_system(params);
    let schema = refinement_schema();
    let request = GenerationRequest {
        model: REFINE_MODEL,
        system: &system,
        contents: text,
        response_schema: &schema,
    };

    info!(
        "Refining {} chars: persona={}, platform={}, intensity={}",
        text.chars().count(),
        params.persona,
        params.platform,
        params.intensity
    );

    let raw: RawRefinement = generate_json(generator, request).await?;
    let result = normalize(raw, text)?;

    warn_missing_keywords(&result, params);
    info!("Refinement complete: score={}", result.score);

    Ok(result)
}

/// Fills the refinement system template from resolved parameters.
pub fn build_refine_system(params: &RefinementParameters) -> String {
    REFINE_SYSTEM_TEMPLATE
        .replace("{keywords}", params.keywords.as_deref().unwrap_or(NONE_PROVIDED))
        .replace(
            "{style_sample}",
            params.style_sample.as_deref().unwrap_or(NONE_PROVIDED),
        )
        .replace("{persona}", params.persona.as_str())
        .replace("{platform}", params.platform.as_str())
        .replace("{intensity}", params.intensity.as_str())
        .replace(
            "{mood}",
            params.mood.map(|m| m.as_str()).unwrap_or(DEFAULT_MOOD_LABEL),
        )
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

fn normalize(raw: RawRefinement, original_text: &str) -> Result<RefinementResult, RefineError> {
    let variations = raw
        .variations
        .ok_or(RefineError::MissingField("variations"))?
        .into_per_variation();
    let variations = PerVariation {
        essential: finalize_variation(VariationName::Essential, variations.essential)?,
        storyteller: finalize_variation(VariationName::Storyteller, variations.storyteller)?,
        visionary: finalize_variation(VariationName::Visionary, variations.visionary)?,
    };

    let scores = raw
        .resonance_scores
        .ok_or(RefineError::MissingField("resonance_scores"))?
        .into_per_variation();
    let resonance_scores = PerVariation {
        essential: scores
            .essential
            .ok_or(RefineError::MissingField("resonance_scores.essential"))?,
        storyteller: scores
            .storyteller
            .ok_or(RefineError::MissingField("resonance_scores.storyteller"))?,
        visionary: scores
            .visionary
            .ok_or(RefineError::MissingField("resonance_scores.visionary"))?,
    }
    .map(|name, score| clamp_score(name.as_str(), score));

    let highlights = match raw.highlights {
        Some(h) => h.into_per_variation().map(|_, list| {
            list.unwrap_or_default()
                .into_iter()
                .filter(|h| !h.phrase.trim().is_empty())
                .map(|h| Highlight {
                    phrase: h.phrase,
                    insight: h.insight,
                })
                .collect::<Vec<_>>()
        }),
        None => PerVariation::default(),
    };

    let score = raw
        .score
        .map(|s| clamp_score("score", s))
        .unwrap_or(DEFAULT_SCORE);

    let structural_changes = raw
        .changes
        .unwrap_or_else(|| DEFAULT_CHANGES.iter().map(|s| s.to_string()).collect());

    Ok(RefinementResult {
        original_text: original_text.to_string(),
        variations,
        resonance_scores,
        highlights,
        score,
        structural_changes,
        integrity_pass: raw.integrity_pass.unwrap_or(true),
        generated_at: Utc::now(),
    })
}

/// Trims surrounding whitespace and collapses a run of trailing periods to one.
fn finalize_variation(name: VariationName, text: Option<String>) -> Result<String, RefineError> {
    let text = text.unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RefineError::EmptyVariation(name.as_str()));
    }

    let without_periods = trimmed.trim_end_matches('.');
    if without_periods.len() + 1 < trimmed.len() {
        Ok(format!("{without_periods}."))
    } else {
        Ok(trimmed.to_string())
    }
}

fn clamp_score(field: &str, score: f64) -> u8 {
    let rounded = score.round();
    if !(0.0..=100.0).contains(&rounded) {
        warn!("Score `{field}` out of range ({score}), clamping to 0-100");
    }
    rounded.clamp(0.0, 100.0) as u8
}

/// Keywords are a prompt directive, not a hard check; misses are only logged.
fn warn_missing_keywords(result: &RefinementResult, params: &RefinementParameters) {
    let tokens = params.keyword_tokens();
    if tokens.is_empty() {
        return;
    }
    for name in VariationName::ALL {
        let text = result.variation(name);
        let missing: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|k| !text.contains(k))
            .collect();
        if !missing.is_empty() {
            warn!(
                "Variation {} dropped {} keyword(s): {:?}",
                name.as_str(),
                missing.len(),
                missing
            );
        }
    }
}
