use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three independently generated rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationName {
    /// Direct.
    #[default]
    Essential,
    /// Narrative.
    Storyteller,
    /// Inspiring.
    Visionary,
}

impl VariationName {
    pub const ALL: [VariationName; 3] = [
        VariationName::Essential,
        VariationName::Storyteller,
        VariationName::Visionary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariationName::Essential => "essential",
            VariationName::Storyteller => "storyteller",
            VariationName::Visionary => "visionary",
        }
    }
}

/// One value per variation, keyed the same way the service keys its JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerVariation<T> {
    pub essential: T,
    pub storyteller: T,
    pub visionary: T,
}

impl<T> PerVariation<T> {
    pub fn get(&self, name: VariationName) -> &T {
        match name {
            VariationName::Essential => &self.essential,
            VariationName::Storyteller => &self.storyteller,
            VariationName::Visionary => &self.visionary,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(VariationName, T) -> U) -> PerVariation<U> {
        PerVariation {
            essential: f(VariationName::Essential, self.essential),
            storyteller: f(VariationName::Storyteller, self.storyteller),
            visionary: f(VariationName::Visionary, self.visionary),
        }
    }
}

/// A phrase in a variation the service called out, with its reasoning.
/// `phrase` should be a substring of the variation; this is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub phrase: String,
    pub insight: String,
}

/// An AI-sounding phrase found in the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPattern {
    pub phrase: String,
    pub reason: String,
}

/// A successful, normalized refinement. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementResult {
    pub original_text: String,
    pub variations: PerVariation<String>,
    pub resonance_scores: PerVariation<u8>,
    pub highlights: PerVariation<Vec<Highlight>>,
    /// Overall score, 0–100.
    pub score: u8,
    pub structural_changes: Vec<String>,
    pub integrity_pass: bool,
    pub generated_at: DateTime<Utc>,
}

impl RefinementResult {
    pub fn variation(&self, name: VariationName) -> &str {
        self.variations.get(name)
    }
}
