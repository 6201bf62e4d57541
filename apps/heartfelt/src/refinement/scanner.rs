//! AI-pattern scan: flags phrases in the raw input that read as machine-written.
//!
//! Scanning is advisory. Every failure degrades to "no patterns found" and is
//! only logged; nothing here returns an error to the caller.

use tracing::{debug, info, warn};

use crate::llm_client::{generate_json, GenerationRequest, TextGenerator, SCAN_MODEL};
use crate::refinement::models::AiPattern;
use crate::refinement::prompts::{pattern_scan_schema, MAX_PATTERNS, PATTERN_SCAN_SYSTEM};

/// Scans `text` for AI-sounding phrases.
///
/// Blank input returns immediately without calling the service. Entries whose
/// phrase is empty or not a literal substring of `text` are dropped, and the
/// list is capped at `MAX_PATTERNS`.
pub async fn scan_for_patterns(text: &str, generator: &dyn TextGenerator) -> Vec<AiPattern> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let schema = pattern_scan_schema();
    let request = GenerationRequest {
        model: SCAN_MODEL,
        system: PATTERN_SCAN_SYSTEM,
        contents: text,
        response_schema: &schema,
    };

    let patterns: Vec<AiPattern> = match generate_json(generator, request).await {
        Ok(patterns) => patterns,
        Err(e) => {
            warn!("Pattern scan failed, treating as no patterns: {e}");
            return Vec::new();
        }
    };

    let received = patterns.len();
    let patterns: Vec<AiPattern> = patterns
        .into_iter()
        .filter(|p| !p.phrase.is_empty() && text.contains(p.phrase.as_str()))
        .take(MAX_PATTERNS)
        .collect();

    if patterns.len() < received {
        debug!(
            "Pattern scan kept {} of {} phrases (non-substring or over limit)",
            patterns.len(),
            received
        );
    }
    info!("Pattern scan found {} phrases", patterns.len());

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGenerator;

    const INPUT: &str = "In conclusion, it is important to note that our results are robust. \
        Furthermore, the team delivered.";

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let generator = ScriptedGenerator::new();
        assert!(scan_for_patterns("", &generator).await.is_empty());
        assert!(scan_for_patterns("   \n\t", &generator).await.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_returns_substring_patterns() {
        let generator = ScriptedGenerator::new().reply(
            r#"[
                {"phrase": "In conclusion", "reason": "Stock closing transition"},
                {"phrase": "Furthermore", "reason": "Formal connective"}
            ]"#,
        );
        let patterns = scan_for_patterns(INPUT, &generator).await;
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].phrase, "In conclusion");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_drops_phrases_not_in_input() {
        let generator = ScriptedGenerator::new().reply(
            r#"[
                {"phrase": "in conclusion", "reason": "wrong case"},
                {"phrase": "delve", "reason": "not present"},
                {"phrase": "", "reason": "empty"},
                {"phrase": "it is important to note", "reason": "hedging"}
            ]"#,
        );
        let patterns = scan_for_patterns(INPUT, &generator).await;
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].phrase, "it is important to note");
    }

    #[tokio::test]
    async fn test_caps_at_five_patterns() {
        let generator = ScriptedGenerator::new().reply(
            r#"[
                {"phrase": "In", "reason": "1"},
                {"phrase": "conclusion", "reason": "2"},
                {"phrase": "it", "reason": "3"},
                {"phrase": "is", "reason": "4"},
                {"phrase": "important", "reason": "5"},
                {"phrase": "robust", "reason": "6"}
            ]"#,
        );
        let patterns = scan_for_patterns(INPUT, &generator).await;
        assert_eq!(patterns.len(), MAX_PATTERNS);
        assert!(patterns.iter().all(|p| p.phrase != "robust"));
    }

    #[tokio::test]
    async fn test_service_failure_is_silent() {
        let generator = ScriptedGenerator::new().fail("upstream unavailable");
        assert!(scan_for_patterns(INPUT, &generator).await.is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_silent() {
        let generator = ScriptedGenerator::new().reply(r#"{"phrase": "In conclusion"}"#);
        assert!(scan_for_patterns(INPUT, &generator).await.is_empty());
    }
}
