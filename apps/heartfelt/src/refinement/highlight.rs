//! Splits the input text into plain and highlighted runs for inline display of
//! detected AI patterns.

use serde::Serialize;

use crate::refinement::models::AiPattern;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Plain { text: String },
    Highlighted { text: String, reason: String },
}

/// Every occurrence of every pattern phrase becomes a highlighted run.
/// Patterns are applied in order; a phrase never matches inside text an
/// earlier pattern already claimed. Concatenating the segment texts yields
/// `text` unchanged.
pub fn segment_highlights(text: &str, patterns: &[AiPattern]) -> Vec<Segment> {
    let mut segments = vec![Segment::Plain {
        text: text.to_string(),
    }];

    for pattern in patterns {
        let phrase = pattern.phrase.as_str();
        if phrase.is_empty() {
            continue;
        }

        let mut next = Vec::with_capacity(segments.len());
        for segment in segments {
            let plain = match segment {
                Segment::Plain { text } => text,
                highlighted => {
                    next.push(highlighted);
                    continue;
                }
            };

            let mut cursor = 0;
            for (start, matched) in plain.match_indices(phrase) {
                if start > cursor {
                    next.push(Segment::Plain {
                        text: plain[cursor..start].to_string(),
                    });
                }
                next.push(Segment::Highlighted {
                    text: matched.to_string(),
                    reason: pattern.reason.clone(),
                });
                cursor = start + matched.len();
            }
            if cursor < plain.len() {
                next.push(Segment::Plain {
                    text: plain[cursor..].to_string(),
                });
            }
        }
        segments = next;
    }

    segments
}
