//! Refinement parameters: the style knobs passed verbatim into the prompt.
//!
//! Every selector is optional in the UI; defaults are applied here, once, when
//! a request is built. Wire names match the labels shown to the user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who the rewrite should sound like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persona {
    #[default]
    General,
    Academic,
    #[serde(rename = "SEO Writer")]
    SeoWriter,
    Founder,
    Marketer,
    Executive,
}

/// Where the text will be published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "LinkedIn")]
    LinkedIn,
    Email,
    #[serde(rename = "Direct Message")]
    DirectMessage,
    #[serde(rename = "Twitter/X")]
    TwitterX,
    #[serde(rename = "Blog Post")]
    BlogPost,
    #[default]
    General,
}

/// The reader's expected state of mind. No default: absent means "Natural".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Inspired,
    Skeptical,
    Bored,
    Upset,
}

/// How far the rewrite may depart from the original structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    #[default]
    Standard,
    Advanced,
    Ultra,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::General => "General",
            Persona::Academic => "Academic",
            Persona::SeoWriter => "SEO Writer",
            Persona::Founder => "Founder",
            Persona::Marketer => "Marketer",
            Persona::Executive => "Executive",
        }
    }
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Email => "Email",
            Platform::DirectMessage => "Direct Message",
            Platform::TwitterX => "Twitter/X",
            Platform::BlogPost => "Blog Post",
            Platform::General => "General",
        }
    }
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Inspired => "Inspired",
            Mood::Skeptical => "Skeptical",
            Mood::Bored => "Bored",
            Mood::Upset => "Upset",
        }
    }
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Standard => "Standard",
            Intensity::Advanced => "Advanced",
            Intensity::Ultra => "Ultra",
        }
    }

    /// One-line description shown next to the intensity selector.
    pub fn description(&self) -> &'static str {
        match self {
            Intensity::Standard => {
                "Foundational Resonance. Refines grammar and flow while preserving original structure."
            }
            Intensity::Advanced => {
                "Deep Pulse Integration. Infuses the text with emotional nuance and varied sentence rhythms."
            }
            Intensity::Ultra => {
                "The Visionary Leap. Complete structural evolution to find the deepest human soul and resonance."
            }
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(Persona, Platform, Mood, Intensity);

/// The user's current selections, as held by the session. Every field may be
/// unset; `resolve` turns it into the parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSelection {
    pub persona: Option<Persona>,
    pub platform: Option<Platform>,
    pub mood: Option<Mood>,
    pub intensity: Option<Intensity>,
    #[serde(default)]
    pub style_sample: String,
    #[serde(default)]
    pub keywords: String,
}

/// Fully-resolved parameters for one refinement request.
///
/// Defaults: persona `General`, platform `General`, intensity `Standard`,
/// mood absent (the prompt says "Natural"). Blank style sample and keyword
/// fields collapse to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefinementParameters {
    pub persona: Persona,
    pub platform: Platform,
    pub mood: Option<Mood>,
    pub intensity: Intensity,
    pub style_sample: Option<String>,
    pub keywords: Option<String>,
}

impl ParameterSelection {
    pub fn resolve(&self) -> RefinementParameters {
        RefinementParameters {
            persona: self.persona.unwrap_or_default(),
            platform: self.platform.unwrap_or_default(),
            mood: self.mood,
            intensity: self.intensity.unwrap_or_default(),
            style_sample: non_blank(&self.style_sample),
            keywords: non_blank(&self.keywords),
        }
    }
}

impl RefinementParameters {
    /// Individual keyword tokens, split on commas and whitespace.
    pub fn keyword_tokens(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|k| {
                k.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
