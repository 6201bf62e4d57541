//! View state machine
//!
//! Pure, synchronous transitions over the single-page session. Anything that
//! awaits (the service call, timers, persistence) lives in `controller`, which
//! drives these transitions under a lock.
//!
//! ```text
//! input --submit--> processing --success--> output
//!                        |                     |
//!                        +------failure--------+--> input (error kept)
//! output --reset--> processing --(delay)--> input (cleared)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::refinement::highlight::{segment_highlights, Segment};
use crate::refinement::models::{AiPattern, Highlight, RefinementResult, VariationName};
use crate::refinement::params::{ParameterSelection, RefinementParameters};
use crate::session::stats::{reading_time_minutes, word_count};
use crate::session::usage::{UsageCounter, UsageSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Input,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Drawer {
    Insights,
    Personalization,
}

/// Static informational panels. At most one is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoPanel {
    Privacy,
    Usage,
    Terms,
    Trust,
}

/// Why a submit was ignored. A rejected submit changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum SubmitRejection {
    #[error("input text is empty")]
    EmptyInput,
    #[error("a refinement is already in progress")]
    InFlight,
    #[error("usage limit reached")]
    UsageExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResetRejection {
    #[error("cannot start over while a refinement is in progress")]
    InFlight,
}

/// Everything one refinement call needs, captured at submit time.
#[derive(Debug, Clone)]
pub struct RefinementTicket {
    pub generation: u64,
    pub text: String,
    pub params: RefinementParameters,
}

/// A stale completion: its generation no longer matches the session's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stale;

#[derive(Debug)]
pub struct SessionState {
    view: View,
    input: String,
    selection: ParameterSelection,
    selected_variation: VariationName,
    result: Option<RefinementResult>,
    error: Option<String>,
    patterns: Vec<AiPattern>,
    scanning: bool,
    in_flight: bool,
    insights_open: bool,
    personalization_open: bool,
    open_panel: Option<InfoPanel>,
    /// Bumped by every submit and reset; completions carrying an older value are dropped.
    generation: u64,
    usage: UsageCounter,
}

impl SessionState {
    pub fn new(usage_count: u64) -> Self {
        Self {
            view: View::Input,
            input: String::new(),
            selection: ParameterSelection::default(),
            selected_variation: VariationName::default(),
            result: None,
            error: None,
            patterns: Vec::new(),
            scanning: false,
            in_flight: false,
            insights_open: false,
            personalization_open: false,
            open_panel: None,
            generation: 0,
            usage: UsageCounter::new(usage_count),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> Option<&RefinementResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn patterns(&self) -> &[AiPattern] {
        &self.patterns
    }

    pub fn usage(&self) -> UsageCounter {
        self.usage
    }

    // ── editing ────────────────────────────────────────────────────────────

    /// Replaces the input text. Detected patterns describe the old text, so
    /// any change discards them.
    pub fn set_input(&mut self, text: String) {
        if text != self.input {
            self.input = text;
            self.patterns.clear();
        }
    }

    pub fn set_selection(&mut self, selection: ParameterSelection) {
        self.selection = selection;
    }

    /// Changes which variation of the current result is displayed. Never
    /// touches the result itself.
    pub fn select_variation(&mut self, name: VariationName) {
        self.selected_variation = name;
    }

    pub fn set_drawer(&mut self, drawer: Drawer, open: bool) {
        match drawer {
            Drawer::Insights => self.insights_open = open,
            Drawer::Personalization => self.personalization_open = open,
        }
    }

    pub fn set_panel(&mut self, panel: Option<InfoPanel>) {
        self.open_panel = panel;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // ── submit ─────────────────────────────────────────────────────────────

    pub fn submit_rejection(&self) -> Option<SubmitRejection> {
        if self.in_flight || self.view == View::Processing {
            Some(SubmitRejection::InFlight)
        } else if self.input.trim().is_empty() {
            Some(SubmitRejection::EmptyInput)
        } else if self.usage.is_exhausted() {
            Some(SubmitRejection::UsageExhausted)
        } else {
            None
        }
    }

    pub fn can_submit(&self) -> bool {
        self.submit_rejection().is_none()
    }

    /// `input -> processing`. Clears the previous result up front so stale
    /// content can never be displayed.
    pub fn begin_submit(&mut self) -> Result<RefinementTicket, SubmitRejection> {
        if let Some(rejection) = self.submit_rejection() {
            return Err(rejection);
        }

        self.generation += 1;
        self.in_flight = true;
        self.result = None;
        self.error = None;
        self.view = View::Processing;

        Ok(RefinementTicket {
            generation: self.generation,
            text: self.input.clone(),
            params: self.selection.resolve(),
        })
    }

    /// `processing -> output`. Returns the new usage count to persist.
    pub fn complete_success(
        &mut self,
        generation: u64,
        result: RefinementResult,
    ) -> Result<u64, Stale> {
        if !self.is_current(generation) {
            return Err(Stale);
        }

        self.in_flight = false;
        self.result = Some(result);
        self.selected_variation = VariationName::Essential;
        self.view = View::Output;
        Ok(self.usage.increment())
    }

    /// `processing -> input`. Input text is left as the user wrote it.
    pub fn complete_failure(&mut self, generation: u64, message: &str) -> Result<(), Stale> {
        if !self.is_current(generation) {
            return Err(Stale);
        }

        self.in_flight = false;
        self.error = Some(message.to_string());
        self.view = View::Input;
        Ok(())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.in_flight && generation == self.generation
    }

    // ── start over ─────────────────────────────────────────────────────────

    /// `output -> processing` for the exit transition. Returns the generation
    /// `finish_reset` must present.
    pub fn begin_reset(&mut self) -> Result<u64, ResetRejection> {
        if self.in_flight {
            return Err(ResetRejection::InFlight);
        }

        self.generation += 1;
        self.result = None;
        self.error = None;
        self.view = View::Processing;
        Ok(self.generation)
    }

    /// `processing -> input` with a clean slate.
    pub fn finish_reset(&mut self, generation: u64) -> Result<(), Stale> {
        if generation != self.generation || self.view != View::Processing || self.in_flight {
            return Err(Stale);
        }

        self.input.clear();
        self.patterns.clear();
        self.insights_open = false;
        self.view = View::Input;
        Ok(())
    }

    // ── scan ───────────────────────────────────────────────────────────────

    /// Starts a pattern scan, returning the text to scan. `None` when the
    /// input is blank or a scan is already running.
    pub fn begin_scan(&mut self) -> Option<String> {
        if self.scanning || self.input.trim().is_empty() {
            return None;
        }
        self.scanning = true;
        self.patterns.clear();
        Some(self.input.clone())
    }

    /// Applies scan results only if the input is still what was scanned.
    pub fn finish_scan(&mut self, scanned: &str, patterns: Vec<AiPattern>) -> bool {
        self.scanning = false;
        if self.input == scanned {
            self.patterns = patterns;
            true
        } else {
            false
        }
    }

    // ── snapshot ───────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        let displayed = self.result.as_ref().map(|result| {
            let name = self.selected_variation;
            let text = result.variation(name).to_string();
            let words = word_count(&text);
            DisplayedVariation {
                name,
                resonance_score: *result.resonance_scores.get(name),
                highlights: result.highlights.get(name).clone(),
                word_count: words,
                reading_time_minutes: reading_time_minutes(words),
                text,
            }
        });

        let intensity = self.selection.intensity.unwrap_or_default();

        SessionSnapshot {
            view: self.view,
            input: self.input.clone(),
            input_word_count: word_count(&self.input),
            parameters: self.selection.clone(),
            intensity_description: intensity.description(),
            selected_variation: self.selected_variation,
            result: self.result.clone(),
            displayed,
            error: self.error.clone(),
            patterns: self.patterns.clone(),
            highlighted_input: segment_highlights(&self.input, &self.patterns),
            scanning: self.scanning,
            processing: self.in_flight,
            can_submit: self.can_submit(),
            submit_blocked_by: self.submit_rejection(),
            usage: self.usage.snapshot(),
            drawers: DrawerState {
                insights: self.insights_open,
                personalization: self.personalization_open,
            },
            open_panel: self.open_panel,
        }
    }
}

/// The selected variation of the current result, ready to render or copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedVariation {
    pub name: VariationName,
    pub text: String,
    pub resonance_score: u8,
    pub highlights: Vec<Highlight>,
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawerState {
    pub insights: bool,
    pub personalization: bool,
}

/// Read-only view of the session, as served to the front end.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub input: String,
    pub input_word_count: usize,
    pub parameters: ParameterSelection,
    pub intensity_description: &'static str,
    pub selected_variation: VariationName,
    pub result: Option<RefinementResult>,
    pub displayed: Option<DisplayedVariation>,
    pub error: Option<String>,
    pub patterns: Vec<AiPattern>,
    pub highlighted_input: Vec<Segment>,
    pub scanning: bool,
    pub processing: bool,
    pub can_submit: bool,
    pub submit_blocked_by: Option<SubmitRejection>,
    pub usage: UsageSnapshot,
    pub drawers: DrawerState,
    pub open_panel: Option<InfoPanel>,
}
