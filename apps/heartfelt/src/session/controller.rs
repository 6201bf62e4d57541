//! Session controller: drives the view state machine through the async work
//! (service calls, timers, persistence).
//!
//! The state lock is held only for synchronous transitions; it is never held
//! across the refinement call, the scan, a timer, or a store write.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::llm_client::TextGenerator;
use crate::refinement::models::VariationName;
use crate::refinement::params::ParameterSelection;
use crate::refinement::refiner::{refine, REFINEMENT_FAILED_MESSAGE};
use crate::refinement::scanner::scan_for_patterns;
use crate::session::timing::join_min_duration;
use crate::session::usage::{load_usage, persist_usage};
use crate::session::view::{
    Drawer, InfoPanel, RefinementTicket, ResetRejection, SessionSnapshot, SessionState,
    SubmitRejection,
};
use crate::store::KeyValueStore;

/// Cosmetic delays. Neither involves any network activity.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    /// Minimum time the processing view stays up during a refinement.
    pub min_processing: Duration,
    /// Exit transition held in the processing view when starting over.
    pub reset_transition: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            min_processing: Duration::from_millis(1500),
            reset_transition: Duration::from_millis(500),
        }
    }
}

/// How a submit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Result applied; the session is on `output`.
    Completed,
    /// The call failed; the session is back on `input` with an error.
    Failed,
    /// Nothing happened and no call was made.
    Ignored { reason: SubmitRejection },
    /// The call finished after the session moved on; its result was dropped.
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub outcome: SubmitOutcome,
    pub session: SessionSnapshot,
}

/// Shared handle to the one session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn KeyValueStore>,
    timings: SessionTimings,
}

impl Session {
    /// Reads the persisted usage count once and builds a fresh session.
    pub async fn start(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn KeyValueStore>,
        timings: SessionTimings,
    ) -> Self {
        let usage = load_usage(store.as_ref()).await;
        Self {
            state: Arc::new(Mutex::new(SessionState::new(usage))),
            generator,
            store,
            timings,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn set_input(&self, text: String) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.set_input(text);
        state.snapshot()
    }

    pub async fn set_parameters(&self, selection: ParameterSelection) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.set_selection(selection);
        state.snapshot()
    }

    pub async fn select_variation(&self, name: VariationName) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.select_variation(name);
        state.snapshot()
    }

    pub async fn set_drawer(&self, drawer: Drawer, open: bool) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.set_drawer(drawer, open);
        state.snapshot()
    }

    pub async fn set_panel(&self, panel: Option<InfoPanel>) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.set_panel(panel);
        state.snapshot()
    }

    pub async fn dismiss_error(&self) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        state.dismiss_error();
        state.snapshot()
    }

    /// Scans the current input for AI-sounding phrases. Never fails; a blank
    /// input or a scan already running makes this a no-op.
    ///
    /// The scan runs on its own task so a dropped caller cannot leave the
    /// session stuck in `scanning`.
    pub async fn scan(&self) -> SessionSnapshot {
        let scan = self.state.lock().await.begin_scan();
        let Some(text) = scan else {
            return self.snapshot().await;
        };

        let session = self.clone();
        let scanned = text.clone();
        let task = tokio::spawn(async move {
            let patterns = scan_for_patterns(&scanned, session.generator.as_ref()).await;
            if !session.state.lock().await.finish_scan(&scanned, patterns) {
                info!("Input changed during scan, discarding patterns");
            }
        });

        if let Err(e) = task.await {
            error!("Pattern scan task failed: {e}");
            self.state.lock().await.finish_scan(&text, Vec::new());
        }
        self.snapshot().await
    }

    /// The "Humanize" action.
    ///
    /// Rejected submits return immediately without touching the service.
    /// Otherwise the refinement runs joined with the minimum processing
    /// duration, and the session lands on `output` or back on `input`. That
    /// work is spawned, so it completes even if the caller goes away.
    pub async fn submit(&self) -> SubmitReport {
        let ticket = {
            let mut state = self.state.lock().await;
            match state.begin_submit() {
                Ok(ticket) => ticket,
                Err(reason) => {
                    info!("Submit ignored: {reason}");
                    return SubmitReport {
                        outcome: SubmitOutcome::Ignored { reason },
                        session: state.snapshot(),
                    };
                }
            }
        };
        let generation = ticket.generation;

        let session = self.clone();
        let task = tokio::spawn(async move { session.run_refinement(ticket).await });

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Refinement {generation} task failed: {e}");
                let applied = self
                    .state
                    .lock()
                    .await
                    .complete_failure(generation, REFINEMENT_FAILED_MESSAGE);
                match applied {
                    Ok(()) => SubmitOutcome::Failed,
                    Err(_) => SubmitOutcome::Discarded,
                }
            }
        };
        self.report(outcome).await
    }

    async fn run_refinement(&self, ticket: RefinementTicket) -> SubmitOutcome {
        let outcome = join_min_duration(
            refine(&ticket.text, &ticket.params, self.generator.as_ref()),
            self.timings.min_processing,
        )
        .await;

        match outcome {
            Ok(result) => {
                let applied = self
                    .state
                    .lock()
                    .await
                    .complete_success(ticket.generation, result);
                match applied {
                    Ok(count) => {
                        persist_usage(self.store.as_ref(), count).await;
                        info!(
                            "Refinement {} applied, usage now {count}",
                            ticket.generation
                        );
                        SubmitOutcome::Completed
                    }
                    Err(_) => {
                        warn!(
                            "Refinement {} finished after the session moved on",
                            ticket.generation
                        );
                        SubmitOutcome::Discarded
                    }
                }
            }
            Err(e) => {
                error!("Refinement {} failed: {e}", ticket.generation);
                let applied = self
                    .state
                    .lock()
                    .await
                    .complete_failure(ticket.generation, e.user_message());
                match applied {
                    Ok(()) => SubmitOutcome::Failed,
                    Err(_) => SubmitOutcome::Discarded,
                }
            }
        }
    }

    /// "Start over": moves to `processing` now and lands on a cleared `input`
    /// once the transition delay has elapsed. Returns the processing snapshot.
    pub async fn start_over(&self) -> Result<SessionSnapshot, ResetRejection> {
        let (generation, snapshot) = {
            let mut state = self.state.lock().await;
            let generation = state.begin_reset()?;
            (generation, state.snapshot())
        };

        let state = Arc::clone(&self.state);
        let delay = self.timings.reset_transition;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if state.lock().await.finish_reset(generation).is_err() {
                info!("Reset {generation} superseded before it finished");
            }
        });

        Ok(snapshot)
    }

    async fn report(&self, outcome: SubmitOutcome) -> SubmitReport {
        SubmitReport {
            outcome,
            session: self.snapshot().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::session::usage::{USAGE_CEILING, USAGE_KEY};
    use crate::session::view::View;
    use crate::store::MemoryStore;
    use tokio::time::Instant;

    const REPLY: &str = r#"{
        "variations": {
            "essential": "  Hello.  ",
            "storyteller": "It began with a hello.",
            "visionary": "Hello, future."
        },
        "resonance_scores": {"essential": 90, "storyteller": 88, "visionary": 93},
        "highlights": {"essential": [], "storyteller": [], "visionary": []},
        "changes": ["Warmer opener"],
        "score": 91,
        "integrity_pass": true
    }"#;

    async fn session_with(
        generator: ScriptedGenerator,
        store: MemoryStore,
    ) -> (Session, Arc<ScriptedGenerator>, Arc<MemoryStore>) {
        let generator = Arc::new(generator);
        let store = Arc::new(store);
        let session = Session::start(
            generator.clone(),
            store.clone(),
            SessionTimings::default(),
        )
        .await;
        (session, generator, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submit_lands_on_output_and_persists_usage() {
        let (session, generator, store) =
            session_with(ScriptedGenerator::new().reply(REPLY), MemoryStore::new()).await;
        session.set_input("hello there".to_string()).await;

        let report = session.submit().await;

        assert_eq!(report.outcome, SubmitOutcome::Completed);
        assert_eq!(report.session.view, View::Output);
        assert_eq!(report.session.displayed.unwrap().text, "Hello.");
        assert_eq!(report.session.usage.used, 1);
        assert_eq!(generator.calls(), 1);
        assert_eq!(store.get(USAGE_KEY).await.unwrap(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_lasts_at_least_the_minimum_duration() {
        let (session, _, _) =
            session_with(ScriptedGenerator::new().reply(REPLY), MemoryStore::new()).await;
        session.set_input("hello".to_string()).await;

        let start = Instant::now();
        session.submit().await;
        assert!(start.elapsed() >= SessionTimings::default().min_processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submit_returns_to_input_without_usage() {
        let (session, _, store) =
            session_with(ScriptedGenerator::new().fail("down"), MemoryStore::new()).await;
        session.set_input("keep this text".to_string()).await;

        let start = Instant::now();
        let report = session.submit().await;

        assert_eq!(report.outcome, SubmitOutcome::Failed);
        assert_eq!(report.session.view, View::Input);
        assert_eq!(report.session.input, "keep this text");
        assert_eq!(
            report.session.error.as_deref(),
            Some(crate::refinement::refiner::REFINEMENT_FAILED_MESSAGE)
        );
        assert_eq!(report.session.usage.used, 0);
        assert_eq!(store.get(USAGE_KEY).await.unwrap(), None);
        assert!(
            start.elapsed() >= SessionTimings::default().min_processing,
            "fast failures wait out the same join"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_submit_is_a_no_op() {
        let (session, generator, _) =
            session_with(ScriptedGenerator::new().reply(REPLY), MemoryStore::new()).await;
        session.set_input("   ".to_string()).await;

        let report = session.submit().await;
        assert_eq!(
            report.outcome,
            SubmitOutcome::Ignored {
                reason: SubmitRejection::EmptyInput
            }
        );
        assert_eq!(report.session.view, View::Input);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_processing_is_ignored() {
        let (session, generator, _) =
            session_with(ScriptedGenerator::new().reply(REPLY), MemoryStore::new()).await;
        session.set_input("hello".to_string()).await;

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit().await }
        });
        // let the first submit reach its timer
        while session.snapshot().await.view != View::Processing {
            tokio::task::yield_now().await;
        }

        let second = session.submit().await;
        assert_eq!(
            second.outcome,
            SubmitOutcome::Ignored {
                reason: SubmitRejection::InFlight
            }
        );
        assert_eq!(second.session.usage.used, 0);

        let first = first.await.unwrap();
        assert_eq!(first.outcome, SubmitOutcome::Completed);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_still_completes() {
        let (session, generator, store) = session_with(
            ScriptedGenerator::new()
                .reply(REPLY)
                .with_latency(Duration::from_millis(800)),
            MemoryStore::new(),
        )
        .await;
        session.set_input("hello".to_string()).await;

        let caller = tokio::spawn({
            let session = session.clone();
            async move { session.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.snapshot().await.view, View::Processing);

        // the client disconnects mid-call
        caller.abort();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let after = session.snapshot().await;
        assert_eq!(after.view, View::Output);
        assert!(!after.processing);
        assert!(after.can_submit);
        assert_eq!(after.usage.used, 1);
        assert_eq!(store.get(USAGE_KEY).await.unwrap(), Some(1));
        assert_eq!(generator.calls(), 1);
        assert!(session.start_over().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_failing_submit_returns_to_input() {
        let (session, _, _) = session_with(
            ScriptedGenerator::new()
                .fail("down")
                .with_latency(Duration::from_millis(800)),
            MemoryStore::new(),
        )
        .await;
        session.set_input("keep me".to_string()).await;

        let caller = tokio::spawn({
            let session = session.clone();
            async move { session.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        caller.abort();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let after = session.snapshot().await;
        assert_eq!(after.view, View::Input);
        assert_eq!(after.input, "keep me");
        assert!(after.error.is_some());
        assert!(after.can_submit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_submit_is_rejected_without_a_call() {
        let mut generator = ScriptedGenerator::new();
        for _ in 0..6 {
            generator = generator.reply(REPLY);
        }
        let (session, generator, store) = session_with(generator, MemoryStore::new()).await;
        session.set_input("hello".to_string()).await;

        for expected in 1..=USAGE_CEILING {
            let report = session.submit().await;
            assert_eq!(report.outcome, SubmitOutcome::Completed);
            assert_eq!(report.session.usage.used, expected);
        }
        let report = session.submit().await;

        assert_eq!(
            report.outcome,
            SubmitOutcome::Ignored {
                reason: SubmitRejection::UsageExhausted
            }
        );
        assert!(!report.session.can_submit);
        assert_eq!(generator.calls(), USAGE_CEILING as usize);
        assert_eq!(store.get(USAGE_KEY).await.unwrap(), Some(USAGE_CEILING));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persisted_usage_is_read_at_startup() {
        let (session, generator, _) = session_with(
            ScriptedGenerator::new().reply(REPLY),
            MemoryStore::with_value(USAGE_KEY, USAGE_CEILING),
        )
        .await;
        session.set_input("hello".to_string()).await;

        let report = session.submit().await;
        assert!(matches!(report.outcome, SubmitOutcome::Ignored { .. }));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_variations_never_re_requests() {
        let (session, generator, _) =
            session_with(ScriptedGenerator::new().reply(REPLY), MemoryStore::new()).await;
        session.set_input("hello".to_string()).await;
        session.submit().await;

        let story = session.select_variation(VariationName::Storyteller).await;
        session.select_variation(VariationName::Essential).await;
        let story_again = session.select_variation(VariationName::Storyteller).await;

        assert_eq!(
            story.displayed.as_ref().unwrap().text,
            "It began with a hello."
        );
        assert_eq!(story.displayed, story_again.displayed);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_over_clears_after_transition_delay() {
        let generator = ScriptedGenerator::new()
            .reply(r#"[{"phrase": "hello", "reason": "bland"}]"#)
            .reply(REPLY);
        let (session, _, _) = session_with(generator, MemoryStore::new()).await;
        session.set_input("hello".to_string()).await;
        let scanned = session.scan().await;
        assert_eq!(scanned.patterns.len(), 1);
        session.submit().await;
        session.set_drawer(Drawer::Insights, true).await;

        let during = session.start_over().await.unwrap();
        assert_eq!(during.view, View::Processing);
        assert!(during.result.is_none());

        tokio::time::sleep(SessionTimings::default().reset_transition + Duration::from_millis(1))
            .await;

        let after = session.snapshot().await;
        assert_eq!(after.view, View::Input);
        assert!(after.input.is_empty());
        assert!(after.patterns.is_empty());
        assert!(!after.drawers.insights);
        assert_eq!(after.usage.used, 1, "start over never refunds usage");
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_with_empty_input_makes_no_call() {
        let (session, generator, _) =
            session_with(ScriptedGenerator::new(), MemoryStore::new()).await;
        let snapshot = session.scan().await;
        assert!(snapshot.patterns.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_scan_still_finishes() {
        let (session, _, _) = session_with(
            ScriptedGenerator::new()
                .reply(r#"[{"phrase": "In conclusion", "reason": "stock"}]"#)
                .with_latency(Duration::from_millis(800)),
            MemoryStore::new(),
        )
        .await;
        session.set_input("In conclusion, yes.".to_string()).await;

        let caller = tokio::spawn({
            let session = session.clone();
            async move { session.scan().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.snapshot().await.scanning);

        caller.abort();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let after = session.snapshot().await;
        assert!(!after.scanning);
        assert_eq!(after.patterns.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_failure_is_silent() {
        let (session, _, _) =
            session_with(ScriptedGenerator::new().fail("down"), MemoryStore::new()).await;
        session.set_input("In conclusion, yes.".to_string()).await;
        let snapshot = session.scan().await;
        assert!(snapshot.patterns.is_empty());
        assert!(snapshot.error.is_none());
        assert!(!snapshot.scanning);
    }
}
