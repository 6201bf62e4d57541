//! Axum route handlers for the Session API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::refinement::models::VariationName;
use crate::refinement::params::ParameterSelection;
use crate::session::controller::{SubmitOutcome, SubmitReport};
use crate::session::view::{Drawer, InfoPanel, SessionSnapshot, SubmitRejection};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VariationRequest {
    pub variation: VariationName,
}

#[derive(Debug, Deserialize)]
pub struct DrawerRequest {
    pub open: bool,
}

#[derive(Debug, Deserialize)]
pub struct PanelRequest {
    pub panel: Option<InfoPanel>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

/// PUT /api/v1/session/input
///
/// Replaces the draft text. Detected patterns are discarded when it changes.
pub async fn handle_set_input(
    State(state): State<AppState>,
    Json(request): Json<InputRequest>,
) -> Json<SessionSnapshot> {
    Json(state.session.set_input(request.text).await)
}

/// PUT /api/v1/session/parameters
///
/// Replaces the persona/platform/mood/intensity selections and the optional
/// keyword and style-sample fields. `null` selectors fall back to defaults at
/// submit time.
pub async fn handle_set_parameters(
    State(state): State<AppState>,
    Json(selection): Json<ParameterSelection>,
) -> Json<SessionSnapshot> {
    Json(state.session.set_parameters(selection).await)
}

/// POST /api/v1/session/scan
///
/// Flags AI-sounding phrases in the current input. Always succeeds.
pub async fn handle_scan(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.scan().await)
}

/// POST /api/v1/session/refine
///
/// The "Humanize" action. A refinement failure is part of the report (the
/// session carries the user-facing error); an ignored submit is an error
/// response so the caller can tell nothing happened.
pub async fn handle_refine(State(state): State<AppState>) -> Result<Json<SubmitReport>, AppError> {
    let report = state.session.submit().await;
    match report.outcome {
        SubmitOutcome::Ignored { reason } => Err(match reason {
            SubmitRejection::EmptyInput => AppError::Validation(reason.to_string()),
            SubmitRejection::InFlight => AppError::Conflict(reason.to_string()),
            SubmitRejection::UsageExhausted => AppError::UsageLimitReached,
        }),
        _ => Ok(Json(report)),
    }
}

/// PUT /api/v1/session/variation
pub async fn handle_select_variation(
    State(state): State<AppState>,
    Json(request): Json<VariationRequest>,
) -> Json<SessionSnapshot> {
    Json(state.session.select_variation(request.variation).await)
}

/// POST /api/v1/session/reset
///
/// "Start over". Responds with the transitional `processing` snapshot; the
/// session lands on a cleared `input` after the transition delay.
pub async fn handle_reset(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .session
        .start_over()
        .await
        .map_err(|e| AppError::Conflict(e.to_string()))?;
    Ok(Json(snapshot))
}

/// PUT /api/v1/session/drawers/:drawer
pub async fn handle_set_drawer(
    State(state): State<AppState>,
    Path(drawer): Path<Drawer>,
    Json(request): Json<DrawerRequest>,
) -> Json<SessionSnapshot> {
    Json(state.session.set_drawer(drawer, request.open).await)
}

/// PUT /api/v1/session/panel
pub async fn handle_set_panel(
    State(state): State<AppState>,
    Json(request): Json<PanelRequest>,
) -> Json<SessionSnapshot> {
    Json(state.session.set_panel(request.panel).await)
}

/// DELETE /api/v1/session/error
pub async fn handle_dismiss_error(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.dismiss_error().await)
}
