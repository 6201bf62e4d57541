use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single-page session. Holds its own lock, generator, and usage store.
    pub session: Session,
}
