use crate::config::Config;
use crate::matching::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
/// The pipeline carries the engine (and through it the process-wide embedding service),
/// the record store and the optional profile cache.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub config: Config,
}
