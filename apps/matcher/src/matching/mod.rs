// Matching engine: ideal-profile generation, embeddings, similarity scoring,
// per-job ranking and the batch pipeline that persists results.
// All text-generation calls go through llm_client; all store access through store.

pub mod cache;
pub mod embedding;
pub mod engine;
pub mod handlers;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod similarity;
