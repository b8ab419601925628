//! Icebreaker: retrieval-augmented Q&A over a single LinkedIn profile
//!
//! A profile is fetched (ProxyCurl or the bundled mock), flattened into a
//! document, split into overlapping segments, embedded and indexed in memory.
//! Questions are answered by the configured Gemini or watsonx.ai model from the
//! most similar segments only.

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod profile;
pub mod providers;
pub mod rag;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use errors::*;
