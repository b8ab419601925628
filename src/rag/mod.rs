//! RAG (Retrieval-Augmented Generation) over a single LinkedIn profile
//!
//! - In-memory cosine-similarity index over profile segments
//! - Context assembly from retrieved segments
//! - Per-session orchestration of process and ask
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use icebreaker::config::AppConfig;
//! use icebreaker::profile::ProfileRequest;
//! use icebreaker::rag::ProfileSession;
//! use icebreaker::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let session = ProfileSession::new(Arc::new(RagService::new(&config)?));
//!
//!     let outcome = session.process(ProfileRequest::mock(), None).await?;
//!     println!("{}", outcome.initial_facts);
//!
//!     let answer = session.ask("What is this person's current job title?").await?;
//!     println!("Answer: {}", answer.text);
//!     println!("Sources: {} segments", answer.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod index;
pub mod pipeline;
pub mod session;

pub use context::ContextAssembler;
pub use index::IndexStore;
pub use index::RankedSegment;
pub use index::VectorIndex;
pub use pipeline::Answer;
pub use pipeline::ProcessOutcome;
pub use pipeline::RagService;
pub use session::ProfileSession;
pub use session::SessionSnapshot;
pub use session::SessionState;
