//! Per-user session state over the shared pipeline

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;
use tracing::info;
use tracing::warn;

use crate::errors::IcebreakerError;
use crate::errors::Result;
use crate::models::Profile;
use crate::profile::ProfileRequest;
use crate::rag::index::IndexStore;
use crate::rag::pipeline::Answer;
use crate::rag::pipeline::ProcessOutcome;
use crate::rag::RagService;

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Indexed {
        profile: Profile,
        initial_facts: String,
        model: String,
    },
}

#[derive(Debug, Default)]
struct SessionData {
    state: SessionState,
    index: IndexStore,
}

/// Read-only view of an indexed session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub profile: Profile,
    pub initial_facts: String,
    pub model: String,
    pub segment_count: usize,
}

/// One user's profile, index and model choice
///
/// Only one `process`, `ask` or `reset` runs at a time; a concurrent call is
/// rejected with `SessionBusy` instead of waiting.
pub struct ProfileSession {
    service: Arc<RagService>,
    data: Mutex<SessionData>,
}

impl ProfileSession {
    pub fn new(service: Arc<RagService>) -> Self {
        Self {
            service,
            data: Mutex::new(SessionData::default()),
        }
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, SessionData>> {
        self.data.try_lock().map_err(|_| IcebreakerError::SessionBusy)
    }

    /// Fetch, index and summarise a profile
    ///
    /// The new index replaces the old one only when every stage succeeds; on
    /// failure the session keeps whatever state it had before.
    pub async fn process(
        &self,
        request: ProfileRequest,
        model_override: Option<&str>,
    ) -> Result<ProcessOutcome> {
        let mut data = self.try_lock()?;
        let model = self.service.resolve_model(model_override)?;

        let prepared = match self.service.prepare(&request, &model).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("Processing failed, keeping previous session state: {}", e);
                return Err(e);
            }
        };

        let segment_count = prepared.index.len();
        data.index.replace(prepared.index);
        data.state = SessionState::Indexed {
            profile: prepared.profile.clone(),
            initial_facts: prepared.initial_facts.clone(),
            model: model.clone(),
        };
        info!("Session ready with {} segments using {}", segment_count, model);

        Ok(ProcessOutcome {
            profile: prepared.profile,
            initial_facts: prepared.initial_facts,
            segment_count,
            model,
            usage: prepared.usage,
        })
    }

    /// Answer a question about the processed profile; state is left unchanged
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(IcebreakerError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let data = self.try_lock()?;
        let SessionState::Indexed { model, .. } = &data.state else {
            return Err(IcebreakerError::SessionNotReady);
        };

        self.service.answer(&data.index, question, model).await
    }

    /// Drop the profile and index
    pub fn reset(&self) -> Result<()> {
        let mut data = self.try_lock()?;
        data.index.clear();
        data.state = SessionState::Empty;
        Ok(())
    }

    /// Whether a profile has been processed; `false` while a call is in flight
    pub fn is_ready(&self) -> bool {
        self.data
            .try_lock()
            .is_ok_and(|data| matches!(data.state, SessionState::Indexed { .. }))
    }

    /// Current profile and facts, waiting for any in-flight call to finish
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let data = self.data.lock().await;
        match &data.state {
            SessionState::Empty => None,
            SessionState::Indexed {
                profile,
                initial_facts,
                model,
            } => Some(SessionSnapshot {
                profile: profile.clone(),
                initial_facts: initial_facts.clone(),
                model: model.clone(),
                segment_count: data.index.get().map_or(0, |index| index.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::testing::mock_service;
    use crate::config::AppConfig;
    use crate::testing::service_with;
    use crate::testing::service_with_config;
    use crate::testing::TitleGenerator;

    #[tokio::test]
    async fn test_ask_before_process_is_not_ready() {
        let session = ProfileSession::new(mock_service());
        let err = session.ask("What is the job title?").await.unwrap_err();
        assert!(matches!(err, IcebreakerError::SessionNotReady));
        assert!(!session.is_ready());
    }

    #[tokio::test]
    async fn test_process_then_ask() {
        let session = ProfileSession::new(mock_service());
        let outcome = session.process(ProfileRequest::mock(), None).await.unwrap();

        assert_eq!(outcome.profile.display_name(), "Eden Marco");
        assert!(outcome.initial_facts.contains("Senior AI Engineer"));
        assert_eq!(outcome.model, "gemini-2.5-flash");
        assert!(session.is_ready());

        let answer = session
            .ask("What is this person's current job title?")
            .await
            .unwrap();
        assert_eq!(answer.text, "Senior AI Engineer");
        assert!(!answer.sources.is_empty());
        assert!(answer.sources.len() <= 3);
    }

    #[tokio::test]
    async fn test_blank_question_is_invalid() {
        let session = ProfileSession::new(mock_service());
        session.process(ProfileRequest::mock(), None).await.unwrap();
        let err = session.ask("   ").await.unwrap_err();
        assert!(matches!(err, IcebreakerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unsupported_model_fails_before_fetch() {
        let generator = Arc::new(TitleGenerator::new());
        let session = ProfileSession::new(service_with(generator.clone()));

        let err = session
            .process(ProfileRequest::mock(), Some("gpt-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, IcebreakerError::ModelUnsupported(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_ready());
    }

    #[tokio::test]
    async fn test_model_override_is_remembered() {
        let session = ProfileSession::new(mock_service());
        session
            .process(ProfileRequest::mock(), Some("gemini-2.5-pro"))
            .await
            .unwrap();

        let answer = session.ask("current job title?").await.unwrap();
        assert_eq!(answer.model, "gemini-2.5-pro");
        assert_eq!(session.snapshot().await.unwrap().model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_failed_process_keeps_previous_state() {
        let session = ProfileSession::new(mock_service());
        session.process(ProfileRequest::mock(), None).await.unwrap();

        let live = ProfileRequest::live(
            "https://www.linkedin.com/in/someone/",
            Some("bad-key".to_string()),
        );
        let err = session.process(live, None).await.unwrap_err();
        assert!(matches!(err, IcebreakerError::DataUnavailable(_)));

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.profile.display_name(), "Eden Marco");
        assert!(session.ask("current job title?").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_key_leaves_session_empty() {
        let session = ProfileSession::new(mock_service());
        let live = ProfileRequest::live(
            "https://www.linkedin.com/in/someone/",
            Some("bad-key".to_string()),
        );

        assert!(session.process(live, None).await.is_err());
        assert!(session.snapshot().await.is_none());
        assert!(matches!(
            session.ask("anything").await.unwrap_err(),
            IcebreakerError::SessionNotReady
        ));
    }

    #[tokio::test]
    async fn test_concurrent_call_is_busy() {
        let mut generator = TitleGenerator::new();
        generator.delay = Some(Duration::from_millis(200));
        let session = Arc::new(ProfileSession::new(service_with(Arc::new(generator))));

        let background = {
            let session = session.clone();
            tokio::spawn(async move { session.process(ProfileRequest::mock(), None).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = session.ask("current job title?").await.unwrap_err();
        assert!(matches!(err, IcebreakerError::SessionBusy));
        assert!(session.reset().is_err());

        background.await.unwrap().unwrap();
        assert!(session.ask("current job title?").await.is_ok());
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let mut config = AppConfig::default();
        config.timeouts.request_secs = 1;
        let mut generator = TitleGenerator::new();
        generator.delay = Some(Duration::from_millis(1500));
        let session = ProfileSession::new(service_with_config(&config, Arc::new(generator)));

        let err = session.process(ProfileRequest::mock(), None).await.unwrap_err();
        assert_eq!(err.kind(), "Timeout");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("generation"));
        assert!(!session.is_ready());
    }

    #[tokio::test]
    async fn test_reset_returns_to_empty() {
        let session = ProfileSession::new(mock_service());
        session.process(ProfileRequest::mock(), None).await.unwrap();
        session.reset().unwrap();

        assert!(!session.is_ready());
        assert!(matches!(
            session.ask("anything").await.unwrap_err(),
            IcebreakerError::SessionNotReady
        ));
    }

    #[tokio::test]
    async fn test_mock_retrieval_is_deterministic() {
        let first = ProfileSession::new(mock_service());
        let second = ProfileSession::new(mock_service());
        first.process(ProfileRequest::mock(), None).await.unwrap();
        second.process(ProfileRequest::mock(), None).await.unwrap();

        let a = first.ask("Which university did they attend?").await.unwrap();
        let b = second.ask("Which university did they attend?").await.unwrap();
        assert_eq!(a.sources, b.sources);
    }
}
