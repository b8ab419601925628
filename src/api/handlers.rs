//! API request handlers
//!
//! Pipeline failures are rendered into the page as text; no handler returns an
//! error status for them.

use std::sync::Arc;

use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::Html;
use axum::Form;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::render::render_page;
use crate::api::render::PageView;
use crate::api::render::SessionView;
use crate::api::render::MOCK_SUBSTITUTION_NOTICE;
use crate::api::render::NO_PROFILE_MESSAGE;
use crate::api::render::SESSION_EXPIRED_MESSAGE;
use crate::api::session::SessionManager;
use crate::api::session::WebSession;
use crate::api::types::ApiResponse;
use crate::api::types::ChatForm;
use crate::api::types::HealthResponse;
use crate::api::types::PageQuery;
use crate::api::types::ProcessForm;
use crate::rag::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RagService>,
    pub sessions: Arc<SessionManager>,
    pub provider: String,
}

impl AppState {
    pub fn new(service: Arc<RagService>, session_timeout_secs: u64, provider: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(service.clone(), session_timeout_secs)),
            service,
            provider: provider.into(),
        }
    }

    fn page(&self, selected_model: Option<&str>) -> PageView {
        PageView {
            models: self.service.supported_models().to_vec(),
            selected_model: selected_model
                .unwrap_or_else(|| self.service.default_model())
                .to_string(),
            provider: self.provider.clone(),
            result: None,
            session: None,
        }
    }

    async fn page_for_session(&self, session: &WebSession, result: Option<String>) -> PageView {
        let snapshot = session.profile.snapshot().await;
        let mut page = self.page(snapshot.as_ref().map(|s| s.model.as_str()));
        page.result = result;
        page.session = snapshot.map(|snapshot| SessionView {
            session_id: session.session_id.clone(),
            profile_name: snapshot.profile.display_name().to_string(),
            headline: snapshot.profile.headline.clone(),
            model: snapshot.model,
            history: session.history.clone(),
        });
        page
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.provider.clone(),
        model: state.service.default_model().to_string(),
        active_sessions: state.sessions.session_count(),
    }))
}

/// JSON 404 for unknown routes
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("no route for {}", uri.path()))),
    )
}

/// `GET /`: the empty form, or an existing session when its id is given
pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let session = query
        .session_id
        .as_deref()
        .and_then(|id| state.sessions.get_session(id));

    let page = match session {
        Some(session) => state.page_for_session(&session, None).await,
        None => state.page(None),
    };
    Html(render_page(&page))
}

/// `POST /process`: process a profile in a fresh session and show the facts
pub async fn process(State(state): State<AppState>, Form(form): Form<ProcessForm>) -> Html<String> {
    let request = form.to_request();
    info!(
        "POST /process (mock: {}, url: {})",
        request.use_mock,
        request.url.as_deref().unwrap_or("-")
    );

    let notice = if state.service.substitutes_mock(&request) {
        MOCK_SUBSTITUTION_NOTICE
    } else {
        ""
    };

    let session = state.sessions.create_session();
    match session.profile.process(request, form.model()).await {
        Ok(outcome) => {
            let result = format!(
                "{notice}Profile processed successfully!\n\nHere are 3 interesting facts about this person:\n\n{}",
                outcome.initial_facts
            );
            Html(render_page(&state.page_for_session(&session, Some(result)).await))
        }
        Err(e) => {
            error!("Processing failed: {}", e);
            state.sessions.delete_session(&session.session_id);
            let mut page = state.page(form.model());
            page.result = Some(format!("Error: {e}"));
            Html(render_page(&page))
        }
    }
}

/// `POST /chat`: answer a question in an existing session
pub async fn chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Html<String> {
    let session_id = form.session_id.trim();
    if session_id.is_empty() {
        let mut page = state.page(None);
        page.result = Some(NO_PROFILE_MESSAGE.to_string());
        return Html(render_page(&page));
    }

    let Some(session) = state.sessions.get_session(session_id) else {
        let mut page = state.page(None);
        page.result = Some(SESSION_EXPIRED_MESSAGE.to_string());
        return Html(render_page(&page));
    };

    let question = form.question.trim();
    if question.is_empty() {
        return Html(render_page(&state.page_for_session(&session, None).await));
    }

    info!("POST /chat ({})", session_id);
    let reply = match session.profile.ask(question).await {
        Ok(answer) => answer.text,
        Err(e) => {
            error!("Answering failed: {}", e);
            format!("Error: {e}")
        }
    };

    let session = state
        .sessions
        .record_exchange(session_id, question, &reply)
        .unwrap_or(session);
    Html(render_page(&state.page_for_session(&session, None).await))
}
