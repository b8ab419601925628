//! HTML rendering for the web form

use crate::api::session::ChatMessage;
use crate::api::session::Role;

/// Shown when a chat arrives without any session id
pub const NO_PROFILE_MESSAGE: &str = "No profile loaded. Please process a LinkedIn profile first.";

/// Shown when the session id is unknown or has expired
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please process the LinkedIn profile again.";

/// Shown above the facts when a live URL was processed from the mock profile
pub const MOCK_SUBSTITUTION_NOTICE: &str =
    "Note: no ProxyCurl API key was provided, so the bundled mock profile was used.\n\n";

const EXAMPLE_QUESTIONS: &[&str] = &[
    "What is this person's current role?",
    "What are their key skills?",
    "What companies have they worked at?",
    "What's an interesting icebreaker I could use?",
];

/// The processed profile as displayed next to the chat
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session_id: String,
    pub profile_name: String,
    pub headline: Option<String>,
    pub model: String,
    pub history: Vec<ChatMessage>,
}

/// Everything the page needs
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub models: Vec<String>,
    pub selected_model: String,
    pub provider: String,
    /// Facts, notices or error text shown in the result box
    pub result: Option<String>,
    pub session: Option<SessionView>,
}

/// Render the full page: process form, result box and, with a session, the chat
pub fn render_page(view: &PageView) -> String {
    let model_options = view
        .models
        .iter()
        .map(|model| {
            let selected = if *model == view.selected_model {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{value}\"{selected}>{value}</option>",
                value = html_escape(model)
            )
        })
        .collect::<Vec<String>>()
        .join("\n          ");

    let result = view.result.as_deref().map_or_else(String::new, |text| {
        format!(
            "<section class=\"result\"><h2>Initial Facts</h2><pre>{}</pre></section>",
            html_escape(text)
        )
    });

    let chat = view
        .session
        .as_ref()
        .map_or_else(render_chat_placeholder, render_chat);

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>LinkedIn Icebreaker Bot</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 1.5rem; max-width: 60rem; }}
      label {{ display: block; margin-top: 0.6rem; }}
      input[type=text], input[type=password], select {{ width: 100%; padding: 0.3rem; }}
      pre {{ white-space: pre-wrap; background: #f6f6f6; padding: 0.8rem; }}
      .meta {{ color: #555; }}
      .message {{ margin: 0.4rem 0; padding: 0.5rem; border-radius: 4px; }}
      .user {{ background: #e8f0fe; }}
      .assistant {{ background: #f1f3f4; }}
    </style>
  </head>
  <body>
    <h1>LinkedIn Icebreaker Bot</h1>
    <div class="meta">Powered by {provider}</div>
    <section>
      <h2>Process a Profile</h2>
      <form method="post" action="/process">
        <label>LinkedIn Profile URL
          <input type="text" name="profile_url" placeholder="https://www.linkedin.com/in/username/">
        </label>
        <label>ProxyCurl API Key (leave empty for mock data)
          <input type="password" name="api_key">
        </label>
        <label><input type="checkbox" name="use_mock" checked> Use Mock Data</label>
        <label>Model
          <select name="model">
          {model_options}
          </select>
        </label>
        <p><button type="submit">Process Profile</button></p>
      </form>
    </section>
    {result}
    {chat}
  </body>
</html>
"#,
        provider = html_escape(&view.provider),
        model_options = model_options,
        result = result,
        chat = chat
    )
}

fn render_chat(session: &SessionView) -> String {
    let history = if session.history.is_empty() {
        "<p class=\"meta\">No questions asked yet.</p>".to_string()
    } else {
        session
            .history
            .iter()
            .map(|message| {
                let (class, label) = match message.role {
                    Role::User => ("user", "You"),
                    Role::Assistant => ("assistant", "Bot"),
                };
                format!(
                    "<div class=\"message {class}\"><strong>{label}:</strong> {}</div>",
                    html_escape(&message.content)
                )
            })
            .collect::<Vec<String>>()
            .join("\n      ")
    };

    let headline = session
        .headline
        .as_deref()
        .map_or_else(String::new, |h| format!(" &middot; {}", html_escape(h)));

    format!(
        r#"<section class="chat">
      <h2>Chat about {name}</h2>
      <div class="meta">{model}{headline}</div>
      {history}
      <form method="post" action="/chat">
        <input type="hidden" name="session_id" value="{session_id}">
        <label>Ask a question about the profile
          <input type="text" name="question" placeholder="What is this person's current job title?">
        </label>
        <p><button type="submit">Send</button></p>
      </form>
    </section>"#,
        name = html_escape(&session.profile_name),
        model = html_escape(&session.model),
        headline = headline,
        history = history,
        session_id = html_escape(&session.session_id),
    )
}

fn render_chat_placeholder() -> String {
    let examples = EXAMPLE_QUESTIONS
        .iter()
        .map(|q| format!("<li>{}</li>", html_escape(q)))
        .collect::<Vec<String>>()
        .join("");
    format!(
        "<section class=\"chat\"><h2>Chat</h2><p class=\"meta\">Process a profile to start chatting. Example questions:</p><ul>{examples}</ul></section>"
    )
}

pub fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn models() -> Vec<String> {
        vec!["gemini-2.5-flash".to_string(), "gemini-2.5-pro".to_string()]
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_page_without_session() {
        let page = render_page(&PageView {
            models: models(),
            selected_model: "gemini-2.5-pro".to_string(),
            provider: "gemini".to_string(),
            ..PageView::default()
        });

        assert!(page.contains("action=\"/process\""));
        assert!(page.contains("<option value=\"gemini-2.5-pro\" selected>"));
        assert!(page.contains("Process a profile to start chatting"));
        assert!(!page.contains("action=\"/chat\""));
    }

    #[test]
    fn test_page_with_session_escapes_history() {
        let page = render_page(&PageView {
            models: models(),
            selected_model: "gemini-2.5-flash".to_string(),
            provider: "gemini".to_string(),
            result: Some("1. <b>fact</b>".to_string()),
            session: Some(SessionView {
                session_id: "abc-123".to_string(),
                profile_name: "Eden Marco".to_string(),
                headline: Some("AI Engineer".to_string()),
                model: "gemini-2.5-flash".to_string(),
                history: vec![ChatMessage {
                    role: Role::User,
                    content: "<img src=x>".to_string(),
                    timestamp: Utc::now(),
                }],
            }),
        });

        assert!(page.contains("name=\"session_id\" value=\"abc-123\""));
        assert!(page.contains("Chat about Eden Marco"));
        assert!(page.contains("&lt;img src=x&gt;"));
        assert!(page.contains("1. &lt;b&gt;fact&lt;/b&gt;"));
        assert!(!page.contains("<img src=x>"));
    }
}
