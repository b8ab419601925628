//! Process a profile and answer questions about it

use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::debug;

use crate::cli::output::*;
use crate::profile::ProfileRequest;
use crate::rag::ProfileSession;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

const MOCK_SUBSTITUTION_NOTICE: &str =
    "No ProxyCurl API key configured; answering from the bundled mock profile instead";
const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

pub async fn handle_chat(
    config: &AppConfig,
    request: ProfileRequest,
    model: Option<&str>,
    questions: &[String],
    verbose: bool,
) -> Result<()> {
    let service = Arc::new(RagService::new(config)?);
    let substitutes_mock = service.substitutes_mock(&request);
    let session = ProfileSession::new(service);

    if request.use_mock {
        print_info("Using the bundled mock profile");
    } else if substitutes_mock {
        print_warning(MOCK_SUBSTITUTION_NOTICE);
    } else {
        print_info(&format!(
            "Fetching profile {}",
            request.url.as_deref().unwrap_or_default()
        ));
    }

    let outcome = session.process(request, model).await?;
    print_outcome(&outcome);

    if questions.is_empty() {
        interactive_loop(&session, verbose).await
    } else {
        for question in questions {
            println!("❓ {question}");
            let answer = session.ask(question).await?;
            print_answer(&answer, verbose);
        }
        Ok(())
    }
}

async fn interactive_loop(session: &ProfileSession, verbose: bool) -> Result<()> {
    print_info("Ask a question about this person (type 'exit' or 'quit' to leave)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt("> ");
        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed");
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_ascii_lowercase().as_str()) {
            break;
        }

        // A failed question is reported and the loop carries on
        match session.ask(question).await {
            Ok(answer) => print_answer(&answer, verbose),
            Err(e) => print_error(&format!("error[{}]: {}", e.kind(), e)),
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
