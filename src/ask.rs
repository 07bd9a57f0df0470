use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::{AskReply, Citation, Message, Role};
use crate::backend::{Backend, Endpoint, FormPayload};
use crate::client::HttpReply;
use crate::credentials::CredentialProvider;
use crate::error::TransportError;
use crate::transcript::TranscriptRenderer;

/// Shown when the server gives no usable answer text.
pub const FALLBACK_ERROR_TEXT: &str = "Error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AskOutcome {
    Answered { answer: String, sources: Vec<Citation> },
    Failed(String),
}

impl AskOutcome {
    pub fn into_message(self) -> Message {
        match self {
            AskOutcome::Answered { answer, sources } => Message::new(Role::Assistant, answer, sources),
            AskOutcome::Failed(text) => Message::assistant(text),
        }
    }
}

fn fallback() -> AskOutcome {
    AskOutcome::Failed(FALLBACK_ERROR_TEXT.to_string())
}

/// Citations of a successful reply. Missing or null means none; anything else
/// must be a well-formed list.
fn decode_sources(sources: Option<serde_json::Value>) -> Option<Vec<Citation>> {
    match sources {
        None | Some(serde_json::Value::Null) => Some(Vec::new()),
        Some(value) => serde_json::from_value(value).ok(),
    }
}

/// Map an ask exchange onto an outcome. Sources are passed through untouched.
pub fn decode_ask(result: Result<HttpReply, TransportError>) -> AskOutcome {
    let Ok(reply) = result else {
        return fallback();
    };
    match serde_json::from_str::<AskReply>(&reply.body) {
        Ok(AskReply {
            ok: true,
            answer: Some(answer),
            sources,
        }) => match decode_sources(sources) {
            Some(sources) => AskOutcome::Answered { answer, sources },
            None => fallback(),
        },
        Ok(AskReply { ok: false, answer, .. }) => AskOutcome::Failed(
            answer
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR_TEXT.to_string()),
        ),
        Ok(_) | Err(_) => fallback(),
    }
}

pub struct AskOrchestrator {
    backend: Arc<dyn Backend>,
    credentials: Arc<dyn CredentialProvider>,
    transcript: Arc<dyn TranscriptRenderer>,
}

impl AskOrchestrator {
    pub fn new(
        backend: Arc<dyn Backend>,
        credentials: Arc<dyn CredentialProvider>,
        transcript: Arc<dyn TranscriptRenderer>,
    ) -> Self {
        AskOrchestrator {
            backend,
            credentials,
            transcript,
        }
    }

    /// Submit the question held in `input`.
    ///
    /// A blank input is ignored without rendering anything. Otherwise the
    /// trimmed question is rendered, `input` is cleared, and the answer (or the
    /// failure text) follows as one assistant entry.
    #[instrument(level = "info", skip_all)]
    pub async fn ask(&self, input: &mut String) -> Option<AskOutcome> {
        let question = input.trim().to_string();
        if question.is_empty() {
            return None;
        }

        self.transcript.append(Message::user(question.clone()));
        input.clear();

        let form = FormPayload::new()
            .text("question", question)
            .csrf(self.credentials.read_token());
        let outcome = decode_ask(self.backend.post_form(Endpoint::Ask, form).await);

        match &outcome {
            AskOutcome::Answered { sources, .. } => info!(sources = sources.len(), "Question answered"),
            AskOutcome::Failed(text) => warn!(error = %text, "Question failed"),
        }
        self.transcript.append(outcome.clone().into_message());
        Some(outcome)
    }
}
