//! Client for a document question-answering server
//!
//! This crate provides:
//! - **Transcript**: `TranscriptRenderer` with in-memory and terminal renderers
//! - **Credentials**: `CredentialProvider` reading the `csrftoken` cookie
//! - **Orchestrators**: `UploadOrchestrator` (sequential uploads, removal) and
//!   `AskOrchestrator` (question/answer with citations)
//! - **Transport**: the `Backend` seam and its reqwest `HttpBackend`
//!
//! # Example
//!
//! ```ignore
//! use docchat::{FileSelection, HttpBackend, Session, TerminalRenderer};
//!
//! let backend = HttpBackend::new("http://127.0.0.1:8000")?;
//! backend.open_session().await?;
//! let session = Session::new(
//!     Arc::new(backend.clone()),
//!     Arc::new(backend.credentials()),
//!     Arc::new(TerminalRenderer::new(std::io::stdout())),
//! );
//! session.uploads.upload_all(&mut FileSelection::from_paths(["notes.pdf"])).await?;
//! ```
use std::sync::Arc;

pub mod api;
pub mod ask;
pub mod backend;
pub mod client;
pub mod credentials;
pub mod error;
mod traffic_log;
pub mod transcript;
pub mod upload;

pub use api::{Citation, Message, Role};
pub use ask::{AskOrchestrator, AskOutcome};
pub use backend::{Backend, Endpoint, FormPayload, FormValue, HttpBackend};
pub use client::HttpReply;
pub use credentials::{CookieJarCredentials, CredentialProvider, StaticToken};
pub use error::{TransportError, UploadError};
pub use transcript::{TerminalRenderer, Transcript, TranscriptRenderer};
pub use upload::{
    DeleteOutcome, FileSelection, SelectedFile, UploadOrchestrator, UploadOutcome, UploadReport,
};

/// Both orchestrators wired to the same backend, credentials and transcript.
#[derive(Clone)]
pub struct Session {
    pub uploads: Arc<UploadOrchestrator>,
    pub asks: Arc<AskOrchestrator>,
}

impl Session {
    pub fn new(
        backend: Arc<dyn Backend>,
        credentials: Arc<dyn CredentialProvider>,
        transcript: Arc<dyn TranscriptRenderer>,
    ) -> Self {
        Session {
            uploads: Arc::new(UploadOrchestrator::new(
                backend.clone(),
                credentials.clone(),
                transcript.clone(),
            )),
            asks: Arc::new(AskOrchestrator::new(backend, credentials, transcript)),
        }
    }
}
