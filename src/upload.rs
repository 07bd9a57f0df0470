//! Document ingestion: sequential multi-file upload and document removal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::{DeleteReply, Message, UploadReply};
use crate::backend::{Backend, Endpoint, FormPayload};
use crate::client::HttpReply;
use crate::credentials::CredentialProvider;
use crate::error::{TransportError, UploadError};
use crate::transcript::TranscriptRenderer;

/// A file picked for upload: the name shown to the user and where to read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    path: PathBuf,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        SelectedFile { name, path }
    }

    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SelectedFile {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The current file selection, cleared once a batch has been processed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSelection {
    files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn new(files: Vec<SelectedFile>) -> Self {
        FileSelection { files }
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(paths.into_iter().map(SelectedFile::new).collect())
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Embedded { chunks: u64, doc_id: Option<String> },
    Failed(String),
}

impl UploadOutcome {
    pub fn message_text(&self, file_name: &str) -> String {
        match self {
            UploadOutcome::Embedded { chunks, .. } => {
                format!("Embedded {} ({} chunks).", file_name, chunks)
            }
            UploadOutcome::Failed(error) => format!("Upload error: {}", error),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReport {
    pub file: SelectedFile,
    pub outcome: UploadOutcome,
}

impl UploadReport {
    /// The server-assigned id to pass to document removal, if one came back.
    pub fn doc_id(&self) -> Option<&str> {
        match &self.outcome {
            UploadOutcome::Embedded { doc_id, .. } => doc_id.as_deref(),
            UploadOutcome::Failed(_) => None,
        }
    }

    /// One line telling the user how to refer to the uploaded document later.
    pub fn doc_id_line(&self) -> Option<String> {
        self.doc_id()
            .map(|id| format!("{} has doc_id {}", self.file.name(), id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Failed(String),
}

impl DeleteOutcome {
    pub fn message_text(&self, doc_id: &str) -> String {
        match self {
            DeleteOutcome::Removed => format!("Removed document {}.", doc_id),
            DeleteOutcome::Failed(error) => format!("Delete error: {}", error),
        }
    }
}

/// Best available description of an HTTP reply when the body says nothing useful.
fn status_text(reply: &HttpReply) -> String {
    if reply.status_text.is_empty() {
        format!("HTTP {}", reply.status)
    } else {
        reply.status_text.clone()
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// Map an upload exchange onto an outcome. Anything malformed is a failure.
pub fn decode_upload(result: Result<HttpReply, TransportError>) -> UploadOutcome {
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => return UploadOutcome::Failed(e.to_string()),
    };
    match serde_json::from_str::<UploadReply>(&reply.body) {
        Ok(UploadReply {
            ok: true,
            chunks,
            doc_id,
            ..
        }) => match chunks.as_ref().and_then(serde_json::Value::as_u64) {
            Some(chunks) => UploadOutcome::Embedded {
                chunks,
                doc_id: doc_id.and_then(|id| match id {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                }),
            },
            None => UploadOutcome::Failed(status_text(&reply)),
        },
        Ok(UploadReply { ok: false, error, .. }) => {
            UploadOutcome::Failed(non_empty(error).unwrap_or_else(|| status_text(&reply)))
        }
        Ok(_) | Err(_) => UploadOutcome::Failed(status_text(&reply)),
    }
}

pub fn decode_delete(result: Result<HttpReply, TransportError>) -> DeleteOutcome {
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => return DeleteOutcome::Failed(e.to_string()),
    };
    match serde_json::from_str::<DeleteReply>(&reply.body) {
        Ok(DeleteReply { ok: true, .. }) => DeleteOutcome::Removed,
        Ok(DeleteReply { ok: false, error }) => {
            DeleteOutcome::Failed(non_empty(error).unwrap_or_else(|| status_text(&reply)))
        }
        Err(_) => DeleteOutcome::Failed(status_text(&reply)),
    }
}

pub struct UploadOrchestrator {
    backend: Arc<dyn Backend>,
    credentials: Arc<dyn CredentialProvider>,
    transcript: Arc<dyn TranscriptRenderer>,
}

impl UploadOrchestrator {
    pub fn new(
        backend: Arc<dyn Backend>,
        credentials: Arc<dyn CredentialProvider>,
        transcript: Arc<dyn TranscriptRenderer>,
    ) -> Self {
        UploadOrchestrator {
            backend,
            credentials,
            transcript,
        }
    }

    /// Upload every selected file, one at a time, in selection order.
    ///
    /// Each file gets an "Uploading" entry before its request and exactly one
    /// outcome entry after it; the next file is not started until then. A
    /// failed file does not stop the batch. The selection is cleared at the end.
    #[instrument(level = "info", skip_all, fields(files = selection.len()))]
    pub async fn upload_all(
        &self,
        selection: &mut FileSelection,
    ) -> Result<Vec<UploadReport>, UploadError> {
        if selection.is_empty() {
            return Err(UploadError::NoFilesSelected);
        }

        let mut reports = Vec::with_capacity(selection.len());
        for file in selection.files().to_vec() {
            self.transcript
                .append(Message::system(format!("Uploading {}...", file.name())));

            let form = FormPayload::new()
                .file("file", file.clone())
                .csrf(self.credentials.read_token());
            let outcome = decode_upload(self.backend.post_form(Endpoint::Upload, form).await);

            match &outcome {
                UploadOutcome::Embedded { chunks, doc_id } => {
                    info!(file = file.name(), chunks, doc_id = ?doc_id, "Document embedded")
                }
                UploadOutcome::Failed(error) => {
                    warn!(file = file.name(), error = %error, "Upload failed")
                }
            }
            self.transcript
                .append(Message::system(outcome.message_text(file.name())));
            reports.push(UploadReport { file, outcome });
        }

        selection.clear();
        Ok(reports)
    }

    /// Remove a previously ingested document. A blank id does nothing.
    #[instrument(level = "info", skip(self))]
    pub async fn remove_document(&self, doc_id: &str) -> Option<DeleteOutcome> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return None;
        }

        let form = FormPayload::new()
            .text("doc_id", doc_id)
            .csrf(self.credentials.read_token());
        let outcome = decode_delete(self.backend.post_form(Endpoint::Delete, form).await);
        if let DeleteOutcome::Failed(error) = &outcome {
            warn!(doc_id, error = %error, "Delete failed");
        }
        self.transcript
            .append(Message::system(outcome.message_text(doc_id)));
        Some(outcome)
    }
}
