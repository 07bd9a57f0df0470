use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source reference returned alongside an answer.
///
/// The index is assigned by the server and kept as-is.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub index: i64,
    pub doc_name: String,
    pub snippet: String,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.index, self.doc_name, self.snippet)
    }
}

/// One transcript entry. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    text: String,
    sources: Vec<Citation>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>, sources: Vec<Citation>) -> Self {
        Message {
            role,
            text: text.into(),
            sources,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, Vec::new())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, Vec::new())
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text, Vec::new())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> &[Citation] {
        &self.sources
    }

    /// Citation lines in server order, formatted `[{index}] {doc_name}: {snippet}`.
    pub fn citation_lines(&self) -> Vec<String> {
        self.sources.iter().map(ToString::to_string).collect()
    }
}

/// Raw body of `POST /api/upload/`.
///
/// Only `ok` and `error` are typed; fields read on the success path alone stay
/// raw so a bad value there cannot hide the server's error text.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct UploadReply {
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) chunks: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) doc_id: Option<serde_json::Value>,
}

/// Raw body of `POST /api/ask/`. `sources` is decoded only when `ok` is true.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AskReply {
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) answer: Option<String>,
    #[serde(default)]
    pub(crate) sources: Option<serde_json::Value>,
}

/// Raw body of `POST /api/delete/`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct DeleteReply {
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) error: Option<String>,
}
