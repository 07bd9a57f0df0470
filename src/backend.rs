use async_trait::async_trait;
use reqwest::{Body, Url};
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use crate::client::{Client, HttpReply};
use crate::credentials::CookieJarCredentials;
use crate::error::TransportError;
use crate::traffic_log;
use crate::upload::SelectedFile;

pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Server routes used by the client.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Upload,
    Ask,
    Delete,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Upload => "/api/upload/",
            Endpoint::Ask => "/api/ask/",
            Endpoint::Delete => "/api/delete/",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(SelectedFile),
}

/// Ordered form fields of a mutating request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, FormValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), FormValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: &str, file: SelectedFile) -> Self {
        self.fields.push((name.to_string(), FormValue::File(file)));
        self
    }

    /// Attach the CSRF token under the field the server checks.
    pub fn csrf(self, token: impl Into<String>) -> Self {
        self.text(CSRF_FIELD, token)
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(field, value)| match value {
            FormValue::Text(text) if field == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// Field names with file contents elided, for logging.
    fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| match value {
                FormValue::Text(_) if name == CSRF_FIELD => format!("{}=<redacted>", name),
                FormValue::Text(text) => format!("{}={}", name, text),
                FormValue::File(file) => format!("{}=<file {}>", name, file.name()),
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// The network seam of the orchestrators.
#[async_trait]
pub trait Backend: Send + Sync {
    /// POST `form` to `endpoint`. Any HTTP status is a reply; only failures to
    /// complete the exchange are errors.
    async fn post_form(
        &self,
        endpoint: Endpoint,
        form: FormPayload,
    ) -> Result<HttpReply, TransportError>;
}

/// The real backend: a same-origin server reached over HTTP, with one cookie
/// jar shared between the transport and the CSRF credential reader.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());
        let client = Client::with_cookie_jar(jar.clone())?;
        Ok(HttpBackend {
            client,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Credential reader over this backend's cookie jar.
    pub fn credentials(&self) -> CookieJarCredentials {
        CookieJarCredentials::new(self.jar.clone(), self.base_url.clone())
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::Network(format!("invalid url {}: {}", path, e)))
    }

    /// Load the chat page so the server can set the `csrftoken` cookie.
    #[instrument(level = "info", skip(self), fields(base_url = %self.base_url))]
    pub async fn open_session(&self) -> Result<HttpReply, TransportError> {
        let reply = self.client.get(self.url_for("/chat/")?).await?;
        debug!(status = reply.status, "Session page loaded");
        Ok(reply)
    }

    /// Encode the payload as multipart. File parts are streamed from disk
    /// with a known length rather than read into memory first.
    async fn into_multipart(form: FormPayload) -> Result<Form, TransportError> {
        let mut multipart = Form::new();
        for (name, value) in form.fields {
            multipart = match value {
                FormValue::Text(text) => multipart.text(name, text),
                FormValue::File(file) => multipart.part(name, Self::file_part(&file).await?),
            };
        }
        Ok(multipart)
    }

    async fn file_part(file: &SelectedFile) -> Result<Part, TransportError> {
        let read_error = |e: std::io::Error| TransportError::FileRead {
            file_name: file.name().to_string(),
            reason: e.to_string(),
        };
        let handle = tokio::fs::File::open(file.path()).await.map_err(read_error)?;
        let metadata = handle.metadata().await.map_err(read_error)?;
        if metadata.is_dir() {
            return Err(read_error(std::io::Error::other("is a directory")));
        }

        let body = Body::wrap_stream(ReaderStream::new(handle));
        Ok(Part::stream_with_length(body, metadata.len()).file_name(file.name().to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn post_form(
        &self,
        endpoint: Endpoint,
        form: FormPayload,
    ) -> Result<HttpReply, TransportError> {
        traffic_log::log_request(endpoint.path(), &form.summary());
        let result = async {
            let url = self.url_for(endpoint.path())?;
            let multipart = Self::into_multipart(form).await?;
            self.client.post_form(url, multipart).await
        }
        .await;

        match &result {
            Ok(reply) => traffic_log::log_response(endpoint.path(), reply.status, &reply.body),
            Err(e) => traffic_log::log_error(endpoint.path(), &e.to_string()),
        }
        result
    }
}
