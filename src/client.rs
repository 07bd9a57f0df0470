use reqwest::cookie::Jar;
use reqwest::multipart::Form;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{Level, event, instrument};

use crate::error::TransportError;
use crate::traffic_log;

/// Status and body of a completed HTTP exchange, whatever the status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        HttpReply {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// reqwest wrapper sharing one cookie jar across every request.
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    pub fn with_cookie_jar(jar: Arc<Jar>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().cookie_provider(jar).build()?;
        Ok(Client { client })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get<U>(&self, url: U) -> Result<HttpReply, TransportError>
    where
        U: reqwest::IntoUrl + Debug,
    {
        let response = self.client.get(url).send().await?;
        Self::into_reply(response).await
    }

    /// POST a multipart form. Non-2xx statuses are returned as replies, not errors,
    /// since the backend reports application failures with a JSON body.
    #[instrument(level = "debug", skip(self, form))]
    pub async fn post_form<U>(&self, url: U, form: Form) -> Result<HttpReply, TransportError>
    where
        U: reqwest::IntoUrl + Debug,
    {
        let response = self.client.post(url).multipart(form).send().await?;
        Self::into_reply(response).await
    }

    async fn into_reply(response: reqwest::Response) -> Result<HttpReply, TransportError> {
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;
        event!(Level::TRACE, status = status.as_u16(), response = %traffic_log::truncate_for_log(&body, 200));

        Ok(HttpReply::new(status.as_u16(), status_text, body))
    }
}
