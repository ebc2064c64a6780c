use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::filters::{LlmCallFilters, Page};
use super::{clean_tag, Gateway, GatewayResult, TaskRequest};
use crate::config::Settings;
use crate::error::GatewayError;
use crate::models::{
    Author, AuthorDetail, AuthorTypeChange, ChatAnswer, ContentItem, ItemDetail, LlmCallPage,
    TaskAck,
};
use crate::playback::{PlaybackLink, PlaybackResponse};

const API_PREFIX: [&str; 2] = ["api", "v1"];
const USER_AGENT: &str = concat!("mindview/", env!("CARGO_PKG_VERSION"));

/// JSON-over-HTTP client for the knowledge-base service.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: reqwest::Url,
    playback_ttl_secs: i64,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(settings: &Settings) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let base_url = reqwest::Url::parse(&settings.base_url).map_err(|e| {
            GatewayError::Network(format!("invalid base URL {}: {e}", settings.base_url))
        })?;

        Ok(Self {
            base_url,
            playback_ttl_secs: settings.playback_ttl_secs,
            client,
        })
    }

    /// Base URL plus the API prefix plus `segments`, each percent-encoded
    /// as one path segment.
    fn url(&self, segments: &[&str]) -> GatewayResult<reqwest::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Network(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Send one request. 404 maps to `NotFound(what)`.
    async fn send(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
        what: &str,
    ) -> GatewayResult<reqwest::Response> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Backend request");

        let mut req = self.client.request(method, url).query(query);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                message: backend_message(&text, status),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &[&str], query: &[(&'static str, String)], what: &str) -> GatewayResult<T> {
        let resp = self.send(Method::GET, path, query, None, what).await?;
        decode(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
        what: &str,
    ) -> GatewayResult<T> {
        let resp = self.send(Method::POST, path, query, body, what).await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> GatewayResult<T> {
    let text = resp
        .text()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;
    // Ack endpoints may answer with an empty body.
    let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Error text from a FastAPI-style body (`detail` or `message`), else the raw body.
fn backend_message(body: &str, status: StatusCode) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|k| v.get(*k))
            .map(|d| match d.as_str() {
                Some(s) => s.to_string(),
                None => d.to_string(),
            })
    });
    field
        .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_authors(&self) -> GatewayResult<Vec<Author>> {
        self.get_json(&["authors"], &[], "Authors").await
    }

    async fn get_author(&self, author_id: &str) -> GatewayResult<AuthorDetail> {
        self.get_json(&["authors", author_id], &[], &format!("Author {author_id}"))
            .await
    }

    async fn list_author_items(&self, author_id: &str) -> GatewayResult<Vec<ContentItem>> {
        self.get_json(
            &["authors", author_id, "videos"],
            &[],
            &format!("Author {author_id}"),
        )
        .await
    }

    async fn get_item(&self, item_id: &str) -> GatewayResult<ItemDetail> {
        self.get_json(&["videos", item_id], &[], &format!("Video {item_id}"))
            .await
    }

    async fn get_playback_link(&self, item_id: &str) -> GatewayResult<Option<PlaybackLink>> {
        let fetched_at = chrono::Utc::now();
        let resp: PlaybackResponse = match self
            .get_json(&["videos", item_id, "playback"], &[], "Playback media")
            .await
        {
            Ok(resp) => resp,
            Err(GatewayError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(PlaybackLink::from_response(resp, fetched_at, self.playback_ttl_secs))
    }

    async fn set_author_type(
        &self,
        author_id: &str,
        author_type: Option<&str>,
    ) -> GatewayResult<AuthorTypeChange> {
        let body = serde_json::json!({ "author_type": clean_tag(author_type) });
        let change: AuthorTypeChange = self
            .post_json(
                &["authors", author_id, "set_type"],
                &[],
                Some(&body),
                &format!("Author {author_id}"),
            )
            .await?;
        info!(author_id, author_type = ?change.author_type, "Author type updated");
        Ok(change)
    }

    async fn set_item_type(
        &self,
        item_id: &str,
        content_type: Option<&str>,
    ) -> GatewayResult<ContentItem> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            video: ContentItem,
        }

        let body = serde_json::json!({ "content_type": clean_tag(content_type) });
        let env: Envelope = self
            .post_json(
                &["videos", item_id, "set_type"],
                &[],
                Some(&body),
                &format!("Video {item_id}"),
            )
            .await?;
        info!(item_id, content_type = ?env.video.content_type, "Video type updated");
        Ok(env.video)
    }

    async fn trigger(&self, task: &TaskRequest) -> GatewayResult<TaskAck> {
        let (path, query, body) = task.endpoint();
        let ack: TaskAck = self
            .post_json(&path, &query, body.as_ref(), &task.subject())
            .await?;
        info!(task = %task.describe(), status = ?ack.status, task_id = ?ack.task_id, "Task enqueued");
        Ok(ack)
    }

    async fn list_llm_calls(&self, filters: &LlmCallFilters, page: Page) -> GatewayResult<LlmCallPage> {
        self.get_json(&["llm_calls"], &filters.query_pairs(page), "LLM call log")
            .await
    }

    async fn ask(&self, query: &str, author_id: Option<&str>) -> GatewayResult<ChatAnswer> {
        let body = serde_json::json!({ "query": query, "author_id": author_id });
        self.post_json(&["chat"], &[], Some(&body), "Chat").await
    }
}
