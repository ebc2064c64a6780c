pub mod filters;
pub mod http;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{
    Author, AuthorDetail, AuthorTypeChange, ChatAnswer, ContentItem, ItemDetail, LlmCallPage,
    TaskAck,
};
use crate::playback::PlaybackLink;
use filters::{LlmCallFilters, Page};

pub use http::HttpGateway;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A background job the backend can be asked to enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    RegenerateReport { author_id: String },
    ResummarizeItem { item_id: String, include_fallback: bool },
    ResummarizeAll { author_id: String, include_fallback: bool },
    ResummarizePending { author_id: String },
    ReprocessItem { item_id: String },
    ReprocessAuthor { author_id: String },
    Ingest { target: String, limit: u32 },
}

impl TaskRequest {
    /// The single backend call this job maps to: unencoded path segments,
    /// query pairs, JSON body.
    pub fn endpoint(&self) -> (Vec<&str>, Vec<(&'static str, String)>, Option<serde_json::Value>) {
        match self {
            TaskRequest::RegenerateReport { author_id } => {
                (vec!["authors", author_id.as_str(), "regenerate_report"], Vec::new(), None)
            }
            TaskRequest::ResummarizeItem {
                item_id,
                include_fallback,
            } => (
                vec!["videos", item_id.as_str(), "resummarize"],
                vec![("include_fallback", include_fallback.to_string())],
                None,
            ),
            TaskRequest::ResummarizeAll {
                author_id,
                include_fallback,
            } => (
                vec!["authors", author_id.as_str(), "resummarize_all"],
                vec![("include_fallback", include_fallback.to_string())],
                None,
            ),
            TaskRequest::ResummarizePending { author_id } => {
                (vec!["authors", author_id.as_str(), "resummarize_pending"], Vec::new(), None)
            }
            TaskRequest::ReprocessItem { item_id } => {
                (vec!["videos", item_id.as_str(), "reprocess_asr"], Vec::new(), None)
            }
            TaskRequest::ReprocessAuthor { author_id } => {
                (vec!["authors", author_id.as_str(), "reprocess_asr"], Vec::new(), None)
            }
            TaskRequest::Ingest { target, limit } => (
                vec!["ingest"],
                Vec::new(),
                Some(serde_json::json!({ "author_id": target, "limit": limit })),
            ),
        }
    }

    /// The entity a 404 from this job's endpoint refers to.
    pub fn subject(&self) -> String {
        match self {
            TaskRequest::RegenerateReport { author_id }
            | TaskRequest::ResummarizeAll { author_id, .. }
            | TaskRequest::ResummarizePending { author_id }
            | TaskRequest::ReprocessAuthor { author_id } => format!("Author {author_id}"),
            TaskRequest::ResummarizeItem { item_id, .. } | TaskRequest::ReprocessItem { item_id } => {
                format!("Video {item_id}")
            }
            TaskRequest::Ingest { target, .. } => format!("Ingest target {target}"),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TaskRequest::RegenerateReport { author_id } => format!("regenerate report for author {author_id}"),
            TaskRequest::ResummarizeItem { item_id, .. } => format!("resummarize item {item_id}"),
            TaskRequest::ResummarizeAll { author_id, .. } => format!("resummarize all items of author {author_id}"),
            TaskRequest::ResummarizePending { author_id } => format!("resummarize pending items of author {author_id}"),
            TaskRequest::ReprocessItem { item_id } => format!("reprocess transcript of item {item_id}"),
            TaskRequest::ReprocessAuthor { author_id } => format!("reprocess transcripts of author {author_id}"),
            TaskRequest::Ingest { target, .. } => format!("ingest {target}"),
        }
    }
}

/// Typed request/response boundary to the knowledge-base service.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_authors(&self) -> GatewayResult<Vec<Author>>;

    async fn get_author(&self, author_id: &str) -> GatewayResult<AuthorDetail>;

    async fn list_author_items(&self, author_id: &str) -> GatewayResult<Vec<ContentItem>>;

    async fn get_item(&self, item_id: &str) -> GatewayResult<ItemDetail>;

    /// Fresh signed media link. `Ok(None)` when the backend has no media.
    async fn get_playback_link(&self, item_id: &str) -> GatewayResult<Option<PlaybackLink>>;

    /// `None` or blank clears the tag.
    async fn set_author_type(
        &self,
        author_id: &str,
        author_type: Option<&str>,
    ) -> GatewayResult<AuthorTypeChange>;

    async fn set_item_type(
        &self,
        item_id: &str,
        content_type: Option<&str>,
    ) -> GatewayResult<ContentItem>;

    /// Enqueue a background job. The ack only confirms enqueueing.
    async fn trigger(&self, task: &TaskRequest) -> GatewayResult<TaskAck>;

    async fn list_llm_calls(&self, filters: &LlmCallFilters, page: Page) -> GatewayResult<LlmCallPage>;

    async fn ask(&self, query: &str, author_id: Option<&str>) -> GatewayResult<ChatAnswer>;
}

/// Trim a classification value; blank means "clear".
pub fn clean_tag(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
