//! Scripted in-memory gateway for coordinator and view tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::Notify;

use mindview::error::GatewayError;
use mindview::gateway::filters::{LlmCallFilters, Page};
use mindview::gateway::{clean_tag, Gateway, GatewayResult, TaskRequest};
use mindview::models::{
    Author, AuthorDetail, AuthorTypeChange, ChatAnswer, ContentItem, ItemDetail, LlmCallPage,
    TaskAck,
};
use mindview::playback::PlaybackLink;

pub struct FakeGateway {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    author: Mutex<AuthorDetail>,
    items: Mutex<Vec<ContentItem>>,
    details: Mutex<HashMap<String, ItemDetail>>,
    playback: Mutex<HashMap<String, String>>,
    triggered: Mutex<Vec<TaskRequest>>,
    gate_triggers: bool,
    trigger_requested: Notify,
    trigger_gate: Notify,
    slow_item: Option<String>,
    item_requested: Notify,
    item_gate: Notify,
}

fn scripted_failure(op: &str) -> GatewayError {
    GatewayError::Backend {
        status: 500,
        message: format!("{op} failed"),
    }
}

pub fn author_detail() -> AuthorDetail {
    serde_json::from_value(json!({
        "author": {"id": "a1", "name": "Ada", "platform": "bilibili", "author_type": null},
        "latest_report": {
            "id": "r2",
            "content_type": "finance",
            "content": "[观点]short term[风险]leverage",
            "created_at": "2025-03-01T00:00:00"
        },
        "reports": [
            {"id": "r1", "content_type": "finance", "content": "old", "created_at": "2025-01-01T00:00:00"},
            {"id": "r2", "content_type": "finance", "content": "[观点]short term[风险]leverage", "created_at": "2025-03-01T00:00:00"}
        ],
        "status": {
            "total": 9,
            "asr_status": {"ready": 9},
            "summary_status": {"ready": 9},
            "content_quality": {"full": 9}
        }
    }))
    .expect("author fixture")
}

pub fn catalog() -> Vec<ContentItem> {
    serde_json::from_value(json!([
        {"id": "v1", "author_id": "a1", "title": "Rates explained", "asr_status": "ready", "summary_status": "ready", "content_quality": "full"},
        {"id": "v2", "author_id": "a1", "title": "无字幕", "asr_status": "missing", "summary_status": "blocked", "content_quality": "missing"},
        {"id": "v3", "author_id": "a1", "title": "Old upload"}
    ]))
    .expect("catalog fixture")
}

pub fn item_detail(id: &str) -> ItemDetail {
    serde_json::from_value(json!({
        "video": {"id": id, "author_id": "a1", "title": format!("Video {id}"), "asr_status": "ready"},
        "summary": {
            "content": "plain",
            "json_data": {"blocks": [{"type": "heading", "text": "Intro"}, "body text"]},
            "short_json": "{\"summary\": \"tl;dr\", \"keywords\": [\"rates\"]}"
        },
        "segments": [
            {"segment_index": 1, "start_time_ms": 61000, "end_time_ms": 65000, "text": "second"},
            {"segment_index": 0, "start_time_ms": 0, "end_time_ms": 61000, "text": "first"}
        ]
    }))
    .expect("item fixture")
}

impl FakeGateway {
    pub fn new() -> Self {
        let details = ["v1", "v2", "v3"]
            .into_iter()
            .map(|id| (id.to_string(), item_detail(id)))
            .collect();
        let playback = [("v1".to_string(), "https://media.example/v1.mp4".to_string())]
            .into_iter()
            .collect();
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            author: Mutex::new(author_detail()),
            items: Mutex::new(catalog()),
            details: Mutex::new(details),
            playback: Mutex::new(playback),
            triggered: Mutex::new(Vec::new()),
            gate_triggers: false,
            trigger_requested: Notify::new(),
            trigger_gate: Notify::new(),
            slow_item: None,
            item_requested: Notify::new(),
            item_gate: Notify::new(),
        }
    }

    /// Triggers wait for `release_trigger` before answering.
    pub fn with_gated_triggers(mut self) -> Self {
        self.gate_triggers = true;
        self
    }

    /// `get_item(id)` waits for `release_item` before answering.
    pub fn with_slow_item(mut self, id: &str) -> Self {
        self.slow_item = Some(id.to_string());
        self
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub fn triggered(&self) -> Vec<TaskRequest> {
        self.triggered.lock().unwrap().clone()
    }

    pub async fn trigger_requested(&self) {
        self.trigger_requested.notified().await
    }

    pub fn release_trigger(&self) {
        self.trigger_gate.notify_one();
    }

    pub async fn item_requested(&self) {
        self.item_requested.notified().await
    }

    pub fn release_item(&self) {
        self.item_gate.notify_one();
    }

    fn record(&self, op: &'static str) -> GatewayResult<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.lock().unwrap().contains(op) {
            return Err(scripted_failure(op));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_authors(&self) -> GatewayResult<Vec<Author>> {
        self.record("list_authors")?;
        Ok(vec![self.author.lock().unwrap().author.clone()])
    }

    async fn get_author(&self, author_id: &str) -> GatewayResult<AuthorDetail> {
        self.record("get_author")?;
        let detail = self.author.lock().unwrap().clone();
        if detail.author.id != author_id {
            return Err(GatewayError::NotFound(format!("Author {author_id}")));
        }
        Ok(detail)
    }

    async fn list_author_items(&self, _author_id: &str) -> GatewayResult<Vec<ContentItem>> {
        self.record("list_author_items")?;
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get_item(&self, item_id: &str) -> GatewayResult<ItemDetail> {
        self.record("get_item")?;
        if self.slow_item.as_deref() == Some(item_id) {
            self.item_requested.notify_one();
            self.item_gate.notified().await;
        }
        self.details
            .lock()
            .unwrap()
            .get(item_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Video {item_id}")))
    }

    async fn get_playback_link(&self, item_id: &str) -> GatewayResult<Option<PlaybackLink>> {
        self.record("get_playback_link")?;
        let now = Utc::now();
        Ok(self.playback.lock().unwrap().get(item_id).map(|url| PlaybackLink {
            url: url.clone(),
            fetched_at: now,
            expires_at: now + Duration::seconds(3600),
        }))
    }

    async fn set_author_type(
        &self,
        author_id: &str,
        author_type: Option<&str>,
    ) -> GatewayResult<AuthorTypeChange> {
        self.record("set_author_type")?;
        let tag = clean_tag(author_type);
        self.author.lock().unwrap().author.author_type = tag.clone();
        Ok(AuthorTypeChange {
            author_id: author_id.to_string(),
            author_type: tag,
        })
    }

    async fn set_item_type(
        &self,
        item_id: &str,
        content_type: Option<&str>,
    ) -> GatewayResult<ContentItem> {
        self.record("set_item_type")?;
        let mut details = self.details.lock().unwrap();
        let detail = details
            .get_mut(item_id)
            .ok_or_else(|| GatewayError::NotFound(format!("Video {item_id}")))?;
        detail.item.content_type = clean_tag(content_type);
        Ok(detail.item.clone())
    }

    async fn trigger(&self, task: &TaskRequest) -> GatewayResult<TaskAck> {
        self.record("trigger")?;
        self.triggered.lock().unwrap().push(task.clone());
        if self.gate_triggers {
            self.trigger_requested.notify_one();
            self.trigger_gate.notified().await;
        }
        Ok(TaskAck {
            status: Some("queued".to_string()),
            message: None,
            task_id: Some(format!("t{}", self.triggered.lock().unwrap().len())),
        })
    }

    async fn list_llm_calls(&self, _filters: &LlmCallFilters, _page: Page) -> GatewayResult<LlmCallPage> {
        self.record("list_llm_calls")?;
        Ok(LlmCallPage::default())
    }

    async fn ask(&self, query: &str, _author_id: Option<&str>) -> GatewayResult<ChatAnswer> {
        self.record("ask")?;
        Ok(ChatAnswer {
            answer: format!("echo: {query}"),
            citations: Vec::new(),
        })
    }
}
