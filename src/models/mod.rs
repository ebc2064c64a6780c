use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::{AsrStatus, ContentQuality, StatusCounts, SummaryStatus};

/// A creator tracked by the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub author_type: Option<String>,
    /// Rollup embedded by the list endpoint, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusCounts>,
}

/// One ingested media item (video or post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub asr_status: AsrStatus,
    #[serde(default)]
    pub summary_status: SummaryStatus,
    #[serde(default)]
    pub content_quality: ContentQuality,
}

/// Transcript fragment. Offsets are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub segment_index: i64,
    #[serde(default)]
    pub start_time_ms: i64,
    #[serde(default)]
    pub end_time_ms: i64,
    #[serde(default)]
    pub text: String,
}

/// Compact summary: one paragraph plus keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortSummary {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Stored LLM summary of one item. `json_data` shape varies by pipeline version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub json_data: Option<serde_json::Value>,
    #[serde(default)]
    pub short_json: Option<serde_json::Value>,
    #[serde(default)]
    pub video_category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Author-level report, one per regeneration and type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorReport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub report_version: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub json_data: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AuthorReport {
    /// Grouping key: content type, then report type, then "generic".
    pub fn type_key(&self) -> &str {
        [&self.content_type, &self.report_type]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|s| !s.is_empty())
            .unwrap_or("generic")
    }

    /// View the report through the summary record shape for normalization.
    pub fn as_summary(&self) -> Summary {
        Summary {
            id: self.id.clone(),
            content_id: None,
            content: self.content.clone(),
            json_data: self.json_data.clone(),
            short_json: None,
            video_category: None,
            created_at: self.created_at.clone(),
        }
    }
}

/// `GET /authors/{id}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDetail {
    pub author: Author,
    #[serde(default)]
    pub latest_report: Option<AuthorReport>,
    #[serde(default)]
    pub reports: Vec<AuthorReport>,
    #[serde(default)]
    pub reports_by_type: BTreeMap<String, Vec<AuthorReport>>,
    #[serde(default)]
    pub status: Option<StatusCounts>,
}

impl AuthorDetail {
    /// Reports grouped by type key, each group most recent first.
    ///
    /// Uses the backend grouping when present, otherwise groups the flat list.
    pub fn grouped_reports(&self) -> BTreeMap<String, Vec<AuthorReport>> {
        let mut grouped = if self.reports_by_type.is_empty() {
            let mut g: BTreeMap<String, Vec<AuthorReport>> = BTreeMap::new();
            for report in &self.reports {
                g.entry(report.type_key().to_string())
                    .or_default()
                    .push(report.clone());
            }
            g
        } else {
            self.reports_by_type.clone()
        };
        for group in grouped.values_mut() {
            // ISO-8601 strings order chronologically; missing dates sink.
            group.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        grouped
    }

    /// Latest report, falling back to the newest one in the flat list.
    pub fn latest(&self) -> Option<&AuthorReport> {
        self.latest_report.as_ref().or_else(|| {
            self.reports
                .iter()
                .max_by(|a, b| a.created_at.cmp(&b.created_at))
        })
    }
}

/// `GET /videos/{id}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(rename = "video")]
    pub item: ContentItem,
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl ItemDetail {
    /// Segments ordered by start offset.
    pub fn ordered_segments(&self) -> Vec<&Segment> {
        let mut segs: Vec<&Segment> = self.segments.iter().collect();
        segs.sort_by_key(|s| (s.start_time_ms, s.segment_index));
        segs
    }
}

/// Response of `POST /authors/{id}/set_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorTypeChange {
    pub author_id: String,
    #[serde(default)]
    pub author_type: Option<String>,
}

/// Enqueue acknowledgment for a background job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

/// One row of the LLM call log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallEntry {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub profile_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<i64>,
    #[serde(default)]
    pub prompt_tokens: Option<i64>,
    #[serde(default)]
    pub completion_tokens: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmCallPage {
    #[serde(default)]
    pub items: Vec<LlmCallEntry>,
    #[serde(default)]
    pub total: usize,
}

/// Answer from the knowledge-base chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_grouping_falls_back_to_flat_list() {
        let detail: AuthorDetail = serde_json::from_value(json!({
            "author": {"id": "a1", "name": "n"},
            "reports": [
                {"id": "r1", "content_type": "finance", "created_at": "2025-01-01T00:00:00"},
                {"id": "r2", "created_at": "2025-02-01T00:00:00"},
                {"id": "r3", "content_type": "finance", "created_at": "2025-03-01T00:00:00"}
            ]
        }))
        .unwrap();

        let grouped = detail.grouped_reports();
        let finance: Vec<_> = grouped["finance"].iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(finance, vec!["r3", "r1"]);
        assert_eq!(grouped["generic"].len(), 1);
        assert_eq!(detail.latest().and_then(|r| r.id.as_deref()), Some("r3"));
    }

    #[test]
    fn test_blank_content_type_falls_through_to_report_type() {
        let detail: AuthorDetail = serde_json::from_value(json!({
            "author": {"id": "a1"},
            "reports": [
                {"id": "r1", "content_type": "", "report_type": "finance"},
                {"id": "r2", "content_type": "", "report_type": ""}
            ]
        }))
        .unwrap();
        assert_eq!(detail.reports[0].type_key(), "finance");
        assert_eq!(detail.reports[1].type_key(), "generic");

        let grouped = detail.grouped_reports();
        assert_eq!(grouped["finance"].len(), 1);
        assert!(!grouped.contains_key(""));
    }

    #[test]
    fn test_backend_groups_are_resorted_newest_first() {
        let detail: AuthorDetail = serde_json::from_value(json!({
            "author": {"id": "a1"},
            "latest_report": {"id": "r9"},
            "reports_by_type": {
                "life": [
                    {"id": "old", "created_at": "2024-01-01"},
                    {"id": "new", "created_at": "2024-06-01"}
                ]
            }
        }))
        .unwrap();
        let grouped = detail.grouped_reports();
        assert_eq!(grouped["life"][0].id.as_deref(), Some("new"));
        assert_eq!(detail.latest().and_then(|r| r.id.as_deref()), Some("r9"));
    }

    #[test]
    fn test_item_detail_orders_segments_by_offset() {
        let detail: ItemDetail = serde_json::from_value(json!({
            "video": {"id": "v1", "title": "t"},
            "summary": null,
            "segments": [
                {"segment_index": 1, "start_time_ms": 5000, "end_time_ms": 9000, "text": "b"},
                {"segment_index": 0, "start_time_ms": 0, "end_time_ms": 5000, "text": "a"}
            ]
        }))
        .unwrap();
        let texts: Vec<&str> = detail.ordered_segments().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert!(detail.summary.is_none());
    }
}
