pub mod blocks;
pub mod fields;
pub mod tagged;

use serde::Serialize;

use crate::models::{ShortSummary, Summary};

pub use blocks::Block;
pub use fields::{CaseStudy, Section, SectionBody};
pub use tagged::TaggedSection;

/// Renderable body of a summary, one variant per recognised payload shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SummaryBody {
    /// `json_data.blocks`: typed Markdown blocks in order.
    Blocks(Vec<Block>),
    /// `[TAG]` markers inside `content`.
    Tagged(Vec<TaggedSection>),
    /// Known structured fields, each present one as a labeled section.
    Sections(Vec<Section>),
    /// Pre-rendered report Markdown (`json_data.report_markdown`).
    Markdown(String),
    /// Unstructured `content`, shown preformatted.
    Raw(String),
    /// Only the compact `short_json` summary exists.
    Short(ShortSummary),
    /// Nothing usable.
    Empty,
}

impl SummaryBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, SummaryBody::Empty)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SummaryBody::Blocks(_) => "blocks",
            SummaryBody::Tagged(_) => "tagged",
            SummaryBody::Sections(_) => "sections",
            SummaryBody::Markdown(_) => "markdown",
            SummaryBody::Raw(_) => "raw",
            SummaryBody::Short(_) => "short",
            SummaryBody::Empty => "empty",
        }
    }
}

/// Canonical summary model handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSummary {
    pub body: SummaryBody,
    pub short: Option<ShortSummary>,
    pub category: Option<String>,
}

impl CanonicalSummary {
    pub fn empty() -> Self {
        Self {
            body: SummaryBody::Empty,
            short: None,
            category: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.body.is_empty()
    }
}

type Recognizer = fn(&Summary) -> Option<SummaryBody>;

/// Recognizers in priority order, one per generation of stored payload. A
/// malformed or partial payload yields `None` and the next one is tried.
const RECOGNIZERS: &[(&str, Recognizer)] = &[
    ("blocks", blocks::recognize),
    ("tagged", tagged::recognize),
    ("fields", fields::recognize),
    ("markdown", recognize_markdown),
    ("raw", recognize_raw),
    ("short", recognize_short),
];

/// Normalize a stored summary (or nothing) into the canonical model. The
/// first recognizer that produces a body wins. Never fails.
pub fn normalize(summary: Option<&Summary>) -> CanonicalSummary {
    let Some(summary) = summary else {
        return CanonicalSummary::empty();
    };

    let body = RECOGNIZERS
        .iter()
        .find_map(|(name, recognize)| {
            let body = recognize(summary)?;
            tracing::debug!(recognizer = name, "Summary payload recognized");
            Some(body)
        })
        .unwrap_or(SummaryBody::Empty);

    CanonicalSummary {
        body,
        short: short_summary(summary),
        category: summary
            .video_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

fn recognize_markdown(summary: &Summary) -> Option<SummaryBody> {
    let md = summary.json_data.as_ref()?.get("report_markdown")?.as_str()?;
    if md.trim().is_empty() {
        return None;
    }
    Some(SummaryBody::Markdown(md.to_string()))
}

fn recognize_raw(summary: &Summary) -> Option<SummaryBody> {
    let content = summary.content.as_deref()?;
    if content.trim().is_empty() {
        return None;
    }
    Some(SummaryBody::Raw(content.to_string()))
}

fn recognize_short(summary: &Summary) -> Option<SummaryBody> {
    short_summary(summary).map(SummaryBody::Short)
}

/// Decode `short_json`, which is stored either as an object or as a JSON string.
fn short_summary(summary: &Summary) -> Option<ShortSummary> {
    let value = summary.short_json.as_ref()?;
    let decoded = match value {
        serde_json::Value::String(s) => serde_json::from_str::<serde_json::Value>(s).ok()?,
        other => other.clone(),
    };
    let obj = decoded.as_object()?;

    let text = obj
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let keywords: Vec<String> = obj
        .get("keywords")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|k| k.as_str())
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if text.is_none() && keywords.is_empty() {
        return None;
    }
    Some(ShortSummary {
        summary: text,
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(value: serde_json::Value) -> Summary {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_no_record_is_unavailable() {
        let canonical = normalize(None);
        assert!(!canonical.is_available());
    }

    #[test]
    fn test_empty_record_reports_no_summary() {
        let canonical = normalize(Some(&Summary::default()));
        assert_eq!(canonical.body, SummaryBody::Empty);
        assert!(canonical.short.is_none());
    }

    #[test]
    fn test_blocks_win_over_tagged_content() {
        let s = summary(json!({
            "content": "[intro]hello",
            "json_data": {"blocks": [{"type": "heading", "text": "Title"}]}
        }));
        assert_eq!(normalize(Some(&s)).body.kind(), "blocks");
    }

    #[test]
    fn test_tagged_content_wins_over_fields() {
        let s = summary(json!({
            "content": "[intro]hello[body]world",
            "json_data": {"one_liner": "x"}
        }));
        match normalize(Some(&s)).body {
            SummaryBody::Tagged(sections) => assert_eq!(sections.len(), 2),
            other => panic!("expected tagged, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_blocks_degrade_to_fields() {
        let s = summary(json!({
            "json_data": {"blocks": "not a list", "normalized": {"key_points": ["a", "b"]}}
        }));
        assert_eq!(normalize(Some(&s)).body.kind(), "sections");
    }

    #[test]
    fn test_raw_content_without_markers() {
        let s = summary(json!({"content": "plain prose", "json_data": {"unrelated": 1}}));
        assert_eq!(normalize(Some(&s)).body, SummaryBody::Raw("plain prose".to_string()));
    }

    #[test]
    fn test_markdown_checklist_and_links_stay_raw() {
        let content = "# Weekly plan\n\nImportant intro paragraph.\n\n- [ ] buy milk\n- see [docs](http://x)";
        let s = summary(json!({"content": content}));
        assert_eq!(normalize(Some(&s)).body, SummaryBody::Raw(content.to_string()));
    }

    #[test]
    fn test_report_markdown_beats_raw_dump() {
        let s = summary(json!({
            "content": "{\"raw\": true}",
            "json_data": {"report_markdown": "# Guide\n\nbody"}
        }));
        assert_eq!(normalize(Some(&s)).body.kind(), "markdown");
    }

    #[test]
    fn test_short_json_string_is_decoded_and_used_last() {
        let s = summary(json!({
            "short_json": "{\"summary\": \"gist\", \"keywords\": [\"k1\", \" \"]}",
            "video_category": " finance "
        }));
        let canonical = normalize(Some(&s));
        let short = ShortSummary {
            summary: Some("gist".to_string()),
            keywords: vec!["k1".to_string()],
        };
        assert_eq!(canonical.body, SummaryBody::Short(short.clone()));
        assert_eq!(canonical.short, Some(short));
        assert_eq!(canonical.category.as_deref(), Some("finance"));
    }

    #[test]
    fn test_short_json_rides_along_with_main_body() {
        let s = summary(json!({
            "content": "text",
            "short_json": {"summary": "gist", "keywords": []}
        }));
        let canonical = normalize(Some(&s));
        assert_eq!(canonical.body.kind(), "raw");
        assert!(canonical.short.is_some());
    }

    #[test]
    fn test_garbage_json_data_never_panics() {
        for data in [json!(null), json!(42), json!("str"), json!([1, 2]), json!({"normalized": 7})] {
            let s = Summary {
                json_data: Some(data),
                ..Summary::default()
            };
            assert_eq!(normalize(Some(&s)).body, SummaryBody::Empty);
        }
    }
}
