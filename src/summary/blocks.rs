use serde::Serialize;

use crate::models::Summary;

/// One typed Markdown block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// `json_data.blocks` as an ordered block list.
///
/// Every array element becomes exactly one block so order and count survive:
/// objects contribute `type`/`text`, bare strings become paragraphs and any
/// other value is stringified. An empty array is treated as no match.
pub fn recognize(summary: &Summary) -> Option<super::SummaryBody> {
    let items = summary.json_data.as_ref()?.get("blocks")?.as_array()?;
    if items.is_empty() {
        return None;
    }
    Some(super::SummaryBody::Blocks(items.iter().map(to_block).collect()))
}

fn to_block(value: &serde_json::Value) -> Block {
    match value {
        serde_json::Value::Object(obj) => Block {
            kind: obj
                .get("type")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("paragraph")
                .to_string(),
            text: match obj.get("text") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
        },
        serde_json::Value::String(s) => Block {
            kind: "paragraph".to_string(),
            text: s.clone(),
        },
        other => Block {
            kind: "paragraph".to_string(),
            text: other.to_string(),
        },
    }
}
