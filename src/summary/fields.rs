use serde::Serialize;

use crate::models::Summary;

/// A labeled section built from one known structured field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub field: &'static str,
    pub label: &'static str,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionBody {
    Text(String),
    List(Vec<String>),
    Cases(Vec<CaseStudy>),
}

/// A case study is either free text or a fixed set of labeled parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseStudy {
    Description(String),
    Labeled(Vec<(&'static str, String)>),
}

#[derive(Clone, Copy)]
enum Shape {
    Text,
    List,
    Cases,
}

/// Known fields in render order.
const KNOWN_FIELDS: &[(&str, &str, Shape)] = &[
    ("one_liner", "One-liner", Shape::Text),
    ("key_points", "Key points", Shape::List),
    ("principles", "Principles", Shape::List),
    ("actionable_guidelines", "Actionable guidelines", Shape::List),
    ("cognitive_warnings", "Cognitive warnings", Shape::List),
    ("case_studies", "Case studies", Shape::Cases),
];

/// Labeled sub-fields of a structured case study.
const CASE_PARTS: &[(&str, &str)] = &[
    ("title", "Case"),
    ("context", "Context"),
    ("action", "Action"),
    ("result", "Result"),
    ("lesson", "Lesson"),
];

/// Known fields from `json_data.normalized`, then `json_data`, then
/// `json_data.raw`. The first candidate object with at least one usable field
/// wins; absent or malformed fields are left out.
pub fn recognize(summary: &Summary) -> Option<super::SummaryBody> {
    let data = summary.json_data.as_ref()?;
    let candidates = [data.get("normalized"), Some(data), data.get("raw")];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_object())
        .map(sections_from)
        .find(|sections| !sections.is_empty())
        .map(super::SummaryBody::Sections)
}

fn sections_from(obj: &serde_json::Map<String, serde_json::Value>) -> Vec<Section> {
    let mut sections = Vec::new();
    for (field, label, shape) in KNOWN_FIELDS {
        let Some(value) = obj.get(*field) else {
            continue;
        };
        let body = match shape {
            Shape::Text => text(value).map(SectionBody::Text),
            Shape::List => Some(string_list(value))
                .filter(|l| !l.is_empty())
                .map(SectionBody::List),
            Shape::Cases => Some(case_list(value))
                .filter(|l| !l.is_empty())
                .map(SectionBody::Cases),
        };
        if let Some(body) = body {
            sections.push(Section {
                field: *field,
                label: *label,
                body,
            });
        }
    }
    sections
}

fn text(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Strings from an array; a lone string counts as a one-item list.
fn string_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    }
}

fn case_list(value: &serde_json::Value) -> Vec<CaseStudy> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items.iter().filter_map(case_study).collect()
}

fn case_study(value: &serde_json::Value) -> Option<CaseStudy> {
    if let Some(s) = text(value) {
        return Some(CaseStudy::Description(s));
    }
    let obj = value.as_object()?;
    if let Some(desc) = obj.get("description").and_then(text) {
        return Some(CaseStudy::Description(desc));
    }
    let parts: Vec<(&'static str, String)> = CASE_PARTS
        .iter()
        .filter_map(|(key, label)| obj.get(*key).and_then(text).map(|t| (*label, t)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(CaseStudy::Labeled(parts))
    }
}
