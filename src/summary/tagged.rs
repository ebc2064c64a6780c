use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::models::Summary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedSection {
    pub tag: String,
    pub text: String,
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\[\]\s](?:[^\[\]\r\n]*[^\[\]\s])?)\]").expect("valid marker pattern")
    })
}

/// `content` split on `[TAG]` markers. No markers, no match.
pub fn recognize(summary: &Summary) -> Option<super::SummaryBody> {
    let sections = split_sections(summary.content.as_deref()?);
    if sections.is_empty() {
        return None;
    }
    Some(super::SummaryBody::Tagged(sections))
}

/// Split on `[TAG]` markers. A tag is non-blank with no surrounding
/// whitespace, so Markdown checkboxes (`[ ]`) never count. Each section's
/// text runs from the end of its marker to the start of the next marker (or
/// the end of the string). Text before the first marker is dropped.
pub fn split_sections(content: &str) -> Vec<TaggedSection> {
    let markers: Vec<(usize, usize, String)> = marker_re()
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            // `[text](url)` is a Markdown link, not a marker.
            if content[whole.end()..].starts_with('(') {
                return None;
            }
            let tag = cap.get(1)?.as_str().to_string();
            Some((whole.start(), whole.end(), tag))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (_, end, tag))| {
            let text_end = markers
                .get(i + 1)
                .map(|(start, _, _)| *start)
                .unwrap_or(content.len());
            TaggedSection {
                tag: tag.clone(),
                text: content[*end..text_end].to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(tag: &str, text: &str) -> TaggedSection {
        TaggedSection {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_two_markers() {
        assert_eq!(
            split_sections("[intro]hello[body]world"),
            vec![section("intro", "hello"), section("body", "world")]
        );
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        assert!(split_sections("just text").is_empty());
        assert!(split_sections("").is_empty());
    }

    #[test]
    fn test_preamble_dropped_and_adjacent_markers_give_empty_text() {
        assert_eq!(
            split_sections("preamble[a][b]tail\n"),
            vec![section("a", ""), section("b", "tail\n")]
        );
    }

    #[test]
    fn test_multibyte_text_slices_cleanly() {
        assert_eq!(
            split_sections("[核心观点]先活下来[建议]少折腾"),
            vec![section("核心观点", "先活下来"), section("建议", "少折腾")]
        );
    }

    #[test]
    fn test_markdown_checkboxes_and_links_are_not_markers() {
        assert!(split_sections("- [ ] buy milk\n- see [docs](http://x)").is_empty());
        assert!(split_sections("[ padded ] text").is_empty());
    }

    #[test]
    fn test_link_next_to_real_marker_stays_in_section_text() {
        assert_eq!(
            split_sections("[风险]see [docs](http://x)"),
            vec![section("风险", "see [docs](http://x)")]
        );
    }
}
