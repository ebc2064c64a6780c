pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 500;

/// Filters for the LLM call log listing.
#[derive(Debug, Clone, Default)]
pub struct LlmCallFilters {
    pub task_type: Option<String>,
    pub content_type: Option<String>,
    pub profile_key: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
    /// Inclusive lower bound, ISO-8601 date or timestamp.
    pub since: Option<String>,
    /// Inclusive upper bound, ISO-8601 date or timestamp.
    pub until: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset,
        }
    }
}

impl LlmCallFilters {
    /// Query pairs for set filters plus pagination. Blank filters are skipped.
    pub fn query_pairs(&self, page: Page) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();

        let fields = [
            ("task_type", &self.task_type),
            ("content_type", &self.content_type),
            ("profile_key", &self.profile_key),
            ("status", &self.status),
            ("model", &self.model),
            ("since", &self.since),
            ("until", &self.until),
        ];
        for (name, value) in fields {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, v.to_string()));
            }
        }

        pairs.push(("limit", page.limit.to_string()));
        pairs.push(("offset", page.offset.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_set_filters_are_sent() {
        let filters = LlmCallFilters {
            task_type: Some("video_summary".into()),
            model: Some("  ".into()),
            since: Some("2025-01-01".into()),
            ..LlmCallFilters::default()
        };
        let pairs = filters.query_pairs(Page::new(20, 40));
        assert_eq!(
            pairs,
            vec![
                ("task_type", "video_summary".to_string()),
                ("since", "2025-01-01".to_string()),
                ("limit", "20".to_string()),
                ("offset", "40".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(Page::new(0, 0).limit, 1);
        assert_eq!(Page::new(10_000, 0).limit, MAX_PAGE_LIMIT);
    }
}
