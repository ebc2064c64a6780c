use serde::Serialize;
use std::cell::RefCell;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{AuthorDetail, AuthorReport, ContentItem, ItemDetail, Segment};
use crate::playback::{PlaybackLink, PlaybackLinkCache};
use crate::status::{ItemStatus, StatusCounts};
use crate::summary::{self, CanonicalSummary};

/// Format a millisecond offset as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_offset(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// `[MM:SS] text`
pub fn transcript_line(segment: &Segment) -> String {
    format!("[{}] {}", format_offset(segment.start_time_ms), segment.text)
}

/// Tracks which entity a view is showing so late responses can be dropped.
///
/// Each `begin` hands out a ticket; a response is applied only if its ticket
/// is still the latest one issued.
#[derive(Debug, Default)]
pub struct ViewSlot {
    entity_id: Option<String>,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    entity_id: String,
    generation: u64,
}

impl ViewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, entity_id: &str) -> Ticket {
        self.generation += 1;
        self.entity_id = Some(entity_id.to_string());
        Ticket {
            entity_id: entity_id.to_string(),
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation == ticket.generation && self.entity_id.as_deref() == Some(ticket.entity_id.as_str())
    }

    /// `Some(value)` if the ticket is still current, else the value is dropped.
    pub fn accept<T>(&self, ticket: &Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(entity_id = %ticket.entity_id, "Discarding stale response");
            None
        }
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.entity_id = None;
    }
}

/// Outcome of one part of a page: loaded, or the error that part hit.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<T> {
    Loaded(T),
    Failed { error: String },
}

impl<T> Part<T> {
    fn from_result(result: Result<T, GatewayError>, what: &str) -> Self {
        match result {
            Ok(v) => Part::Loaded(v),
            Err(e) => {
                warn!(part = what, error = %e, "Page part failed to load");
                Part::Failed {
                    error: e.user_message(),
                }
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Part::Loaded(v) => Some(v),
            Part::Failed { .. } => None,
        }
    }
}

/// A report with its normalized rendering.
#[derive(Debug, Serialize)]
pub struct RenderedReport {
    pub report: AuthorReport,
    pub rendered: CanonicalSummary,
}

impl RenderedReport {
    fn new(report: &AuthorReport) -> Self {
        Self {
            rendered: summary::normalize(Some(&report.as_summary())),
            report: report.clone(),
        }
    }
}

/// Author screen: profile, reports and catalog, each loaded independently.
#[derive(Debug, Serialize)]
pub struct AuthorPage {
    pub author_id: String,
    pub detail: Part<AuthorDetail>,
    pub latest_report: Option<RenderedReport>,
    pub reports_by_type: Vec<(String, Vec<RenderedReport>)>,
    pub items: Part<Vec<ContentItem>>,
    /// Rollup over the fetched items, or the embedded one if items failed.
    pub status: Option<StatusCounts>,
}

impl AuthorPage {
    /// Fetch detail and item list concurrently. One failing does not hide the other.
    pub async fn load<G: Gateway + ?Sized>(gateway: &G, author_id: &str) -> Self {
        let (detail, items) = tokio::join!(
            gateway.get_author(author_id),
            gateway.list_author_items(author_id)
        );
        Self::assemble(author_id, detail, items)
    }

    pub fn assemble(
        author_id: &str,
        detail: Result<AuthorDetail, GatewayError>,
        items: Result<Vec<ContentItem>, GatewayError>,
    ) -> Self {
        let detail = Part::from_result(detail, "author");
        let items = Part::from_result(items, "items");

        let status = match (&items, &detail) {
            (Part::Loaded(items), _) => Some(StatusCounts::rollup(items)),
            (_, Part::Loaded(d)) => d.status.clone().or_else(|| d.author.status.clone()),
            _ => None,
        };

        let (latest_report, reports_by_type) = match detail.loaded() {
            Some(d) => (
                d.latest().map(RenderedReport::new),
                d.grouped_reports()
                    .into_iter()
                    .map(|(kind, reports)| (kind, reports.iter().map(RenderedReport::new).collect()))
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        Self {
            author_id: author_id.to_string(),
            detail,
            latest_report,
            reports_by_type,
            items,
            status,
        }
    }
}

/// Item screen: status tags, normalized summary, transcript and playback.
#[derive(Debug, Serialize)]
pub struct ItemPage {
    pub item: ContentItem,
    pub status: ItemStatus,
    pub summary: CanonicalSummary,
    pub transcript: Vec<String>,
    /// Absent when the backend has no media or the link request failed.
    pub playback: Option<PlaybackLink>,
}

impl ItemPage {
    pub fn from_detail(detail: ItemDetail, playback: Option<PlaybackLink>) -> Self {
        let transcript = detail
            .ordered_segments()
            .into_iter()
            .map(transcript_line)
            .collect();
        Self {
            status: ItemStatus::of(&detail.item),
            summary: summary::normalize(detail.summary.as_ref()),
            transcript,
            playback,
            item: detail.item,
        }
    }
}

/// Item view with stale-response protection and its playback cache.
///
/// `open` takes `&self` so a newer navigation can start while an older one is
/// still waiting; the older one then resolves to `Ok(None)`.
#[derive(Debug, Default)]
pub struct ItemView {
    slot: RefCell<ViewSlot>,
    playback: RefCell<PlaybackLinkCache>,
}

impl ItemView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `item_id`. Returns `Ok(None)` if another item was opened meanwhile.
    pub async fn open<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        item_id: &str,
    ) -> Result<Option<ItemPage>, GatewayError> {
        let ticket = {
            let mut slot = self.slot.borrow_mut();
            if slot.entity_id.as_deref() != Some(item_id) {
                self.playback.borrow_mut().teardown();
            }
            slot.begin(item_id)
        };

        let detail = gateway.get_item(item_id).await;
        let Some(detail) = self.slot.borrow().accept(&ticket, detail) else {
            return Ok(None);
        };
        let detail = detail?;

        let link = gateway.get_playback_link(item_id).await;
        let Some(link) = self.slot.borrow().accept(&ticket, link) else {
            return Ok(None);
        };
        let playback = self.playback.borrow_mut().store(item_id, link).cloned();

        Ok(Some(ItemPage::from_detail(detail, playback)))
    }

    /// Link held for `item_id`, if still valid.
    pub fn playback(&self, item_id: &str) -> Option<PlaybackLink> {
        self.playback
            .borrow()
            .current(item_id, chrono::Utc::now())
            .cloned()
    }

    pub fn close(&self) {
        self.slot.borrow_mut().clear();
        self.playback.borrow_mut().teardown();
    }
}
