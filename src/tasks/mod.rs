use std::cell::RefCell;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::error::TaskError;
use crate::gateway::{Gateway, TaskRequest};
use crate::models::{AuthorDetail, ItemDetail, TaskAck};

/// A UI surface that can trigger backend work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Surface {
    AuthorReport,
    AuthorResummarize,
    AuthorReprocess,
    AuthorType,
    ItemResummarize,
    ItemReprocess,
    ItemType,
    Ingest,
}

impl Surface {
    pub fn label(&self) -> &'static str {
        match self {
            Surface::AuthorReport => "report regeneration",
            Surface::AuthorResummarize => "author resummarize",
            Surface::AuthorReprocess => "author transcript reprocess",
            Surface::AuthorType => "author type update",
            Surface::ItemResummarize => "video resummarize",
            Surface::ItemReprocess => "video transcript reprocess",
            Surface::ItemType => "video type update",
            Surface::Ingest => "ingest",
        }
    }

    pub fn for_task(task: &TaskRequest) -> Self {
        match task {
            TaskRequest::RegenerateReport { .. } => Surface::AuthorReport,
            TaskRequest::ResummarizeAll { .. } | TaskRequest::ResummarizePending { .. } => {
                Surface::AuthorResummarize
            }
            TaskRequest::ReprocessAuthor { .. } => Surface::AuthorReprocess,
            TaskRequest::ResummarizeItem { .. } => Surface::ItemResummarize,
            TaskRequest::ReprocessItem { .. } => Surface::ItemReprocess,
            TaskRequest::Ingest { .. } => Surface::Ingest,
        }
    }
}

/// Clears its surface's busy flag when dropped, whatever the outcome.
struct BusyGuard<'a> {
    busy: &'a RefCell<BTreeSet<Surface>>,
    surface: Surface,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.borrow_mut().remove(&self.surface);
    }
}

/// Issues backend task requests for one view and tracks per-surface busy flags.
///
/// A successful trigger only means the job was enqueued, and a surface is busy
/// only while that enqueue request is outstanding. Job triggers never refetch;
/// the two classification updates refetch their entity once.
///
/// Single-threaded by construction: flags live in a `RefCell`, and no borrow
/// is held across an await.
pub struct TaskCoordinator<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    busy: RefCell<BTreeSet<Surface>>,
}

impl<'g, G: Gateway + ?Sized> TaskCoordinator<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            busy: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn is_busy(&self, surface: Surface) -> bool {
        self.busy.borrow().contains(&surface)
    }

    fn acquire(&self, surface: Surface) -> Result<BusyGuard<'_>, TaskError> {
        if !self.busy.borrow_mut().insert(surface) {
            return Err(TaskError::Busy(surface));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            surface,
        })
    }

    /// Enqueue one job. No retry, no re-fetch.
    pub async fn trigger(&self, task: TaskRequest) -> Result<TaskAck, TaskError> {
        let _guard = self.acquire(Surface::for_task(&task))?;
        match self.gateway.trigger(&task).await {
            Ok(ack) => {
                info!(task = %task.describe(), "Trigger acknowledged");
                Ok(ack)
            }
            Err(e) => {
                warn!(task = %task.describe(), error = %e, "Trigger failed");
                Err(e.into())
            }
        }
    }

    pub async fn regenerate_report(&self, author_id: &str) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::RegenerateReport {
            author_id: author_id.to_string(),
        })
        .await
    }

    pub async fn resummarize_item(
        &self,
        item_id: &str,
        include_fallback: bool,
    ) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::ResummarizeItem {
            item_id: item_id.to_string(),
            include_fallback,
        })
        .await
    }

    pub async fn resummarize_all(
        &self,
        author_id: &str,
        include_fallback: bool,
    ) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::ResummarizeAll {
            author_id: author_id.to_string(),
            include_fallback,
        })
        .await
    }

    pub async fn resummarize_pending(&self, author_id: &str) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::ResummarizePending {
            author_id: author_id.to_string(),
        })
        .await
    }

    pub async fn reprocess_item(&self, item_id: &str) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::ReprocessItem {
            item_id: item_id.to_string(),
        })
        .await
    }

    pub async fn reprocess_author(&self, author_id: &str) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::ReprocessAuthor {
            author_id: author_id.to_string(),
        })
        .await
    }

    pub async fn ingest(&self, target: &str, limit: u32) -> Result<TaskAck, TaskError> {
        self.trigger(TaskRequest::Ingest {
            target: target.to_string(),
            limit,
        })
        .await
    }

    /// Set or clear the author tag, then re-fetch the author once.
    pub async fn set_author_type(
        &self,
        author_id: &str,
        author_type: Option<&str>,
    ) -> Result<AuthorDetail, TaskError> {
        let _guard = self.acquire(Surface::AuthorType)?;
        self.gateway
            .set_author_type(author_id, author_type)
            .await
            .inspect_err(|e| warn!(author_id, error = %e, "Author type update failed"))?;
        let detail = self.gateway.get_author(author_id).await?;
        Ok(detail)
    }

    /// Set or clear the item tag, then re-fetch the item once.
    pub async fn set_content_type(
        &self,
        item_id: &str,
        content_type: Option<&str>,
    ) -> Result<ItemDetail, TaskError> {
        let _guard = self.acquire(Surface::ItemType)?;
        self.gateway
            .set_item_type(item_id, content_type)
            .await
            .inspect_err(|e| warn!(item_id, error = %e, "Video type update failed"))?;
        let detail = self.gateway.get_item(item_id).await?;
        Ok(detail)
    }
}
