//! Response payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wbgen_core::types::id::{JobId, NotificationId, TaskId};
use wbgen_core::types::pagination::PageResponse;
use wbgen_entity::job::{GenerationKind, Job, JobStatus};
use wbgen_entity::notification::{Notification, Severity};
use wbgen_entity::task::{Task, TaskStatus};

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true` for this envelope.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload in the success envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A job as presented to its owner.
#[derive(Debug, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub kind: GenerationKind,
    pub product_name: String,
    pub category: String,
    pub status: JobStatus,
    pub total_count: i32,
    pub completed_count: i32,
    pub total_cost: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            kind: job.kind,
            product_name: job.product_name,
            category: job.category,
            status: job.status,
            total_count: job.total_count,
            completed_count: job.completed_count,
            total_cost: job.total_cost,
            error_message: job.error_message,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// A task within a job status response. Internal blob paths stay private;
/// only the public asset URL is exposed.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub card_index: i32,
    pub status: TaskStatus,
    pub retry_count: i32,
    pub asset_url: Option<String>,
    pub error: Option<String>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            card_index: task.card_index,
            status: task.status,
            retry_count: task.retry_count,
            asset_url: task.asset_url,
            error: task.last_error,
        }
    }
}

/// A job together with its tasks, for status polling.
#[derive(Debug, Serialize)]
pub struct JobDetailsView {
    #[serde(flatten)]
    pub job: JobView,
    pub tasks: Vec<TaskView>,
}

/// A notification as presented to its owner.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            severity: n.severity,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Token balance payload.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// Unread-count payload.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Payment webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct PaymentAckResponse {
    /// Whether this delivery credited tokens. `false` for replays and
    /// non-succeeded statuses.
    pub credited: bool,
}

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Maps a page of entities to a page of views.
pub fn map_page<T, V: From<T>>(page: PageResponse<T>) -> PageResponse<V> {
    PageResponse::new(
        page.items.into_iter().map(V::from).collect(),
        page.page,
        page.page_size,
        page.total_items,
    )
}
