use crate::domain::money::Amount;
use crate::error::{Result, ValidationErrors};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type TaskId = u64;
pub type UserId = u64;

/// Review state of the task definition itself (not of submissions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SocialMedia,
    VideoMarketing,
    MicroInfluence,
    Promotion,
    Telegram,
}

/// A paid micro-job with a fixed payout and a capacity counter.
///
/// `task_count_remaining` only ever decreases, one slot per accepted
/// submission, and never drops below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: Category,
    pub task_type: u32,
    pub task_amount: Amount,
    pub task_count_total: u32,
    pub task_count_remaining: u32,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub religion: Option<String>,
    pub no_of_participants: Option<u32>,
    pub social_media_url: Option<String>,
    pub type_of_comment: Option<String>,
    pub payment_per_task: Option<Amount>,
    pub task_duration: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed creation input. Status is caller-supplied and stored as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: Category,
    pub task_type: u32,
    pub task_amount: Decimal,
    pub task_count_total: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub no_of_participants: Option<u32>,
    #[serde(default)]
    pub social_media_url: Option<String>,
    #[serde(default)]
    pub type_of_comment: Option<String>,
    #[serde(default)]
    pub payment_per_task: Option<Decimal>,
    #[serde(default)]
    pub task_duration: Option<String>,
}

impl NewTask {
    /// Validates the input and builds the task record. The id is assigned by
    /// the store; timestamps are taken from `now`.
    pub fn into_task(self, owner_id: UserId, now: DateTime<Utc>) -> Result<Task> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "must not be empty");
        }
        if self.description.trim().is_empty() {
            errors.push("description", "must not be empty");
        }
        if self.task_amount <= Decimal::ZERO {
            errors.push("task_amount", "must be positive");
        }
        if self.task_count_total == 0 {
            errors.push("task_count_total", "must be at least 1");
        }
        if let Some(payment) = self.payment_per_task
            && payment <= Decimal::ZERO
        {
            errors.push("payment_per_task", "must be positive");
        }
        errors.into_result()?;

        Ok(Task {
            id: 0,
            owner_id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            category: self.category,
            task_type: self.task_type,
            task_amount: Amount::new(self.task_amount)?,
            task_count_total: self.task_count_total,
            task_count_remaining: self.task_count_total,
            location: self.location,
            gender: self.gender,
            religion: self.religion,
            no_of_participants: self.no_of_participants,
            social_media_url: self.social_media_url,
            type_of_comment: self.type_of_comment,
            payment_per_task: self.payment_per_task.map(Amount::new).transpose()?,
            task_duration: self.task_duration,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. Absent fields are left untouched; no derived field is ever
/// recomputed or stored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub task_type: Option<u32>,
    pub task_duration: Option<String>,
    pub social_media_url: Option<String>,
    pub type_of_comment: Option<String>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            errors.push("title", "must not be empty");
        }
        if let Some(description) = &self.description
            && description.trim().is_empty()
        {
            errors.push("description", "must not be empty");
        }
        errors.into_result()
    }

    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(task_type) = self.task_type {
            task.task_type = task_type;
        }
        if let Some(duration) = self.task_duration {
            task.task_duration = Some(duration);
        }
        if let Some(url) = self.social_media_url {
            task.social_media_url = Some(url);
        }
        if let Some(comment) = self.type_of_comment {
            task.type_of_comment = Some(comment);
        }
        task.updated_at = now;
    }
}

const NEW_TASK_WINDOW_HOURS: i64 = 12;

/// Read-time projection: the stored task plus derived presentation fields.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub completion_percentage: Decimal,
    pub completed: &'static str,
    pub posted_status: &'static str,
}

impl TaskView {
    pub fn project(task: Task, now: DateTime<Utc>) -> Self {
        let total = task.task_count_total;
        let completion_percentage = if total > 0 {
            let done = total - task.task_count_remaining;
            (Decimal::from(done) / Decimal::from(total) * Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let completed = if task.task_count_remaining == 0 {
            "Completed"
        } else {
            "Available"
        };
        let posted_status = if now - task.created_at < Duration::hours(NEW_TASK_WINDOW_HOURS) {
            "new"
        } else {
            ""
        };
        Self {
            task,
            completion_percentage,
            completed,
            posted_status,
        }
    }
}
