use crate::domain::ports::{MediaStoreBox, TaskStoreBox};
use crate::domain::submission::{Evidence, ScreenshotUpload, Submission, SubmissionStatus};
use crate::domain::task::{NewTask, Task, TaskId, TaskPatch, TaskView, UserId};
use crate::error::{Error, Result};
use chrono::Utc;
use tracing::info;

/// Orchestrates the task lifecycle: creation, updates, reads with derived
/// fields, submissions and task approval.
///
/// Validation happens before any store call; the multi-step submit mutation is
/// delegated to the store as one atomic unit.
pub struct TaskLifecycle {
    tasks: TaskStoreBox,
    media: MediaStoreBox,
}

impl TaskLifecycle {
    pub fn new(tasks: TaskStoreBox, media: MediaStoreBox) -> Self {
        Self { tasks, media }
    }

    pub async fn create(&self, owner_id: UserId, input: NewTask) -> Result<Task> {
        let task = input.into_task(owner_id, Utc::now())?;
        let task = self.tasks.create_task(task).await?;
        info!(task_id = task.id, owner_id, "task created");
        Ok(task)
    }

    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        self.tasks
            .update_task(id, patch)
            .await?
            .ok_or(Error::NotFound("task"))
    }

    /// All tasks with read-time derived fields. Reports `NotFound` when no
    /// tasks exist, which the HTTP layer surfaces as an empty-list 404.
    pub async fn list(&self) -> Result<Vec<TaskView>> {
        let tasks = self.tasks.all_tasks().await?;
        if tasks.is_empty() {
            return Err(Error::NotFound("tasks"));
        }
        let now = Utc::now();
        Ok(tasks
            .into_iter()
            .map(|task| TaskView::project(task, now))
            .collect())
    }

    pub async fn get(&self, id: TaskId) -> Result<TaskView> {
        let task = self
            .tasks
            .task(id)
            .await?
            .ok_or(Error::NotFound("task"))?;
        Ok(TaskView::project(task, Utc::now()))
    }

    /// Claims one slot of the task for the caller.
    ///
    /// The screenshot is validated and stored first; the store then applies
    /// the submit step (duplicate/capacity checks, submission insert, counter
    /// decrement, funds record) atomically.
    pub async fn submit(
        &self,
        user_id: UserId,
        task_id: TaskId,
        screenshot: ScreenshotUpload,
        social_url: Option<String>,
    ) -> Result<Task> {
        screenshot.validate()?;
        let screenshot_url = self
            .media
            .store_image(&screenshot.filename, &screenshot.bytes)
            .await?;
        let evidence = Evidence {
            screenshot_url,
            social_url,
        };
        let (task, submission) = self
            .tasks
            .record_submission(task_id, user_id, evidence)
            .await?;
        info!(
            task_id,
            user_id,
            submission_id = submission.id,
            remaining = task.task_count_remaining,
            "task submitted"
        );
        Ok(task)
    }

    /// Approves the task definition itself (`Pending -> Approved`).
    pub async fn approve(&self, id: TaskId) -> Result<Task> {
        self.tasks
            .approve_task(id)
            .await?
            .ok_or(Error::NotFound("task"))
    }

    pub async fn pending_count(&self) -> Result<u64> {
        self.tasks.count_submissions(SubmissionStatus::Pending).await
    }

    pub async fn completed_count(&self) -> Result<u64> {
        self.tasks
            .count_submissions(SubmissionStatus::Approved)
            .await
    }

    pub async fn rejected_count(&self) -> Result<u64> {
        self.tasks
            .count_submissions(SubmissionStatus::Rejected)
            .await
    }

    pub async fn history(&self) -> Result<Vec<Submission>> {
        self.tasks.submissions().await
    }

    pub async fn delete(&self, id: TaskId) -> Result<Task> {
        let task = self
            .tasks
            .delete_task(id)
            .await?
            .ok_or(Error::NotFound("task"))?;
        info!(task_id = id, "task deleted");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MediaStore;
    use crate::domain::task::{Category, Priority, TaskStatus};
    use crate::infrastructure::in_memory::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct StubMedia;

    #[async_trait]
    impl MediaStore for StubMedia {
        async fn store_image(&self, filename: &str, _bytes: &[u8]) -> Result<String> {
            Ok(format!("/uploads/{filename}"))
        }
    }

    fn lifecycle() -> TaskLifecycle {
        TaskLifecycle::new(Box::new(MemoryStore::new()), Box::new(StubMedia))
    }

    fn new_task(total: u32) -> NewTask {
        NewTask {
            title: "Follow our page".into(),
            description: "Follow and screenshot".into(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            category: Category::SocialMedia,
            task_type: 1,
            task_amount: dec!(50),
            task_count_total: total,
            location: None,
            gender: None,
            religion: None,
            no_of_participants: None,
            social_media_url: None,
            type_of_comment: None,
            payment_per_task: None,
            task_duration: None,
        }
    }

    fn screenshot() -> ScreenshotUpload {
        ScreenshotUpload {
            filename: "proof.png".into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_before_store() {
        let service = lifecycle();
        let mut input = new_task(5);
        input.title = "".into();
        assert!(matches!(
            service.create(1, input).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(service.list().await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_consumes_one_slot() {
        let service = lifecycle();
        let task = service.create(1, new_task(5)).await.unwrap();

        let task = service
            .submit(2, task.id, screenshot(), Some("https://x.com/p".into()))
            .await
            .unwrap();
        assert_eq!(task.task_count_remaining, 4);

        let history = service.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].evidence.screenshot_url, "/uploads/proof.png");
        assert_eq!(service.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_submit_twice_conflicts() {
        let service = lifecycle();
        let task = service.create(1, new_task(5)).await.unwrap();
        service.submit(2, task.id, screenshot(), None).await.unwrap();

        let err = service
            .submit(2, task.id, screenshot(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadySubmitted));
        assert_eq!(
            service.get(task.id).await.unwrap().task.task_count_remaining,
            4
        );
    }

    #[tokio::test]
    async fn test_submit_exhausted_task_conflicts() {
        let service = lifecycle();
        let task = service.create(1, new_task(1)).await.unwrap();
        service.submit(2, task.id, screenshot(), None).await.unwrap();

        let err = service
            .submit(3, task.id, screenshot(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TaskExhausted));
    }

    #[tokio::test]
    async fn test_submit_invalid_screenshot_never_stores() {
        let service = lifecycle();
        let task = service.create(1, new_task(5)).await.unwrap();

        let upload = ScreenshotUpload {
            filename: "proof.pdf".into(),
            bytes: vec![1],
        };
        assert!(matches!(
            service.submit(2, task.id, upload, None).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(
            service.get(task.id).await.unwrap().task.task_count_remaining,
            5
        );
    }

    #[tokio::test]
    async fn test_approve_requires_pending_status() {
        let service = lifecycle();
        let task = service.create(1, new_task(5)).await.unwrap();

        let approved = service.approve(task.id).await.unwrap();
        assert_eq!(approved.status, TaskStatus::Approved);

        // Not pending anymore: reported as not found.
        assert!(matches!(
            service.approve(task.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_task() {
        let service = lifecycle();
        assert!(matches!(
            service.update(99, TaskPatch::default()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(service.delete(99).await, Err(Error::NotFound(_))));
    }
}
