use crate::domain::ledger::SettledSubmission;
use crate::domain::money::Balance;
use crate::domain::ports::{LedgerStoreBox, OrderStoreBox};
use crate::domain::order::OrderId;
use crate::domain::submission::{Submission, SubmissionId};
use crate::domain::task::UserId;
use crate::error::{Error, Result};
use tracing::{debug, info};

/// Converts pending obligations into credited balances and reconciles paid
/// orders.
///
/// Every mutation here is a single atomic store transition; a retry of an
/// already-settled submission or an already-paid order never re-applies
/// effects.
pub struct SettlementEngine {
    ledger: LedgerStoreBox,
    orders: OrderStoreBox,
}

impl SettlementEngine {
    pub fn new(ledger: LedgerStoreBox, orders: OrderStoreBox) -> Self {
        Self { ledger, orders }
    }

    /// Approves a pending submission: marks it approved, credits the
    /// submitter's wallet with the task payout and resolves the funds record.
    pub async fn approve_submission(&self, id: SubmissionId) -> Result<SettledSubmission> {
        let settled = self
            .ledger
            .settle_submission(id)
            .await?
            .ok_or(Error::NotFound("submission"))?;
        info!(
            submission_id = id,
            user_id = settled.submission.user_id,
            amount = %settled.amount.value(),
            balance_after = %settled.balance.0,
            "submission settled"
        );
        Ok(settled)
    }

    /// Rejects a pending submission and voids its pending funds. Capacity is
    /// not restored: `task_count_remaining` only ever decreases.
    pub async fn reject_submission(&self, id: SubmissionId) -> Result<Submission> {
        let submission = self
            .ledger
            .reject_submission(id)
            .await?
            .ok_or(Error::NotFound("submission"))?;
        info!(
            submission_id = id,
            user_id = submission.user_id,
            "submission rejected"
        );
        Ok(submission)
    }

    /// Marks a verified order paid, clears the buyer's pending cart and
    /// adjusts stock/trending counters. A cancelled, missing or already-paid
    /// order makes this a no-op.
    pub async fn reconcile_paid_order(&self, order_id: OrderId, user_id: UserId) -> Result<()> {
        match self.orders.mark_order_paid(order_id, user_id).await? {
            Some(order) => {
                info!(order_id, user_id, items = order.items.len(), "order paid");
            }
            None => {
                debug!(order_id, user_id, "order absent or already paid, skipping");
            }
        }
        Ok(())
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Balance> {
        self.ledger.balance(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use crate::domain::order::{Order, OrderItem, OrderStatus, Product};
    use crate::domain::ports::{OrderStore, TaskStore};
    use crate::domain::submission::{Evidence, SubmissionStatus};
    use crate::domain::task::{Category, NewTask, Priority, TaskStatus};
    use crate::infrastructure::in_memory::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn engine(store: &MemoryStore) -> SettlementEngine {
        SettlementEngine::new(Box::new(store.clone()), Box::new(store.clone()))
    }

    async fn seed_submission(store: &MemoryStore) -> SubmissionId {
        let input = NewTask {
            title: "t".into(),
            description: "d".into(),
            status: TaskStatus::Pending,
            priority: Priority::Low,
            category: Category::SocialMedia,
            task_type: 1,
            task_amount: dec!(75),
            task_count_total: 3,
            location: None,
            gender: None,
            religion: None,
            no_of_participants: None,
            social_media_url: None,
            type_of_comment: None,
            payment_per_task: None,
            task_duration: None,
        };
        let task = store
            .create_task(input.into_task(1, Utc::now()).unwrap())
            .await
            .unwrap();
        let evidence = Evidence {
            screenshot_url: "/uploads/a.png".into(),
            social_url: None,
        };
        let (_, submission) = store.record_submission(task.id, 2, evidence).await.unwrap();
        submission.id
    }

    #[tokio::test]
    async fn test_approve_credits_wallet_once() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let submission_id = seed_submission(&store).await;

        let settled = engine.approve_submission(submission_id).await.unwrap();
        assert_eq!(settled.submission.status, SubmissionStatus::Approved);
        assert_eq!(settled.balance, Balance::new(dec!(75)));

        let err = engine.approve_submission(submission_id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(engine.balance(2).await.unwrap(), Balance::new(dec!(75)));
    }

    #[tokio::test]
    async fn test_reject_then_approve_is_refused() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let submission_id = seed_submission(&store).await;

        let rejected = engine.reject_submission(submission_id).await.unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);

        assert!(matches!(
            engine.approve_submission(submission_id).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(engine.balance(2).await.unwrap(), Balance::ZERO);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let now = Utc::now();

        let product = store
            .put_product(Product {
                id: 0,
                name: "widget".into(),
                stock: 10,
                view_count: 0,
            })
            .await
            .unwrap();
        let order = store
            .put_order(Order {
                id: 0,
                user_id: 9,
                status: OrderStatus::Pending,
                items: vec![OrderItem {
                    product_id: product.id,
                    quantity: 3,
                }],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        engine.reconcile_paid_order(order.id, 9).await.unwrap();
        engine.reconcile_paid_order(order.id, 9).await.unwrap();

        let product = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 7);
        assert_eq!(product.view_count, 3);
    }

    #[tokio::test]
    async fn test_reconcile_missing_order_is_noop() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        engine.reconcile_paid_order(404, 9).await.unwrap();
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        assert_eq!(engine.balance(1).await.unwrap(), Balance::ZERO);
    }
}
