use crate::domain::deposit::{Deposit, DepositCapture};
use crate::domain::gateway::{InitializeRequest, InitializedPayment, VerifiedPayment};
use crate::domain::ledger::{FundsRecord, SettledSubmission, Wallet};
use crate::domain::money::{Amount, Balance};
use crate::domain::order::{CartEntry, Order, OrderId, Product, ProductId};
use crate::domain::submission::{Evidence, Submission, SubmissionId, SubmissionStatus};
use crate::domain::task::{Task, TaskId, TaskPatch, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Tasks and their submissions.
///
/// Compound mutations (`record_submission`, `approve_task`) run their status
/// checks and writes as one atomic unit against the backing store; two
/// concurrent callers can never both pass a check.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts the task, assigning its id.
    async fn create_task(&self, task: Task) -> Result<Task>;
    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>>;
    async fn task(&self, id: TaskId) -> Result<Option<Task>>;
    async fn all_tasks(&self) -> Result<Vec<Task>>;
    async fn delete_task(&self, id: TaskId) -> Result<Option<Task>>;
    /// `Pending -> Approved`; `None` when the task is absent or not pending.
    async fn approve_task(&self, id: TaskId) -> Result<Option<Task>>;
    /// Atomic submit step: rejects a duplicate (user, task) submission or an
    /// exhausted task, then inserts the pending submission, decrements
    /// `task_count_remaining` and opens the pending funds record — all or
    /// nothing. Returns the updated task and the created submission.
    async fn record_submission(
        &self,
        task_id: TaskId,
        user_id: UserId,
        evidence: Evidence,
    ) -> Result<(Task, Submission)>;
    async fn submission(&self, id: SubmissionId) -> Result<Option<Submission>>;
    async fn submissions(&self) -> Result<Vec<Submission>>;
    async fn count_submissions(&self, status: SubmissionStatus) -> Result<u64>;
}

/// Wallets and funds records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn balance(&self, user_id: UserId) -> Result<Balance>;
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>>;
    async fn funds_record(&self, submission_id: SubmissionId) -> Result<Option<FundsRecord>>;
    /// Atomic settlement: submission `Pending -> Approved`, submitter wallet
    /// found-or-created and credited with the task payout, funds record
    /// resolved. `None` when the submission is absent or no longer pending.
    async fn settle_submission(&self, id: SubmissionId) -> Result<Option<SettledSubmission>>;
    /// Atomic rejection: submission `Pending -> Rejected`, funds record
    /// voided. `None` when the submission is absent or no longer pending.
    async fn reject_submission(&self, id: SubmissionId) -> Result<Option<Submission>>;
}

/// Orders, products and carts, touched only by payment reconciliation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn cart_entries(&self, user_id: UserId) -> Result<Vec<CartEntry>>;
    async fn put_order(&self, order: Order) -> Result<Order>;
    async fn put_product(&self, product: Product) -> Result<Product>;
    async fn put_cart_entry(&self, entry: CartEntry) -> Result<CartEntry>;
    /// Atomic reconciliation keyed by the order: order `Pending -> Paid`, the
    /// user's pending cart entries cleared, stock decremented (saturating at
    /// zero) and trending counters bumped per item. `None` (no mutation) when
    /// the order is absent or already paid.
    async fn mark_order_paid(&self, order_id: OrderId, user_id: UserId) -> Result<Option<Order>>;
}

/// Deposit rows for the gateway initialize/verify lifecycle.
#[async_trait]
pub trait DepositStore: Send + Sync {
    /// Inserts the deposit, assigning its id. The reference must be unique.
    async fn create_deposit(&self, deposit: Deposit) -> Result<Deposit>;
    async fn deposit_by_reference(&self, reference: &str) -> Result<Option<Deposit>>;
    /// Atomic successful transition: captures the gateway-reported fields and,
    /// when `credit_wallet` is set, credits the depositor's wallet — one unit.
    /// Fails with `AlreadyProcessed` when the reference already verified.
    async fn mark_successful(
        &self,
        reference: &str,
        capture: DepositCapture,
        credit_wallet: bool,
    ) -> Result<Deposit>;
    /// Compensating write: `Pending -> Failed`. A deposit that already
    /// verified successfully is left untouched.
    async fn mark_failed(&self, reference: &str) -> Result<()>;
}

/// The external payment provider (initialize / verify HTTP contract).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: InitializeRequest) -> Result<InitializedPayment>;
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment>;
}

/// External file storage: takes image bytes, returns a durable URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store_image(&self, filename: &str, bytes: &[u8]) -> Result<String>;
}

/// Fire-and-forget notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn wallet_funded(&self, user_id: UserId, amount: Amount, reference: &str) -> Result<()>;
}

pub type TaskStoreBox = Box<dyn TaskStore>;
pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type DepositStoreBox = Box<dyn DepositStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type MediaStoreBox = Box<dyn MediaStore>;
pub type NotifierBox = Box<dyn Notifier>;
