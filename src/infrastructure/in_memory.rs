use crate::domain::deposit::{Deposit, DepositCapture, DepositStatus};
use crate::domain::ledger::{FundsRecord, SettledSubmission, Wallet};
use crate::domain::money::{Amount, Balance};
use crate::domain::order::{CartEntry, CartStatus, Order, OrderId, OrderStatus, Product, ProductId};
use crate::domain::ports::{DepositStore, LedgerStore, OrderStore, TaskStore};
use crate::domain::submission::{Evidence, Submission, SubmissionId, SubmissionStatus};
use crate::domain::task::{Task, TaskId, TaskPatch, TaskStatus, UserId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    submissions: HashMap<SubmissionId, Submission>,
    /// Keyed by the owning submission id.
    funds: HashMap<SubmissionId, FundsRecord>,
    wallets: HashMap<UserId, Wallet>,
    /// Keyed by the gateway reference.
    deposits: HashMap<String, Deposit>,
    orders: HashMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    cart: HashMap<u64, CartEntry>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn credit(&mut self, user_id: UserId, amount: Amount) -> Balance {
        let now = Utc::now();
        let wallet = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::open(user_id, now));
        wallet.balance += amount.into();
        wallet.updated_at = now;
        wallet.balance
    }
}

/// In-memory backend implementing every store port over one shared state.
///
/// All compound mutations take the single write lock for their whole
/// check-then-act sequence, which is what makes them atomic with respect to
/// concurrent request handlers. `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, mut task: Task) -> Result<Task> {
        let mut state = self.state.write().await;
        task.id = state.next_id();
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>> {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(task, Utc::now());
        Ok(Some(task.clone()))
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn all_tasks(&self) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId) -> Result<Option<Task>> {
        let mut state = self.state.write().await;
        Ok(state.tasks.remove(&id))
    }

    async fn approve_task(&self, id: TaskId) -> Result<Option<Task>> {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            return Ok(None);
        }
        task.status = TaskStatus::Approved;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn record_submission(
        &self,
        task_id: TaskId,
        user_id: UserId,
        evidence: Evidence,
    ) -> Result<(Task, Submission)> {
        let mut state = self.state.write().await;

        if state
            .submissions
            .values()
            .any(|s| s.user_id == user_id && s.task_id == task_id)
        {
            return Err(Error::AlreadySubmitted);
        }

        let Some(mut task) = state.tasks.get(&task_id).cloned() else {
            return Err(Error::NotFound("task"));
        };
        if task.task_count_remaining == 0 {
            return Err(Error::TaskExhausted);
        }

        let now = Utc::now();
        let submission_id = state.next_id();
        let funds_id = state.next_id();
        let submission = Submission {
            id: submission_id,
            user_id,
            task_id,
            evidence,
            status: SubmissionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let mut funds = FundsRecord::open(submission_id, user_id, task.task_amount, now);
        funds.id = funds_id;
        task.task_count_remaining -= 1;
        task.updated_at = now;

        // All three writes land under the same guard as the checks above.
        state.submissions.insert(submission_id, submission.clone());
        state.funds.insert(submission_id, funds);
        state.tasks.insert(task_id, task.clone());

        Ok((task, submission))
    }

    async fn submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let state = self.state.read().await;
        Ok(state.submissions.get(&id).cloned())
    }

    async fn submissions(&self) -> Result<Vec<Submission>> {
        let state = self.state.read().await;
        let mut all: Vec<Submission> = state.submissions.values().cloned().collect();
        all.sort_by_key(|s| s.id);
        Ok(all)
    }

    async fn count_submissions(&self, status: SubmissionStatus) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .values()
            .filter(|s| s.status == status)
            .count() as u64)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn balance(&self, user_id: UserId) -> Result<Balance> {
        let state = self.state.read().await;
        Ok(state
            .wallets
            .get(&user_id)
            .map(|w| w.balance)
            .unwrap_or(Balance::ZERO))
    }

    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&user_id).cloned())
    }

    async fn funds_record(&self, submission_id: SubmissionId) -> Result<Option<FundsRecord>> {
        let state = self.state.read().await;
        Ok(state.funds.get(&submission_id).cloned())
    }

    async fn settle_submission(&self, id: SubmissionId) -> Result<Option<SettledSubmission>> {
        let mut state = self.state.write().await;
        let Some(mut submission) = state.submissions.get(&id).cloned() else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Pending {
            return Ok(None);
        }
        let Some(mut funds) = state.funds.get(&id).cloned() else {
            return Err(Error::internal(format!(
                "no funds record for submission {id}"
            )));
        };
        let amount = Amount::new(funds.pending.0)?;

        let now = Utc::now();
        submission.status = SubmissionStatus::Approved;
        submission.updated_at = now;
        funds.resolve(amount, now);

        let balance = state.credit(submission.user_id, amount);
        state.submissions.insert(id, submission.clone());
        state.funds.insert(id, funds);

        Ok(Some(SettledSubmission {
            submission,
            amount,
            balance,
        }))
    }

    async fn reject_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let mut state = self.state.write().await;
        let Some(mut submission) = state.submissions.get(&id).cloned() else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Pending {
            return Ok(None);
        }
        let now = Utc::now();
        submission.status = SubmissionStatus::Rejected;
        submission.updated_at = now;
        state.submissions.insert(id, submission.clone());
        if let Some(funds) = state.funds.get_mut(&id) {
            funds.void(now);
        }
        Ok(Some(submission))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn cart_entries(&self, user_id: UserId) -> Result<Vec<CartEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<CartEntry> = state
            .cart
            .values()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }

    async fn put_order(&self, mut order: Order) -> Result<Order> {
        let mut state = self.state.write().await;
        if order.id == 0 {
            order.id = state.next_id();
        }
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn put_product(&self, mut product: Product) -> Result<Product> {
        let mut state = self.state.write().await;
        if product.id == 0 {
            product.id = state.next_id();
        }
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn put_cart_entry(&self, mut entry: CartEntry) -> Result<CartEntry> {
        let mut state = self.state.write().await;
        if entry.id == 0 {
            entry.id = state.next_id();
        }
        state.cart.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn mark_order_paid(&self, order_id: OrderId, user_id: UserId) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        let Some(mut order) = state.orders.get(&order_id).cloned() else {
            return Ok(None);
        };
        if order.status != OrderStatus::Pending {
            return Ok(None);
        }

        order.status = OrderStatus::Paid;
        order.updated_at = Utc::now();
        state.orders.insert(order_id, order.clone());

        state
            .cart
            .retain(|_, entry| !(entry.user_id == user_id && entry.status == CartStatus::Pending));

        for item in &order.items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                if product.stock < item.quantity {
                    warn!(
                        product_id = product.id,
                        stock = product.stock,
                        quantity = item.quantity,
                        "stock decrement clamped at zero"
                    );
                }
                product.stock = product.stock.saturating_sub(item.quantity);
                product.view_count += u64::from(item.quantity);
            }
        }

        Ok(Some(order))
    }
}

#[async_trait]
impl DepositStore for MemoryStore {
    async fn create_deposit(&self, mut deposit: Deposit) -> Result<Deposit> {
        let mut state = self.state.write().await;
        if state.deposits.contains_key(&deposit.reference) {
            return Err(Error::internal(format!(
                "duplicate deposit reference {}",
                deposit.reference
            )));
        }
        deposit.id = state.next_id();
        state.deposits.insert(deposit.reference.clone(), deposit.clone());
        Ok(deposit)
    }

    async fn deposit_by_reference(&self, reference: &str) -> Result<Option<Deposit>> {
        let state = self.state.read().await;
        Ok(state.deposits.get(reference).cloned())
    }

    async fn mark_successful(
        &self,
        reference: &str,
        capture: DepositCapture,
        credit_wallet: bool,
    ) -> Result<Deposit> {
        let mut state = self.state.write().await;
        let Some(deposit) = state.deposits.get_mut(reference) else {
            return Err(Error::NotFound("deposit"));
        };
        if deposit.status == DepositStatus::Successful {
            return Err(Error::AlreadyProcessed);
        }

        deposit.status = DepositStatus::Successful;
        deposit.amount = capture.amount;
        deposit.currency = Some(capture.currency);
        deposit.method = Some(capture.method);
        deposit.token = capture.token;
        deposit.updated_at = Utc::now();
        let deposit = deposit.clone();

        if credit_wallet {
            state.credit(deposit.user_id, deposit.amount);
        }

        Ok(deposit)
    }

    async fn mark_failed(&self, reference: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(deposit) = state.deposits.get_mut(reference)
            && deposit.status == DepositStatus::Pending
        {
            deposit.status = DepositStatus::Failed;
            deposit.updated_at = Utc::now();
        }
        Ok(())
    }
}
