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
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

pub const CF_TASKS: &str = "tasks";
pub const CF_SUBMISSIONS: &str = "submissions";
/// Funds records, keyed by the owning submission id.
pub const CF_FUNDS: &str = "funds";
pub const CF_WALLETS: &str = "wallets";
/// Deposits, keyed by the gateway reference.
pub const CF_DEPOSITS: &str = "deposits";
pub const CF_ORDERS: &str = "orders";
pub const CF_PRODUCTS: &str = "products";
pub const CF_CART: &str = "cart";
pub const CF_META: &str = "meta";

const NEXT_ID_KEY: &[u8] = b"next_id";

/// Persistent store over RocksDB, one column family per table and JSON row
/// encoding.
///
/// RocksDB has no multi-key transactions in this binding, so every compound
/// mutation serializes behind `write_lock` for its check-then-act phase and
/// lands its rows in a single `WriteBatch` — the same atomicity contract the
/// in-memory store gives via its state lock.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Opens or creates the database, ensuring all column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_TASKS,
            CF_SUBMISSIONS,
            CF_FUNDS,
            CF_WALLETS,
            CF_DEPOSITS,
            CF_ORDERS,
            CF_PRODUCTS,
            CF_CART,
            CF_META,
        ]
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::internal(format!("{name} column family not found")))
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let handle = self.cf(cf)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn batch_put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: &[u8],
        row: &T,
    ) -> Result<()> {
        let handle = self.cf(cf)?;
        batch.put_cf(handle, key, serde_json::to_vec(row)?);
        Ok(())
    }

    /// Allocates the next row id. Callers must hold `write_lock`.
    fn next_id(&self, batch: &mut WriteBatch) -> Result<u64> {
        let handle = self.cf(CF_META)?;
        let current = self
            .db
            .get_cf(handle, NEXT_ID_KEY)?
            .map(|bytes| {
                bytes
                    .try_into()
                    .map(u64::from_be_bytes)
                    .map_err(|_| Error::internal("corrupt id counter"))
            })
            .transpose()?
            .unwrap_or(0);
        let next = current + 1;
        batch.put_cf(handle, NEXT_ID_KEY, next.to_be_bytes());
        Ok(next)
    }

    fn wallet_row(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.get_json(CF_WALLETS, &user_id.to_be_bytes())
    }

    /// Stages a wallet credit into the batch, creating the wallet at zero.
    fn stage_credit(
        &self,
        batch: &mut WriteBatch,
        user_id: UserId,
        amount: Amount,
    ) -> Result<Balance> {
        let now = Utc::now();
        let mut wallet = self
            .wallet_row(user_id)?
            .unwrap_or_else(|| Wallet::open(user_id, now));
        wallet.balance += amount.into();
        wallet.updated_at = now;
        let balance = wallet.balance;
        self.batch_put(batch, CF_WALLETS, &user_id.to_be_bytes(), &wallet)?;
        Ok(balance)
    }
}

#[async_trait]
impl TaskStore for RocksStore {
    async fn create_task(&self, mut task: Task) -> Result<Task> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        task.id = self.next_id(&mut batch)?;
        self.batch_put(&mut batch, CF_TASKS, &task.id.to_be_bytes(), &task)?;
        self.db.write(batch)?;
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut task) = self.get_json::<Task>(CF_TASKS, &id.to_be_bytes())? else {
            return Ok(None);
        };
        patch.apply(&mut task, Utc::now());
        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_TASKS, &id.to_be_bytes(), &task)?;
        self.db.write(batch)?;
        Ok(Some(task))
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        self.get_json(CF_TASKS, &id.to_be_bytes())
    }

    async fn all_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.scan_json(CF_TASKS)?;
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId) -> Result<Option<Task>> {
        let _guard = self.write_lock.lock().await;
        let Some(task) = self.get_json::<Task>(CF_TASKS, &id.to_be_bytes())? else {
            return Ok(None);
        };
        self.db.delete_cf(self.cf(CF_TASKS)?, id.to_be_bytes())?;
        Ok(Some(task))
    }

    async fn approve_task(&self, id: TaskId) -> Result<Option<Task>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut task) = self.get_json::<Task>(CF_TASKS, &id.to_be_bytes())? else {
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            return Ok(None);
        }
        task.status = TaskStatus::Approved;
        task.updated_at = Utc::now();
        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_TASKS, &id.to_be_bytes(), &task)?;
        self.db.write(batch)?;
        Ok(Some(task))
    }

    async fn record_submission(
        &self,
        task_id: TaskId,
        user_id: UserId,
        evidence: Evidence,
    ) -> Result<(Task, Submission)> {
        let _guard = self.write_lock.lock().await;

        let existing: Vec<Submission> = self.scan_json(CF_SUBMISSIONS)?;
        if existing
            .iter()
            .any(|s| s.user_id == user_id && s.task_id == task_id)
        {
            return Err(Error::AlreadySubmitted);
        }

        let Some(mut task) = self.get_json::<Task>(CF_TASKS, &task_id.to_be_bytes())?
        else {
            return Err(Error::NotFound("task"));
        };
        if task.task_count_remaining == 0 {
            return Err(Error::TaskExhausted);
        }

        let now = Utc::now();
        let mut batch = WriteBatch::default();
        let submission_id = self.next_id(&mut batch)?;
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
        funds.id = submission_id;
        task.task_count_remaining -= 1;
        task.updated_at = now;

        self.batch_put(
            &mut batch,
            CF_SUBMISSIONS,
            &submission_id.to_be_bytes(),
            &submission,
        )?;
        self.batch_put(&mut batch, CF_FUNDS, &submission_id.to_be_bytes(), &funds)?;
        self.batch_put(&mut batch, CF_TASKS, &task_id.to_be_bytes(), &task)?;
        self.db.write(batch)?;

        Ok((task, submission))
    }

    async fn submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        self.get_json(CF_SUBMISSIONS, &id.to_be_bytes())
    }

    async fn submissions(&self) -> Result<Vec<Submission>> {
        let mut all: Vec<Submission> = self.scan_json(CF_SUBMISSIONS)?;
        all.sort_by_key(|s| s.id);
        Ok(all)
    }

    async fn count_submissions(&self, status: SubmissionStatus) -> Result<u64> {
        let all: Vec<Submission> = self.scan_json(CF_SUBMISSIONS)?;
        Ok(all.iter().filter(|s| s.status == status).count() as u64)
    }
}

#[async_trait]
impl LedgerStore for RocksStore {
    async fn balance(&self, user_id: UserId) -> Result<Balance> {
        Ok(self
            .wallet_row(user_id)?
            .map(|w| w.balance)
            .unwrap_or(Balance::ZERO))
    }

    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.wallet_row(user_id)
    }

    async fn funds_record(&self, submission_id: SubmissionId) -> Result<Option<FundsRecord>> {
        self.get_json(CF_FUNDS, &submission_id.to_be_bytes())
    }

    async fn settle_submission(&self, id: SubmissionId) -> Result<Option<SettledSubmission>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut submission) = self.get_json::<Submission>(CF_SUBMISSIONS, &id.to_be_bytes())?
        else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Pending {
            return Ok(None);
        }
        let Some(mut funds) = self.get_json::<FundsRecord>(CF_FUNDS, &id.to_be_bytes())?
        else {
            return Err(Error::internal(format!(
                "no funds record for submission {id}"
            )));
        };
        let amount = Amount::new(funds.pending.0)?;

        let now = Utc::now();
        submission.status = SubmissionStatus::Approved;
        submission.updated_at = now;
        funds.resolve(amount, now);

        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_SUBMISSIONS, &id.to_be_bytes(), &submission)?;
        self.batch_put(&mut batch, CF_FUNDS, &id.to_be_bytes(), &funds)?;
        let balance = self.stage_credit(&mut batch, submission.user_id, amount)?;
        self.db.write(batch)?;

        Ok(Some(SettledSubmission {
            submission,
            amount,
            balance,
        }))
    }

    async fn reject_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut submission) = self.get_json::<Submission>(CF_SUBMISSIONS, &id.to_be_bytes())?
        else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Pending {
            return Ok(None);
        }
        let now = Utc::now();
        submission.status = SubmissionStatus::Rejected;
        submission.updated_at = now;

        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_SUBMISSIONS, &id.to_be_bytes(), &submission)?;
        if let Some(mut funds) = self.get_json::<FundsRecord>(CF_FUNDS, &id.to_be_bytes())? {
            funds.void(now);
            self.batch_put(&mut batch, CF_FUNDS, &id.to_be_bytes(), &funds)?;
        }
        self.db.write(batch)?;
        Ok(Some(submission))
    }
}

#[async_trait]
impl OrderStore for RocksStore {
    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, &id.to_be_bytes())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, &id.to_be_bytes())
    }

    async fn cart_entries(&self, user_id: UserId) -> Result<Vec<CartEntry>> {
        let mut entries: Vec<CartEntry> = self.scan_json(CF_CART)?;
        entries.retain(|entry| entry.user_id == user_id);
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }

    async fn put_order(&self, mut order: Order) -> Result<Order> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        if order.id == 0 {
            order.id = self.next_id(&mut batch)?;
        }
        self.batch_put(&mut batch, CF_ORDERS, &order.id.to_be_bytes(), &order)?;
        self.db.write(batch)?;
        Ok(order)
    }

    async fn put_product(&self, mut product: Product) -> Result<Product> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        if product.id == 0 {
            product.id = self.next_id(&mut batch)?;
        }
        self.batch_put(&mut batch, CF_PRODUCTS, &product.id.to_be_bytes(), &product)?;
        self.db.write(batch)?;
        Ok(product)
    }

    async fn put_cart_entry(&self, mut entry: CartEntry) -> Result<CartEntry> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        if entry.id == 0 {
            entry.id = self.next_id(&mut batch)?;
        }
        self.batch_put(&mut batch, CF_CART, &entry.id.to_be_bytes(), &entry)?;
        self.db.write(batch)?;
        Ok(entry)
    }

    async fn mark_order_paid(&self, order_id: OrderId, user_id: UserId) -> Result<Option<Order>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut order) = self.get_json::<Order>(CF_ORDERS, &order_id.to_be_bytes())?
        else {
            return Ok(None);
        };
        if order.status != OrderStatus::Pending {
            return Ok(None);
        }

        let now = Utc::now();
        order.status = OrderStatus::Paid;
        order.updated_at = now;

        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_ORDERS, &order_id.to_be_bytes(), &order)?;

        let cart_cf = self.cf(CF_CART)?;
        let entries: Vec<CartEntry> = self.scan_json(CF_CART)?;
        for entry in entries {
            if entry.user_id == user_id && entry.status == CartStatus::Pending {
                batch.delete_cf(cart_cf, entry.id.to_be_bytes());
            }
        }

        for item in &order.items {
            if let Some(mut product) =
                self.get_json::<Product>(CF_PRODUCTS, &item.product_id.to_be_bytes())?
            {
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
                self.batch_put(
                    &mut batch,
                    CF_PRODUCTS,
                    &item.product_id.to_be_bytes(),
                    &product,
                )?;
            }
        }

        self.db.write(batch)?;
        Ok(Some(order))
    }
}

#[async_trait]
impl DepositStore for RocksStore {
    async fn create_deposit(&self, mut deposit: Deposit) -> Result<Deposit> {
        let _guard = self.write_lock.lock().await;
        if self
            .get_json::<Deposit>(CF_DEPOSITS, deposit.reference.as_bytes())?
            .is_some()
        {
            return Err(Error::internal(format!(
                "duplicate deposit reference {}",
                deposit.reference
            )));
        }
        let mut batch = WriteBatch::default();
        deposit.id = self.next_id(&mut batch)?;
        self.batch_put(
            &mut batch,
            CF_DEPOSITS,
            deposit.reference.as_bytes(),
            &deposit,
        )?;
        self.db.write(batch)?;
        Ok(deposit)
    }

    async fn deposit_by_reference(&self, reference: &str) -> Result<Option<Deposit>> {
        self.get_json(CF_DEPOSITS, reference.as_bytes())
    }

    async fn mark_successful(
        &self,
        reference: &str,
        capture: DepositCapture,
        credit_wallet: bool,
    ) -> Result<Deposit> {
        let _guard = self.write_lock.lock().await;
        let Some(mut deposit) = self.get_json::<Deposit>(CF_DEPOSITS, reference.as_bytes())?
        else {
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

        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_DEPOSITS, reference.as_bytes(), &deposit)?;
        if credit_wallet {
            self.stage_credit(&mut batch, deposit.user_id, deposit.amount)?;
        }
        self.db.write(batch)?;
        Ok(deposit)
    }

    async fn mark_failed(&self, reference: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let Some(mut deposit) = self.get_json::<Deposit>(CF_DEPOSITS, reference.as_bytes())?
        else {
            return Ok(());
        };
        if deposit.status != DepositStatus::Pending {
            return Ok(());
        }
        deposit.status = DepositStatus::Failed;
        deposit.updated_at = Utc::now();
        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_DEPOSITS, reference.as_bytes(), &deposit)?;
        self.db.write(batch)?;
        Ok(())
    }
}
