use async_trait::async_trait;
use hovertask::application::lifecycle::TaskLifecycle;
use hovertask::application::payments::{PaymentOrchestrator, PaymentPolicy};
use hovertask::application::settlement::SettlementEngine;
use hovertask::domain::gateway::{InitializeRequest, InitializedPayment, VerifiedPayment};
use hovertask::domain::money::Amount;
use hovertask::domain::ports::{MediaStore, Notifier, PaymentGateway};
use hovertask::domain::submission::ScreenshotUpload;
use hovertask::domain::task::{Category, NewTask, Priority, TaskStatus, UserId};
use hovertask::domain::Caller;
use hovertask::error::{Error, Result};
use hovertask::infrastructure::in_memory::MemoryStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Gateway double fed a queue of scripted responses; counts calls so tests
/// can assert the provider was (not) reached.
#[derive(Default)]
pub struct ScriptedGateway {
    pub init_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    init_responses: Mutex<VecDeque<Result<InitializedPayment>>>,
    verify_responses: Mutex<VecDeque<Result<VerifiedPayment>>>,
}

impl ScriptedGateway {
    pub fn push_init(&self, response: Result<InitializedPayment>) {
        self.init_responses.lock().unwrap().push_back(response);
    }

    pub fn push_verify(&self, response: Result<VerifiedPayment>) {
        self.verify_responses.lock().unwrap().push_back(response);
    }
}

/// Newtype over the shared handle so the foreign `PaymentGateway` trait can be
/// implemented here without tripping the orphan rule (`Arc` is not local).
pub struct SharedGateway(pub Arc<ScriptedGateway>);

#[async_trait]
impl PaymentGateway for SharedGateway {
    async fn initialize(&self, _request: InitializeRequest) -> Result<InitializedPayment> {
        self.0.init_calls.fetch_add(1, Ordering::SeqCst);
        self.0
            .init_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Gateway("no scripted response".into())))
    }

    async fn verify(&self, _reference: &str) -> Result<VerifiedPayment> {
        self.0.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.0
            .verify_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Gateway("no scripted response".into())))
    }
}

pub struct MemoryMedia;

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn store_image(&self, filename: &str, _bytes: &[u8]) -> Result<String> {
        Ok(format!("/uploads/{filename}"))
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub sent: AtomicUsize,
}

/// Newtype over the shared handle so the foreign `Notifier` trait can be
/// implemented here without tripping the orphan rule (`Arc` is not local).
pub struct SharedNotifier(pub Arc<CountingNotifier>);

#[async_trait]
impl Notifier for SharedNotifier {
    async fn wallet_funded(
        &self,
        _user_id: UserId,
        _amount: Amount,
        _reference: &str,
    ) -> Result<()> {
        self.0.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Full service wiring over one shared in-memory store.
pub struct TestContext {
    pub store: MemoryStore,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<CountingNotifier>,
    pub lifecycle: Arc<TaskLifecycle>,
    pub settlement: Arc<SettlementEngine>,
    pub payments: Arc<PaymentOrchestrator>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_minimum_deposit(dec!(100))
    }

    pub fn with_minimum_deposit(minimum_deposit: Decimal) -> Self {
        let store = MemoryStore::new();
        let gateway = Arc::new(ScriptedGateway::default());
        let notifier = Arc::new(CountingNotifier::default());
        let lifecycle = Arc::new(TaskLifecycle::new(
            Box::new(store.clone()),
            Box::new(MemoryMedia),
        ));
        let settlement = Arc::new(SettlementEngine::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
        ));
        let payments = Arc::new(PaymentOrchestrator::new(
            Box::new(store.clone()),
            Box::new(SharedGateway(gateway.clone())),
            Box::new(SharedNotifier(notifier.clone())),
            settlement.clone(),
            PaymentPolicy {
                minimum_deposit,
                callback_url: "http://localhost/api/v1/wallet/verify-payment".into(),
            },
        ));
        Self {
            store,
            gateway,
            notifier,
            lifecycle,
            settlement,
            payments,
        }
    }
}

pub fn caller(id: UserId) -> Caller {
    Caller {
        id,
        email: format!("user{id}@example.com"),
    }
}

pub fn new_task(amount: Decimal, total: u32) -> NewTask {
    NewTask {
        title: "Follow our page".into(),
        description: "Follow the page and upload a screenshot".into(),
        status: TaskStatus::Pending,
        priority: Priority::Medium,
        category: Category::SocialMedia,
        task_type: 1,
        task_amount: amount,
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

pub fn screenshot() -> ScreenshotUpload {
    ScreenshotUpload {
        filename: "proof.png".into(),
        bytes: vec![137, 80, 78, 71],
    }
}

pub fn initialized(reference: &str) -> InitializedPayment {
    InitializedPayment {
        reference: reference.into(),
        authorization_url: format!("https://checkout.example/{reference}"),
    }
}

pub fn verified_success(reference: &str, amount_minor: u64, user_id: UserId) -> VerifiedPayment {
    VerifiedPayment {
        reference: reference.into(),
        transaction_status: "success".into(),
        gateway_response: "Approved".into(),
        amount_minor,
        currency: "NGN".into(),
        channel: "card".into(),
        authorization_code: Some("AUTH_1".into()),
        metadata: Some(hovertask::domain::gateway::PaymentMetadata {
            user_id,
            order_id: None,
        }),
    }
}
