use crate::domain::money::Amount;
use crate::domain::task::UserId;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Successful,
    Failed,
}

const TRX_TAG_LEN: usize = 10;

/// One payment-gateway transaction lifecycle: initialized as `Pending`,
/// resolved to `Successful` or `Failed` at verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: u64,
    pub user_id: UserId,
    /// Gateway-issued reference, unique per transaction.
    pub reference: String,
    pub amount: Amount,
    pub status: DepositStatus,
    /// Locally generated transaction tag.
    pub trx: String,
    pub method: Option<String>,
    pub currency: Option<String>,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deposit {
    pub fn initialize(user_id: UserId, reference: String, amount: Amount, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_id,
            reference,
            amount,
            status: DepositStatus::Pending,
            trx: generate_trx(TRX_TAG_LEN),
            method: None,
            currency: None,
            token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Gateway-reported facts captured onto the deposit row when the transaction
/// verifies successfully.
#[derive(Debug, Clone)]
pub struct DepositCapture {
    pub amount: Amount,
    pub currency: String,
    pub method: String,
    pub token: Option<String>,
}

pub fn generate_trx(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
