use crate::domain::money::{Amount, Balance};
use crate::domain::submission::{Submission, SubmissionId};
use crate::domain::task::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's spendable balance. Created lazily at zero on first credit and only
/// ever credited by the settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn open(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            balance: Balance::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundsKind {
    Task,
}

/// Ledger entry tracking money owed-but-unpaid (`pending`) vs paid-out
/// (`earned`) for one submission.
///
/// Keyed by the owning submission id, so two submissions with identical
/// payouts can never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsRecord {
    pub id: u64,
    pub submission_id: SubmissionId,
    pub user_id: UserId,
    pub pending: Balance,
    pub earned: Balance,
    pub kind: FundsKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FundsRecord {
    /// Opens the in-flight record created alongside a submission.
    pub fn open(submission_id: SubmissionId, user_id: UserId, amount: Amount, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            submission_id,
            user_id,
            pending: amount.into(),
            earned: Balance::ZERO,
            kind: FundsKind::Task,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending obligation converted to a paid-out credit.
    pub fn resolve(&mut self, amount: Amount, now: DateTime<Utc>) {
        self.pending = Balance::ZERO;
        self.earned = amount.into();
        self.updated_at = now;
    }

    /// Pending obligation cancelled; nothing was earned.
    pub fn void(&mut self, now: DateTime<Utc>) {
        self.pending = Balance::ZERO;
        self.earned = Balance::ZERO;
        self.updated_at = now;
    }
}

/// Outcome of an approved submission: the transition plus the resulting
/// wallet state, reported together so callers never re-read a torn state.
#[derive(Debug, Clone, Serialize)]
pub struct SettledSubmission {
    pub submission: Submission,
    pub amount: Amount,
    pub balance: Balance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_funds_record_lifecycle() {
        let now = Utc::now();
        let amount = Amount::new(dec!(50)).unwrap();
        let mut record = FundsRecord::open(3, 9, amount, now);
        assert_eq!(record.pending, Balance::new(dec!(50)));
        assert_eq!(record.earned, Balance::ZERO);

        record.resolve(amount, now);
        assert_eq!(record.pending, Balance::ZERO);
        assert_eq!(record.earned, Balance::new(dec!(50)));
    }

    #[test]
    fn test_voided_record_earns_nothing() {
        let now = Utc::now();
        let mut record = FundsRecord::open(3, 9, Amount::new(dec!(50)).unwrap(), now);
        record.void(now);
        assert_eq!(record.pending, Balance::ZERO);
        assert_eq!(record.earned, Balance::ZERO);
    }
}
