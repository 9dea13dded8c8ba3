use crate::domain::order::OrderId;
use crate::domain::task::UserId;
use serde::{Deserialize, Serialize};

/// Metadata echoed back by the gateway at verification time; carries enough
/// to route the settled money (wallet top-up vs order payment).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

/// Request for a hosted-payment session.
#[derive(Debug, Clone)]
pub struct InitializeRequest {
    pub email: String,
    pub callback_url: String,
    /// Amount in minor currency units, as the gateway expects.
    pub amount_minor: u64,
    pub metadata: PaymentMetadata,
}

/// Gateway response to a successful initialize call.
#[derive(Debug, Clone, Serialize)]
pub struct InitializedPayment {
    pub reference: String,
    pub authorization_url: String,
}

/// Gateway-reported state of a transaction under verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub reference: String,
    /// Raw transaction status string, `"success"` when the charge went through.
    pub transaction_status: String,
    /// Human-readable provider reason, surfaced on non-success.
    pub gateway_response: String,
    pub amount_minor: u64,
    pub currency: String,
    pub channel: String,
    pub authorization_code: Option<String>,
    pub metadata: Option<PaymentMetadata>,
}

impl VerifiedPayment {
    pub fn is_successful(&self) -> bool {
        self.transaction_status == "success"
    }
}
