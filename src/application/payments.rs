use crate::application::settlement::SettlementEngine;
use crate::domain::deposit::{Deposit, DepositCapture, DepositStatus};
use crate::domain::gateway::{InitializeRequest, InitializedPayment, PaymentMetadata, VerifiedPayment};
use crate::domain::money::{Amount, Balance};
use crate::domain::order::OrderId;
use crate::domain::ports::{DepositStoreBox, NotifierBox, PaymentGatewayBox};
use crate::domain::task::UserId;
use crate::domain::Caller;
use crate::error::{Error, Result, ValidationErrors};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Policy knobs for the payment flow, taken from configuration.
#[derive(Debug, Clone)]
pub struct PaymentPolicy {
    pub minimum_deposit: Decimal,
    pub callback_url: String,
}

/// Typed initialize-payment input.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializePayment {
    pub amount: Decimal,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// Outcome of a successful verification: the settled deposit row plus the
/// gateway's view of the transaction.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationOutcome {
    pub deposit: Deposit,
    pub payment: VerifiedPayment,
}

/// Drives the gateway initialize/verify flow and the resulting settlement.
///
/// Gateway calls are external I/O and always run outside the local store
/// transitions; failures after the gateway call compensate by marking the
/// deposit `Failed` — unless the successful transition already committed, in
/// which case the deposit stays `Successful` and the residual error is
/// surfaced on its own.
pub struct PaymentOrchestrator {
    deposits: DepositStoreBox,
    gateway: PaymentGatewayBox,
    notifier: NotifierBox,
    settlement: Arc<SettlementEngine>,
    policy: PaymentPolicy,
}

impl PaymentOrchestrator {
    pub fn new(
        deposits: DepositStoreBox,
        gateway: PaymentGatewayBox,
        notifier: NotifierBox,
        settlement: Arc<SettlementEngine>,
        policy: PaymentPolicy,
    ) -> Self {
        Self {
            deposits,
            gateway,
            notifier,
            settlement,
            policy,
        }
    }

    /// Starts a hosted payment: validates the amount, asks the gateway for a
    /// reference and redirect target, then persists the pending deposit.
    pub async fn initialize(
        &self,
        caller: &Caller,
        input: InitializePayment,
    ) -> Result<InitializedPayment> {
        if input.amount < self.policy.minimum_deposit {
            return Err(ValidationErrors::field(
                "amount",
                format!("must be at least {}", self.policy.minimum_deposit),
            ));
        }
        let amount = Amount::new(input.amount)?;

        let request = InitializeRequest {
            email: caller.email.clone(),
            callback_url: self.policy.callback_url.clone(),
            amount_minor: amount.to_minor_units()?,
            metadata: PaymentMetadata {
                user_id: caller.id,
                order_id: input.order_id,
            },
        };
        let initialized = self.gateway.initialize(request).await?;

        let deposit = Deposit::initialize(
            caller.id,
            initialized.reference.clone(),
            amount,
            Utc::now(),
        );
        self.deposits.create_deposit(deposit).await?;
        info!(
            user_id = caller.id,
            reference = %initialized.reference,
            amount = %input.amount,
            "payment initialized"
        );
        Ok(initialized)
    }

    /// Confirms a gateway transaction and settles its effects exactly once.
    pub async fn verify(&self, reference: &str) -> Result<VerificationOutcome> {
        let deposit = self
            .deposits
            .deposit_by_reference(reference)
            .await?
            .ok_or(Error::NotFound("deposit"))?;
        if deposit.status == DepositStatus::Successful {
            return Err(Error::AlreadyProcessed);
        }

        let payment = match self.gateway.verify(reference).await {
            Ok(payment) => payment,
            Err(err) => {
                self.compensate(reference).await;
                return Err(err);
            }
        };
        if !payment.is_successful() {
            self.compensate(reference).await;
            return Err(Error::Gateway(format!(
                "payment not successful: {}",
                payment.gateway_response
            )));
        }

        let capture = DepositCapture {
            amount: Amount::from_minor_units(payment.amount_minor)?,
            currency: payment.currency.clone(),
            method: payment.channel.clone(),
            token: payment.authorization_code.clone(),
        };
        let order_id = payment.metadata.as_ref().and_then(|m| m.order_id);
        // A deposit without order metadata is a wallet top-up; the credit
        // lands inside the same transition that flips the status.
        let deposit = match self
            .deposits
            .mark_successful(reference, capture, order_id.is_none())
            .await
        {
            Ok(deposit) => deposit,
            Err(err) => {
                if !matches!(err, Error::AlreadyProcessed) {
                    self.compensate(reference).await;
                }
                return Err(err);
            }
        };

        // From here on the verification is durably committed: a failure below
        // surfaces to the caller but never rewrites the deposit as failed.
        if let Some(order_id) = order_id {
            self.settlement
                .reconcile_paid_order(order_id, deposit.user_id)
                .await?;
        }

        if let Err(err) = self
            .notifier
            .wallet_funded(deposit.user_id, deposit.amount, reference)
            .await
        {
            warn!(reference, "funded-wallet notification failed: {err}");
        }

        info!(
            user_id = deposit.user_id,
            reference,
            amount = %deposit.amount.value(),
            "payment verified"
        );
        Ok(VerificationOutcome { deposit, payment })
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Balance> {
        self.settlement.balance(user_id).await
    }

    /// Best-effort `Failed` write; a deposit that already verified is left
    /// untouched by the store.
    async fn compensate(&self, reference: &str) {
        if let Err(err) = self.deposits.mark_failed(reference).await {
            error!(reference, "failed to mark deposit failed: {err}");
        }
    }
}
