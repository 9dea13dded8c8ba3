use crate::config::GatewayConfig;
use crate::domain::gateway::{InitializeRequest, InitializedPayment, PaymentMetadata, VerifiedPayment};
use crate::domain::ports::PaymentGateway;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client for the Paystack transaction API.
///
/// Both calls carry a hard request timeout; a timeout or transport failure
/// surfaces as a gateway error, never as an internal one — the caller treats
/// the provider as unreachable, not the service as broken.
pub struct PaystackGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("gateway client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    callback_url: &'a str,
    amount: u64,
    metadata: PaymentMetadata,
}

/// Provider envelope: `status` is the call-level flag, `data` the payload.
#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    reference: String,
    authorization_url: String,
}

#[derive(Deserialize)]
struct VerifyData {
    reference: String,
    status: String,
    #[serde(default)]
    gateway_response: Option<String>,
    amount: u64,
    currency: String,
    channel: String,
    #[serde(default)]
    authorization: Option<Authorization>,
    #[serde(default)]
    metadata: Option<PaymentMetadata>,
}

#[derive(Deserialize)]
struct Authorization {
    #[serde(default)]
    authorization_code: Option<String>,
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Gateway(format!("gateway request failed: {e}"))
}

impl<T> Envelope<T> {
    /// Unwraps the payload of a call the provider reported as successful.
    fn into_data(self, http_ok: bool) -> Result<T> {
        if !http_ok || !self.status {
            return Err(Error::Gateway(
                self.message.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        self.data
            .ok_or_else(|| Error::Gateway("gateway response missing data".into()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, request: InitializeRequest) -> Result<InitializedPayment> {
        let body = InitializeBody {
            email: &request.email,
            callback_url: &request.callback_url,
            amount: request.amount_minor,
            metadata: request.metadata,
        };
        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let http_ok = response.status().is_success();
        let envelope: Envelope<InitializeData> =
            response.json().await.map_err(transport_error)?;
        let data = envelope.into_data(http_ok)?;
        Ok(InitializedPayment {
            reference: data.reference,
            authorization_url: data.authorization_url,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment> {
        let response = self
            .http
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;
        let http_ok = response.status().is_success();
        let envelope: Envelope<VerifyData> = response.json().await.map_err(transport_error)?;
        let data = envelope.into_data(http_ok)?;
        Ok(VerifiedPayment {
            reference: data.reference,
            transaction_status: data.status,
            gateway_response: data.gateway_response.unwrap_or_default(),
            amount_minor: data.amount,
            currency: data.currency,
            channel: data.channel,
            authorization_code: data.authorization.and_then(|a| a.authorization_code),
            metadata: data.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_rejects_falsy_status() {
        let envelope: Envelope<InitializeData> = serde_json::from_str(
            r#"{"status": false, "message": "Invalid key"}"#,
        )
        .unwrap();
        let err = envelope.into_data(true).unwrap_err();
        assert!(matches!(err, Error::Gateway(m) if m == "Invalid key"));
    }

    #[test]
    fn test_envelope_rejects_http_failure_even_with_truthy_status() {
        let envelope: Envelope<InitializeData> = serde_json::from_str(
            r#"{"status": true, "data": {"reference": "r", "authorization_url": "u"}}"#,
        )
        .unwrap();
        assert!(envelope.into_data(false).is_err());
    }

    #[test]
    fn test_verify_payload_parses_provider_shape() {
        let envelope: Envelope<VerifyData> = serde_json::from_str(
            r#"{
                "status": true,
                "message": "Verification successful",
                "data": {
                    "reference": "ref_1",
                    "status": "success",
                    "gateway_response": "Approved",
                    "amount": 50000,
                    "currency": "NGN",
                    "channel": "card",
                    "authorization": {"authorization_code": "AUTH_x"},
                    "metadata": {"user_id": 4, "order_id": 12}
                }
            }"#,
        )
        .unwrap();
        let data = envelope.into_data(true).unwrap();
        assert_eq!(data.status, "success");
        assert_eq!(data.amount, 50000);
        assert_eq!(
            data.authorization.unwrap().authorization_code.as_deref(),
            Some("AUTH_x")
        );
        assert_eq!(data.metadata.unwrap().order_id, Some(12));
    }
}
