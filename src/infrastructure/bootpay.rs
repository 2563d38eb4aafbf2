//! HTTP client for the Bootpay receipt API.
//!
//! Three calls are used: token issuance, receipt lookup and cancellation.
//! Every response is wrapped in an envelope whose `status` field is `200` on
//! success regardless of the HTTP status line.

use crate::config::GatewayConfig;
use crate::domain::ports::{AccessToken, CancelOutcome, PaymentGateway, ReceiptVerification};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ENVELOPE_OK: i32 = 200;
/// Receipt status once the payment has been captured.
pub const RECEIPT_STATUS_PAID: i32 = 1;
/// Receipt status once the payment has been cancelled upstream.
pub const RECEIPT_STATUS_CANCELLED: i32 = 20;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: i32,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    application_id: &'a str,
    private_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptData {
    #[serde(default)]
    price: Decimal,
    status: i32,
}

#[derive(Debug, Serialize)]
struct CancelRequest<'a> {
    receipt_id: &'a str,
    /// Who asked for the cancellation.
    name: &'a str,
    reason: &'a str,
}

/// `PaymentGateway` backed by the Bootpay REST API.
///
/// Connect and read timeouts come from `GatewayConfig`; a timeout surfaces as
/// a payment (or, for cancellation, gateway) error like any other transport
/// failure.
#[derive(Debug, Clone)]
pub struct BootpayGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl BootpayGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| ReservationError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// `receipt/{id}.json`, with the id percent-encoded as one path segment.
    fn receipt_url(&self, receipt_id: &str) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| format!("invalid gateway URL: {e}"))?;
        url.path_segments_mut()
            .map_err(|()| format!("gateway URL {} cannot take a path", self.config.base_url))?
            .pop_if_empty()
            .push("receipt")
            .push(&format!("{receipt_id}.json"));
        Ok(url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> std::result::Result<Envelope<T>, String> {
        let http_status = response.status();
        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| format!("unreadable response (HTTP {http_status}): {e}"))
    }

    async fn receipt(
        &self,
        receipt_id: &str,
        token: &AccessToken,
    ) -> std::result::Result<Envelope<ReceiptData>, String> {
        let response = self
            .client
            .get(self.receipt_url(receipt_id)?)
            .header(AUTHORIZATION, token.0.as_str())
            .send()
            .await
            .map_err(|e| format!("receipt lookup failed: {e}"))?;
        Self::read_envelope(response).await
    }
}

#[async_trait]
impl PaymentGateway for BootpayGateway {
    async fn access_token(&self) -> Result<AccessToken> {
        let body = TokenRequest {
            application_id: &self.config.application_id,
            private_key: &self.config.private_key,
        };
        let response = self
            .client
            .post(self.url("request/token.json"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReservationError::Payment(format!("token request failed: {e}")))?;
        let envelope: Envelope<TokenData> = Self::read_envelope(response)
            .await
            .map_err(ReservationError::Payment)?;

        match envelope.data {
            Some(data) if envelope.status == ENVELOPE_OK && !data.token.is_empty() => {
                debug!("Gateway access token issued");
                Ok(AccessToken(data.token))
            }
            _ => Err(ReservationError::Payment(format!(
                "gateway rejected the credentials (status {}): {}",
                envelope.status,
                envelope.message.unwrap_or_default()
            ))),
        }
    }

    async fn verify_receipt(
        &self,
        receipt_id: &str,
        token: &AccessToken,
    ) -> Result<ReceiptVerification> {
        let envelope = self
            .receipt(receipt_id, token)
            .await
            .map_err(ReservationError::Payment)?;

        let verification = match envelope.data {
            Some(data) if envelope.status == ENVELOPE_OK => ReceiptVerification {
                confirmed: data.status == RECEIPT_STATUS_PAID,
                amount: data.price,
                status: data.status,
            },
            _ => ReceiptVerification {
                confirmed: false,
                amount: Decimal::ZERO,
                status: envelope.status,
            },
        };
        debug!(%receipt_id, confirmed = verification.confirmed, "Receipt verified");
        Ok(verification)
    }

    async fn cancel(
        &self,
        receipt_id: &str,
        requested_by: &str,
        reason: &str,
        token: &AccessToken,
    ) -> Result<CancelOutcome> {
        let body = CancelRequest {
            receipt_id,
            name: requested_by,
            reason,
        };
        let response = self
            .client
            .post(self.url("cancel.json"))
            .header(AUTHORIZATION, token.0.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ReservationError::Gateway(format!("cancel request failed: {e}")))?;
        let envelope: Envelope<serde_json::Value> = Self::read_envelope(response)
            .await
            .map_err(ReservationError::Gateway)?;

        if envelope.status == ENVELOPE_OK {
            return Ok(CancelOutcome::Refunded);
        }

        // A refusal is only final if the money is still captured.
        let receipt = self
            .receipt(receipt_id, token)
            .await
            .map_err(ReservationError::Gateway)?;
        match receipt.data {
            Some(data) if data.status == RECEIPT_STATUS_CANCELLED => Ok(CancelOutcome::Waived),
            _ => Ok(CancelOutcome::Declined(
                envelope
                    .message
                    .unwrap_or_else(|| format!("cancel refused with status {}", envelope.status)),
            )),
        }
    }
}
