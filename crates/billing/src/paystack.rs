//! Paystack payment-link client
//!
//! Requests a hosted checkout URL for an invoice. Link creation is best
//! effort: a single attempt is made, and any failure degrades to "no
//! link" so invoice generation is never blocked by the gateway.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{BillingError, BillingResult};

/// Configuration for the Paystack gateway
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Paystack secret API key; link creation is disabled when empty
    pub secret_key: String,
    /// API base URL
    pub base_url: String,
    /// Invoice currency (smallest unit is 1/100 of this)
    pub currency: String,
}

impl PaystackConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            secret_key: std::env::var("PAYSTACK_SECRET_KEY").unwrap_or_default(),
            base_url: std::env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            currency: std::env::var("INVOICE_CURRENCY").unwrap_or_else(|_| "NGN".to_string()),
        }
    }

    /// Check if payment-link creation is enabled
    pub fn is_enabled(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    message: Option<String>,
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

/// Paystack billing client
#[derive(Clone)]
pub struct PaystackClient {
    config: PaystackConfig,
    client: reqwest::Client,
}

impl PaystackClient {
    /// Create a new client from config
    pub fn new(config: PaystackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Self {
        Self::new(PaystackConfig::from_env())
    }

    /// Invoice currency this client charges in
    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Convert a decimal invoice amount to the gateway's smallest unit
    pub fn to_smallest_unit(amount: Decimal) -> i64 {
        (amount * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(0)
    }

    /// Request a hosted payment link for an invoice.
    ///
    /// Returns `Ok(Some(url))` on success and `Ok(None)` when the
    /// gateway is unconfigured or rejects the request; transport
    /// failures surface as `Err` for the caller to degrade on.
    pub async fn create_payment_link(
        &self,
        email: &str,
        amount_smallest_unit: i64,
        metadata: serde_json::Value,
    ) -> BillingResult<Option<String>> {
        if !self.config.is_enabled() {
            tracing::warn!(email = %email, "Paystack not configured, skipping payment link");
            return Ok(None);
        }

        let body = serde_json::json!({
            "email": email,
            "amount": amount_smallest_unit,
            "currency": self.config.currency,
            "metadata": metadata,
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.config.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.config.secret_key),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BillingError::PaymentGateway(format!(
                "transaction initialize returned {}: {}",
                status, text
            )));
        }

        let parsed: InitializeResponse = response.json().await?;
        if !parsed.status {
            return Err(BillingError::PaymentGateway(
                parsed
                    .message
                    .unwrap_or_else(|| "transaction initialize rejected".to_string()),
            ));
        }

        Ok(parsed.data.map(|data| data.authorization_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smallest_unit_conversion() {
        assert_eq!(
            PaystackClient::to_smallest_unit("1250.50".parse().unwrap()),
            125_050
        );
        assert_eq!(PaystackClient::to_smallest_unit(Decimal::ZERO), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_client_returns_no_link() {
        let client = PaystackClient::new(PaystackConfig {
            secret_key: String::new(),
            base_url: "https://api.paystack.co".to_string(),
            currency: "NGN".to_string(),
        });
        let link = client
            .create_payment_link("ada@example.com", 100_000, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(link, None);
    }
}
