//! Razorpay gateway client and the trait seam the verification paths use.
//!
//! The confirm and webhook handlers depend on [`PaymentGateway`] rather than
//! the concrete client so they can be exercised without network access.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Outbound gateway calls get a bounded timeout; a timed-out call surfaces
/// as a gateway error the client may retry, never a hang.
const GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Request to create a remote order with the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGatewayOrder {
    /// Amount in minor units (paise)
    pub amount: i64,
    pub currency: String,
    /// 1 = auto-capture on authorization
    pub payment_capture: u8,
    pub notes: serde_json::Value,
}

/// Remote order handle returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Authoritative payment record fetched from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Amount in the gateway's minor-unit convention (paise)
    pub amount: i64,
    pub status: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl GatewayPayment {
    /// Gateway-side status indicating funds have been collected.
    pub fn is_captured(&self) -> bool {
        self.status == "captured"
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a remote order; the returned handle carries the
    /// `gateway_order_id` the client needs to complete checkout.
    async fn create_order(&self, request: &CreateGatewayOrder) -> Result<GatewayOrder>;

    /// Fetch the authoritative record for a payment.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment>;
}

/// Production Razorpay client. Authenticates with HTTP basic auth
/// (key id / key secret) against the v1 REST API.
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(key_id: &str, key_secret: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &CreateGatewayOrder) -> Result<GatewayOrder> {
        let response = self
            .client
            .post(format!("{}/orders", RAZORPAY_API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Order creation failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Order creation rejected: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse order response: {}", e)))
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment> {
        let response = self
            .client
            .get(format!("{}/payments/{}", RAZORPAY_API_BASE, payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Payment fetch failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Payment fetch rejected: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse payment response: {}", e)))
    }
}
