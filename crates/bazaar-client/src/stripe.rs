use std::time::Duration;

use bazaar_core::error::AppError;
use bazaar_core::traits::{PaymentGateway, PaymentIntent};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stripe payment-intent client.
///
/// Talks to the REST API directly with a secret key; `base_url` can point at
/// a stub server in tests.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Result<Self, AppError> {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(secret_key: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(secret_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.secret_key, &self.base_url, timeout)
    }

    fn build(secret_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ---- Stripe API types ----

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull `error.message` out of a Stripe error body, falling back to the raw text.
fn error_message(status_code: u16, body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"))
}

impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        let url = format!("{}/payment_intents", self.base_url);
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_lowercase()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::HttpError(format!("Payment provider unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status_code, &body);
            tracing::warn!(%status_code, %message, "Payment intent rejected");
            return Err(AppError::PaymentError {
                message,
                status_code,
            });
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse payment intent: {e}")))?;

        let client_secret = intent.client_secret.ok_or_else(|| AppError::PaymentError {
            message: format!("payment intent {} has no client secret", intent.id),
            status_code: status.as_u16(),
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }
}
