use bazaar_client::StripeGateway;
use bazaar_core::TokenIssuer;
use bazaar_db::Database;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub tokens: TokenIssuer,
    /// `None` disables the payment-intent endpoint.
    pub payments: Option<StripeGateway>,
    /// Lowercase ISO currency code charged for payment intents.
    pub currency: String,
}
