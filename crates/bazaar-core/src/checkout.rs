use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Collection, Document, Filter, InsertResult, UpdateOne, UpdateResult};
use crate::money::to_minor_units;
use crate::traits::{DocumentStore, PaymentGateway, PaymentIntent};

/// Result of recording a payment: the payment insert and the booking update.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PaymentRecord {
    pub result: InsertResult,
    pub booking: UpdateResult,
}

/// Convert `price` into minor units of `currency` and open a payment intent.
pub async fn create_payment_intent<P: PaymentGateway>(
    gateway: &P,
    price: &Value,
    currency: &str,
) -> Result<PaymentIntent, AppError> {
    let amount = to_minor_units(price, currency)?;
    tracing::info!(%amount, %currency, "Creating payment intent");

    let intent = gateway.create_payment_intent(amount, currency).await?;
    tracing::info!(intent_id = %intent.id, "Payment intent created");
    Ok(intent)
}

/// Store `payment` and flag its booking (`bookingId`) as paid, in one atomic write.
///
/// The booking is upserted, so a payment for a booking that was never stored
/// still leaves a `{ paid: true }` record behind under that id.
pub async fn record_payment<S: DocumentStore>(
    store: &S,
    payment: Document,
) -> Result<PaymentRecord, AppError> {
    let booking_id = payment
        .get_str("bookingId")
        .ok_or_else(|| AppError::InvalidInput("bookingId is required".into()))?;
    let booking_id = Uuid::parse_str(booking_id)
        .map_err(|_| AppError::InvalidInput(format!("invalid bookingId: {booking_id}")))?;

    let (result, booking) = store
        .insert_with_update(
            Collection::Payments,
            payment,
            UpdateOne {
                collection: Collection::Bookings,
                filter: Filter::by_id(booking_id),
                patch: Document::new().with("paid", true),
                upsert: true,
            },
        )
        .await?;

    tracing::info!(payment_id = %result.inserted_id, %booking_id, "Payment recorded");
    Ok(PaymentRecord { result, booking })
}
