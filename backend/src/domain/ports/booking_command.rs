//! Driving port for ticket purchases.
//!
//! The purchasing actor is passed explicitly. A customer buys for themself; an
//! approved booking agent buys on a customer's behalf and is recorded on the
//! purchase for commission attribution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{ActorContext, CustomerEmail, Error, FlightKey, TicketId};

/// Request to buy one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTicketRequest {
    pub flight: FlightKey,
    pub customer: CustomerEmail,
    /// Client-chosen key making retries of this purchase safe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Result of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTicketResponse {
    pub ticket_id: TicketId,
    /// `true` when an earlier identical request already issued this ticket.
    pub replayed: bool,
}

/// Driving port for ticket purchases.
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Allocate one ticket and record its purchase.
    ///
    /// Fails with `FlightNotFound`, `FlightCancelled`, `SoldOut`,
    /// `CustomerNotFound`, `AgentNotAuthorizedForAirline`,
    /// `PermissionDenied`, `AllocationConflict`, or `IdempotencyConflict`.
    async fn purchase_ticket(
        &self,
        actor: &ActorContext,
        request: PurchaseTicketRequest,
    ) -> Result<PurchaseTicketResponse, Error>;
}
