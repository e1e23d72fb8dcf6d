//! Tickets, purchases, and the seat-capacity decision.
//!
//! Both persistence adapters call [`SeatInventory::check_reservation`] while
//! holding their per-flight serialisation point (a row lock in PostgreSQL, the
//! table mutex in memory). The check and the ticket insert therefore form one
//! unit; the decision itself lives here so the adapters cannot disagree.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::identity::{BookingAgentId, CustomerEmail};
use super::idempotency::{IdempotencyKey, PurchaseFingerprint};
use super::inventory::{FlightKey, FlightStatus, SeatCapacity};

/// Store-assigned, globally unique ticket id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(i64);

impl TicketId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capacity and issued-ticket count of one flight at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInventory {
    pub capacity: SeatCapacity,
    pub issued: i64,
}

/// Why a reservation cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationRefusal {
    FlightCancelled,
    SoldOut,
}

impl SeatInventory {
    pub const fn new(capacity: SeatCapacity, issued: i64) -> Self {
        Self { capacity, issued }
    }

    /// Seats left. Signed so an oversell shows up as a negative number
    /// instead of being clamped away.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::{SeatCapacity, SeatInventory};
    ///
    /// let seats = SeatCapacity::new(2).expect("positive");
    /// assert_eq!(SeatInventory::new(seats, 1).available(), 1);
    /// assert_eq!(SeatInventory::new(seats, 3).available(), -1);
    /// ```
    pub fn available(&self) -> i64 {
        i64::from(self.capacity.get()) - self.issued
    }

    /// Decide whether one more ticket may be issued for a flight in `status`.
    pub fn check_reservation(&self, status: &FlightStatus) -> Result<(), ReservationRefusal> {
        if status.is_cancelled() {
            return Err(ReservationRefusal::FlightCancelled);
        }
        if self.available() <= 0 {
            return Err(ReservationRefusal::SoldOut);
        }
        Ok(())
    }
}

/// A ticket together with its purchase record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub ticket_id: TicketId,
    pub flight: FlightKey,
    pub customer: CustomerEmail,
    pub booking_agent: Option<BookingAgentId>,
    pub purchase_date: NaiveDate,
}

/// Idempotency stamp stored alongside a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseStamp {
    pub key: IdempotencyKey,
    pub fingerprint: PurchaseFingerprint,
}

/// Everything an adapter needs to issue one ticket atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketAllocation {
    pub flight: FlightKey,
    pub customer: CustomerEmail,
    pub booking_agent: Option<BookingAgentId>,
    pub purchase_date: NaiveDate,
    pub stamp: Option<PurchaseStamp>,
}

/// Outcome of an allocation attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "ticketId", rename_all = "snake_case")]
pub enum AllocationOutcome {
    /// A new ticket and purchase were written.
    Issued(TicketId),
    /// The idempotency key matched an earlier identical request.
    Replayed(TicketId),
}

impl AllocationOutcome {
    pub const fn ticket_id(self) -> TicketId {
        match self {
            Self::Issued(id) | Self::Replayed(id) => id,
        }
    }
}
