//! Driving port for booking reads.

use async_trait::async_trait;

use crate::domain::{ActorContext, Error, Flight, FlightKey};

/// Driving port for seat availability and customer itineraries.
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Seats left on a flight: capacity minus issued tickets.
    async fn available_seats(&self, flight: &FlightKey) -> Result<i64, Error>;

    /// Flights the acting customer holds tickets for. With `upcoming_only`
    /// set, flights that already departed are left out.
    async fn customer_flights(
        &self,
        actor: &ActorContext,
        upcoming_only: bool,
    ) -> Result<Vec<Flight>, Error>;
}
