//! Driving port for catalog reads.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActorContext, AirlineName, Airplane, Airport, Error, Flight, FlightNumber,
};

/// Route and date filters shared by customer and staff flight listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFlightsRequest {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Public status lookup. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightStatusRequest {
    pub airline: Option<AirlineName>,
    pub flight_num: Option<FlightNumber>,
    pub date: Option<NaiveDate>,
}

/// Driving port for catalog reads.
#[async_trait]
pub trait InventoryQuery: Send + Sync {
    /// Customer-facing search: never returns cancelled or departed flights.
    async fn search_flights(&self, request: SearchFlightsRequest) -> Result<Vec<Flight>, Error>;

    /// Staff view of their own airline's flights, past and cancelled included.
    async fn list_airline_flights(
        &self,
        actor: &ActorContext,
        request: SearchFlightsRequest,
    ) -> Result<Vec<Flight>, Error>;

    /// Status lookup by airline, flight number, and departure date.
    async fn flight_status(&self, request: FlightStatusRequest) -> Result<Vec<Flight>, Error>;

    /// Airports whose name or city contains `term`.
    async fn search_airports(&self, term: &str) -> Result<Vec<Airport>, Error>;

    /// Airplanes of the acting staff member's airline.
    async fn list_airplanes(&self, actor: &ActorContext) -> Result<Vec<Airplane>, Error>;
}
