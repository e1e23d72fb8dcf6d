//! Driving port for catalog mutations by airline staff.
//!
//! Flights and airplanes are always created for the acting Admin's own
//! airline; the request does not name one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActorContext, AirplaneId, AirportName, Airplane, Airport, Error, Flight, FlightKey,
    FlightNumber, FlightStatus,
};

/// Fields of a new flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlightRequest {
    pub flight_num: FlightNumber,
    pub departure_airport: AirportName,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: AirportName,
    pub arrival_time: DateTime<Utc>,
    pub price: i64,
    pub airplane_id: AirplaneId,
}

/// Fields of a new airplane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAirplaneRequest {
    pub airplane_id: i32,
    pub seats: i32,
}

/// Fields of a new airport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAirportRequest {
    pub name: String,
    pub city: String,
}

/// Driving port for catalog writes.
#[async_trait]
pub trait InventoryCommand: Send + Sync {
    /// Create a flight with status `Upcoming`. Requires Admin.
    async fn create_flight(
        &self,
        actor: &ActorContext,
        request: CreateFlightRequest,
    ) -> Result<Flight, Error>;

    /// Create an airplane with a positive seat count. Requires Admin.
    async fn create_airplane(
        &self,
        actor: &ActorContext,
        request: CreateAirplaneRequest,
    ) -> Result<Airplane, Error>;

    /// Create an airport with a unique name. Requires Admin.
    async fn create_airport(
        &self,
        actor: &ActorContext,
        request: CreateAirportRequest,
    ) -> Result<Airport, Error>;

    /// Set any status on a flight. Requires Operator or Admin of its airline.
    async fn change_flight_status(
        &self,
        actor: &ActorContext,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<(), Error>;
}
