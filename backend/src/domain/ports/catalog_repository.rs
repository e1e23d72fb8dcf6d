//! Port for inventory catalog persistence.

use async_trait::async_trait;

use crate::domain::{
    Airline, AirlineName, Airplane, Airport, Flight, FlightKey, FlightSearch, FlightStatus,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog repository adapters.
    pub enum CatalogRepositoryError {
        /// An entity with the same key already exists.
        Duplicate { message: String } => "catalog entry already exists: {message}",
        /// A referenced airline, airplane, or airport is missing.
        UnknownReference { message: String } => "catalog reference missing: {message}",
        /// Repository connection could not be established.
        Connection { message: String } => "catalog repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "catalog repository query failed: {message}",
    }
}

/// Port for reading and writing airlines, airports, airplanes, and flights.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert an airline.
    async fn insert_airline(&self, airline: &Airline) -> Result<(), CatalogRepositoryError>;

    /// Find an airline by name.
    async fn find_airline(
        &self,
        name: &AirlineName,
    ) -> Result<Option<Airline>, CatalogRepositoryError>;

    /// Insert an airport; the name must be unused.
    async fn insert_airport(&self, airport: &Airport) -> Result<(), CatalogRepositoryError>;

    /// Airports whose name or city contains `term`, ordered by name.
    async fn search_airports(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Airport>, CatalogRepositoryError>;

    /// Insert an airplane for an existing airline.
    async fn insert_airplane(&self, airplane: &Airplane) -> Result<(), CatalogRepositoryError>;

    /// Airplanes of one airline ordered by id.
    async fn list_airplanes(
        &self,
        airline: &AirlineName,
    ) -> Result<Vec<Airplane>, CatalogRepositoryError>;

    /// Insert a flight whose airplane and airports exist.
    async fn insert_flight(&self, flight: &Flight) -> Result<(), CatalogRepositoryError>;

    /// Find a flight by key.
    async fn find_flight(&self, key: &FlightKey) -> Result<Option<Flight>, CatalogRepositoryError>;

    /// Overwrite a flight's status. Returns `false` when the flight is missing.
    async fn update_flight_status(
        &self,
        key: &FlightKey,
        status: &FlightStatus,
    ) -> Result<bool, CatalogRepositoryError>;

    /// Flights matching every filter, ordered by departure then key.
    async fn search_flights(
        &self,
        search: &FlightSearch,
    ) -> Result<Vec<Flight>, CatalogRepositoryError>;
}
