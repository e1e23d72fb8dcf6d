//! Inventory catalog service.
//!
//! Catalog writes are restricted to approved Admins and always target the
//! Admin's own airline. Status changes additionally admit Operators. Reads
//! are public except for the staff views of their own airline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::info;

use crate::domain::authorization::{require_admin, require_flight_operator, require_staff};
use crate::domain::ports::{
    CatalogRepository, CreateAirplaneRequest, CreateAirportRequest, CreateFlightRequest,
    FlightStatusRequest, InventoryCommand, InventoryQuery, SearchFlightsRequest,
};
use crate::domain::store_errors::map_catalog_error;
use crate::domain::{
    AIRPORT_SEARCH_LIMIT, ActorContext, Airplane, AirplaneId, Airport, Error, ErrorCode, Flight,
    FlightDraft, FlightKey, FlightSearch, FlightStatus, InventoryValidationError, SeatCapacity,
};

/// Catalog service implementing [`InventoryCommand`] and [`InventoryQuery`].
#[derive(Clone)]
pub struct InventoryService<C> {
    catalog: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<C> InventoryService<C> {
    /// Create a catalog service over the given repository.
    pub fn new(catalog: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }
}

fn map_validation_error(error: InventoryValidationError) -> Error {
    match error {
        InventoryValidationError::InvalidTimeRange => {
            Error::new(ErrorCode::InvalidTimeRange, error.to_string())
        }
        other => Error::invalid_request(other.to_string()),
    }
}

fn inverted_range(request: &SearchFlightsRequest) -> Option<(NaiveDate, NaiveDate)> {
    match (request.start_date, request.end_date) {
        (Some(start), Some(end)) if start > end => Some((start, end)),
        _ => None,
    }
}

fn check_date_order(request: &SearchFlightsRequest) -> Result<(), Error> {
    match inverted_range(request) {
        Some((start, end)) => Err(Error::new(
            ErrorCode::InvalidTimeRange,
            format!("start date {start} is after end date {end}"),
        )),
        None => Ok(()),
    }
}

impl<C> InventoryService<C>
where
    C: CatalogRepository,
{
    async fn run_search(&self, search: FlightSearch) -> Result<Vec<Flight>, Error> {
        self.catalog
            .search_flights(&search)
            .await
            .map_err(map_catalog_error)
    }
}

#[async_trait]
impl<C> InventoryCommand for InventoryService<C>
where
    C: CatalogRepository,
{
    async fn create_flight(
        &self,
        actor: &ActorContext,
        request: CreateFlightRequest,
    ) -> Result<Flight, Error> {
        let grant = require_admin(actor)?;
        let flight = Flight::new(FlightDraft {
            key: FlightKey::new(grant.airline.clone(), request.flight_num),
            departure_airport: request.departure_airport,
            departure_time: request.departure_time,
            arrival_airport: request.arrival_airport,
            arrival_time: request.arrival_time,
            price: request.price,
            status: FlightStatus::Upcoming,
            airplane_id: request.airplane_id,
        })
        .map_err(map_validation_error)?;

        self.catalog
            .insert_flight(&flight)
            .await
            .map_err(map_catalog_error)?;
        info!(flight = %flight.key(), admin = %grant.username, "flight created");
        Ok(flight)
    }

    async fn create_airplane(
        &self,
        actor: &ActorContext,
        request: CreateAirplaneRequest,
    ) -> Result<Airplane, Error> {
        let grant = require_admin(actor)?;
        let airplane = Airplane {
            airline: grant.airline.clone(),
            airplane_id: AirplaneId::new(request.airplane_id).map_err(map_validation_error)?,
            seats: SeatCapacity::new(request.seats).map_err(map_validation_error)?,
        };
        self.catalog
            .insert_airplane(&airplane)
            .await
            .map_err(map_catalog_error)?;
        info!(
            airline = %airplane.airline,
            airplane_id = airplane.airplane_id.get(),
            seats = airplane.seats.get(),
            "airplane created"
        );
        Ok(airplane)
    }

    async fn create_airport(
        &self,
        actor: &ActorContext,
        request: CreateAirportRequest,
    ) -> Result<Airport, Error> {
        require_admin(actor)?;
        let airport = Airport::new(request.name, request.city).map_err(map_validation_error)?;
        self.catalog
            .insert_airport(&airport)
            .await
            .map_err(map_catalog_error)?;
        info!(airport = %airport.name, "airport created");
        Ok(airport)
    }

    async fn change_flight_status(
        &self,
        actor: &ActorContext,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<(), Error> {
        let operator = require_flight_operator(actor, &flight.airline)?;
        let updated = self
            .catalog
            .update_flight_status(flight, &status)
            .await
            .map_err(map_catalog_error)?;
        if !updated {
            return Err(Error::new(
                ErrorCode::FlightNotFound,
                format!("flight {flight} not found"),
            ));
        }
        info!(%flight, status = %status, operator = %operator, "flight status changed");
        Ok(())
    }
}

#[async_trait]
impl<C> InventoryQuery for InventoryService<C>
where
    C: CatalogRepository,
{
    async fn search_flights(&self, request: SearchFlightsRequest) -> Result<Vec<Flight>, Error> {
        // No day satisfies both bounds.
        if inverted_range(&request).is_some() {
            return Ok(Vec::new());
        }
        self.run_search(FlightSearch {
            source: request.source,
            destination: request.destination,
            start_date: request.start_date,
            end_date: request.end_date,
            departing_after: Some(self.clock.utc()),
            include_cancelled: false,
            ..FlightSearch::default()
        })
        .await
    }

    async fn list_airline_flights(
        &self,
        actor: &ActorContext,
        request: SearchFlightsRequest,
    ) -> Result<Vec<Flight>, Error> {
        let airline = require_staff(actor)?;
        check_date_order(&request)?;
        self.run_search(FlightSearch {
            airline: Some(airline.clone()),
            source: request.source,
            destination: request.destination,
            start_date: request.start_date,
            end_date: request.end_date,
            include_cancelled: true,
            ..FlightSearch::default()
        })
        .await
    }

    async fn flight_status(&self, request: FlightStatusRequest) -> Result<Vec<Flight>, Error> {
        if request.airline.is_none() && request.flight_num.is_none() && request.date.is_none() {
            return Err(Error::invalid_request(
                "flight status lookup needs an airline, flight number, or date",
            ));
        }
        self.run_search(FlightSearch {
            airline: request.airline,
            flight_num: request.flight_num,
            start_date: request.date,
            end_date: request.date,
            include_cancelled: true,
            ..FlightSearch::default()
        })
        .await
    }

    async fn search_airports(&self, term: &str) -> Result<Vec<Airport>, Error> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.catalog
            .search_airports(term, AIRPORT_SEARCH_LIMIT)
            .await
            .map_err(map_catalog_error)
    }

    async fn list_airplanes(&self, actor: &ActorContext) -> Result<Vec<Airplane>, Error> {
        let airline = require_staff(actor)?;
        self.catalog
            .list_airplanes(airline)
            .await
            .map_err(map_catalog_error)
    }
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
