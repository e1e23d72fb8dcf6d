//! `CatalogRepository` over the in-memory tables.

use std::collections::btree_map::Entry;

use async_trait::async_trait;

use crate::domain::ports::{CatalogRepository, CatalogRepositoryError};
use crate::domain::{
    Airline, AirlineName, Airplane, Airport, Flight, FlightKey, FlightSearch, FlightStatus,
};

use super::{InMemoryStore, Tables};

fn check_flight_references(tables: &Tables, flight: &Flight) -> Result<(), CatalogRepositoryError> {
    let key = flight.key();
    if !tables.airlines.contains(flight.airline()) {
        return Err(CatalogRepositoryError::unknown_reference(format!(
            "flight {key} references a missing airline"
        )));
    }
    for endpoint in [flight.departure_airport(), flight.arrival_airport()] {
        if !tables.airports.contains_key(endpoint) {
            return Err(CatalogRepositoryError::unknown_reference(format!(
                "flight {key} references a missing airport"
            )));
        }
    }
    if !tables
        .airplanes
        .contains_key(&(flight.airline().clone(), flight.airplane_id()))
    {
        return Err(CatalogRepositoryError::unknown_reference(format!(
            "flight {key} references a missing airplane"
        )));
    }
    Ok(())
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn insert_airline(&self, entry: &Airline) -> Result<(), CatalogRepositoryError> {
        let mut tables = self.lock().map_err(CatalogRepositoryError::query)?;
        if !tables.airlines.insert(entry.name.clone()) {
            return Err(CatalogRepositoryError::duplicate(format!(
                "airline {}",
                entry.name
            )));
        }
        Ok(())
    }

    async fn find_airline(
        &self,
        name: &AirlineName,
    ) -> Result<Option<Airline>, CatalogRepositoryError> {
        let tables = self.lock().map_err(CatalogRepositoryError::query)?;
        Ok(tables
            .airlines
            .get(name)
            .map(|found| Airline { name: found.clone() }))
    }

    async fn insert_airport(&self, entry: &Airport) -> Result<(), CatalogRepositoryError> {
        let mut tables = self.lock().map_err(CatalogRepositoryError::query)?;
        match tables.airports.entry(entry.name.clone()) {
            Entry::Occupied(_) => Err(CatalogRepositoryError::duplicate(format!(
                "airport {}",
                entry.name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(())
            }
        }
    }

    async fn search_airports(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Airport>, CatalogRepositoryError> {
        let tables = self.lock().map_err(CatalogRepositoryError::query)?;
        Ok(tables
            .airports
            .values()
            .filter(|candidate| candidate.matches_term(term))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_airplane(&self, entry: &Airplane) -> Result<(), CatalogRepositoryError> {
        let mut tables = self.lock().map_err(CatalogRepositoryError::query)?;
        let subject = format!("airplane {} of {}", entry.airplane_id, entry.airline);
        if !tables.airlines.contains(&entry.airline) {
            return Err(CatalogRepositoryError::unknown_reference(format!(
                "{subject} references a missing airline"
            )));
        }
        match tables
            .airplanes
            .entry((entry.airline.clone(), entry.airplane_id))
        {
            Entry::Occupied(_) => Err(CatalogRepositoryError::duplicate(subject)),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(())
            }
        }
    }

    async fn list_airplanes(
        &self,
        owner: &AirlineName,
    ) -> Result<Vec<Airplane>, CatalogRepositoryError> {
        let tables = self.lock().map_err(CatalogRepositoryError::query)?;
        Ok(tables
            .airplanes
            .values()
            .filter(|plane| &plane.airline == owner)
            .cloned()
            .collect())
    }

    async fn insert_flight(&self, entry: &Flight) -> Result<(), CatalogRepositoryError> {
        let mut tables = self.lock().map_err(CatalogRepositoryError::query)?;
        check_flight_references(&tables, entry)?;
        match tables.flights.entry(entry.key().clone()) {
            Entry::Occupied(_) => Err(CatalogRepositoryError::duplicate(format!(
                "flight {}",
                entry.key()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(())
            }
        }
    }

    async fn find_flight(&self, key: &FlightKey) -> Result<Option<Flight>, CatalogRepositoryError> {
        let tables = self.lock().map_err(CatalogRepositoryError::query)?;
        Ok(tables.flights.get(key).cloned())
    }

    async fn update_flight_status(
        &self,
        key: &FlightKey,
        status: &FlightStatus,
    ) -> Result<bool, CatalogRepositoryError> {
        let mut tables = self.lock().map_err(CatalogRepositoryError::query)?;
        let Some(current) = tables.flights.remove(key) else {
            return Ok(false);
        };
        tables
            .flights
            .insert(key.clone(), current.with_status(status.clone()));
        Ok(true)
    }

    async fn search_flights(
        &self,
        search: &FlightSearch,
    ) -> Result<Vec<Flight>, CatalogRepositoryError> {
        let tables = self.lock().map_err(CatalogRepositoryError::query)?;
        let mut found = Vec::new();
        for candidate in tables.flights.values() {
            let (Some(departure), Some(arrival)) = (
                tables.airports.get(candidate.departure_airport()),
                tables.airports.get(candidate.arrival_airport()),
            ) else {
                return Err(CatalogRepositoryError::query(format!(
                    "flight {} references a missing airport",
                    candidate.key()
                )));
            };
            if search.matches(candidate, departure, arrival) {
                found.push(candidate.clone());
            }
        }
        found.sort_by(|a, b| {
            a.departure_time()
                .cmp(&b.departure_time())
                .then_with(|| a.key().cmp(b.key()))
        });
        Ok(found)
    }
}
