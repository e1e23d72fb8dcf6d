//! PostgreSQL-backed `CatalogRepository` implementation using Diesel ORM.
//!
//! Airports are matched with `ILIKE` on name or city; user terms are escaped
//! so `%` and `_` match literally.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{CatalogRepository, CatalogRepositoryError};
use crate::domain::{
    Airline, AirlineName, Airplane, Airport, Flight, FlightKey, FlightSearch, FlightStatus,
};

use super::error_mapping::{
    DieselFailure, classify_diesel_error, map_corrupt_row_with, map_pool_error_with,
};
use super::models::{AirlineRow, AirplaneRow, AirportRow, FlightRow};
use super::pool::{DbPool, PoolError};
use super::schema::{airline, airplane, airport, flight};

/// Diesel-backed catalog of airlines, airports, airplanes and flights.
#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogRepositoryError {
    map_pool_error_with(error, CatalogRepositoryError::connection)
}

/// Map Diesel errors, naming `subject` in duplicate and reference errors.
fn map_diesel_error(error: diesel::result::Error, subject: &str) -> CatalogRepositoryError {
    match classify_diesel_error(error, "catalog repository") {
        DieselFailure::UniqueViolation { .. } => {
            CatalogRepositoryError::duplicate(subject.to_owned())
        }
        DieselFailure::ForeignKeyViolation { constraint } => {
            if constraint.is_none() {
                warn!(subject, "foreign key violation without constraint name");
            }
            CatalogRepositoryError::unknown_reference(format!(
                "{subject} references a missing {}",
                referenced_entity(constraint.as_deref())
            ))
        }
        DieselFailure::Connection | DieselFailure::Serialization => {
            CatalogRepositoryError::connection("database connection error")
        }
        DieselFailure::Query(message) => CatalogRepositoryError::query(message),
    }
}

fn referenced_entity(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("flight_airplane_fkey") => "airplane",
        Some(name) if name.contains("airport") => "airport",
        Some(name) if name.contains("airline") => "airline",
        _ => "record",
    }
}

fn map_query_error(error: diesel::result::Error) -> CatalogRepositoryError {
    map_diesel_error(error, "catalog entry")
}

/// Build a case-insensitive substring pattern with LIKE metacharacters
/// escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn rows_to_flights(rows: Vec<FlightRow>) -> Result<Vec<Flight>, CatalogRepositoryError> {
    rows.into_iter()
        .map(|row| {
            Flight::try_from(row).map_err(|err| map_corrupt_row_with(err, CatalogRepositoryError::query))
        })
        .collect()
}

#[async_trait]
impl CatalogRepository for DieselCatalogRepository {
    async fn insert_airline(&self, entry: &Airline) -> Result<(), CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(airline::table)
            .values(&AirlineRow {
                airline_name: entry.name.as_str().to_owned(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, &format!("airline {}", entry.name)))
    }

    async fn find_airline(
        &self,
        name: &AirlineName,
    ) -> Result<Option<Airline>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: Option<String> = airline::table
            .filter(airline::airline_name.eq(name.as_str()))
            .select(airline::airline_name)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(found.map(|_| Airline { name: name.clone() }))
    }

    async fn insert_airport(&self, entry: &Airport) -> Result<(), CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(airport::table)
            .values(&AirportRow::from(entry))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, &format!("airport {}", entry.name)))
    }

    async fn search_airports(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Airport>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = contains_pattern(term);
        let rows: Vec<AirportRow> = airport::table
            .filter(
                airport::airport_name
                    .ilike(pattern.as_str())
                    .or(airport::airport_city.ilike(pattern.as_str())),
            )
            .select(AirportRow::as_select())
            .order(airport::airport_name.asc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter()
            .map(|row| {
                Airport::try_from(row)
                    .map_err(|err| map_corrupt_row_with(err, CatalogRepositoryError::query))
            })
            .collect()
    }

    async fn insert_airplane(&self, entry: &Airplane) -> Result<(), CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(airplane::table)
            .values(&AirplaneRow::from(entry))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_diesel_error(
                    err,
                    &format!("airplane {} of {}", entry.airplane_id, entry.airline),
                )
            })
    }

    async fn list_airplanes(
        &self,
        owner: &AirlineName,
    ) -> Result<Vec<Airplane>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AirplaneRow> = airplane::table
            .filter(airplane::airline_name.eq(owner.as_str()))
            .select(AirplaneRow::as_select())
            .order(airplane::airplane_id.asc())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter()
            .map(|row| {
                Airplane::try_from(row)
                    .map_err(|err| map_corrupt_row_with(err, CatalogRepositoryError::query))
            })
            .collect()
    }

    async fn insert_flight(&self, entry: &Flight) -> Result<(), CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(flight::table)
            .values(&FlightRow::from(entry))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, &format!("flight {}", entry.key())))
    }

    async fn find_flight(&self, key: &FlightKey) -> Result<Option<Flight>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FlightRow> = flight::table
            .filter(flight::airline_name.eq(key.airline.as_str()))
            .filter(flight::flight_num.eq(key.flight_num.as_str()))
            .select(FlightRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(Flight::try_from)
            .transpose()
            .map_err(|err| map_corrupt_row_with(err, CatalogRepositoryError::query))
    }

    async fn update_flight_status(
        &self,
        key: &FlightKey,
        status: &FlightStatus,
    ) -> Result<bool, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            flight::table
                .filter(flight::airline_name.eq(key.airline.as_str()))
                .filter(flight::flight_num.eq(key.flight_num.as_str())),
        )
        .set(flight::status.eq(status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(updated > 0)
    }

    async fn search_flights(
        &self,
        search: &FlightSearch,
    ) -> Result<Vec<Flight>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = flight::table.select(FlightRow::as_select()).into_boxed();
        if !search.include_cancelled {
            query = query.filter(flight::status.ne(FlightStatus::Cancelled.as_str()));
        }
        if let Some(name) = &search.airline {
            query = query.filter(flight::airline_name.eq(name.as_str().to_owned()));
        }
        if let Some(number) = &search.flight_num {
            query = query.filter(flight::flight_num.eq(number.as_str().to_owned()));
        }
        if let Some(term) = search.source_term() {
            let pattern = contains_pattern(term);
            query = query.filter(
                flight::departure_airport.eq_any(
                    airport::table
                        .filter(
                            airport::airport_name
                                .ilike(pattern.clone())
                                .or(airport::airport_city.ilike(pattern)),
                        )
                        .select(airport::airport_name),
                ),
            );
        }
        if let Some(term) = search.destination_term() {
            let pattern = contains_pattern(term);
            query = query.filter(
                flight::arrival_airport.eq_any(
                    airport::table
                        .filter(
                            airport::airport_name
                                .ilike(pattern.clone())
                                .or(airport::airport_city.ilike(pattern)),
                        )
                        .select(airport::airport_name),
                ),
            );
        }
        let (lower, upper) = search.departure_window();
        if let Some(lower) = lower {
            query = query.filter(flight::departure_time.ge(lower));
        }
        if let Some(upper) = upper {
            query = query.filter(flight::departure_time.lt(upper));
        }

        let rows: Vec<FlightRow> = query
            .order((
                flight::departure_time.asc(),
                flight::airline_name.asc(),
                flight::flight_num.asc(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows_to_flights(rows)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for catalog error mapping and pattern escaping.

    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("york", "%york%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("c:\\", "%c:\\\\%")]
    fn patterns_escape_like_metacharacters(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(term), expected);
    }

    #[rstest]
    fn unique_violation_names_the_entry() {
        let err = map_diesel_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                Box::new("duplicate key".to_owned()),
            ),
            "airport JFK",
        );
        assert_eq!(err, CatalogRepositoryError::duplicate("airport JFK"));
    }

    #[rstest]
    fn foreign_key_violation_is_an_unknown_reference() {
        let err = map_diesel_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                Box::new("fk".to_owned()),
            ),
            "flight AA/1",
        );
        assert!(matches!(err, CatalogRepositoryError::UnknownReference { .. }));
        assert!(err.to_string().contains("flight AA/1"));
    }

    #[rstest]
    #[case(Some("flight_airplane_fkey"), "airplane")]
    #[case(Some("flight_departure_airport_fkey"), "airport")]
    #[case(Some("airplane_airline_name_fkey"), "airline")]
    #[case(None, "record")]
    fn constraint_names_identify_the_missing_entity(
        #[case] constraint: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(referenced_entity(constraint), expected);
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::build("bad url"));
        assert!(matches!(err, CatalogRepositoryError::Connection { .. }));
    }
}
