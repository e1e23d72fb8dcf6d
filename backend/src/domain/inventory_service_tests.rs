//! Tests for the inventory catalog service.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{CatalogRepositoryError, MockCatalogRepository};
use crate::domain::{ApprovalState, FlightNumber, Permission};
use crate::test_support::fixtures::{
    admin_actor, airline, airplane_id, airport, customer_actor, flight_key, staff_actor,
};
use crate::test_support::{MutableClock, reference_now};

#[fixture]
fn catalog() -> MockCatalogRepository {
    MockCatalogRepository::new()
}

fn make_service(catalog: MockCatalogRepository) -> InventoryService<MockCatalogRepository> {
    InventoryService::new(
        Arc::new(catalog),
        Arc::new(MutableClock::new(reference_now())),
    )
}

fn flight_request() -> CreateFlightRequest {
    CreateFlightRequest {
        flight_num: FlightNumber::new("101").expect("flight number"),
        departure_airport: airport("JFK"),
        departure_time: reference_now() + Duration::days(1),
        arrival_airport: airport("LAX"),
        arrival_time: reference_now() + Duration::days(1) + Duration::hours(6),
        price: 320,
        airplane_id: airplane_id(1),
    }
}

#[rstest]
#[tokio::test]
async fn admin_creates_upcoming_flight_for_own_airline(mut catalog: MockCatalogRepository) {
    catalog
        .expect_insert_flight()
        .withf(|flight| {
            flight.airline() == &airline("AA") && flight.status() == &FlightStatus::Upcoming
        })
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(catalog);
    let flight = service
        .create_flight(&admin_actor("bob", "AA"), flight_request())
        .await
        .expect("flight created");

    assert_eq!(flight.key(), &flight_key("AA", "101"));
}

#[rstest]
#[tokio::test]
async fn create_flight_rejects_inverted_times(mut catalog: MockCatalogRepository) {
    catalog.expect_insert_flight().times(0);
    let mut request = flight_request();
    request.arrival_time = request.departure_time - Duration::minutes(5);

    let service = make_service(catalog);
    let err = service
        .create_flight(&admin_actor("bob", "AA"), request)
        .await
        .expect_err("arrival before departure");

    assert_eq!(err.code(), ErrorCode::InvalidTimeRange);
}

#[rstest]
#[tokio::test]
async fn create_flight_rejects_negative_price(mut catalog: MockCatalogRepository) {
    catalog.expect_insert_flight().times(0);
    let mut request = flight_request();
    request.price = -1;

    let service = make_service(catalog);
    let err = service
        .create_flight(&admin_actor("bob", "AA"), request)
        .await
        .expect_err("negative price");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(staff_actor("op", "AA", ApprovalState::Approved, [Permission::Operator]), ErrorCode::NotAdmin)]
#[case(staff_actor("new", "AA", ApprovalState::Pending, [Permission::Admin]), ErrorCode::PermissionDenied)]
#[case(customer_actor("ada@example.com"), ErrorCode::PermissionDenied)]
#[tokio::test]
async fn create_flight_requires_approved_admin(
    mut catalog: MockCatalogRepository,
    #[case] actor: ActorContext,
    #[case] expected: ErrorCode,
) {
    catalog.expect_insert_flight().times(0);

    let service = make_service(catalog);
    let err = service
        .create_flight(&actor, flight_request())
        .await
        .expect_err("not an approved admin");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn unknown_airplane_is_an_invalid_reference(mut catalog: MockCatalogRepository) {
    catalog
        .expect_insert_flight()
        .times(1)
        .return_once(|_| Err(CatalogRepositoryError::unknown_reference("airplane AA/1")));

    let service = make_service(catalog);
    let err = service
        .create_flight(&admin_actor("bob", "AA"), flight_request())
        .await
        .expect_err("airplane missing");

    assert_eq!(err.code(), ErrorCode::InvalidReference);
}

#[rstest]
#[case(0)]
#[case(-4)]
#[tokio::test]
async fn create_airplane_rejects_non_positive_seats(
    mut catalog: MockCatalogRepository,
    #[case] seats: i32,
) {
    catalog.expect_insert_airplane().times(0);

    let service = make_service(catalog);
    let err = service
        .create_airplane(
            &admin_actor("bob", "AA"),
            CreateAirplaneRequest {
                airplane_id: 1,
                seats,
            },
        )
        .await
        .expect_err("seats must be positive");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn create_airplane_targets_admin_airline(mut catalog: MockCatalogRepository) {
    catalog
        .expect_insert_airplane()
        .withf(|plane| plane.airline == airline("AA") && plane.seats.get() == 180)
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(catalog);
    let plane = service
        .create_airplane(
            &admin_actor("bob", "AA"),
            CreateAirplaneRequest {
                airplane_id: 3,
                seats: 180,
            },
        )
        .await
        .expect("airplane created");

    assert_eq!(plane.airplane_id, airplane_id(3));
}

#[rstest]
#[tokio::test]
async fn duplicate_airport_is_a_conflict(mut catalog: MockCatalogRepository) {
    catalog
        .expect_insert_airport()
        .times(1)
        .return_once(|_| Err(CatalogRepositoryError::duplicate("airport JFK")));

    let service = make_service(catalog);
    let err = service
        .create_airport(
            &admin_actor("bob", "AA"),
            CreateAirportRequest {
                name: "JFK".to_owned(),
                city: "New York".to_owned(),
            },
        )
        .await
        .expect_err("duplicate airport");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn operator_changes_status_of_own_airline(mut catalog: MockCatalogRepository) {
    catalog
        .expect_update_flight_status()
        .withf(|key, status| key == &flight_key("AA", "101") && status.is_cancelled())
        .times(1)
        .return_once(|_, _| Ok(true));

    let service = make_service(catalog);
    let operator = staff_actor("op", "AA", ApprovalState::Approved, [Permission::Operator]);
    service
        .change_flight_status(&operator, &flight_key("AA", "101"), FlightStatus::Cancelled)
        .await
        .expect("status changed");
}

#[rstest]
#[case(staff_actor("op", "Delta", ApprovalState::Approved, [Permission::Operator]))]
#[case(staff_actor("op", "AA", ApprovalState::Approved, Vec::<Permission>::new()))]
#[case(staff_actor("op", "AA", ApprovalState::Pending, [Permission::Operator]))]
#[tokio::test]
async fn status_change_requires_operator_of_airline(
    mut catalog: MockCatalogRepository,
    #[case] actor: ActorContext,
) {
    catalog.expect_update_flight_status().times(0);

    let service = make_service(catalog);
    let err = service
        .change_flight_status(&actor, &flight_key("AA", "101"), FlightStatus::Delayed)
        .await
        .expect_err("not an operator of AA");

    assert_eq!(err.code(), ErrorCode::PermissionDenied);
}

#[rstest]
#[tokio::test]
async fn status_change_of_missing_flight_is_not_found(mut catalog: MockCatalogRepository) {
    catalog
        .expect_update_flight_status()
        .times(1)
        .return_once(|_, _| Ok(false));

    let service = make_service(catalog);
    let err = service
        .change_flight_status(
            &admin_actor("bob", "AA"),
            &flight_key("AA", "404"),
            FlightStatus::Delayed,
        )
        .await
        .expect_err("flight missing");

    assert_eq!(err.code(), ErrorCode::FlightNotFound);
}

#[rstest]
#[tokio::test]
async fn customer_search_excludes_cancelled_and_past(mut catalog: MockCatalogRepository) {
    catalog
        .expect_search_flights()
        .withf(|search| {
            !search.include_cancelled
                && search.departing_after == Some(reference_now())
                && search.source.as_deref() == Some("york")
        })
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let service = make_service(catalog);
    let flights = service
        .search_flights(SearchFlightsRequest {
            source: Some("york".to_owned()),
            ..SearchFlightsRequest::default()
        })
        .await
        .expect("search succeeds");

    assert!(flights.is_empty());
}

#[rstest]
#[tokio::test]
async fn inverted_date_range_finds_nothing(mut catalog: MockCatalogRepository) {
    catalog.expect_search_flights().times(0);

    let service = make_service(catalog);
    let flights = service
        .search_flights(SearchFlightsRequest {
            start_date: NaiveDate::from_ymd_opt(2026, 3, 5),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..SearchFlightsRequest::default()
        })
        .await
        .expect("inverted range is not an error");

    assert!(flights.is_empty());
}

#[rstest]
#[tokio::test]
async fn staff_listing_rejects_inverted_date_range(mut catalog: MockCatalogRepository) {
    catalog.expect_search_flights().times(0);

    let service = make_service(catalog);
    let staff = staff_actor("kim", "AA", ApprovalState::Approved, Vec::<Permission>::new());
    let err = service
        .list_airline_flights(
            &staff,
            SearchFlightsRequest {
                start_date: NaiveDate::from_ymd_opt(2026, 3, 10),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                ..SearchFlightsRequest::default()
            },
        )
        .await
        .expect_err("start after end");

    assert_eq!(err.code(), ErrorCode::InvalidTimeRange);
}

#[rstest]
#[tokio::test]
async fn staff_listing_is_scoped_to_own_airline(mut catalog: MockCatalogRepository) {
    catalog
        .expect_search_flights()
        .withf(|search| {
            search.include_cancelled
                && search.departing_after.is_none()
                && search.airline == Some(airline("AA"))
        })
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let service = make_service(catalog);
    let staff = staff_actor("kim", "AA", ApprovalState::Approved, Vec::<Permission>::new());
    service
        .list_airline_flights(&staff, SearchFlightsRequest::default())
        .await
        .expect("listing succeeds");
}

#[rstest]
#[tokio::test]
async fn flight_status_needs_a_filter(mut catalog: MockCatalogRepository) {
    catalog.expect_search_flights().times(0);

    let service = make_service(catalog);
    let err = service
        .flight_status(FlightStatusRequest::default())
        .await
        .expect_err("empty lookup");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn flight_status_uses_single_day_window(mut catalog: MockCatalogRepository) {
    let day = NaiveDate::from_ymd_opt(2026, 3, 4);
    catalog
        .expect_search_flights()
        .withf(move |search| {
            search.include_cancelled && search.start_date == day && search.end_date == day
        })
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let service = make_service(catalog);
    service
        .flight_status(FlightStatusRequest {
            date: day,
            ..FlightStatusRequest::default()
        })
        .await
        .expect("lookup succeeds");
}

#[rstest]
#[tokio::test]
async fn airport_search_is_capped(mut catalog: MockCatalogRepository) {
    catalog
        .expect_search_airports()
        .withf(|term, limit| term == "york" && *limit == AIRPORT_SEARCH_LIMIT)
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));

    let service = make_service(catalog);
    service
        .search_airports("  york ")
        .await
        .expect("search succeeds");
}

#[rstest]
#[tokio::test]
async fn blank_airport_term_skips_the_store(mut catalog: MockCatalogRepository) {
    catalog.expect_search_airports().times(0);

    let service = make_service(catalog);
    let airports = service.search_airports("   ").await.expect("blank term");

    assert!(airports.is_empty());
}

#[rstest]
#[tokio::test]
async fn airplanes_are_listed_for_staff_airline(mut catalog: MockCatalogRepository) {
    catalog
        .expect_list_airplanes()
        .withf(|name| name == &airline("AA"))
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let service = make_service(catalog);
    let staff = staff_actor("kim", "AA", ApprovalState::Approved, Vec::<Permission>::new());
    service
        .list_airplanes(&staff)
        .await
        .expect("listing succeeds");
}
