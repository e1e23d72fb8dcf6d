//! PostgreSQL-backed `IdentityRepository` implementation using Diesel ORM.
//!
//! Staff registration locks the airline row so two concurrent first
//! registrations cannot both become the bootstrap Admin. Agent approval locks
//! the agent row so the flag flip and the work-for insert are reported
//! consistently to concurrent approvers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{IdentityRepository, IdentityRepositoryError};
use crate::domain::{
    AgentApproval, AgentEmail, AirlineName, BookingAgent, BookingAgentId, Customer,
    CustomerEmail, Permission, StaffBootstrap, StaffMember, StaffRegistration, StaffUsername,
};

use super::error_mapping::{
    DieselFailure, classify_diesel_error, map_corrupt_row_with, map_pool_error_with,
};
use super::models::{
    BookingAgentRow, CorruptRow, CustomerRow, PermissionRow, StaffRow, WorkForRow,
    booking_agent_from_rows, staff_member_from_rows,
};
use super::pool::{DbPool, PoolError};
use super::schema::{
    airline, airline_staff, booking_agent, booking_agent_work_for, customer, permission,
};

const WORK_FOR_AGENT_FKEY: &str = "booking_agent_work_for_email_fkey";
const WORK_FOR_AIRLINE_FKEY: &str = "booking_agent_work_for_airline_name_fkey";

/// Diesel-backed store of customers, agents and staff.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdentityRepositoryError {
    map_pool_error_with(error, IdentityRepositoryError::connection)
}

fn map_corrupt_row(error: CorruptRow) -> IdentityRepositoryError {
    map_corrupt_row_with(error, IdentityRepositoryError::query)
}

/// Map Diesel errors, naming `subject` in duplicate errors.
fn map_diesel_error(error: diesel::result::Error, subject: &str) -> IdentityRepositoryError {
    match classify_diesel_error(error, "identity repository") {
        DieselFailure::UniqueViolation { .. } => {
            IdentityRepositoryError::duplicate(subject.to_owned())
        }
        DieselFailure::Connection | DieselFailure::Serialization => {
            IdentityRepositoryError::connection("database connection error")
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            IdentityRepositoryError::query("foreign key violation")
        }
        DieselFailure::Query(message) => IdentityRepositoryError::query(message),
    }
}

fn map_query_error(error: diesel::result::Error) -> IdentityRepositoryError {
    map_diesel_error(error, "account")
}

/// Failure inside a multi-statement transaction.
#[derive(Debug)]
enum TransactionFailure {
    Refused(IdentityRepositoryError),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for TransactionFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl TransactionFailure {
    fn into_port_error(self, subject: &str) -> IdentityRepositoryError {
        match self {
            Self::Refused(error) => error,
            Self::Database(error) => map_diesel_error(error, subject),
        }
    }
}

/// Affiliated airline names keyed by agent email.
async fn load_affiliations(
    conn: &mut AsyncPgConnection,
    emails: Vec<String>,
) -> Result<BTreeMap<String, Vec<String>>, diesel::result::Error> {
    let rows: Vec<WorkForRow> = booking_agent_work_for::table
        .filter(booking_agent_work_for::email.eq_any(emails))
        .select(WorkForRow::as_select())
        .load(conn)
        .await?;
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.email).or_default().push(row.airline_name);
    }
    Ok(grouped)
}

/// Permission labels keyed by staff username.
async fn load_permissions(
    conn: &mut AsyncPgConnection,
    usernames: Vec<String>,
) -> Result<BTreeMap<String, Vec<String>>, diesel::result::Error> {
    let rows: Vec<PermissionRow> = permission::table
        .filter(permission::username.eq_any(usernames))
        .select(PermissionRow::as_select())
        .load(conn)
        .await?;
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.username)
            .or_default()
            .push(row.permission_type);
    }
    Ok(grouped)
}

async fn hydrate_agents(
    conn: &mut AsyncPgConnection,
    rows: Vec<BookingAgentRow>,
) -> Result<Vec<BookingAgent>, IdentityRepositoryError> {
    let emails: Vec<String> = rows.iter().map(|row| row.email.clone()).collect();
    let mut affiliations = load_affiliations(conn, emails)
        .await
        .map_err(map_query_error)?;
    rows.into_iter()
        .map(|row| {
            let airlines = affiliations.remove(&row.email).unwrap_or_default();
            booking_agent_from_rows(row, airlines).map_err(map_corrupt_row)
        })
        .collect()
}

async fn hydrate_staff(
    conn: &mut AsyncPgConnection,
    rows: Vec<StaffRow>,
) -> Result<Vec<StaffMember>, IdentityRepositoryError> {
    let usernames: Vec<String> = rows.iter().map(|row| row.username.clone()).collect();
    let mut permissions = load_permissions(conn, usernames)
        .await
        .map_err(map_query_error)?;
    rows.into_iter()
        .map(|row| {
            let labels = permissions.remove(&row.username).unwrap_or_default();
            staff_member_from_rows(row, labels).map_err(map_corrupt_row)
        })
        .collect()
}

async fn register_staff_locked(
    conn: &mut AsyncPgConnection,
    registration: &StaffRegistration,
) -> Result<StaffMember, TransactionFailure> {
    let locked: Option<String> = airline::table
        .filter(airline::airline_name.eq(registration.airline.as_str()))
        .select(airline::airline_name)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    if locked.is_none() {
        return Err(TransactionFailure::Refused(
            IdentityRepositoryError::unknown_airline(registration.airline.as_str()),
        ));
    }

    let admins: i64 = airline_staff::table
        .inner_join(permission::table)
        .filter(airline_staff::airline_name.eq(registration.airline.as_str()))
        .filter(permission::permission_type.eq(Permission::Admin.as_str()))
        .count()
        .get_result(conn)
        .await?;
    let member = StaffBootstrap::for_airline(admins > 0).apply(registration.clone());

    diesel::insert_into(airline_staff::table)
        .values(&StaffRow::from(&member))
        .execute(conn)
        .await?;
    let grants: Vec<PermissionRow> = member
        .permissions
        .iter()
        .map(|granted| PermissionRow {
            username: member.username.as_str().to_owned(),
            permission_type: granted.as_str().to_owned(),
        })
        .collect();
    if !grants.is_empty() {
        diesel::insert_into(permission::table)
            .values(&grants)
            .execute(conn)
            .await?;
    }
    Ok(member)
}

async fn approve_agent_locked(
    conn: &mut AsyncPgConnection,
    email: &AgentEmail,
    airline_name: &AirlineName,
) -> Result<AgentApproval, TransactionFailure> {
    let approved: Option<bool> = booking_agent::table
        .filter(booking_agent::email.eq(email.as_str()))
        .select(booking_agent::approved)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let Some(approved) = approved else {
        return Err(TransactionFailure::Refused(
            IdentityRepositoryError::agent_not_found(email.as_str()),
        ));
    };

    if !approved {
        diesel::update(booking_agent::table.filter(booking_agent::email.eq(email.as_str())))
            .set(booking_agent::approved.eq(true))
            .execute(conn)
            .await?;
    }

    let inserted = diesel::insert_into(booking_agent_work_for::table)
        .values(&WorkForRow {
            email: email.as_str().to_owned(),
            airline_name: airline_name.as_str().to_owned(),
        })
        .on_conflict_do_nothing()
        .execute(conn)
        .await
        .map_err(|err| affiliation_failure(err, email, airline_name))?;

    Ok(AgentApproval {
        newly_approved: !approved,
        affiliation_added: inserted > 0,
    })
}

fn affiliation_failure(
    error: diesel::result::Error,
    email: &AgentEmail,
    airline_name: &AirlineName,
) -> TransactionFailure {
    let failure = classify_diesel_error(error, "identity repository");
    let refused = if failure.violates(WORK_FOR_AIRLINE_FKEY) {
        IdentityRepositoryError::unknown_airline(airline_name.as_str())
    } else if failure.violates(WORK_FOR_AGENT_FKEY) {
        IdentityRepositoryError::agent_not_found(email.as_str())
    } else {
        match failure {
            DieselFailure::UniqueViolation { .. } => {
                IdentityRepositoryError::already_affiliated(email.as_str(), airline_name.as_str())
            }
            DieselFailure::Connection | DieselFailure::Serialization => {
                IdentityRepositoryError::connection("database connection error")
            }
            DieselFailure::ForeignKeyViolation { .. } => {
                IdentityRepositoryError::query("foreign key violation")
            }
            DieselFailure::Query(message) => IdentityRepositoryError::query(message),
        }
    };
    TransactionFailure::Refused(refused)
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn insert_customer(&self, account: &Customer) -> Result<(), IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(customer::table)
            .values(&CustomerRow::from(account))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, &format!("customer {}", account.email)))
    }

    async fn find_customer(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<Customer>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CustomerRow> = customer::table
            .filter(customer::email.eq(email.as_str()))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(Customer::try_from)
            .transpose()
            .map_err(map_corrupt_row)
    }

    async fn insert_agent(&self, agent: &BookingAgent) -> Result<(), IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affiliations: Vec<WorkForRow> = agent
            .airlines
            .iter()
            .map(|name| WorkForRow {
                email: agent.email.as_str().to_owned(),
                airline_name: name.as_str().to_owned(),
            })
            .collect();
        let row = BookingAgentRow::from(agent);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(booking_agent::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !affiliations.is_empty() {
                    diesel::insert_into(booking_agent_work_for::table)
                        .values(&affiliations)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            map_diesel_error(
                err,
                &format!("booking agent {} (id {})", agent.email, agent.agent_id),
            )
        })
    }

    async fn find_agent(
        &self,
        email: &AgentEmail,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingAgentRow> = booking_agent::table
            .filter(booking_agent::email.eq(email.as_str()))
            .select(BookingAgentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(hydrate_agents(&mut conn, rows).await?.into_iter().next())
    }

    async fn find_agent_by_id(
        &self,
        agent_id: BookingAgentId,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingAgentRow> = booking_agent::table
            .filter(booking_agent::booking_agent_id.eq(agent_id.get()))
            .select(BookingAgentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(hydrate_agents(&mut conn, rows).await?.into_iter().next())
    }

    async fn register_staff(
        &self,
        registration: &StaffRegistration,
    ) -> Result<StaffMember, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let member = conn
            .transaction::<_, TransactionFailure, _>(|conn| {
                async move { register_staff_locked(conn, registration).await }.scope_boxed()
            })
            .await
            .map_err(|failure| {
                failure.into_port_error(&format!("staff {}", registration.username))
            })?;
        debug!(
            username = %member.username,
            airline = %member.airline,
            bootstrap_admin = member.permissions.contains(&Permission::Admin),
            "staff member stored"
        );
        Ok(member)
    }

    async fn find_staff(
        &self,
        username: &StaffUsername,
    ) -> Result<Option<StaffMember>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StaffRow> = airline_staff::table
            .filter(airline_staff::username.eq(username.as_str()))
            .select(StaffRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(hydrate_staff(&mut conn, rows).await?.into_iter().next())
    }

    async fn approve_agent_for_airline(
        &self,
        email: &AgentEmail,
        airline_name: &AirlineName,
    ) -> Result<AgentApproval, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TransactionFailure, _>(|conn| {
            async move { approve_agent_locked(conn, email, airline_name).await }.scope_boxed()
        })
        .await
        .map_err(|failure| failure.into_port_error(&format!("booking agent {email}")))
    }

    async fn approve_staff(
        &self,
        usernames: &[StaffUsername],
        airline_name: &AirlineName,
    ) -> Result<u64, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let names: Vec<&str> = usernames.iter().map(StaffUsername::as_str).collect();
        let updated = diesel::update(
            airline_staff::table
                .filter(airline_staff::username.eq_any(names))
                .filter(airline_staff::airline_name.eq(airline_name.as_str()))
                .filter(airline_staff::approved.eq(false)),
        )
        .set(airline_staff::approved.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(u64::try_from(updated).unwrap_or_default())
    }

    async fn grant_permission(
        &self,
        username: &StaffUsername,
        granted: Permission,
    ) -> Result<bool, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(permission::table)
            .values(&PermissionRow {
                username: username.as_str().to_owned(),
                permission_type: granted.as_str().to_owned(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(inserted > 0)
    }

    async fn add_affiliation(
        &self,
        email: &AgentEmail,
        airline_name: &AirlineName,
    ) -> Result<(), IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(booking_agent_work_for::table)
            .values(&WorkForRow {
                email: email.as_str().to_owned(),
                airline_name: airline_name.as_str().to_owned(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                affiliation_failure(err, email, airline_name).into_port_error("affiliation")
            })
    }

    async fn pending_agents(
        &self,
        airline_name: &AirlineName,
    ) -> Result<Vec<BookingAgent>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affiliated = booking_agent_work_for::table
            .filter(booking_agent_work_for::airline_name.eq(airline_name.as_str()))
            .select(booking_agent_work_for::email);
        let rows: Vec<BookingAgentRow> = booking_agent::table
            .filter(booking_agent::approved.eq(false))
            .filter(diesel::dsl::not(booking_agent::email.eq_any(affiliated)))
            .select(BookingAgentRow::as_select())
            .order(booking_agent::email.asc())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        hydrate_agents(&mut conn, rows).await
    }

    async fn pending_staff(
        &self,
        airline_name: &AirlineName,
    ) -> Result<Vec<StaffMember>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StaffRow> = airline_staff::table
            .filter(airline_staff::airline_name.eq(airline_name.as_str()))
            .filter(airline_staff::approved.eq(false))
            .select(StaffRow::as_select())
            .order(airline_staff::username.asc())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        hydrate_staff(&mut conn, rows).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity error mapping.

    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    fn agent() -> AgentEmail {
        AgentEmail::new("agent@example.com").expect("email")
    }

    fn airline_name() -> AirlineName {
        AirlineName::new("United").expect("airline")
    }

    #[rstest]
    fn unique_violation_is_a_duplicate_registration() {
        let err = map_diesel_error(
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                Box::new("duplicate key".to_owned()),
            ),
            "customer ada@example.com",
        );
        assert_eq!(
            err,
            IdentityRepositoryError::duplicate("customer ada@example.com")
        );
    }

    #[rstest]
    fn duplicate_affiliation_is_reported_as_such() {
        let failure = affiliation_failure(
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                Box::new("duplicate key".to_owned()),
            ),
            &agent(),
            &airline_name(),
        );
        assert_eq!(
            failure.into_port_error("affiliation"),
            IdentityRepositoryError::already_affiliated("agent@example.com", "United")
        );
    }

    #[rstest]
    fn refusals_survive_transaction_mapping() {
        let failure =
            TransactionFailure::Refused(IdentityRepositoryError::unknown_airline("Nowhere Air"));
        assert_eq!(
            failure.into_port_error("staff bob"),
            IdentityRepositoryError::unknown_airline("Nowhere Air")
        );
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(err, IdentityRepositoryError::Connection { .. }));
    }
}
