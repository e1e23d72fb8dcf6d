//! `IdentityRepository` over the in-memory tables.

use std::collections::btree_map::Entry;

use async_trait::async_trait;

use crate::domain::ports::{IdentityRepository, IdentityRepositoryError};
use crate::domain::{
    AgentApproval, AgentEmail, AirlineName, ApprovalState, BookingAgent, BookingAgentId,
    Customer, CustomerEmail, Permission, StaffBootstrap, StaffMember, StaffRegistration,
    StaffUsername,
};

use super::{InMemoryStore, Tables};

fn require_airline(tables: &Tables, airline: &AirlineName) -> Result<(), IdentityRepositoryError> {
    if tables.airlines.contains(airline) {
        Ok(())
    } else {
        Err(IdentityRepositoryError::unknown_airline(airline.as_str()))
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn insert_customer(&self, account: &Customer) -> Result<(), IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        match tables.customers.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(IdentityRepositoryError::duplicate(format!(
                "customer {}",
                account.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(())
            }
        }
    }

    async fn find_customer(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<Customer>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables.customers.get(email).cloned())
    }

    async fn insert_agent(&self, agent: &BookingAgent) -> Result<(), IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        let id_taken = tables
            .agents
            .values()
            .any(|existing| existing.agent_id == agent.agent_id);
        if id_taken || tables.agents.contains_key(&agent.email) {
            return Err(IdentityRepositoryError::duplicate(format!(
                "booking agent {} (id {})",
                agent.email, agent.agent_id
            )));
        }
        for airline in &agent.airlines {
            require_airline(&tables, airline)?;
        }
        tables.agents.insert(agent.email.clone(), agent.clone());
        Ok(())
    }

    async fn find_agent(
        &self,
        email: &AgentEmail,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables.agents.get(email).cloned())
    }

    async fn find_agent_by_id(
        &self,
        agent_id: BookingAgentId,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables
            .agents
            .values()
            .find(|agent| agent.agent_id == agent_id)
            .cloned())
    }

    async fn register_staff(
        &self,
        registration: &StaffRegistration,
    ) -> Result<StaffMember, IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        require_airline(&tables, &registration.airline)?;
        if tables.staff.contains_key(&registration.username) {
            return Err(IdentityRepositoryError::duplicate(format!(
                "staff {}",
                registration.username
            )));
        }
        let admin_exists = tables.staff.values().any(|member| {
            member.airline == registration.airline && member.permissions.contains(&Permission::Admin)
        });
        let member = StaffBootstrap::for_airline(admin_exists).apply(registration.clone());
        tables
            .staff
            .insert(member.username.clone(), member.clone());
        Ok(member)
    }

    async fn find_staff(
        &self,
        username: &StaffUsername,
    ) -> Result<Option<StaffMember>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables.staff.get(username).cloned())
    }

    async fn approve_agent_for_airline(
        &self,
        email: &AgentEmail,
        airline: &AirlineName,
    ) -> Result<AgentApproval, IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        require_airline(&tables, airline)?;
        let agent = tables
            .agents
            .get_mut(email)
            .ok_or_else(|| IdentityRepositoryError::agent_not_found(email.as_str()))?;
        let newly_approved = !agent.approval.is_approved();
        agent.approval = ApprovalState::Approved;
        let affiliation_added = agent.airlines.insert(airline.clone());
        Ok(AgentApproval {
            newly_approved,
            affiliation_added,
        })
    }

    async fn approve_staff(
        &self,
        usernames: &[StaffUsername],
        airline: &AirlineName,
    ) -> Result<u64, IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        let mut approved = 0_u64;
        for username in usernames {
            if let Some(member) = tables.staff.get_mut(username)
                && &member.airline == airline
                && !member.approval.is_approved()
            {
                member.approval = ApprovalState::Approved;
                approved += 1;
            }
        }
        Ok(approved)
    }

    async fn grant_permission(
        &self,
        username: &StaffUsername,
        permission: Permission,
    ) -> Result<bool, IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        let member = tables.staff.get_mut(username).ok_or_else(|| {
            IdentityRepositoryError::query(format!("staff {username} does not exist"))
        })?;
        Ok(member.permissions.insert(permission))
    }

    async fn add_affiliation(
        &self,
        email: &AgentEmail,
        airline: &AirlineName,
    ) -> Result<(), IdentityRepositoryError> {
        let mut tables = self.lock().map_err(IdentityRepositoryError::query)?;
        require_airline(&tables, airline)?;
        let agent = tables
            .agents
            .get_mut(email)
            .ok_or_else(|| IdentityRepositoryError::agent_not_found(email.as_str()))?;
        if agent.airlines.insert(airline.clone()) {
            Ok(())
        } else {
            Err(IdentityRepositoryError::already_affiliated(
                email.as_str(),
                airline.as_str(),
            ))
        }
    }

    async fn pending_agents(
        &self,
        airline: &AirlineName,
    ) -> Result<Vec<BookingAgent>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables
            .agents
            .values()
            .filter(|agent| !agent.approval.is_approved() && !agent.works_for(airline))
            .cloned()
            .collect())
    }

    async fn pending_staff(
        &self,
        airline: &AirlineName,
    ) -> Result<Vec<StaffMember>, IdentityRepositoryError> {
        let tables = self.lock().map_err(IdentityRepositoryError::query)?;
        Ok(tables
            .staff
            .values()
            .filter(|member| &member.airline == airline && !member.approval.is_approved())
            .cloned()
            .collect())
    }
}
