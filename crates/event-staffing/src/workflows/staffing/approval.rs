use std::sync::Arc;

use tracing::{debug, info};

use super::authorization::Principal;
use super::domain::{DecisionOutcome, DecisionStatus, Event, EventId, NewEvent, ScheduleWindow};
use super::error::{ConflictReason, StaffingError};
use super::repository::{ConditionalUpdate, EventRepository, RepositoryError};

/// Admits client events into the "open for applications" state.
pub struct EventApprovalGate<E> {
    events: Arc<E>,
}

impl<E> EventApprovalGate<E>
where
    E: EventRepository + 'static,
{
    pub fn new(events: Arc<E>) -> Self {
        Self { events }
    }

    /// File a new event on behalf of a client; it starts out pending.
    pub fn register(&self, principal: &Principal, draft: NewEvent) -> Result<Event, StaffingError> {
        let client = principal.require_client()?;

        if draft.title.trim().is_empty() {
            return Err(StaffingError::validation("event title must not be empty"));
        }
        if ScheduleWindow::new(draft.starts_at, draft.ends_at).is_none() {
            return Err(StaffingError::validation(
                "event must start before it ends",
            ));
        }
        if draft.hosts_needed == 0 {
            return Err(StaffingError::validation(
                "an event needs at least one host",
            ));
        }

        let event = self.events.insert_event(client, draft)?;
        info!(event_id = %event.id, client_id = %client, "event registered");
        Ok(event)
    }

    pub fn approve(&self, principal: &Principal, event_id: EventId) -> Result<Event, StaffingError> {
        self.decide(principal, event_id, DecisionOutcome::Accepted)
    }

    pub fn reject(&self, principal: &Principal, event_id: EventId) -> Result<Event, StaffingError> {
        self.decide(principal, event_id, DecisionOutcome::Rejected)
    }

    /// Single conditional update on `status = pending`; concurrent callers get exactly one winner.
    fn decide(
        &self,
        principal: &Principal,
        event_id: EventId,
        outcome: DecisionOutcome,
    ) -> Result<Event, StaffingError> {
        let admin = principal.require_admin()?;
        let next = outcome.status();

        match self
            .events
            .transition_status(event_id, DecisionStatus::Pending, next, admin)?
        {
            ConditionalUpdate::Applied => {
                info!(event_id = %event_id, admin_id = %admin, status = %next, "event decided");
                self.get(event_id)
            }
            ConditionalUpdate::Stale => {
                debug!(event_id = %event_id, "event already decided");
                Err(ConflictReason::AlreadyProcessed.into())
            }
            ConditionalUpdate::Missing => Err(StaffingError::not_found(format!("event {event_id}"))),
        }
    }

    pub fn get(&self, event_id: EventId) -> Result<Event, StaffingError> {
        self.events
            .fetch_event(event_id)?
            .ok_or_else(|| StaffingError::not_found(format!("event {event_id}")))
    }

    /// Delete an event; refused while any application references it.
    pub fn remove(&self, principal: &Principal, event_id: EventId) -> Result<(), StaffingError> {
        let event = self.get(event_id)?;
        principal.require_admin_or_owner(&event)?;

        match self.events.delete_event(event_id) {
            Ok(()) => {
                info!(event_id = %event_id, "event removed");
                Ok(())
            }
            Err(RepositoryError::Conflict) => Err(ConflictReason::EventHasDependents.into()),
            Err(RepositoryError::NotFound) => {
                Err(StaffingError::not_found(format!("event {event_id}")))
            }
            Err(other) => Err(other.into()),
        }
    }
}
