use super::domain::{
    AdminId, ApplicationId, ClientId, DecisionRecord, DecisionStatus, Event, EventApplication, EventId,
    HostId, HostProfile, NewApplication, NewEvent, ScheduledAssignment, StockKey,
    TransportationTrip,
};

/// Result of a compare-and-set write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalUpdate {
    /// The row matched the expected prior state and was written.
    Applied,
    /// The row exists but no longer matches the expected prior state.
    Stale,
    /// No row with that key.
    Missing,
}

impl ConditionalUpdate {
    pub fn applied(self) -> bool {
        matches!(self, ConditionalUpdate::Applied)
    }
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Event rows. Status changes go through [`EventRepository::transition_status`] only.
pub trait EventRepository: Send + Sync {
    fn insert_event(&self, client: ClientId, draft: NewEvent) -> Result<Event, RepositoryError>;
    fn fetch_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError>;
    /// `UPDATE events SET status = next, deciding_admin = admin WHERE id = ? AND status = expected`
    fn transition_status(
        &self,
        id: EventId,
        expected: DecisionStatus,
        next: DecisionStatus,
        admin: AdminId,
    ) -> Result<ConditionalUpdate, RepositoryError>;
    fn set_team_leader(&self, id: EventId, leader: Option<HostId>)
        -> Result<(), RepositoryError>;
    /// `UPDATE events SET team_leader = previous WHERE id = ? AND team_leader = expected`
    fn restore_team_leader(
        &self,
        id: EventId,
        expected: HostId,
        previous: Option<HostId>,
    ) -> Result<ConditionalUpdate, RepositoryError>;
    /// Deletes the event unless applications still reference it, in which case
    /// `RepositoryError::Conflict` is returned.
    fn delete_event(&self, id: EventId) -> Result<(), RepositoryError>;
}

/// Application rows, unique per (sender, event).
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `RepositoryError::Conflict` when the host already applied to the event.
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<EventApplication, RepositoryError>;
    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<EventApplication>, RepositoryError>;
    /// Writes the decision only while the application is still pending.
    fn record_decision(
        &self,
        id: ApplicationId,
        decision: DecisionRecord,
    ) -> Result<ConditionalUpdate, RepositoryError>;
    /// Compensation: puts an accepted application back to pending and clears its decision fields.
    fn revert_to_pending(&self, id: ApplicationId) -> Result<ConditionalUpdate, RepositoryError>;
    /// Accepted applications of `host` joined to their events' windows.
    fn accepted_assignments(
        &self,
        host: HostId,
    ) -> Result<Vec<ScheduledAssignment>, RepositoryError>;
    fn applications_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventApplication>, RepositoryError>;
}

/// Stock rows per (item, size).
pub trait WardrobeRepository: Send + Sync {
    /// `UPDATE stock SET quantity = quantity - 1 WHERE item = ? AND size = ? AND quantity > 0`;
    /// returns whether a row was decremented.
    fn decrement_if_available(&self, key: &StockKey) -> Result<bool, RepositoryError>;
    /// Upserts the row starting from zero; returns the new quantity.
    fn increment(&self, key: &StockKey) -> Result<u32, RepositoryError>;
    fn quantity(&self, key: &StockKey) -> Result<Option<u32>, RepositoryError>;
    fn set_quantity(&self, key: &StockKey, quantity: u32) -> Result<(), RepositoryError>;
}

/// Transportation planning records, at most one per event.
pub trait TripRepository: Send + Sync {
    fn trip_for_event(&self, event: EventId)
        -> Result<Option<TransportationTrip>, RepositoryError>;
    fn upsert_trip(&self, trip: TransportationTrip) -> Result<(), RepositoryError>;
}

/// Read access to the host directory collaborator.
pub trait HostDirectory: Send + Sync {
    fn host_profile(&self, host: HostId) -> Result<Option<HostProfile>, RepositoryError>;
}

/// Everything the staffing engine needs from persistence.
pub trait StaffingStore:
    EventRepository + ApplicationRepository + WardrobeRepository + TripRepository + HostDirectory
{
}

impl<T> StaffingStore for T where
    T: EventRepository
        + ApplicationRepository
        + WardrobeRepository
        + TripRepository
        + HostDirectory
{
}
