use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    AdminId, ApplicationId, ClientId, DecisionRecord, DecisionStatus, Event, EventApplication,
    EventId, HostId, HostProfile, NewApplication, NewEvent, ScheduleWindow, ScheduledAssignment,
    StockKey, TransportationTrip,
};
use super::repository::{
    ApplicationRepository, ConditionalUpdate, EventRepository, HostDirectory, RepositoryError,
    TripRepository, WardrobeRepository,
};

/// Process-local store. Every trait method takes the lock exactly once, so each
/// conditional write is atomic with respect to every other store call.
#[derive(Default)]
pub struct InMemoryStaffingStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    next_event: u64,
    next_application: u64,
    events: BTreeMap<EventId, Event>,
    applications: BTreeMap<ApplicationId, EventApplication>,
    stock: HashMap<StockKey, u32>,
    trips: HashMap<EventId, TransportationTrip>,
    hosts: HashMap<HostId, HostProfile>,
}

impl InMemoryStaffingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Seeds or replaces a host directory entry.
    pub fn upsert_host(&self, profile: HostProfile) -> Result<(), RepositoryError> {
        self.state()?.hosts.insert(profile.id, profile);
        Ok(())
    }
}

impl EventRepository for InMemoryStaffingStore {
    fn insert_event(&self, client: ClientId, draft: NewEvent) -> Result<Event, RepositoryError> {
        let window = ScheduleWindow {
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
        };

        let mut state = self.state()?;
        state.next_event += 1;
        let event = Event {
            id: EventId(state.next_event),
            title: draft.title,
            client_id: client,
            status: DecisionStatus::Pending,
            window,
            hosts_needed: draft.hosts_needed,
            wardrobe_item: draft.wardrobe_item,
            team_leader: None,
            deciding_admin: None,
        };
        state.events.insert(event.id, event.clone());
        Ok(event)
    }

    fn fetch_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(self.state()?.events.get(&id).cloned())
    }

    fn transition_status(
        &self,
        id: EventId,
        expected: DecisionStatus,
        next: DecisionStatus,
        admin: AdminId,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        let mut state = self.state()?;
        let Some(event) = state.events.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if event.status != expected {
            return Ok(ConditionalUpdate::Stale);
        }
        event.status = next;
        event.deciding_admin = Some(admin);
        Ok(ConditionalUpdate::Applied)
    }

    fn set_team_leader(
        &self,
        id: EventId,
        leader: Option<HostId>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let event = state.events.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        event.team_leader = leader;
        Ok(())
    }

    fn restore_team_leader(
        &self,
        id: EventId,
        expected: HostId,
        previous: Option<HostId>,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        let mut state = self.state()?;
        let Some(event) = state.events.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if event.team_leader != Some(expected) {
            return Ok(ConditionalUpdate::Stale);
        }
        event.team_leader = previous;
        Ok(ConditionalUpdate::Applied)
    }

    fn delete_event(&self, id: EventId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.events.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if state.applications.values().any(|app| app.event_id == id) {
            return Err(RepositoryError::Conflict);
        }
        state.events.remove(&id);
        state.trips.remove(&id);
        Ok(())
    }
}

impl ApplicationRepository for InMemoryStaffingStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<EventApplication, RepositoryError> {
        let mut state = self.state()?;
        let duplicate = state
            .applications
            .values()
            .any(|app| app.sender == application.sender && app.event_id == application.event_id);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        state.next_application += 1;
        let record = EventApplication {
            id: ApplicationId(state.next_application),
            sender: application.sender,
            event_id: application.event_id,
            requested_role: application.requested_role,
            assigned_role: None,
            status: DecisionStatus::Pending,
            request_dress: application.request_dress,
            needs_ride: application.needs_ride,
            decided_at: None,
            deciding_admin: None,
        };
        state.applications.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<EventApplication>, RepositoryError> {
        Ok(self.state()?.applications.get(&id).cloned())
    }

    fn record_decision(
        &self,
        id: ApplicationId,
        decision: DecisionRecord,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        let mut state = self.state()?;
        let Some(app) = state.applications.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if app.status != DecisionStatus::Pending {
            return Ok(ConditionalUpdate::Stale);
        }
        app.status = decision.status;
        app.assigned_role = decision.assigned_role;
        app.decided_at = Some(decision.decided_at);
        app.deciding_admin = Some(decision.deciding_admin);
        Ok(ConditionalUpdate::Applied)
    }

    fn revert_to_pending(&self, id: ApplicationId) -> Result<ConditionalUpdate, RepositoryError> {
        let mut state = self.state()?;
        let Some(app) = state.applications.get_mut(&id) else {
            return Ok(ConditionalUpdate::Missing);
        };
        if app.status != DecisionStatus::Accepted {
            return Ok(ConditionalUpdate::Stale);
        }
        app.status = DecisionStatus::Pending;
        app.assigned_role = None;
        app.decided_at = None;
        app.deciding_admin = None;
        Ok(ConditionalUpdate::Applied)
    }

    fn accepted_assignments(
        &self,
        host: HostId,
    ) -> Result<Vec<ScheduledAssignment>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .values()
            .filter(|app| app.sender == host && app.status == DecisionStatus::Accepted)
            .filter_map(|app| {
                state.events.get(&app.event_id).map(|event| ScheduledAssignment {
                    application_id: app.id,
                    event_id: event.id,
                    title: event.title.clone(),
                    window: event.window,
                })
            })
            .collect())
    }

    fn applications_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventApplication>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .values()
            .filter(|app| app.event_id == event)
            .cloned()
            .collect())
    }
}

impl WardrobeRepository for InMemoryStaffingStore {
    fn decrement_if_available(&self, key: &StockKey) -> Result<bool, RepositoryError> {
        let mut state = self.state()?;
        match state.stock.get_mut(key) {
            Some(quantity) if *quantity > 0 => {
                *quantity -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn increment(&self, key: &StockKey) -> Result<u32, RepositoryError> {
        let mut state = self.state()?;
        let quantity = state.stock.entry(key.clone()).or_insert(0);
        *quantity = quantity.saturating_add(1);
        Ok(*quantity)
    }

    fn quantity(&self, key: &StockKey) -> Result<Option<u32>, RepositoryError> {
        Ok(self.state()?.stock.get(key).copied())
    }

    fn set_quantity(&self, key: &StockKey, quantity: u32) -> Result<(), RepositoryError> {
        self.state()?.stock.insert(key.clone(), quantity);
        Ok(())
    }
}

impl TripRepository for InMemoryStaffingStore {
    fn trip_for_event(
        &self,
        event: EventId,
    ) -> Result<Option<TransportationTrip>, RepositoryError> {
        Ok(self.state()?.trips.get(&event).cloned())
    }

    fn upsert_trip(&self, trip: TransportationTrip) -> Result<(), RepositoryError> {
        self.state()?.trips.insert(trip.event_id, trip);
        Ok(())
    }
}

impl HostDirectory for InMemoryStaffingStore {
    fn host_profile(&self, host: HostId) -> Result<Option<HostProfile>, RepositoryError> {
        Ok(self.state()?.hosts.get(&host).cloned())
    }
}
