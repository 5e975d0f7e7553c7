use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::staffing::domain::{
    AdminId, ApplicationId, ApplicationSubmission, ClientId, ClothingItemId, DecisionRecord,
    DecisionStatus, Event, EventApplication, EventId, HostId, HostProfile, NewApplication,
    NewEvent, ScheduledAssignment, StockKey, TransportationTrip,
};
use crate::workflows::staffing::repository::{
    ApplicationRepository, ConditionalUpdate, EventRepository, HostDirectory, RepositoryError,
    TripRepository, WardrobeRepository,
};
use crate::workflows::staffing::{
    staffing_router, InMemoryStaffingStore, Principal, StaffingEngine, DEFAULT_DOWNGRADE_RATIO,
};

pub(super) const ADMIN: Principal = Principal::admin(900);
pub(super) const CLIENT: Principal = Principal::client(500);
pub(super) const DRESS: ClothingItemId = ClothingItemId(7);

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn draft(title: &str, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        starts_at,
        ends_at,
        hosts_needed: 10,
        wardrobe_item: None,
    }
}

pub(super) fn submission(role: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        requested_role: role.to_string(),
        request_dress: false,
        needs_ride: false,
    }
}

pub(super) struct Fixture<S = InMemoryStaffingStore> {
    pub(super) engine: Arc<StaffingEngine<S>>,
    pub(super) store: Arc<S>,
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStaffingStore::new());
    Fixture {
        engine: Arc::new(StaffingEngine::new(store.clone(), DEFAULT_DOWNGRADE_RATIO)),
        store,
    }
}

impl Fixture {
    pub(super) fn host(&self, id: u64, size: Option<&str>) -> HostId {
        self.store
            .upsert_host(HostProfile {
                id: HostId(id),
                name: format!("Host {id}"),
                clothing_size: size.map(str::to_string),
            })
            .expect("seed host");
        HostId(id)
    }

    pub(super) fn router(&self) -> axum::Router {
        staffing_router(self.engine.clone())
    }
}

impl<S> Fixture<S>
where
    S: crate::workflows::staffing::StaffingStore + 'static,
{
    /// Registers and approves an event so hosts can apply.
    pub(super) fn open_event(&self, draft: NewEvent) -> Event {
        let event = self
            .engine
            .events
            .register(&CLIENT, draft)
            .expect("register event");
        self.engine
            .events
            .approve(&ADMIN, event.id)
            .expect("approve event")
    }

    pub(super) fn apply(
        &self,
        host: HostId,
        event: EventId,
        submission: ApplicationSubmission,
    ) -> EventApplication {
        self.engine
            .applications
            .submit(&Principal::host(host.0), host, event, submission)
            .expect("submit application")
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Runs once inside the store, just before the next stock decrement.
pub(super) type StockHook = Box<dyn FnOnce(&InMemoryStaffingStore) + Send>;

/// Delegates to the in-memory store, with two ways to disturb the stock table: report it as
/// unreachable, or run a hook right before a reservation touches it.
#[derive(Default)]
pub(super) struct InterceptingStore {
    pub(super) inner: InMemoryStaffingStore,
    stock_offline: bool,
    before_decrement: Mutex<Option<StockHook>>,
}

impl InterceptingStore {
    pub(super) fn before_next_decrement(&self, hook: StockHook) {
        *self.before_decrement.lock().expect("hook mutex poisoned") = Some(hook);
    }

    fn stock_reachable(&self) -> Result<(), RepositoryError> {
        if self.stock_offline {
            return Err(RepositoryError::Unavailable(
                "stock table offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl EventRepository for InterceptingStore {
    fn insert_event(&self, client: ClientId, draft: NewEvent) -> Result<Event, RepositoryError> {
        self.inner.insert_event(client, draft)
    }

    fn fetch_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        self.inner.fetch_event(id)
    }

    fn transition_status(
        &self,
        id: EventId,
        expected: DecisionStatus,
        next: DecisionStatus,
        admin: AdminId,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        self.inner.transition_status(id, expected, next, admin)
    }

    fn set_team_leader(
        &self,
        id: EventId,
        leader: Option<HostId>,
    ) -> Result<(), RepositoryError> {
        self.inner.set_team_leader(id, leader)
    }

    fn restore_team_leader(
        &self,
        id: EventId,
        expected: HostId,
        previous: Option<HostId>,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        self.inner.restore_team_leader(id, expected, previous)
    }

    fn delete_event(&self, id: EventId) -> Result<(), RepositoryError> {
        self.inner.delete_event(id)
    }
}

impl ApplicationRepository for InterceptingStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<EventApplication, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<EventApplication>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn record_decision(
        &self,
        id: ApplicationId,
        decision: DecisionRecord,
    ) -> Result<ConditionalUpdate, RepositoryError> {
        self.inner.record_decision(id, decision)
    }

    fn revert_to_pending(&self, id: ApplicationId) -> Result<ConditionalUpdate, RepositoryError> {
        self.inner.revert_to_pending(id)
    }

    fn accepted_assignments(
        &self,
        host: HostId,
    ) -> Result<Vec<ScheduledAssignment>, RepositoryError> {
        self.inner.accepted_assignments(host)
    }

    fn applications_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventApplication>, RepositoryError> {
        self.inner.applications_for_event(event)
    }
}

impl WardrobeRepository for InterceptingStore {
    fn decrement_if_available(&self, key: &StockKey) -> Result<bool, RepositoryError> {
        self.stock_reachable()?;
        let hook = self
            .before_decrement
            .lock()
            .expect("hook mutex poisoned")
            .take();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
        self.inner.decrement_if_available(key)
    }

    fn increment(&self, key: &StockKey) -> Result<u32, RepositoryError> {
        self.stock_reachable()?;
        self.inner.increment(key)
    }

    fn quantity(&self, key: &StockKey) -> Result<Option<u32>, RepositoryError> {
        self.stock_reachable()?;
        self.inner.quantity(key)
    }

    fn set_quantity(&self, key: &StockKey, quantity: u32) -> Result<(), RepositoryError> {
        self.stock_reachable()?;
        self.inner.set_quantity(key, quantity)
    }
}

impl TripRepository for InterceptingStore {
    fn trip_for_event(
        &self,
        event: EventId,
    ) -> Result<Option<TransportationTrip>, RepositoryError> {
        self.inner.trip_for_event(event)
    }

    fn upsert_trip(&self, trip: TransportationTrip) -> Result<(), RepositoryError> {
        self.inner.upsert_trip(trip)
    }
}

impl HostDirectory for InterceptingStore {
    fn host_profile(&self, host: HostId) -> Result<Option<HostProfile>, RepositoryError> {
        self.inner.host_profile(host)
    }
}

fn intercepting_fixture(store: InterceptingStore) -> Fixture<InterceptingStore> {
    let store = Arc::new(store);
    Fixture {
        engine: Arc::new(StaffingEngine::new(store.clone(), DEFAULT_DOWNGRADE_RATIO)),
        store,
    }
}

/// Every stock call fails as if the table were unreachable.
pub(super) fn outage_fixture() -> Fixture<InterceptingStore> {
    intercepting_fixture(InterceptingStore {
        stock_offline: true,
        ..InterceptingStore::default()
    })
}

/// Healthy store whose next stock decrement can be preceded by a hook.
pub(super) fn interleaving_fixture() -> Fixture<InterceptingStore> {
    intercepting_fixture(InterceptingStore::default())
}

impl Fixture<InterceptingStore> {
    pub(super) fn host(&self, id: u64, size: Option<&str>) -> HostId {
        self.store
            .inner
            .upsert_host(HostProfile {
                id: HostId(id),
                name: format!("Host {id}"),
                clothing_size: size.map(str::to_string),
            })
            .expect("seed host");
        HostId(id)
    }
}
