//! End-to-end staffing scenarios driven through the public engine facade.

use std::sync::{Arc, Barrier};

use chrono::{DateTime, TimeZone, Utc};

use event_staffing::workflows::staffing::{
    ApplicationSubmission, ClothingItemId, ConflictReason, DecisionOutcome, DecisionRequest,
    DecisionStatus, HostId, HostProfile, InMemoryStaffingStore, NewEvent, Principal,
    StaffingEngine, StaffingError, StockKey, WardrobeRepository, DEFAULT_DOWNGRADE_RATIO,
};

const ADMIN: Principal = Principal::admin(1);
const CLIENT: Principal = Principal::client(2);

fn june(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn engine() -> (Arc<StaffingEngine<InMemoryStaffingStore>>, Arc<InMemoryStaffingStore>) {
    let store = Arc::new(InMemoryStaffingStore::new());
    let engine = Arc::new(StaffingEngine::new(store.clone(), DEFAULT_DOWNGRADE_RATIO));
    (engine, store)
}

fn open_event(
    engine: &StaffingEngine<InMemoryStaffingStore>,
    title: &str,
    window: (DateTime<Utc>, DateTime<Utc>),
    wardrobe_item: Option<ClothingItemId>,
) -> event_staffing::workflows::staffing::Event {
    let event = engine
        .events
        .register(
            &CLIENT,
            NewEvent {
                title: title.to_string(),
                starts_at: window.0,
                ends_at: window.1,
                hosts_needed: 10,
                wardrobe_item,
            },
        )
        .expect("register");
    engine.events.approve(&ADMIN, event.id).expect("approve")
}

fn seed_host(store: &InMemoryStaffingStore, id: u64, size: &str) -> HostId {
    store
        .upsert_host(HostProfile {
            id: HostId(id),
            name: format!("Host {id}"),
            clothing_size: Some(size.to_string()),
        })
        .expect("seed host");
    HostId(id)
}

fn apply(
    engine: &StaffingEngine<InMemoryStaffingStore>,
    host: HostId,
    event: &event_staffing::workflows::staffing::Event,
    request_dress: bool,
    needs_ride: bool,
) -> event_staffing::workflows::staffing::EventApplication {
    engine
        .applications
        .submit(
            &Principal::host(host.0),
            host,
            event.id,
            ApplicationSubmission {
                requested_role: "host".to_string(),
                request_dress,
                needs_ride,
            },
        )
        .expect("submit")
}

fn accept() -> DecisionRequest {
    DecisionRequest {
        outcome: DecisionOutcome::Accepted,
        assigned_role: None,
    }
}

#[test]
fn double_booking_is_refused_with_the_conflicting_event() {
    let (engine, store) = engine();
    let host = seed_host(&store, 10, "M");
    let event_a = open_event(&engine, "Event A", (june(1, 10), june(1, 18)), None);
    let event_b = open_event(&engine, "Event B", (june(1, 12), june(1, 20)), None);

    let first = apply(&engine, host, &event_a, false, false);
    engine
        .applications
        .decide(&ADMIN, first.id, accept())
        .expect("accept A");

    let second = apply(&engine, host, &event_b, false, false);
    match engine.applications.decide(&ADMIN, second.id, accept()) {
        Err(StaffingError::Conflict(ConflictReason::ScheduleOverlap { overlapping })) => {
            let titles: Vec<_> = overlapping.iter().map(|a| a.title.as_str()).collect();
            assert_eq!(titles, vec!["Event A"]);
        }
        other => panic!("expected overlap conflict, got {other:?}"),
    }
}

#[test]
fn last_dress_goes_to_exactly_one_of_two_concurrent_accepts() {
    let (engine, store) = engine();
    let item = ClothingItemId(7);
    let event = open_event(&engine, "Gala", (june(3, 18), june(3, 23)), Some(item));
    let key = StockKey::new(item, "M");
    store.set_quantity(&key, 1).expect("seed stock");

    let applications = [
        apply(&engine, seed_host(&store, 1, "M"), &event, true, false),
        apply(&engine, seed_host(&store, 2, "M"), &event, true, false),
    ];
    let barrier = Barrier::new(applications.len());

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = applications
            .iter()
            .map(|application| {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.applications.decide(&ADMIN, application.id, accept())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|o| matches!(
        o,
        Err(StaffingError::Conflict(ConflictReason::InsufficientStock { .. }))
    )));
    assert_eq!(store.quantity(&key).expect("quantity"), Some(0));

    let statuses: Vec<_> = applications
        .iter()
        .map(|application| {
            engine
                .applications
                .get(application.id)
                .expect("stored")
                .status
        })
        .collect();
    assert!(statuses.contains(&DecisionStatus::Accepted));
    assert!(statuses.contains(&DecisionStatus::Pending));
}

#[test]
fn transport_summary_suggests_downgrade_for_light_demand() {
    let (engine, store) = engine();
    let event = open_event(&engine, "Marathon", (june(8, 5), june(8, 15)), None);

    for id in 1..=5 {
        let application = apply(&engine, seed_host(&store, id, "S"), &event, false, true);
        engine
            .applications
            .decide(&ADMIN, application.id, accept())
            .expect("accept rider");
    }

    let summary = engine
        .transport
        .compute_summary(event.id, 10)
        .expect("summary");
    assert_eq!(summary.actual_needed_seats, 5);
    assert!(summary.downgrade_suggested);
}
