use crate::infra::in_memory_engine;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use event_staffing::config::TransportConfig;
use event_staffing::error::AppError;
use event_staffing::workflows::staffing::{
    ApplicationSubmission, ClothingItemId, DecisionOutcome, DecisionRequest, Event,
    EventApplication, HostId, HostProfile, InMemoryStaffingStore, NewEvent, Principal,
    StaffingEngine, StaffingError,
};

const ADMIN: Principal = Principal::admin(1);
const CLIENT: Principal = Principal::client(100);
const DRESS: ClothingItemId = ClothingItemId(7);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the demo events take place (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) day: Option<NaiveDate>,
    /// Units of the event dress in size M before the stock scenario.
    #[arg(long, default_value_t = 1)]
    pub(crate) dress_stock: u32,
    /// Worst-case seats used for the transportation summary.
    #[arg(long, default_value_t = 10)]
    pub(crate) worst_case_seats: u32,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let day = args.day.unwrap_or_else(|| Utc::now().date_naive());
    let (engine, store) = in_memory_engine(TransportConfig::default());
    let midnight = day.and_time(NaiveTime::MIN).and_utc();
    let at = |hour: i64| -> DateTime<Utc> { midnight + Duration::hours(hour) };

    for (id, size) in [(1, "M"), (2, "M"), (3, "L"), (4, "S"), (5, "S"), (6, "M")] {
        store
            .upsert_host(HostProfile {
                id: HostId(id),
                name: format!("Host {id}"),
                clothing_size: Some(size.to_string()),
            })
            .map_err(StaffingError::from)?;
    }

    println!("Event staffing demo ({day})");

    println!("\nDouble-booking check");
    let event_a = open_event(&engine, "Event A", at(10), at(18), None)?;
    let event_b = open_event(&engine, "Event B", at(12), at(20), None)?;
    let first = apply(&engine, HostId(1), &event_a, false, false)?;
    report("accept host 1 for Event A", decide(&engine, &first));
    let second = apply(&engine, HostId(1), &event_b, false, false)?;
    report("accept host 1 for Event B", decide(&engine, &second));

    println!("\nWardrobe stock");
    let gala = open_event(&engine, "Gala", at(30), at(34), Some(DRESS))?;
    engine
        .wardrobe
        .restock(&ADMIN, DRESS, "M", args.dress_stock)?;
    println!("- stock for item {DRESS} size M: {}", args.dress_stock);
    let dressed = [
        apply(&engine, HostId(2), &gala, true, false)?,
        apply(&engine, HostId(6), &gala, true, false)?,
    ];
    for application in &dressed {
        report(
            &format!("accept host {} with dress", application.sender),
            decide(&engine, application),
        );
    }
    println!(
        "- remaining stock: {}",
        engine
            .wardrobe
            .quantity(DRESS, "M")
            .map_err(StaffingError::from)?
    );

    println!("\nTransportation");
    let shuttle = open_event(&engine, "Shuttle day", at(50), at(58), None)?;
    for host in 1..=5 {
        let application = apply(&engine, HostId(host), &shuttle, false, host <= 3)?;
        decide(&engine, &application)?;
    }
    let summary = engine
        .transport
        .compute_summary(shuttle.id, args.worst_case_seats)?;
    println!(
        "- {} of {} worst-case seats needed, downgrade suggested: {}",
        summary.actual_needed_seats, summary.worst_case_seats, summary.downgrade_suggested
    );

    Ok(())
}

fn open_event(
    engine: &StaffingEngine<InMemoryStaffingStore>,
    title: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    wardrobe_item: Option<ClothingItemId>,
) -> Result<Event, StaffingError> {
    let event = engine.events.register(
        &CLIENT,
        NewEvent {
            title: title.to_string(),
            starts_at,
            ends_at,
            hosts_needed: 10,
            wardrobe_item,
        },
    )?;
    engine.events.approve(&ADMIN, event.id)
}

fn apply(
    engine: &StaffingEngine<InMemoryStaffingStore>,
    host: HostId,
    event: &Event,
    request_dress: bool,
    needs_ride: bool,
) -> Result<EventApplication, StaffingError> {
    engine.applications.submit(
        &Principal::host(host.0),
        host,
        event.id,
        ApplicationSubmission {
            requested_role: "host".to_string(),
            request_dress,
            needs_ride,
        },
    )
}

fn decide(
    engine: &StaffingEngine<InMemoryStaffingStore>,
    application: &EventApplication,
) -> Result<EventApplication, StaffingError> {
    engine.applications.decide(
        &ADMIN,
        application.id,
        DecisionRequest {
            outcome: DecisionOutcome::Accepted,
            assigned_role: None,
        },
    )
}

fn report(label: &str, outcome: Result<EventApplication, StaffingError>) {
    match outcome {
        Ok(application) => println!("- {label}: {}", application.status),
        Err(err) => println!("- {label}: refused ({err})"),
    }
}
