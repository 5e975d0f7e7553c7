use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::authorization::Principal;
use super::domain::{DecisionStatus, Event, EventId, TransportationTrip};
use super::error::StaffingError;
use super::repository::{ApplicationRepository, EventRepository, TripRepository};

/// Share of the worst case at or below which a smaller vehicle is suggested.
pub const DEFAULT_DOWNGRADE_RATIO: f64 = 0.6;

/// Seat-capacity view for one event. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportationSummary {
    pub event_id: EventId,
    pub available: bool,
    pub trips: Vec<TransportationTrip>,
    pub worst_case_seats: u32,
    pub actual_needed_seats: u32,
    pub downgrade_suggested: bool,
}

/// Admin input for the event's trip record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripPlan {
    pub pickup_location: String,
    pub departure_time: DateTime<Utc>,
    #[serde(default)]
    pub return_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_cents: u64,
}

/// `worst > 0 && actual <= round(worst * ratio)`
pub fn downgrade_suggested(worst_case_seats: u32, actual_needed_seats: u32, ratio: f64) -> bool {
    if worst_case_seats == 0 {
        return false;
    }
    let threshold = (f64::from(worst_case_seats) * ratio).round();
    f64::from(actual_needed_seats) <= threshold
}

pub struct TransportationPlanner<S> {
    store: Arc<S>,
    downgrade_ratio: f64,
}

impl<S> TransportationPlanner<S>
where
    S: EventRepository + ApplicationRepository + TripRepository + 'static,
{
    pub fn new(store: Arc<S>, downgrade_ratio: f64) -> Self {
        Self {
            store,
            downgrade_ratio,
        }
    }

    pub fn compute_summary(
        &self,
        event_id: EventId,
        worst_case_seats: u32,
    ) -> Result<TransportationSummary, StaffingError> {
        let actual_needed_seats = self
            .store
            .applications_for_event(event_id)?
            .iter()
            .filter(|app| app.status == DecisionStatus::Accepted && app.needs_ride)
            .count();
        let actual_needed_seats = u32::try_from(actual_needed_seats)
            .map_err(|_| StaffingError::Internal("ride count overflow".to_string()))?;

        let trips: Vec<_> = self.store.trip_for_event(event_id)?.into_iter().collect();

        Ok(TransportationSummary {
            event_id,
            available: !trips.is_empty(),
            trips,
            worst_case_seats,
            actual_needed_seats,
            downgrade_suggested: downgrade_suggested(
                worst_case_seats,
                actual_needed_seats,
                self.downgrade_ratio,
            ),
        })
    }

    /// Summary for a caller; the worst case defaults to the event's `hosts_needed`.
    pub fn summary_for(
        &self,
        principal: &Principal,
        event_id: EventId,
        worst_case_seats: Option<u32>,
    ) -> Result<TransportationSummary, StaffingError> {
        let event = self.event(event_id)?;
        principal.require_admin_or_owner(&event)?;
        self.compute_summary(event_id, worst_case_seats.unwrap_or(event.hosts_needed))
    }

    /// Create or replace the event's trip record.
    pub fn plan_trip(
        &self,
        principal: &Principal,
        event_id: EventId,
        plan: TripPlan,
    ) -> Result<TransportationTrip, StaffingError> {
        principal.require_admin()?;
        self.event(event_id)?;

        if plan.pickup_location.trim().is_empty() {
            return Err(StaffingError::validation("pickup location must not be empty"));
        }
        if let Some(return_time) = plan.return_time {
            if return_time <= plan.departure_time {
                return Err(StaffingError::validation(
                    "return time must be after departure time",
                ));
            }
        }

        let trip = TransportationTrip {
            event_id,
            pickup_location: plan.pickup_location.trim().to_string(),
            departure_time: plan.departure_time,
            return_time: plan.return_time,
            payment_cents: plan.payment_cents,
        };
        self.store.upsert_trip(trip.clone())?;
        info!(event_id = %event_id, pickup = %trip.pickup_location, "transportation planned");
        Ok(trip)
    }

    fn event(&self, event_id: EventId) -> Result<Event, StaffingError> {
        self.store
            .fetch_event(event_id)?
            .ok_or_else(|| StaffingError::not_found(format!("event {event_id}")))
    }
}
