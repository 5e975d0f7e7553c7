use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::approval::EventApprovalGate;
use super::authorization::Principal;
use super::conflict::ConflictDetector;
use super::domain::{
    AdminId, ApplicationId, ApplicationSubmission, AssignedRole, DecisionOutcome, DecisionRecord,
    DecisionRequest, DecisionStatus, Event, EventApplication, EventId, HostId, NewApplication,
    StockKey,
};
use super::error::{ConflictReason, StaffingError};
use super::repository::{ConditionalUpdate, RepositoryError, StaffingStore};
use super::transport::TransportationPlanner;
use super::wardrobe::{Reservation, WardrobeReservationLedger};

/// Lifecycle of staffing applications: `pending -> accepted | rejected`, both terminal.
///
/// Accepting is a short saga over non-transactional storage:
/// conditional accept, team-leader propagation, then the wardrobe reservation. A failed
/// reservation is compensated by reverting the application to pending.
pub struct ApplicationStateMachine<S> {
    store: Arc<S>,
    conflicts: ConflictDetector<S>,
    wardrobe: WardrobeReservationLedger<S>,
}

impl<S> ApplicationStateMachine<S>
where
    S: StaffingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            conflicts: ConflictDetector::new(store.clone()),
            wardrobe: WardrobeReservationLedger::new(store.clone()),
            store,
        }
    }

    /// File an application against an event that is open for applications.
    pub fn submit(
        &self,
        principal: &Principal,
        host: HostId,
        event_id: EventId,
        submission: ApplicationSubmission,
    ) -> Result<EventApplication, StaffingError> {
        principal.require_host(host)?;

        let requested_role = submission.requested_role.trim();
        if requested_role.is_empty() {
            return Err(StaffingError::validation("requested role must not be empty"));
        }

        let event = self.event(event_id)?;
        if event.status != DecisionStatus::Accepted {
            return Err(ConflictReason::EventNotOpen {
                status: event.status,
            }
            .into());
        }

        let application = NewApplication {
            sender: host,
            event_id,
            requested_role: requested_role.to_string(),
            request_dress: submission.request_dress,
            needs_ride: submission.needs_ride,
        };

        match self.store.insert_application(application) {
            Ok(stored) => {
                info!(
                    application_id = %stored.id,
                    host_id = %host,
                    event_id = %event_id,
                    "application submitted"
                );
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => Err(ConflictReason::DuplicateApplication.into()),
            Err(other) => Err(other.into()),
        }
    }

    /// Record an admin decision on a pending application.
    pub fn decide(
        &self,
        principal: &Principal,
        application_id: ApplicationId,
        request: DecisionRequest,
    ) -> Result<EventApplication, StaffingError> {
        let admin = principal.require_admin()?;

        let application = self.get(application_id)?;
        if application.status != DecisionStatus::Pending {
            return Err(ConflictReason::AlreadyProcessed.into());
        }

        match request.outcome {
            DecisionOutcome::Rejected => self.reject(application, admin),
            DecisionOutcome::Accepted => {
                self.accept(application, request.assigned_role.as_deref(), admin)
            }
        }
    }

    fn reject(
        &self,
        mut application: EventApplication,
        admin: AdminId,
    ) -> Result<EventApplication, StaffingError> {
        let decision = DecisionRecord {
            status: DecisionStatus::Rejected,
            assigned_role: None,
            decided_at: Utc::now(),
            deciding_admin: admin,
        };
        self.commit(application.id, decision)?;

        info!(application_id = %application.id, admin_id = %admin, "application rejected");
        apply(&mut application, decision);
        Ok(application)
    }

    fn accept(
        &self,
        mut application: EventApplication,
        role_override: Option<&str>,
        admin: AdminId,
    ) -> Result<EventApplication, StaffingError> {
        let event = self.event(application.event_id)?;

        let overlapping =
            self.conflicts
                .has_conflict(application.sender, &event.window, Some(application.id))?;
        if !overlapping.is_empty() {
            debug!(
                application_id = %application.id,
                overlaps = overlapping.len(),
                "accept refused: schedule overlap"
            );
            return Err(ConflictReason::ScheduleOverlap { overlapping }.into());
        }

        let raw_role = role_override
            .filter(|role| !role.trim().is_empty())
            .unwrap_or(&application.requested_role);
        let role = AssignedRole::parse(raw_role).ok_or_else(|| {
            StaffingError::validation(format!(
                "role '{raw_role}' must be one of host, team_leader"
            ))
        })?;

        let stock_key = self.dress_reservation_key(&application, &event)?;

        let decision = DecisionRecord {
            status: DecisionStatus::Accepted,
            assigned_role: Some(role),
            decided_at: Utc::now(),
            deciding_admin: admin,
        };
        self.commit(application.id, decision)?;

        // A concurrent accept for the same host may have slipped past the first scan.
        let overlapping =
            self.conflicts
                .has_conflict(application.sender, &event.window, Some(application.id))?;
        if !overlapping.is_empty() {
            warn!(
                application_id = %application.id,
                "concurrent overlapping accept detected, reverting"
            );
            self.compensate(application.id, None)?;
            return Err(ConflictReason::ScheduleOverlap { overlapping }.into());
        }

        let leader_handoff = if role == AssignedRole::TeamLeader {
            self.store
                .set_team_leader(event.id, Some(application.sender))?;
            Some(LeaderHandoff {
                event_id: event.id,
                leader: application.sender,
                previous: event.team_leader,
            })
        } else {
            None
        };

        if let Some(key) = stock_key {
            if self.wardrobe.reserve(key.item, &key.size)? == Reservation::OutOfStock {
                self.compensate(application.id, leader_handoff)?;
                return Err(ConflictReason::InsufficientStock { key }.into());
            }
        }

        info!(
            application_id = %application.id,
            admin_id = %admin,
            role = role.label(),
            "application accepted"
        );
        apply(&mut application, decision);
        Ok(application)
    }

    /// Wardrobe row to reserve when the applicant asked for a dress, if the event has one.
    fn dress_reservation_key(
        &self,
        application: &EventApplication,
        event: &Event,
    ) -> Result<Option<StockKey>, StaffingError> {
        if !application.request_dress {
            return Ok(None);
        }
        let Some(item) = event.wardrobe_item else {
            return Ok(None);
        };

        let profile = self
            .store
            .host_profile(application.sender)?
            .ok_or_else(|| StaffingError::not_found(format!("host {}", application.sender)))?;
        let size = profile
            .clothing_size
            .filter(|size| !size.trim().is_empty())
            .ok_or_else(|| {
                StaffingError::validation(format!(
                    "host {} has no clothing size on file",
                    application.sender
                ))
            })?;

        Ok(Some(StockKey::new(item, size)))
    }

    fn commit(&self, id: ApplicationId, decision: DecisionRecord) -> Result<(), StaffingError> {
        match self.store.record_decision(id, decision)? {
            ConditionalUpdate::Applied => Ok(()),
            ConditionalUpdate::Stale => {
                debug!(application_id = %id, "lost decision race");
                Err(ConflictReason::AlreadyProcessed.into())
            }
            ConditionalUpdate::Missing => Err(StaffingError::not_found(format!("application {id}"))),
        }
    }

    /// Undo a provisional accept. A `handoff` is rolled back only while this accept's
    /// host still leads the event.
    fn compensate(
        &self,
        id: ApplicationId,
        handoff: Option<LeaderHandoff>,
    ) -> Result<(), StaffingError> {
        let reverted = self.store.revert_to_pending(id).map_err(|err| {
            error!(application_id = %id, error = %err, "compensation failed; application left accepted");
            StaffingError::from(err)
        })?;
        if !reverted.applied() {
            error!(application_id = %id, outcome = ?reverted, "compensation found no accepted row");
        }

        if let Some(handoff) = handoff {
            let restored = self.store.restore_team_leader(
                handoff.event_id,
                handoff.leader,
                handoff.previous,
            )?;
            if !restored.applied() {
                warn!(
                    event_id = %handoff.event_id,
                    host_id = %handoff.leader,
                    outcome = ?restored,
                    "team leader changed since propagation; keeping current leader"
                );
            }
        }

        warn!(application_id = %id, "provisional accept reverted to pending");
        Ok(())
    }

    pub fn get(&self, application_id: ApplicationId) -> Result<EventApplication, StaffingError> {
        self.store
            .fetch_application(application_id)?
            .ok_or_else(|| StaffingError::not_found(format!("application {application_id}")))
    }

    /// The applicant or an admin may read an application.
    pub fn get_as(
        &self,
        principal: &Principal,
        application_id: ApplicationId,
    ) -> Result<EventApplication, StaffingError> {
        let application = self.get(application_id)?;
        principal.require_admin_or_host(application.sender)?;
        Ok(application)
    }

    pub fn applications_for_event(
        &self,
        principal: &Principal,
        event_id: EventId,
    ) -> Result<Vec<EventApplication>, StaffingError> {
        let event = self.event(event_id)?;
        principal.require_admin_or_owner(&event)?;
        Ok(self.store.applications_for_event(event_id)?)
    }

    fn event(&self, event_id: EventId) -> Result<Event, StaffingError> {
        self.store
            .fetch_event(event_id)?
            .ok_or_else(|| StaffingError::not_found(format!("event {event_id}")))
    }
}

/// Team-leader propagation performed by an accept in flight.
#[derive(Debug, Clone, Copy)]
struct LeaderHandoff {
    event_id: EventId,
    leader: HostId,
    previous: Option<HostId>,
}

fn apply(application: &mut EventApplication, decision: DecisionRecord) {
    application.status = decision.status;
    application.assigned_role = decision.assigned_role;
    application.decided_at = Some(decision.decided_at);
    application.deciding_admin = Some(decision.deciding_admin);
}

/// All staffing components wired to one store.
pub struct StaffingEngine<S> {
    pub events: EventApprovalGate<S>,
    pub applications: ApplicationStateMachine<S>,
    pub conflicts: ConflictDetector<S>,
    pub wardrobe: WardrobeReservationLedger<S>,
    pub transport: TransportationPlanner<S>,
}

impl<S> StaffingEngine<S>
where
    S: StaffingStore + 'static,
{
    pub fn new(store: Arc<S>, downgrade_ratio: f64) -> Self {
        Self {
            events: EventApprovalGate::new(store.clone()),
            applications: ApplicationStateMachine::new(store.clone()),
            conflicts: ConflictDetector::new(store.clone()),
            wardrobe: WardrobeReservationLedger::new(store.clone()),
            transport: TransportationPlanner::new(store, downgrade_ratio),
        }
    }
}
