use std::sync::Arc;

use super::domain::{ApplicationId, HostId, ScheduleWindow, ScheduledAssignment};
use super::repository::{ApplicationRepository, RepositoryError};

/// Read-only double-booking check over a host's accepted assignments.
pub struct ConflictDetector<A> {
    applications: Arc<A>,
}

impl<A> ConflictDetector<A>
where
    A: ApplicationRepository + 'static,
{
    pub fn new(applications: Arc<A>) -> Self {
        Self { applications }
    }

    /// Accepted assignments of `host` whose windows overlap `candidate`, skipping `exclude`.
    /// An empty result means no conflict.
    pub fn has_conflict(
        &self,
        host: HostId,
        candidate: &ScheduleWindow,
        exclude: Option<ApplicationId>,
    ) -> Result<Vec<ScheduledAssignment>, RepositoryError> {
        let assignments = self.applications.accepted_assignments(host)?;
        Ok(overlapping(assignments, candidate, exclude))
    }
}

fn overlapping(
    assignments: Vec<ScheduledAssignment>,
    candidate: &ScheduleWindow,
    exclude: Option<ApplicationId>,
) -> Vec<ScheduledAssignment> {
    let mut hits: Vec<_> = assignments
        .into_iter()
        .filter(|assignment| Some(assignment.application_id) != exclude)
        .filter(|assignment| assignment.window.overlaps(candidate))
        .collect();
    hits.sort_by_key(|assignment| (assignment.window.starts_at, assignment.event_id));
    hits
}
