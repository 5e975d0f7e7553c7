use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a staffed event.
    EventId
);
numeric_id!(
    /// Identifier of a host's application to an event.
    ApplicationId
);
numeric_id!(
    /// Identifier of a host (a person who can staff events).
    HostId
);
numeric_id!(
    /// Identifier of the client that requested an event.
    ClientId
);
numeric_id!(AdminId);
numeric_id!(
    /// Identifier of a clothing catalog item.
    ClothingItemId
);

/// Closed schedule window; both endpoints belong to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ScheduleWindow {
    /// Returns `None` unless `starts_at < ends_at`.
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Option<Self> {
        (starts_at < ends_at).then_some(Self { starts_at, ends_at })
    }

    /// Touching endpoints count as an overlap.
    pub fn overlaps(&self, other: &ScheduleWindow) -> bool {
        self.starts_at <= other.ends_at && other.starts_at <= self.ends_at
    }
}

/// Admission state shared by events and applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl DecisionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Accepted => "accepted",
            DecisionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role a host is assigned once an application is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    Host,
    TeamLeader,
}

impl AssignedRole {
    /// Case-insensitive; spaces and dashes are accepted in place of the underscore.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "host" => Some(Self::Host),
            "team_leader" => Some(Self::TeamLeader),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AssignedRole::Host => "host",
            AssignedRole::TeamLeader => "team_leader",
        }
    }
}

/// An event as seen by the staffing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub client_id: ClientId,
    pub status: DecisionStatus,
    pub window: ScheduleWindow,
    /// Worst-case headcount.
    pub hosts_needed: u32,
    pub wardrobe_item: Option<ClothingItemId>,
    pub team_leader: Option<HostId>,
    pub deciding_admin: Option<AdminId>,
}

/// Client-supplied draft of an event awaiting admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub hosts_needed: u32,
    #[serde(default)]
    pub wardrobe_item: Option<ClothingItemId>,
}

/// A host's request to staff an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventApplication {
    pub id: ApplicationId,
    pub sender: HostId,
    pub event_id: EventId,
    pub requested_role: String,
    pub assigned_role: Option<AssignedRole>,
    pub status: DecisionStatus,
    pub request_dress: bool,
    pub needs_ride: bool,
    pub decided_at: Option<DateTime<Utc>>,
    pub deciding_admin: Option<AdminId>,
}

/// Fields supplied by a host when applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub requested_role: String,
    #[serde(default)]
    pub request_dress: bool,
    #[serde(default)]
    pub needs_ride: bool,
}

/// Store-facing insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub sender: HostId,
    pub event_id: EventId,
    pub requested_role: String,
    pub request_dress: bool,
    pub needs_ride: bool,
}

/// Terminal outcome an admin may record on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Accepted,
    Rejected,
}

impl DecisionOutcome {
    pub const fn status(self) -> DecisionStatus {
        match self {
            DecisionOutcome::Accepted => DecisionStatus::Accepted,
            DecisionOutcome::Rejected => DecisionStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub outcome: DecisionOutcome,
    #[serde(default)]
    pub assigned_role: Option<String>,
}

/// Values written by a successful decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRecord {
    pub status: DecisionStatus,
    pub assigned_role: Option<AssignedRole>,
    pub decided_at: DateTime<Utc>,
    pub deciding_admin: AdminId,
}

/// An accepted application joined to its event's window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAssignment {
    pub application_id: ApplicationId,
    pub event_id: EventId,
    pub title: String,
    pub window: ScheduleWindow,
}

/// Directory entry for a host; only the attributes the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    pub id: HostId,
    pub name: String,
    pub clothing_size: Option<String>,
}

/// Stock row key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item: ClothingItemId,
    pub size: String,
}

impl StockKey {
    pub fn new(item: ClothingItemId, size: impl Into<String>) -> Self {
        Self {
            item,
            size: size.into(),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {} size {}", self.item, self.size)
    }
}

/// The single transportation planning record kept per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportationTrip {
    pub event_id: EventId,
    pub pickup_location: String,
    pub departure_time: DateTime<Utc>,
    #[serde(default)]
    pub return_time: Option<DateTime<Utc>>,
    pub payment_cents: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn window_requires_start_before_end() {
        assert!(ScheduleWindow::new(at(10), at(18)).is_some());
        assert!(ScheduleWindow::new(at(18), at(18)).is_none());
        assert!(ScheduleWindow::new(at(18), at(10)).is_none());
    }

    #[test]
    fn touching_windows_overlap() {
        let morning = ScheduleWindow::new(at(8), at(12)).unwrap();
        let afternoon = ScheduleWindow::new(at(12), at(16)).unwrap();
        let evening = ScheduleWindow::new(at(17), at(22)).unwrap();

        assert!(morning.overlaps(&afternoon));
        assert!(afternoon.overlaps(&morning));
        assert!(!morning.overlaps(&evening));
    }

    #[test]
    fn role_labels_are_normalized() {
        assert_eq!(AssignedRole::parse(" Host "), Some(AssignedRole::Host));
        assert_eq!(
            AssignedRole::parse("Team Leader"),
            Some(AssignedRole::TeamLeader)
        );
        assert_eq!(
            AssignedRole::parse("TEAM-LEADER"),
            Some(AssignedRole::TeamLeader)
        );
        assert_eq!(AssignedRole::parse("bartender"), None);
    }
}
