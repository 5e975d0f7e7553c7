//! Per-operation authorization predicates.
//!
//! The identity collaborator authenticates callers and hands the engine a [`Principal`]; the
//! predicates here only decide whether that principal may act on a given resource.

use serde::{Deserialize, Serialize};

use super::domain::{AdminId, ClientId, Event, HostId};
use super::error::StaffingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    Admin,
    Host,
    Client,
}

impl PrincipalRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "host" | "user" => Some(Self::Host),
            "client" => Some(Self::Client),
            _ => None,
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub role: PrincipalRole,
}

impl Principal {
    pub const fn admin(id: u64) -> Self {
        Self {
            id,
            role: PrincipalRole::Admin,
        }
    }

    pub const fn host(id: u64) -> Self {
        Self {
            id,
            role: PrincipalRole::Host,
        }
    }

    pub const fn client(id: u64) -> Self {
        Self {
            id,
            role: PrincipalRole::Client,
        }
    }

    pub fn require_admin(&self) -> Result<AdminId, StaffingError> {
        match self.role {
            PrincipalRole::Admin => Ok(AdminId(self.id)),
            _ => Err(StaffingError::forbidden("admin role required")),
        }
    }

    pub fn require_client(&self) -> Result<ClientId, StaffingError> {
        match self.role {
            PrincipalRole::Client => Ok(ClientId(self.id)),
            _ => Err(StaffingError::forbidden("client role required")),
        }
    }

    /// Hosts may only act as themselves.
    pub fn require_host(&self, host: HostId) -> Result<(), StaffingError> {
        if self.role == PrincipalRole::Host && self.id == host.0 {
            Ok(())
        } else {
            Err(StaffingError::forbidden(format!(
                "only host {host} may act on its own applications"
            )))
        }
    }

    pub fn require_admin_or_host(&self, host: HostId) -> Result<(), StaffingError> {
        if self.role == PrincipalRole::Admin {
            return Ok(());
        }
        self.require_host(host)
    }

    pub fn require_admin_or_owner(&self, event: &Event) -> Result<(), StaffingError> {
        match self.role {
            PrincipalRole::Admin => Ok(()),
            PrincipalRole::Client if ClientId(self.id) == event.client_id => Ok(()),
            _ => Err(StaffingError::forbidden(format!(
                "event {} belongs to another client",
                event.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::staffing::domain::{DecisionStatus, EventId, ScheduleWindow};
    use chrono::{TimeZone, Utc};

    fn event_owned_by(client: u64) -> Event {
        Event {
            id: EventId(1),
            title: "Launch party".to_string(),
            client_id: ClientId(client),
            status: DecisionStatus::Accepted,
            window: ScheduleWindow {
                starts_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap(),
            },
            hosts_needed: 4,
            wardrobe_item: None,
            team_leader: None,
            deciding_admin: None,
        }
    }

    #[test]
    fn hosts_cannot_impersonate_each_other() {
        assert!(Principal::host(7).require_host(HostId(7)).is_ok());
        assert!(matches!(
            Principal::host(7).require_host(HostId(8)),
            Err(StaffingError::Forbidden(_))
        ));
        assert!(Principal::admin(1).require_host(HostId(7)).is_err());
        assert!(Principal::admin(1).require_admin_or_host(HostId(7)).is_ok());
    }

    #[test]
    fn only_the_owning_client_sees_its_event() {
        let event = event_owned_by(3);
        assert!(Principal::client(3).require_admin_or_owner(&event).is_ok());
        assert!(Principal::client(4).require_admin_or_owner(&event).is_err());
        assert!(Principal::host(3).require_admin_or_owner(&event).is_err());
        assert!(Principal::admin(9).require_admin_or_owner(&event).is_ok());
    }

    #[test]
    fn parses_role_headers() {
        assert_eq!(PrincipalRole::parse("Admin"), Some(PrincipalRole::Admin));
        assert_eq!(PrincipalRole::parse("user"), Some(PrincipalRole::Host));
        assert_eq!(PrincipalRole::parse("root"), None);
    }
}
