//! Staffing workflow: event admission, host applications, double-booking checks, wardrobe
//! reservations and transportation capacity planning.
//!
//! Correctness under concurrency rests on the store's conditional updates; the components hold
//! no in-process locks of their own.

pub mod approval;
pub mod authorization;
pub mod conflict;
pub mod domain;
pub mod error;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod transport;
pub mod wardrobe;

#[cfg(test)]
mod tests;

pub use approval::EventApprovalGate;
pub use authorization::{Principal, PrincipalRole};
pub use conflict::ConflictDetector;
pub use domain::{
    AdminId, ApplicationId, ApplicationSubmission, AssignedRole, ClientId, ClothingItemId,
    DecisionOutcome, DecisionRequest, DecisionStatus, Event, EventApplication, EventId, HostId,
    HostProfile, NewEvent, ScheduleWindow, ScheduledAssignment, StockKey, TransportationTrip,
};
pub use error::{ConflictReason, StaffingError};
pub use memory::InMemoryStaffingStore;
pub use repository::{
    ApplicationRepository, ConditionalUpdate, EventRepository, HostDirectory, RepositoryError,
    StaffingStore, TripRepository, WardrobeRepository,
};
pub use router::staffing_router;
pub use service::{ApplicationStateMachine, StaffingEngine};
pub use transport::{
    downgrade_suggested, TransportationPlanner, TransportationSummary, TripPlan,
    DEFAULT_DOWNGRADE_RATIO,
};
pub use wardrobe::{Reservation, WardrobeReservationLedger};
