//! fedgov-core: shared types, error taxonomy, clock and configuration.
//! All other fedgov crates depend on this one.

pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::SwarmError;
pub use types::{
    DeviceLease, DeviceSelector, ExtendRequest, JoinRequest, JoinResponse, LeaseRequest, Neighbor,
    ProbeRequest,
};
