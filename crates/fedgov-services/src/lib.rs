//! fedgov-services: the lease registry, the neighbor directory, the
//! identity guard, and the `Governor` that ties them together.

pub mod governor;
pub mod identity;
pub mod lease;
pub mod neighbor;

pub use governor::Governor;
pub use identity::IdentityGuard;
pub use lease::{DeviceState, DeviceStatus, LeaseRegistry};
pub use neighbor::NeighborDirectory;
