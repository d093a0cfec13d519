//! Device authorization: pairing a push-notification-only device with a
//! user account through a short verification code.

pub mod generator;
pub mod memory;
pub mod model;
pub mod store;
pub mod workflow;

pub use generator::DeviceAuthorizationGenerator;
pub use memory::MemoryDeviceAuthorizationStore;
pub use model::{
    DeviceAuthorization, DeviceAuthorizationStatus, DeviceAuthorizationUpdate, Pagination,
    StatusTransition,
};
pub use store::DeviceAuthorizationStore;
pub use workflow::DeviceAuthorizationWorkflow;
