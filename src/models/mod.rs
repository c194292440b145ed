pub mod money;
pub mod observation;
pub mod session;

pub use money::Money;
pub use observation::{FrameObservation, StableObservation, VehicleClass};
pub use session::{GridPosition, SectorAssignment, SectorDescriptor, Session};
