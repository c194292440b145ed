pub mod debounce;
pub mod loop_worker;
pub mod plate;
pub mod replay;
pub mod sampler;

pub use debounce::{DebounceConfig, DebounceFilter, FilterEvent};
pub use loop_worker::{capture_loop, LaneMessage};
pub use replay::ReplayDetector;
pub use sampler::{Detection, DetectionClass, DetectionSampler, Detector};
