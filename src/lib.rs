//! Weighted wheel spinner.
//!
//! - `sampler`: weighted draw of a segment from a per-label weight map
//! - `scheduler`: rotation frames that settle the pointer on that segment
//! - `spin`: the two combined into a single spin lifecycle
//! - `wheel_renderer`: PNG / GIF output of the frames

pub mod config;
pub mod error;
pub mod sampler;
pub mod scheduler;
pub mod spin;
pub mod weights;
pub mod wheel;
pub mod wheel_renderer;

pub use config::WheelConfig;
pub use error::WheelError;
pub use sampler::{Sampler, SamplingMode, SpinResult, sample};
pub use scheduler::{AnimationFrame, SpinSchedule, TurnRange, compute_angle_sequence, segment_under_pointer};
pub use spin::{Spin, SpinPhase, Wheel};
pub use weights::{WeightMap, WeightRange};
pub use wheel::{Segment, WheelLayout};
pub use wheel_renderer::WheelRenderer;
