pub mod angle;
pub mod angle_filter;
pub mod calibration;
pub mod form;
pub mod reps;
pub mod threshold;

pub use angle::compute_angle;
pub use angle_filter::{AngleFilter, FilteredAngle};
pub use calibration::{CalibrationStore, Envelope};
pub use reps::{Feedback, FeedbackTone, Phase, RepCounter};
pub use threshold::ThresholdPair;
