mod cycle;
mod overdue;
mod session;

pub use cycle::{CycleConfig, CycleScheduler, CycleState, CycleTransition, FlashCue, StepKind};
pub use overdue::{Crossing, OverdueDetector, GUARD_GRACE_MS};
pub use session::{FocusSessionTracker, SegmentEnd};
